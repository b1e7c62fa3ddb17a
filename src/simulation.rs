//! Functionality for running the projection for every scenario.
use crate::census::build_census;
use crate::derivation::{DerivedParameters, derive_parameters};
use crate::model::Model;
use crate::output::DataWriter;
use crate::output::metadata::write_metadata;
use crate::resource::{ResourceRecord, extract_admissions, project_occupancy};
use crate::scenario::{ScenarioConfig, ScenarioID};
use crate::sir::{SirRecord, simulate};
use anyhow::{Context, Result, bail};
use log::{debug, error, info};
use std::path::Path;
use std::rc::Rc;

/// The complete output of the projection for one scenario
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResult {
    /// The scenario these results are for
    pub scenario_id: ScenarioID,
    /// SIR model coefficients and derived values
    pub parameters: DerivedParameters,
    /// Compartment sizes for each day
    pub sir: Vec<SirRecord>,
    /// Patients who would be occupying each resource if admitted that day
    pub occupancy: Vec<ResourceRecord<f64>>,
    /// New admissions for each resource per day
    pub admissions: Vec<ResourceRecord<f64>>,
    /// Number of patients occupying each resource per day
    pub census: Vec<ResourceRecord<u64>>,
}

/// Run the projection for a single scenario.
///
/// The scenario's inputs are validated first, so an invalid scenario fails here rather than when
/// the model is loaded.
///
/// # Arguments
///
/// * `scenario` - The scenario to project
/// * `beta_decay` - Fraction by which the transmission rate shrinks each day, if any
pub fn run_scenario(scenario: &ScenarioConfig, beta_decay: Option<f64>) -> Result<ScenarioResult> {
    scenario.ensure_valid()?;
    let parameters = derive_parameters(scenario)?;
    debug!(
        "Scenario {}: beta = {}, gamma = {}, initial infections = {}",
        scenario.id, parameters.beta, parameters.gamma, parameters.initial_state.infected
    );

    let sir = simulate(
        parameters.initial_state,
        parameters.beta,
        parameters.gamma,
        scenario.n_days,
        beta_decay,
    )?;
    let occupancy = project_occupancy(&sir, &scenario.rates, scenario.market_share);
    let admissions = extract_admissions(&occupancy);
    let census = build_census(&admissions, &scenario.length_of_stay);

    Ok(ScenarioResult {
        scenario_id: scenario.id,
        parameters,
        sir,
        occupancy,
        admissions,
        census,
    })
}

/// Run the projection for every scenario in the model.
///
/// Scenarios are independent: an error in one does not prevent the others from running.
///
/// # Returns
///
/// Each scenario paired with its results or the error which prevented it from running.
pub fn run_scenarios(
    model: &Model,
) -> impl Iterator<Item = (&Rc<ScenarioConfig>, Result<ScenarioResult>)> {
    let beta_decay = model.beta_decay();
    model.iter_scenarios().map(move |scenario| {
        let result = run_scenario(scenario, beta_decay)
            .with_context(|| format!("Scenario {} ('{}') failed", scenario.id, scenario.name));
        (scenario, result)
    })
}

/// Run the simulation and write the results to disk.
///
/// Results are written for every scenario which runs successfully, along with metadata about the
/// run. If any scenario fails, the reason is logged and an error is returned once all the other
/// scenarios have been written.
///
/// # Arguments:
///
/// * `model` - The model to run
/// * `output_path` - The folder to which output files will be written
pub fn run(model: &Model, output_path: &Path) -> Result<()> {
    let mut writer = DataWriter::create(output_path)?;

    let mut n_failed = 0;
    for (scenario, result) in run_scenarios(model) {
        match result {
            Ok(result) => {
                info!(
                    "Scenario {} ('{}'): projected {} days",
                    scenario.id, scenario.name, scenario.n_days
                );
                if result.census.is_empty() {
                    info!(
                        "Scenario {}: horizon is too short for a census with a length of stay of \
                        {} days",
                        scenario.id,
                        scenario.max_length_of_stay()
                    );
                }
                writer.write_scenario(scenario, &result)?;
            }
            Err(err) => {
                error!("{err:?}");
                n_failed += 1;
            }
        }
    }

    writer.flush()?;
    write_metadata(output_path, model, model.scenarios.len() - n_failed)
        .context("Failed to save metadata")?;

    if n_failed > 0 {
        bail!(
            "{n_failed} of {} scenarios failed to run",
            model.scenarios.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{model, scenario};
    use crate::resource::{ByCategory, ResourceCategory};
    use itertools::Itertools;
    use rstest::rstest;
    use strum::IntoEnumIterator;
    use tempfile::tempdir;

    #[rstest]
    fn test_run_scenario(scenario: ScenarioConfig) {
        let result = run_scenario(&scenario, None).unwrap();

        assert_eq!(result.scenario_id, scenario.id);
        assert_eq!(result.sir.len(), 366);
        assert_eq!(result.occupancy.len(), 366);
        assert_eq!(result.admissions.len(), 365);
        assert_eq!(result.census.len(), 365 - 14);

        let day0 = result.sir[0].state;
        assert_eq!(day0.susceptible, 683_832.0);
        assert!((day0.infected - 80.0).abs() < 1e-9);
        assert_eq!(day0.recovered, 0.0);
        assert!(result.sir[1].state.susceptible < day0.susceptible);
    }

    #[rstest]
    fn test_run_scenario_census_properties(scenario: ScenarioConfig) {
        let result = run_scenario(&scenario, None).unwrap();

        assert_eq!(result.census[0].values.hosp, 0);
        assert_eq!(result.census[0].values.icu, 0);
        assert_eq!(result.census[0].values.vent, 0);

        for category in ResourceCategory::iter() {
            let admissions = result
                .admissions
                .iter()
                .map(|record| *record.values.get(category))
                .collect_vec();
            assert!(admissions.iter().all(|&admitted| admitted >= 0.0));

            // Cumulative admissions never decrease
            let cumulative = admissions
                .iter()
                .scan(0.0, |total, admitted| {
                    *total += admitted;
                    Some(*total)
                })
                .collect_vec();
            assert!(cumulative.iter().tuple_windows().all(|(a, b)| b >= a));
        }
    }

    #[rstest]
    fn test_run_scenario_deterministic(scenario: ScenarioConfig) {
        assert_eq!(
            run_scenario(&scenario, Some(0.01)).unwrap(),
            run_scenario(&scenario, Some(0.01)).unwrap()
        );
    }

    #[rstest]
    fn test_run_scenario_short_horizon(mut scenario: ScenarioConfig) {
        scenario.n_days = 10;
        let result = run_scenario(&scenario, None).unwrap();

        assert_eq!(result.admissions.len(), 10);
        assert!(result.census.is_empty());
    }

    #[rstest]
    fn test_run_scenario_no_patients(mut scenario: ScenarioConfig) {
        scenario.current_hosp = 0.0;
        let result = run_scenario(&scenario, None).unwrap();

        assert!(result.sir.iter().all(|record| record.state.infected == 0.0));
        assert!(
            result
                .census
                .iter()
                .all(|record| record.values == ByCategory::default())
        );
    }

    #[rstest]
    fn test_run_scenario_invalid(mut scenario: ScenarioConfig) {
        scenario.market_share = 0.0;
        assert!(run_scenario(&scenario, None).is_err());
    }

    #[rstest]
    fn test_run_scenarios_isolated(mut model: Model, scenario: ScenarioConfig) {
        let alone = run_scenario(&scenario, None).unwrap();

        // Add a second, broken scenario after the first
        let mut broken = scenario.clone();
        broken.id = ScenarioID(2);
        broken.name = "Broken".into();
        broken.rates.hosp = 0.0;
        model.scenarios.insert(broken.id, broken.into());

        let results = run_scenarios(&model).collect_vec();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].1.as_ref().unwrap(), &alone);
        assert_eq!(
            results[1].1.as_ref().unwrap_err().to_string(),
            "Scenario 2 ('Broken') failed"
        );
    }

    #[test]
    fn test_run_skips_invalid_scenario() {
        let model_dir = tempdir().unwrap();
        std::fs::write(model_dir.path().join("model.toml"), "").unwrap();
        std::fs::write(
            model_dir.path().join("scenarios.csv"),
            "name,population,market_share,initial_infections,current_hosp,n_days,doubling_time,\
            relative_contact_rate,recovery_days,hosp_rate,icu_rate,vent_rate,hosp_los,icu_los,\
            vent_los\n\
            Good,683832,100,52,2,60,4,30,14,2.5,0.75,0.65,10,14,14\n\
            Bad,683832,100,52,2,60,4,30,14,0,0.75,0.65,10,14,14\n",
        )
        .unwrap();
        let model = Model::from_path(model_dir.path()).unwrap();

        // The bad scenario fails on its own, naming itself
        let results = run_scenarios(&model).collect_vec();
        assert!(results[0].1.is_ok());
        let err = results[1].1.as_ref().unwrap_err();
        assert_eq!(
            err.chain().map(ToString::to_string).collect_vec(),
            [
                "Scenario 2 ('Bad') failed",
                "Invalid scenario 2 ('Bad')",
                "hosp_rate must be a fraction greater than 0 and no more than 1"
            ]
        );

        // The good scenario's results are still written
        let output_dir = tempdir().unwrap();
        let err = run(&model, output_dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 scenarios failed to run");
        for file_name in ["sir.csv", "admissions.csv", "census.csv", "scenarios.csv"] {
            let contents = std::fs::read_to_string(output_dir.path().join(file_name)).unwrap();
            assert!(contents.lines().count() > 1, "{file_name} is empty");
            assert!(
                contents.lines().skip(1).all(|line| line.starts_with("1,")),
                "{file_name} contains rows for the invalid scenario"
            );
        }
    }

    #[rstest]
    fn test_run_writes_successful_scenarios(mut model: Model, scenario: ScenarioConfig) {
        let mut broken = scenario.clone();
        broken.id = ScenarioID(2);
        broken.name = "Broken".into();
        broken.market_share = 0.0;
        model.scenarios.insert(broken.id, broken.into());

        let dir = tempdir().unwrap();
        let err = run(&model, dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 scenarios failed to run");

        let census = std::fs::read_to_string(dir.path().join("census.csv")).unwrap();
        assert_eq!(census.lines().count(), 1 + 365 - 14);
        assert!(census.lines().skip(1).all(|line| line.starts_with("1,")));
    }
}
