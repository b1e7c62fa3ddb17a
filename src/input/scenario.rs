//! Code for reading scenarios from a CSV file.
use super::{input_err_msg, read_csv};
use crate::model::RateUnits;
use crate::resource::ByCategory;
use crate::scenario::{ScenarioConfig, ScenarioID, ScenarioMap};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::rc::Rc;

const SCENARIOS_FILE_NAME: &str = "scenarios.csv";

/// A row of the scenarios CSV file, before conversion of rates to fractions
#[derive(Debug, Deserialize, PartialEq)]
struct ScenarioRaw {
    name: String,
    population: f64,
    market_share: f64,
    initial_infections: f64,
    current_hosp: f64,
    n_days: u32,
    doubling_time: f64,
    relative_contact_rate: f64,
    recovery_days: f64,
    hosp_rate: f64,
    icu_rate: f64,
    vent_rate: f64,
    hosp_los: u32,
    icu_los: u32,
    vent_los: u32,
}

impl ScenarioRaw {
    /// Convert into a [`ScenarioConfig`] with the given ID
    fn into_scenario(self, id: ScenarioID, units: RateUnits) -> ScenarioConfig {
        ScenarioConfig {
            id,
            name: self.name,
            population: self.population,
            market_share: units.to_fraction(self.market_share),
            initial_infections: self.initial_infections,
            current_hosp: self.current_hosp,
            n_days: self.n_days,
            doubling_time: self.doubling_time,
            relative_contact_rate: units.to_fraction(self.relative_contact_rate),
            recovery_days: self.recovery_days,
            rates: ByCategory {
                hosp: units.to_fraction(self.hosp_rate),
                icu: units.to_fraction(self.icu_rate),
                vent: units.to_fraction(self.vent_rate),
            },
            length_of_stay: ByCategory {
                hosp: self.hosp_los,
                icu: self.icu_los,
                vent: self.vent_los,
            },
        }
    }
}

/// Read scenarios from the scenarios CSV file.
///
/// Scenarios are given sequential IDs, starting at 1, in the order in which they appear in the
/// file. Only problems with the file as a whole (e.g. malformed rows or duplicate names) are
/// errors here; the values of each scenario are checked when it is run.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `units` - How rates and fractions are expressed in the file
///
/// # Returns
///
/// A map of scenarios, keyed by ID, or an error.
pub fn read_scenarios(model_dir: &Path, units: RateUnits) -> Result<ScenarioMap> {
    let file_path = model_dir.join(SCENARIOS_FILE_NAME);
    let scenarios_raw = read_csv(&file_path)?;
    read_scenarios_from_iter(scenarios_raw.into_iter(), units)
        .with_context(|| input_err_msg(&file_path))
}

fn read_scenarios_from_iter<I>(iter: I, units: RateUnits) -> Result<ScenarioMap>
where
    I: Iterator<Item = ScenarioRaw>,
{
    let mut names = HashSet::new();
    let mut scenarios = ScenarioMap::new();
    for (id, raw) in (1..).map(ScenarioID).zip(iter) {
        ensure!(
            names.insert(raw.name.clone()),
            "Duplicate scenario name: {}",
            raw.name
        );

        scenarios.insert(id, Rc::new(raw.into_scenario(id, units)));
    }

    Ok(scenarios)
}
