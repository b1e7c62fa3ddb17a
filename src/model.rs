//! The model represents the static input data provided by the user.
use crate::input::scenario::read_scenarios;
use crate::scenario::{ScenarioConfig, ScenarioMap};
use anyhow::{Result, ensure};
use log::error;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub mod parameters;
pub use parameters::{ModelParameters, RateUnits};

/// Model definition
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Scenarios to project, in input order
    pub scenarios: ScenarioMap,
}

impl Model {
    /// Read a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        let model_dir = model_dir.as_ref();
        let parameters = ModelParameters::from_path(model_dir)?;
        let scenarios = read_scenarios(model_dir, parameters.rate_units)?;

        Ok(Model {
            model_path: model_dir.to_path_buf(),
            parameters,
            scenarios,
        })
    }

    /// Iterate over the model's scenarios in input order
    pub fn iter_scenarios(&self) -> impl Iterator<Item = &Rc<ScenarioConfig>> {
        self.scenarios.values()
    }

    /// Check the inputs of every scenario, logging each invalid one.
    ///
    /// # Returns
    ///
    /// An error stating how many scenarios are invalid, if any are.
    pub fn validate_scenarios(&self) -> Result<()> {
        let n_invalid = self
            .iter_scenarios()
            .filter_map(|scenario| scenario.ensure_valid().err())
            .inspect(|err| error!("{err:?}"))
            .count();
        ensure!(
            n_invalid == 0,
            "{n_invalid} of {} scenarios are invalid",
            self.scenarios.len()
        );

        Ok(())
    }

    /// The per-step decay of the transmission rate, if any
    pub fn beta_decay(&self) -> Option<f64> {
        Some(self.parameters.beta_decay).filter(|decay| *decay > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioID;
    use std::fs;
    use tempfile::tempdir;

    const SCENARIOS_HEADER: &str = "name,population,market_share,initial_infections,\
        current_hosp,n_days,doubling_time,relative_contact_rate,recovery_days,hosp_rate,icu_rate,\
        vent_rate,hosp_los,icu_los,vent_los";

    #[test]
    fn test_model_from_path_keeps_invalid_scenarios() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("model.toml"), "").unwrap();
        fs::write(
            dir.path().join("scenarios.csv"),
            format!(
                "{SCENARIOS_HEADER}\n\
                Good,1000,100,10,1,30,4,30,14,2.5,0.75,0.65,10,14,14\n\
                Bad,1000,100,10,1,30,4,30,14,0,0.75,0.65,10,14,14\n\
                Worse,1000,100,10,1,30,0,30,14,2.5,0.75,0.65,10,14,14\n"
            ),
        )
        .unwrap();

        let model = Model::from_path(dir.path()).unwrap();
        assert_eq!(model.scenarios.len(), 3);
        assert_eq!(
            model.validate_scenarios().unwrap_err().to_string(),
            "2 of 3 scenarios are invalid"
        );
    }

    #[test]
    fn test_model_from_path_duplicate_name() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("model.toml"), "").unwrap();
        fs::write(
            dir.path().join("scenarios.csv"),
            format!(
                "{SCENARIOS_HEADER}\n\
                A,1000,100,10,1,30,4,30,14,2.5,0.75,0.65,10,14,14\n\
                A,1000,100,10,1,30,4,60,14,2.5,0.75,0.65,10,14,14\n"
            ),
        )
        .unwrap();

        assert!(Model::from_path(dir.path()).is_err());
    }

    #[test]
    fn test_model_from_path() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("model.toml"), "beta_decay = 0.01\n").unwrap();
        fs::write(
            dir.path().join("scenarios.csv"),
            "name,population,market_share,initial_infections,current_hosp,n_days,doubling_time,\
            relative_contact_rate,recovery_days,hosp_rate,icu_rate,vent_rate,hosp_los,icu_los,\
            vent_los\n\
            A,1000,100,10,1,30,4,30,14,2.5,0.75,0.65,10,14,14\n\
            B,1000,100,10,1,30,4,60,14,2.5,0.75,0.65,10,14,14\n",
        )
        .unwrap();

        let model = Model::from_path(dir.path()).unwrap();
        assert_eq!(model.model_path, dir.path());
        assert_eq!(model.beta_decay(), Some(0.01));
        assert_eq!(
            model.iter_scenarios().map(|s| s.id).collect::<Vec<_>>(),
            [ScenarioID(1), ScenarioID(2)]
        );
        assert!(model.validate_scenarios().is_ok());
    }
}
