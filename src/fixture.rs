//! Fixtures for tests
use crate::model::{Model, ModelParameters};
use crate::resource::ByCategory;
use crate::scenario::{ScenarioConfig, ScenarioID, ScenarioMap};
use indexmap::indexmap;
use rstest::fixture;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// A scenario with 30% distancing, already converted to fractions
#[fixture]
pub fn scenario() -> ScenarioConfig {
    ScenarioConfig {
        id: ScenarioID(1),
        name: "Baseline".into(),
        population: 683_832.0,
        market_share: 1.0,
        initial_infections: 52.0,
        current_hosp: 2.0,
        n_days: 365,
        doubling_time: 4.0,
        relative_contact_rate: 0.3,
        recovery_days: 14.0,
        rates: ByCategory {
            hosp: 0.025,
            icu: 0.0075,
            vent: 0.0065,
        },
        length_of_stay: ByCategory {
            hosp: 10,
            icu: 14,
            vent: 14,
        },
    }
}

#[fixture]
pub fn scenarios(scenario: ScenarioConfig) -> ScenarioMap {
    indexmap! { scenario.id => scenario.into() }
}

#[fixture]
pub fn model(scenarios: ScenarioMap) -> Model {
    Model {
        model_path: PathBuf::from("model"),
        parameters: ModelParameters::default(),
        scenarios,
    }
}
