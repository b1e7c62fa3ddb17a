//! Scenarios describe one set of clinical and epidemiological inputs to project.
use crate::resource::{ByCategory, ResourceCategory};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A unique, sequential identifier for a scenario, starting at 1
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
pub struct ScenarioID(pub u32);

/// A map of [`ScenarioConfig`]s, keyed by scenario ID, in input order
pub type ScenarioMap = IndexMap<ScenarioID, Rc<ScenarioConfig>>;

/// The inputs for a single scenario.
///
/// All rates and fractions are stored as fractions (i.e. between 0 and 1).
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    /// Sequential ID for the scenario
    pub id: ScenarioID,
    /// Human-readable name for the scenario
    pub name: String,
    /// Population of the region
    pub population: f64,
    /// Fraction of the region's patients served by the hospital(s)
    pub market_share: f64,
    /// Number of infections currently known in the region
    pub initial_infections: f64,
    /// Number of patients currently in hospital
    pub current_hosp: f64,
    /// Number of days to simulate
    pub n_days: u32,
    /// Number of days for infections to double in the absence of distancing
    pub doubling_time: f64,
    /// Relative reduction in social contact from distancing measures
    pub relative_contact_rate: f64,
    /// Mean number of days for an infected person to recover
    pub recovery_days: f64,
    /// Fraction of infections requiring each resource
    pub rates: ByCategory<f64>,
    /// Number of days a patient occupies each resource
    pub length_of_stay: ByCategory<u32>,
}

/// Check that a value is finite and strictly positive
fn check_positive(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "{name} must be a finite number greater than zero"
    );

    Ok(())
}

/// Check that a value is finite and not negative
fn check_non_negative(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a finite number of at least zero"
    );

    Ok(())
}

/// Check that a value is a fraction between 0 and 1 (inclusive)
fn check_fraction(name: &str, value: f64) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "{name} must be a fraction between 0 and 1"
    );

    Ok(())
}

/// Check that a value is a fraction greater than 0 and no more than 1
fn check_fraction_nonzero(name: &str, value: f64) -> Result<()> {
    ensure!(
        value > 0.0 && value <= 1.0,
        "{name} must be a fraction greater than 0 and no more than 1"
    );

    Ok(())
}

impl ScenarioConfig {
    /// Check that the scenario's inputs are valid
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.name.trim().is_empty(), "Scenario name cannot be empty");

        check_positive("population", self.population)?;
        check_fraction_nonzero("market_share", self.market_share)?;
        check_positive("initial_infections", self.initial_infections)?;
        check_non_negative("current_hosp", self.current_hosp)?;
        check_positive("doubling_time", self.doubling_time)?;
        check_fraction("relative_contact_rate", self.relative_contact_rate)?;
        check_positive("recovery_days", self.recovery_days)?;

        check_fraction_nonzero("hosp_rate", self.rates.hosp)?;
        for category in [ResourceCategory::Icu, ResourceCategory::Vent] {
            check_fraction(&format!("{category}_rate"), *self.rates.get(category))?;
        }

        for (category, los) in self.length_of_stay.iter() {
            ensure!(*los > 0, "{category}_los must be greater than zero");
        }

        Ok(())
    }

    /// Validate the scenario, adding the scenario's name and ID to any error
    pub fn ensure_valid(&self) -> Result<()> {
        self.validate()
            .with_context(|| format!("Invalid scenario {} ('{}')", self.id, self.name))
    }

    /// The longest length of stay across all resource categories
    pub fn max_length_of_stay(&self) -> u32 {
        self.length_of_stay
            .iter()
            .map(|(_, los)| *los)
            .max()
            .unwrap_or_default()
    }
}
