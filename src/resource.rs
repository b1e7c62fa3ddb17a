//! Hospital resource categories and the projection of infections onto resource use.
//!
//! Each scenario tracks three categories of resource: ordinary hospital beds (`hosp`), ICU beds
//! (`icu`) and ventilators (`vent`). Infection counts are first converted into the number of
//! patients who would be occupying each resource if admitted on that day ("occupancy"), which is
//! then differenced to obtain the number of new admissions per day.
use crate::sir::SirRecord;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

/// A category of hospital resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceCategory {
    /// Ordinary hospital beds
    Hosp,
    /// Intensive care beds
    Icu,
    /// Mechanical ventilators
    Vent,
}

/// One value for each [`ResourceCategory`]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ByCategory<T> {
    /// Value for ordinary hospital beds
    pub hosp: T,
    /// Value for ICU beds
    pub icu: T,
    /// Value for ventilators
    pub vent: T,
}

impl<T> ByCategory<T> {
    /// Build a [`ByCategory`] by calling `f` once per category
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(ResourceCategory) -> T,
    {
        Self {
            hosp: f(ResourceCategory::Hosp),
            icu: f(ResourceCategory::Icu),
            vent: f(ResourceCategory::Vent),
        }
    }

    /// Get the value for the given category
    pub fn get(&self, category: ResourceCategory) -> &T {
        match category {
            ResourceCategory::Hosp => &self.hosp,
            ResourceCategory::Icu => &self.icu,
            ResourceCategory::Vent => &self.vent,
        }
    }

    /// Apply `f` to the value of every category
    pub fn map<U, F>(&self, mut f: F) -> ByCategory<U>
    where
        F: FnMut(&T) -> U,
    {
        ByCategory::from_fn(|category| f(self.get(category)))
    }

    /// Iterate over the categories and their values
    pub fn iter(&self) -> impl Iterator<Item = (ResourceCategory, &T)> {
        ResourceCategory::iter().map(move |category| (category, self.get(category)))
    }
}

/// The value of each resource category on a given day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceRecord<T> {
    /// Days since the start of the simulation
    pub day: u32,
    /// Per-category values
    pub values: ByCategory<T>,
}

/// Project the number of infections onto resource occupancy.
///
/// For every day, the occupancy of each category is `I × rate × market_share`, giving the number
/// of patients who would be occupying the resource if they were all admitted on that day.
///
/// # Arguments
///
/// * `sir` - Output of the SIR simulation
/// * `rates` - Fraction of infections requiring each resource
/// * `market_share` - Fraction of the regional population served by the hospital
pub fn project_occupancy(
    sir: &[SirRecord],
    rates: &ByCategory<f64>,
    market_share: f64,
) -> Vec<ResourceRecord<f64>> {
    sir.iter()
        .map(|record| ResourceRecord {
            day: record.day,
            values: rates.map(|rate| record.state.infected * rate * market_share),
        })
        .collect()
}

/// Extract the number of new admissions per day from resource occupancy.
///
/// Admissions for each category are the day-on-day increase in occupancy. A decrease in occupancy
/// counts as zero admissions. The output is one day shorter than the input and is renumbered to
/// start at day 0.
pub fn extract_admissions(occupancy: &[ResourceRecord<f64>]) -> Vec<ResourceRecord<f64>> {
    occupancy
        .iter()
        .tuple_windows()
        .zip(0..)
        .map(|((prev, next), day)| ResourceRecord {
            day,
            values: ByCategory::from_fn(|category| {
                (next.values.get(category) - prev.values.get(category)).max(0.0)
            }),
        })
        .collect()
}
