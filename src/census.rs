//! Calculation of the hospital census from daily admissions.
//!
//! Every patient admitted to a resource is assumed to stay for exactly the resource's length of
//! stay (LOS). The census on a given day is therefore the number of patients admitted during the
//! trailing LOS-day window. Only days for which the whole window lies within the admissions data
//! are reported.
use crate::resource::{ByCategory, ResourceCategory, ResourceRecord};
use itertools::Itertools;

/// Calculate the census for a single resource category.
///
/// # Arguments
///
/// * `admissions` - New admissions per day, starting at day 0
/// * `los` - Length of stay, in days
///
/// # Returns
///
/// Whole numbers of patients for days `0..admissions.len() - los`. Day 0 is always zero. If there
/// are no more days of admissions than `los`, the result is empty.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn category_census(admissions: &[f64], los: u32) -> Vec<u64> {
    let los = los as usize;
    let Some(valid_days) = admissions.len().checked_sub(los) else {
        return Vec::new();
    };

    let cumulative = admissions
        .iter()
        .scan(0.0, |total, admitted| {
            *total += admitted;
            Some(*total)
        })
        .collect_vec();

    (0..valid_days)
        .map(|day| {
            if day == 0 {
                return 0;
            }

            let in_house = if day >= los {
                cumulative[day] - cumulative[day - los]
            } else {
                cumulative[day]
            };

            // Round up to whole patients before converting
            in_house.ceil().max(0.0) as u64
        })
        .collect()
}

/// Calculate the census for every resource category.
///
/// Each category uses its own length of stay. Only days with a valid census for *every* category
/// are included, so the number of days is limited by the longest length of stay.
///
/// # Arguments
///
/// * `admissions` - New admissions per day for each category, starting at day 0
/// * `length_of_stay` - Length of stay for each category, in days
pub fn build_census(
    admissions: &[ResourceRecord<f64>],
    length_of_stay: &ByCategory<u32>,
) -> Vec<ResourceRecord<u64>> {
    let census = ByCategory::from_fn(|category: ResourceCategory| {
        let series = admissions
            .iter()
            .map(|record| *record.values.get(category))
            .collect_vec();
        category_census(&series, *length_of_stay.get(category))
    });

    let n_days = census.iter().map(|(_, series)| series.len()).min();
    (0..n_days.unwrap_or_default())
        .zip(admissions)
        .map(|(idx, record)| ResourceRecord {
            day: record.day,
            values: census.map(|series| series[idx]),
        })
        .collect()
}
