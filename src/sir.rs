//! The discrete-time SIR model.
//!
//! The population is split into susceptible, infected and recovered compartments which are
//! advanced one day at a time. After every step the compartments are rescaled so that the total
//! population is conserved.
use anyhow::{Result, ensure};
use serde::Serialize;
use std::iter;

/// The size of each compartment of the SIR model at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompartmentState {
    /// Number of people who can still be infected
    pub susceptible: f64,
    /// Number of people currently infected
    pub infected: f64,
    /// Number of people who have recovered
    pub recovered: f64,
}

impl CompartmentState {
    /// The total population across all compartments
    pub fn total(&self) -> f64 {
        self.susceptible + self.infected + self.recovered
    }
}

/// The state of the SIR model on a given day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SirRecord {
    /// Days since the start of the simulation
    pub day: u32,
    /// Compartment sizes on this day
    pub state: CompartmentState,
}

/// Advance the SIR model by one day.
///
/// Any compartment which would become negative is clamped to zero, then all compartments are
/// rescaled so that they sum to `population`.
///
/// # Arguments
///
/// * `state` - Compartment sizes for the current day
/// * `beta` - Transmission rate
/// * `gamma` - Recovery rate
/// * `population` - Total population, which is conserved
///
/// # Returns
///
/// The compartment sizes for the next day or an error if the total population collapses to zero
/// (in which case the rescaling is undefined).
pub fn step(
    state: &CompartmentState,
    beta: f64,
    gamma: f64,
    population: f64,
) -> Result<CompartmentState> {
    let CompartmentState {
        susceptible: s,
        infected: i,
        recovered: r,
    } = *state;

    let new_infections = beta * s * i;
    let next = CompartmentState {
        susceptible: (s - new_infections).max(0.0),
        infected: (new_infections - gamma * i + i).max(0.0),
        recovered: (gamma * i + r).max(0.0),
    };

    let total = next.total();
    ensure!(
        total.is_finite() && total > 0.0,
        "Total population became {total} during integration; cannot rescale compartments"
    );

    let scale = population / total;
    Ok(CompartmentState {
        susceptible: next.susceptible * scale,
        infected: next.infected * scale,
        recovered: next.recovered * scale,
    })
}

/// The transmission rate to use for each step of the simulation.
///
/// The rate for step `k` is `beta × (1 - decay)^k`. With no decay the rate is constant.
pub fn beta_schedule(beta: f64, decay: Option<f64>) -> impl Iterator<Item = f64> {
    let factor = 1.0 - decay.unwrap_or(0.0);
    iter::successors(Some(beta), move |beta| Some(beta * factor))
}

/// Run the SIR model forward in time.
///
/// # Arguments
///
/// * `initial` - Compartment sizes on day 0
/// * `beta` - Initial transmission rate
/// * `gamma` - Recovery rate
/// * `n_days` - Number of days to simulate
/// * `beta_decay` - Fraction by which `beta` shrinks after each step, if any
///
/// # Returns
///
/// One record per day, from day 0 (the initial state) to day `n_days` inclusive.
pub fn simulate(
    initial: CompartmentState,
    beta: f64,
    gamma: f64,
    n_days: u32,
    beta_decay: Option<f64>,
) -> Result<Vec<SirRecord>> {
    let population = initial.total();
    let mut records = Vec::with_capacity(n_days as usize + 1);
    records.push(SirRecord {
        day: 0,
        state: initial,
    });

    let mut state = initial;
    for (day, beta) in (1..=n_days).zip(beta_schedule(beta, beta_decay)) {
        state = step(&state, beta, gamma, population)?;
        records.push(SirRecord { day, state });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::{approx_eq, assert_approx_eq};
    use itertools::Itertools;
    use rstest::rstest;

    const POPULATION: f64 = 683_832.0;

    fn initial_state() -> CompartmentState {
        CompartmentState {
            susceptible: POPULATION,
            infected: 80.0,
            recovered: 0.0,
        }
    }

    #[test]
    fn test_step() {
        let state = CompartmentState {
            susceptible: 990.0,
            infected: 10.0,
            recovered: 0.0,
        };
        let next = step(&state, 0.0001, 0.1, 1000.0).unwrap();

        // 0.99 new infections and one recovery, with no rescaling needed
        assert_approx_eq!(f64, next.susceptible, 989.01, epsilon = 1e-9);
        assert_approx_eq!(f64, next.infected, 9.99, epsilon = 1e-9);
        assert_approx_eq!(f64, next.recovered, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_step_clamps_and_rescales() {
        // Transmission is so high that S would go negative
        let state = CompartmentState {
            susceptible: 50.0,
            infected: 50.0,
            recovered: 0.0,
        };
        let next = step(&state, 1.0, 0.5, 100.0).unwrap();

        assert_approx_eq!(f64, next.susceptible, 0.0);
        assert!(next.infected > 0.0 && next.recovered > 0.0);
        assert_approx_eq!(f64, next.total(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_step_degenerate() {
        let state = CompartmentState {
            susceptible: 0.0,
            infected: 0.0,
            recovered: 0.0,
        };
        assert!(step(&state, 0.1, 0.1, 100.0).is_err());
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(365)]
    fn test_simulate_length(#[case] n_days: u32) {
        let records = simulate(initial_state(), 2e-7, 1.0 / 14.0, n_days, None).unwrap();

        assert_eq!(records.len(), n_days as usize + 1);
        assert_eq!(records[0].state, initial_state());
        assert!(
            records
                .iter()
                .zip(0..)
                .all(|(record, day)| record.day == day)
        );
    }

    #[test]
    fn test_simulate_conserves_population() {
        let records = simulate(initial_state(), 3e-7, 1.0 / 14.0, 365, None).unwrap();
        let n = initial_state().total();

        for record in &records {
            let state = record.state;
            assert!(approx_eq!(f64, state.total(), n, epsilon = 1e-6));
            assert!(state.susceptible >= 0.0 && state.infected >= 0.0 && state.recovered >= 0.0);
        }
    }

    #[test]
    fn test_simulate_susceptible_depletes() {
        let records = simulate(initial_state(), 3e-7, 1.0 / 14.0, 10, None).unwrap();

        assert!(records[1].state.susceptible < records[0].state.susceptible);
        assert!(
            records
                .iter()
                .tuple_windows()
                .all(|(a, b)| b.state.susceptible <= a.state.susceptible)
        );
    }

    #[test]
    fn test_beta_schedule() {
        let beta = 3e-7;
        let decay = 0.05;
        let schedule = beta_schedule(beta, Some(decay)).take(30).collect_vec();

        for (k, value) in (0..).zip(schedule) {
            assert_approx_eq!(f64, value, beta * (1.0 - decay).powi(k), ulps = 64);
        }
    }

    #[test]
    fn test_beta_schedule_no_decay() {
        assert!(beta_schedule(3e-7, None).take(10).all(|beta| beta == 3e-7));
        assert!(beta_schedule(3e-7, Some(0.0)).take(10).all(|beta| beta == 3e-7));
    }

    #[test]
    fn test_simulate_with_decay() {
        let beta = 3e-7;
        let gamma = 1.0 / 14.0;
        let decay = 0.1;
        let records = simulate(initial_state(), beta, gamma, 5, Some(decay)).unwrap();

        // Step manually, using the decayed transmission rate for each step
        let mut state = initial_state();
        for (k, record) in (0..).zip(&records[1..]) {
            state = step(&state, beta * (1.0 - decay).powi(k), gamma, POPULATION + 80.0).unwrap();
            assert_approx_eq!(f64, record.state.infected, state.infected, epsilon = 1e-6);
        }

        // Decay slows the epidemic
        let no_decay = simulate(initial_state(), beta, gamma, 5, None).unwrap();
        assert!(records[5].state.infected < no_decay[5].state.infected);
    }
}
