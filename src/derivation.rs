//! Derivation of SIR model coefficients from a scenario's clinical inputs.
use crate::scenario::ScenarioConfig;
use crate::sir::CompartmentState;
use anyhow::{Result, ensure};
use log::warn;

/// Coefficients and initial conditions for the SIR model, plus derived values for reporting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedParameters {
    /// Compartment sizes on day 0
    pub initial_state: CompartmentState,
    /// Transmission rate
    pub beta: f64,
    /// Recovery rate (in 1/days)
    pub gamma: f64,
    /// Estimated number of infections in the region, based on current hospitalisations
    pub total_infections: f64,
    /// Probability that an infection is detected
    pub detection_probability: f64,
    /// Daily growth rate of infections implied by the doubling time
    pub intrinsic_growth_rate: f64,
    /// Effective reproduction number after distancing
    pub r_t: f64,
    /// Basic reproduction number (`None` if contact is reduced by 100%)
    pub r_naught: Option<f64>,
    /// Doubling time after distancing, in days (`None` if undefined)
    pub doubling_time_t: Option<f64>,
}

/// Derive the SIR model's coefficients and initial conditions for a scenario.
///
/// The number of infections is estimated from the number of patients currently in hospital. The
/// transmission rate is computed from the growth rate implied by the doubling time, scaled by the
/// reduction in contact rate.
///
/// # Returns
///
/// The derived parameters or an error if the scenario's inputs would lead to division by zero.
pub fn derive_parameters(scenario: &ScenarioConfig) -> Result<DerivedParameters> {
    let hosp_rate = scenario.rates.hosp;
    ensure!(
        scenario.market_share > 0.0 && hosp_rate > 0.0,
        "Cannot estimate total infections: market_share and hosp_rate must be greater than zero"
    );
    ensure!(
        scenario.doubling_time > 0.0 && scenario.recovery_days > 0.0,
        "doubling_time and recovery_days must be greater than zero"
    );

    let total_infections = scenario.current_hosp / scenario.market_share / hosp_rate;
    let detection_probability = scenario.initial_infections / total_infections;
    if detection_probability > 1.0 {
        warn!(
            "Scenario {}: detection probability is {detection_probability:.3}, i.e. there are \
            more known infections than estimated from hospitalisations",
            scenario.id
        );
    }

    // NB: not the same as `total_infections` after rounding
    let infected = scenario.initial_infections / detection_probability;
    let susceptible = scenario.population;
    let initial_state = CompartmentState {
        susceptible,
        infected,
        recovered: 0.0,
    };

    let intrinsic_growth_rate = 2.0_f64.powf(1.0 / scenario.doubling_time) - 1.0;
    let gamma = 1.0 / scenario.recovery_days;
    let beta =
        (intrinsic_growth_rate + gamma) / susceptible * (1.0 - scenario.relative_contact_rate);

    let r_t = beta / gamma * susceptible;
    let r_naught = (scenario.relative_contact_rate < 1.0)
        .then(|| r_t / (1.0 - scenario.relative_contact_rate));
    let doubling_time_t = Some(1.0 / (beta * susceptible - gamma + 1.0).log2())
        .filter(|value| value.is_finite());

    Ok(DerivedParameters {
        initial_state,
        beta,
        gamma,
        total_infections,
        detection_probability,
        intrinsic_growth_rate,
        r_t,
        r_naught,
        doubling_time_t,
    })
}
