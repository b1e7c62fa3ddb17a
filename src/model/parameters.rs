//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::input::{deserialise_proportion, input_err_msg, read_toml};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq, Default)]
pub struct ModelParameters {
    /// Fraction by which the transmission rate shrinks after each simulated day.
    ///
    /// Zero (the default) means no decay.
    #[serde(default)]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub beta_decay: f64,
    /// How rates and fractions are expressed in the scenarios file
    #[serde(default)]
    pub rate_units: RateUnits,
}

/// How rates and fractions are expressed in input files
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Default, Clone, Copy)]
pub enum RateUnits {
    /// Values are percentages between 0 and 100
    #[default]
    #[string = "percent"]
    Percent,
    /// Values are fractions between 0 and 1
    #[string = "fraction"]
    Fraction,
}

impl RateUnits {
    /// Convert a value in these units to a fraction
    pub fn to_fraction(self, value: f64) -> f64 {
        match self {
            Self::Percent => value / 100.0,
            Self::Fraction => value,
        }
    }
}

/// Check that the `beta_decay` parameter is valid
fn check_beta_decay(value: f64) -> Result<()> {
    ensure!(
        value < 1.0,
        "beta_decay must be less than 1, otherwise transmission stops entirely"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        // beta_decay is already checked to be in [0, 1] by deserialise_proportion
        check_beta_decay(self.beta_decay)?;

        Ok(())
    }
}
