//! Common functionality for bedcast, a tool for projecting hospital resource demand with an SIR
//! model.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod census;
pub mod cli;
pub mod derivation;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod resource;
pub mod scenario;
pub mod settings;
pub mod simulation;
pub mod sir;

#[cfg(test)]
mod fixture;

/// Get the path to the folder where user-level bedcast configuration is stored
pub fn get_bedcast_config_dir() -> PathBuf {
    let Some(mut dir) = dirs::config_dir() else {
        // No config dir for this platform; fall back on the current working directory
        return PathBuf::new();
    };

    dir.push("bedcast");
    dir
}
