//! Rolling-horizon unit commitment and economic dispatch for power grids.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod error;
pub mod formulation;
pub mod fuel;
pub mod generator;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod network;
pub mod node;
pub mod output;
pub mod settings;
pub mod simulation;
pub mod solver;
pub mod time_series;
pub mod topology;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the path to the gridplan config folder in the user's config directory
pub fn get_config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_default();
    path.push("gridplan");

    path
}
