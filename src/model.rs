//! The model struct holds all input data for a simulation.
use crate::input::load_model;
use crate::time_series::TimeSeriesStore;
use crate::topology::Topology;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub mod parameters;
pub use parameters::{ConstraintGroups, ModelParameters, SolveFailurePolicy, SolverParameters};

/// Model definition
#[derive(Debug)]
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Nodes, lines, fuel categories and generators
    pub topology: Topology,
    /// Hourly demand, availability and reserve series
    pub time_series: TimeSeriesStore,
}

impl Model {
    /// Read a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        load_model(model_dir)
    }

    /// Iterate over the days to simulate
    pub fn iter_days(&self) -> impl Iterator<Item = u32> {
        self.parameters.start_day..=self.parameters.last_day
    }
}
