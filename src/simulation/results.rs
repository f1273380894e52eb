//! Results harvested from each day's solve and the sinks which receive them.
use crate::generator::GeneratorID;
use crate::node::{NodeID, ResourceKind};
use anyhow::Result;
use indexmap::IndexMap;
use strum::{EnumIter, IntoEnumIterator};

/// A per-generator hourly result series
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, EnumIter)]
pub enum GeneratorSeries {
    /// Power output
    Dispatch,
    /// Commitment state
    On,
    /// Start-up indicator
    Switch,
    /// Spinning reserve offered
    SpinningReserve,
    /// Non-spinning reserve offered
    NonSpinningReserve,
}

impl GeneratorSeries {
    /// Name of the series, used for output file names
    pub fn name(self) -> &'static str {
        match self {
            Self::Dispatch => "dispatch",
            Self::On => "on",
            Self::Switch => "switch",
            Self::SpinningReserve => "spinning_reserve",
            Self::NonSpinningReserve => "non_spinning_reserve",
        }
    }
}

/// A per-node hourly result series
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum NodeSeries {
    /// Dispatch of a variable resource
    Resource(ResourceKind),
    /// Voltage angle
    VoltageAngle,
}

impl NodeSeries {
    /// Name of the series, used for output file names
    pub fn name(self) -> &'static str {
        match self {
            Self::Resource(kind) => kind.name(),
            Self::VoltageAngle => "voltage_angle",
        }
    }

    /// Iterate over every node series
    pub fn iter() -> impl Iterator<Item = Self> {
        ResourceKind::iter()
            .map(Self::Resource)
            .chain(std::iter::once(Self::VoltageAngle))
    }
}

/// Something which receives simulation results
pub trait ResultSink {
    /// Record the value of a generator series at an absolute hour
    fn record_generator(
        &mut self,
        series: GeneratorSeries,
        id: &GeneratorID,
        hour: usize,
        value: f64,
    ) -> Result<()>;

    /// Record the value of a node series at an absolute hour
    fn record_node(&mut self, series: NodeSeries, id: &NodeID, hour: usize, value: f64)
    -> Result<()>;

    /// Record the objective value of a day's solve
    fn record_objective(&mut self, day: u32, objective: f64) -> Result<()>;

    /// Called once all days have been recorded
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// The harvested results of a single day, held until the day is known to have succeeded
#[derive(PartialEq, Debug, Clone, Default)]
pub struct DayResults {
    /// The simulated day
    pub day: u32,
    /// Objective value of the solve
    pub objective: f64,
    /// Generator values as (series, generator, absolute hour, value)
    pub generators: Vec<(GeneratorSeries, GeneratorID, usize, f64)>,
    /// Node values as (series, node, absolute hour, value)
    pub nodes: Vec<(NodeSeries, NodeID, usize, f64)>,
}

impl DayResults {
    /// Pass every value to a sink
    pub fn record(&self, sink: &mut dyn ResultSink) -> Result<()> {
        for (series, id, hour, value) in &self.generators {
            sink.record_generator(*series, id, *hour, *value)?;
        }
        for (series, id, hour, value) in &self.nodes {
            sink.record_node(*series, id, *hour, *value)?;
        }
        sink.record_objective(self.day, self.objective)
    }
}

/// Hourly values keyed by absolute hour
pub type HourlyValues = IndexMap<usize, f64>;

/// Keeps all results in memory
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ResultAccumulator {
    generators: IndexMap<(GeneratorSeries, GeneratorID), HourlyValues>,
    nodes: IndexMap<(NodeSeries, NodeID), HourlyValues>,
    objectives: Vec<(u32, f64)>,
}

impl ResultAccumulator {
    /// Hourly values of a generator series
    pub fn generator_series(&self, series: GeneratorSeries, id: &str) -> Option<&HourlyValues> {
        self.generators.get(&(series, GeneratorID::new(id)))
    }

    /// Hourly values of a node series
    pub fn node_series(&self, series: NodeSeries, id: &str) -> Option<&HourlyValues> {
        self.nodes.get(&(series, NodeID::new(id)))
    }

    /// Value of a generator series at an absolute hour
    pub fn generator_value(&self, series: GeneratorSeries, id: &str, hour: usize) -> Option<f64> {
        self.generator_series(series, id)?.get(&hour).copied()
    }

    /// The (day, objective) pairs recorded so far
    pub fn objectives(&self) -> &[(u32, f64)] {
        &self.objectives
    }
}

impl ResultSink for ResultAccumulator {
    fn record_generator(
        &mut self,
        series: GeneratorSeries,
        id: &GeneratorID,
        hour: usize,
        value: f64,
    ) -> Result<()> {
        self.generators
            .entry((series, id.clone()))
            .or_default()
            .insert(hour, value);
        Ok(())
    }

    fn record_node(
        &mut self,
        series: NodeSeries,
        id: &NodeID,
        hour: usize,
        value: f64,
    ) -> Result<()> {
        self.nodes
            .entry((series, id.clone()))
            .or_default()
            .insert(hour, value);
        Ok(())
    }

    fn record_objective(&mut self, day: u32, objective: f64) -> Result<()> {
        self.objectives.push((day, objective));
        Ok(())
    }
}
