//! Hourly input series and the sliding window over them.
//!
//! The [`TimeSeriesStore`] holds full-length series and is never mutated once loaded. The
//! [`HorizonWindow`] is owned by the simulation driver and holds `H + 1` slots per series: slot 0
//! is the warm-start slot carried over from the previous day, slots `1..=H` are the hours being
//! decided. A [`DayContext`] is a read-only snapshot of the window handed to the formulation.
use crate::error::{ConfigurationError, DayDiagnostics};
use crate::generator::GeneratorID;
use crate::node::NodeID;
use crate::topology::Topology;
use anyhow::{Result, ensure};
use indexmap::IndexMap;

/// The number of hours in a simulated day
pub const HOURS_PER_DAY: usize = 24;

/// Hourly series for each node, keyed by node ID
pub type NodeSeriesMap = IndexMap<NodeID, Vec<f64>>;

/// Full-length hourly input series
#[derive(PartialEq, Debug, Clone)]
pub struct TimeSeriesStore {
    demand: NodeSeriesMap,
    availability: NodeSeriesMap,
    reserves: Vec<f64>,
}

impl TimeSeriesStore {
    /// Create a new store.
    ///
    /// All series must have the same length, which must be a positive multiple of 24.
    ///
    /// # Arguments
    ///
    /// * `demand` - Hourly demand for each demand-bearing node
    /// * `availability` - Hourly availability for each variable resource node
    /// * `reserves` - System-wide hourly reserve requirement
    pub fn new(
        demand: NodeSeriesMap,
        availability: NodeSeriesMap,
        reserves: Vec<f64>,
    ) -> Result<Self> {
        let len = reserves.len();
        ensure!(
            len > 0 && len.is_multiple_of(HOURS_PER_DAY),
            ConfigurationError::Invalid(format!(
                "Time series length must be a positive multiple of {HOURS_PER_DAY} hours, got {len}"
            ))
        );
        for (node_id, series) in demand.iter().chain(availability.iter()) {
            ensure!(
                series.len() == len,
                ConfigurationError::Invalid(format!(
                    "Series for node {node_id} has {} hours, expected {len}",
                    series.len()
                ))
            );
        }

        Ok(Self {
            demand,
            availability,
            reserves,
        })
    }

    /// The number of hours covered by the series
    pub fn len(&self) -> usize {
        self.reserves.len()
    }

    /// Whether the store is empty (never true for a valid store)
    pub fn is_empty(&self) -> bool {
        self.reserves.is_empty()
    }

    /// Check that every node needing a series has one
    pub fn check_complete(&self, topology: &Topology) -> Result<()> {
        for node in topology.nodes.values() {
            if node.category.has_demand() {
                ensure!(
                    self.demand.contains_key(&node.id),
                    ConfigurationError::MissingParameter {
                        what: "demand series",
                        id: format!("node {}", node.id),
                    }
                );
            }
            if node.category.resource().is_some() {
                ensure!(
                    self.availability.contains_key(&node.id),
                    ConfigurationError::MissingParameter {
                        what: "availability series",
                        id: format!("node {}", node.id),
                    }
                );
            }
        }

        Ok(())
    }

    /// Check that the series cover every hour read when simulating up to `last_day`
    pub fn check_covers(&self, last_day: u32, horizon: usize) -> Result<()> {
        let needed = (last_day as usize - 1) * HOURS_PER_DAY + horizon;
        ensure!(
            needed <= self.len(),
            ConfigurationError::Invalid(format!(
                "Simulating up to day {last_day} with a {horizon}-hour horizon needs {needed} \
                hours of data, but the time series only have {}",
                self.len()
            ))
        );

        Ok(())
    }

    /// Hourly demand for a node
    pub fn demand(&self, node_id: &NodeID) -> Option<&[f64]> {
        self.demand.get(node_id).map(Vec::as_slice)
    }

    /// Hourly availability for a resource node
    pub fn availability(&self, node_id: &NodeID) -> Option<&[f64]> {
        self.availability.get(node_id).map(Vec::as_slice)
    }

    /// The system-wide hourly reserve requirement
    pub fn reserves(&self) -> &[f64] {
        &self.reserves
    }
}

/// An `H + 1` slot view onto the series for the day being simulated
#[derive(PartialEq, Debug, Clone)]
pub struct HorizonWindow {
    horizon: usize,
    demand: NodeSeriesMap,
    availability: NodeSeriesMap,
    reserves: Vec<f64>,
}

impl HorizonWindow {
    /// Create a zeroed window tracking the series the topology needs
    pub fn new(topology: &Topology, horizon: usize) -> Self {
        let slots = || vec![0.0; horizon + 1];
        let demand = topology
            .nodes
            .values()
            .filter(|node| node.category.has_demand())
            .map(|node| (node.id.clone(), slots()))
            .collect();
        let availability = topology
            .nodes
            .values()
            .filter(|node| node.category.resource().is_some())
            .map(|node| (node.id.clone(), slots()))
            .collect();

        Self {
            horizon,
            demand,
            availability,
            reserves: slots(),
        }
    }

    /// The number of decision hours in the window
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Copy the given day's hours from the store into slots `1..=H`.
    ///
    /// Slot 0 is not written. Binding the same day twice gives the same window.
    pub fn bind(&mut self, store: &TimeSeriesStore, day: u32) -> Result<()> {
        let start = (day as usize - 1) * HOURS_PER_DAY;
        let range = start..start + self.horizon;
        ensure!(
            range.end <= store.len(),
            "Day {day} runs past the end of the time series"
        );

        for (node_id, slots) in &mut self.demand {
            let series = store
                .demand(node_id)
                .ok_or_else(|| ConfigurationError::MissingParameter {
                    what: "demand series",
                    id: format!("node {node_id}"),
                })?;
            slots[1..].copy_from_slice(&series[range.clone()]);
        }
        for (node_id, slots) in &mut self.availability {
            let series =
                store
                    .availability(node_id)
                    .ok_or_else(|| ConfigurationError::MissingParameter {
                        what: "availability series",
                        id: format!("node {node_id}"),
                    })?;
            slots[1..].copy_from_slice(&series[range.clone()]);
        }
        self.reserves[1..].copy_from_slice(&store.reserves()[range]);

        Ok(())
    }

    /// Carry the last hour of the day into the warm-start slot
    pub fn advance(&mut self) {
        let carry = |slots: &mut Vec<f64>| slots[0] = slots[HOURS_PER_DAY];
        self.demand.values_mut().for_each(carry);
        self.availability.values_mut().for_each(carry);
        carry(&mut self.reserves);
    }
}

/// Everything which varies from one day's problem to the next
#[derive(Debug, Clone, Copy)]
pub struct DayContext<'a> {
    /// The simulated day (1-based)
    pub day: u32,
    window: &'a HorizonWindow,
    initial_on: &'a IndexMap<GeneratorID, bool>,
}

impl<'a> DayContext<'a> {
    /// Snapshot the window and initial unit states for a day
    pub fn new(
        day: u32,
        window: &'a HorizonWindow,
        initial_on: &'a IndexMap<GeneratorID, bool>,
    ) -> Self {
        Self {
            day,
            window,
            initial_on,
        }
    }

    /// The number of decision hours
    pub fn horizon(&self) -> usize {
        self.window.horizon
    }

    /// Demand at a node in a window slot. Nodes without demand have zero demand.
    pub fn demand(&self, node_id: &NodeID, hour: usize) -> f64 {
        self.window.demand.get(node_id).map_or(0.0, |s| s[hour])
    }

    /// Availability of a resource node in a window slot
    pub fn availability(&self, node_id: &NodeID, hour: usize) -> f64 {
        self.window.availability.get(node_id).map_or(0.0, |s| s[hour])
    }

    /// The reserve requirement in a window slot
    pub fn reserve(&self, hour: usize) -> f64 {
        self.window.reserves[hour]
    }

    /// Whether the generator is on at the start of the day
    pub fn initial_on(&self, id: &GeneratorID) -> bool {
        self.initial_on.get(id).copied().unwrap_or_default()
    }

    /// Absolute hour (1-based, from the start of the series) of a local hour
    pub fn absolute_hour(&self, hour: usize) -> usize {
        hour + (self.day as usize - 1) * HOURS_PER_DAY
    }

    /// Summarise the key inputs of the day, for error messages
    pub fn diagnostics(&self) -> DayDiagnostics {
        let hours = 1..=self.horizon();
        DayDiagnostics {
            total_demand: self
                .window
                .demand
                .values()
                .flat_map(|slots| &slots[hours.clone()])
                .sum(),
            peak_reserve: self.window.reserves[hours]
                .iter()
                .copied()
                .fold(0.0, f64::max),
            committed_units: self.initial_on.values().filter(|on| **on).count(),
        }
    }
}
