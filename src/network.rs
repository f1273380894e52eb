//! Transmission lines and the dense line parameter matrix used by the DC power flow.
use crate::error::{ConfigurationError, ValidationError};
use crate::node::{NodeID, NodeMap};
use crate::units::{Power, Susceptance};
use anyhow::{Result, ensure};
use itertools::Itertools;
use log::warn;
use petgraph::algo::connected_components;
use petgraph::graph::UnGraph;
use serde::Deserialize;
use std::collections::HashSet;

/// A physical transmission line, as declared in the input data (one direction only)
#[derive(PartialEq, Debug, Clone, Deserialize)]
pub struct TransmissionLink {
    /// Sending node
    pub source: NodeID,
    /// Receiving node
    pub sink: NodeID,
    /// Thermal capacity (MVA)
    pub capacity: Power,
    /// Line susceptance
    pub susceptance: Susceptance,
}

/// Parameters of the line between an ordered pair of nodes
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct LineParameters {
    /// Thermal capacity; zero means there is no line
    pub capacity: f64,
    /// Line susceptance
    pub susceptance: f64,
}

/// A dense node×node matrix of line parameters.
///
/// Rows and columns follow the node order of the [`NodeMap`] used to build it. Every declared
/// line is stored as an antiparallel pair, so `get(a, b) == get(b, a)` for all nodes.
#[derive(PartialEq, Debug, Clone)]
pub struct LineMatrix {
    size: usize,
    entries: Vec<LineParameters>,
}

impl LineMatrix {
    /// Build the matrix from declared lines.
    ///
    /// # Arguments
    ///
    /// * `nodes` - All nodes, in the order used for indexing
    /// * `links` - Declared lines, one entry per physical line
    pub fn new(nodes: &NodeMap, links: &[TransmissionLink]) -> Result<Self> {
        let size = nodes.len();
        let mut entries = vec![LineParameters::default(); size * size];
        let mut declared = HashSet::new();

        for link in links {
            let index_of = |id: &NodeID| {
                nodes
                    .get_index_of(id)
                    .ok_or_else(|| ConfigurationError::UnknownReference {
                        kind: "Line",
                        id: format!("{}-{}", link.source, link.sink),
                        target_kind: "node",
                        target: id.to_string(),
                    })
            };
            let source = index_of(&link.source)?;
            let sink = index_of(&link.sink)?;

            ensure!(
                source != sink,
                ConfigurationError::Invalid(format!(
                    "Line from node {} to itself is not allowed",
                    link.source
                ))
            );
            if link.capacity.value() < 0.0 || link.capacity.value().is_nan() {
                Err(ValidationError::Negative {
                    what: "capacity",
                    id: format!("line {}-{}", link.source, link.sink),
                    value: link.capacity.value(),
                })?;
            }

            ensure!(
                declared.insert((source.min(sink), source.max(sink))),
                ConfigurationError::Invalid(format!(
                    "Line between {} and {} is declared more than once",
                    link.source, link.sink
                ))
            );

            let params = LineParameters {
                capacity: link.capacity.value(),
                susceptance: link.susceptance.value(),
            };
            entries[source * size + sink] = params;
            entries[sink * size + source] = params;
        }

        Ok(Self { size, entries })
    }

    /// Parameters for the line from node index `from` to node index `to`
    pub fn get(&self, from: usize, to: usize) -> LineParameters {
        self.entries[from * self.size + to]
    }

    /// Iterate over the (source, sink, parameters) of every entry with non-zero capacity
    pub fn iter_links(&self) -> impl Iterator<Item = (usize, usize, LineParameters)> + '_ {
        (0..self.size)
            .cartesian_product(0..self.size)
            .map(|(from, to)| (from, to, self.get(from, to)))
            .filter(|(_, _, params)| params.capacity > 0.0)
    }

    /// Iterate over the neighbours of a node with non-zero susceptance, with that susceptance
    pub fn iter_neighbours(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        (0..self.size)
            .map(move |other| (other, self.get(node, other).susceptance))
            .filter(|(_, susceptance)| *susceptance != 0.0)
    }

    /// Count the islands formed by lines with non-zero capacity
    pub fn count_islands(&self) -> usize {
        let mut graph = UnGraph::<(), ()>::with_capacity(self.size, 0);
        let indices = (0..self.size).map(|_| graph.add_node(())).collect_vec();
        for (from, to, _) in self.iter_links().filter(|(from, to, _)| from < to) {
            graph.add_edge(indices[from], indices[to], ());
        }

        connected_components(&graph)
    }

    /// Log a warning if the network is split into islands
    pub fn check_connected(&self) {
        let islands = self.count_islands();
        if islands > 1 {
            warn!(
                "The transmission network is split into {islands} islands; nodes not connected \
                to the reference node have no fixed voltage angle"
            );
        }
    }
}
