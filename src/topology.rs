//! The topology registry: the static structure of the grid.
//!
//! The registry is built once from validated records and never mutated afterwards. It owns the
//! fuel categories, nodes, generators and line matrix, and precomputes the subsets which the
//! formulation iterates over.
use crate::error::ConfigurationError;
use crate::fuel::{FuelCategory, FuelID, FuelMap};
use crate::generator::{Generator, GeneratorID, GeneratorMap};
use crate::network::{LineMatrix, TransmissionLink};
use crate::node::{NodeCategory, NodeID, NodeMap};
use crate::units::MoneyPerEnergy;
use anyhow::{Context, Result, ensure};
use indexmap::{IndexMap, IndexSet};
use log::debug;

/// Identifies a node by its category and its position within that category's node list
pub type NodeKey = (NodeCategory, usize);

/// The static structure of the grid
#[derive(Debug, Clone)]
pub struct Topology {
    /// Fuel categories declared in the input data
    pub fuels: FuelMap,
    /// All nodes, in input order
    pub nodes: NodeMap,
    /// All generators, in input order
    pub generators: GeneratorMap,
    /// Line parameters, indexed by position in `nodes`
    pub lines: LineMatrix,
    /// Index of the reference (slack) bus in `nodes`
    reference_node: usize,
    /// Generators of each fuel category. Only categories with at least one generator are present.
    fuel_partition: IndexMap<FuelID, Vec<GeneratorID>>,
    /// Generators which count towards the reserve requirement
    reserve_eligible: IndexSet<GeneratorID>,
    /// The nodes of each category, in input order. Empty categories are absent.
    nodes_by_category: IndexMap<NodeCategory, Vec<NodeID>>,
    /// Generators located at each generation node
    owned_generators: IndexMap<NodeKey, Vec<GeneratorID>>,
}

impl Topology {
    /// Build the registry, checking that all cross-references resolve.
    ///
    /// # Arguments
    ///
    /// * `fuels` - Fuel categories
    /// * `nodes` - Nodes of the network
    /// * `generators` - Generators, each of which must already be individually valid
    /// * `links` - Transmission lines, one entry per physical line
    /// * `reference_node` - ID of the reference bus
    pub fn new(
        fuels: FuelMap,
        nodes: NodeMap,
        generators: GeneratorMap,
        links: &[TransmissionLink],
        reference_node: &str,
    ) -> Result<Self> {
        ensure!(!generators.is_empty(), ConfigurationError::NoGenerators);

        let reference_node = nodes.get_index_of(reference_node).ok_or_else(|| {
            ConfigurationError::Invalid(format!("Reference node {reference_node} not found"))
        })?;

        let mut nodes_by_category: IndexMap<NodeCategory, Vec<NodeID>> = IndexMap::new();
        for node in nodes.values() {
            nodes_by_category
                .entry(node.category)
                .or_default()
                .push(node.id.clone());
        }
        nodes_by_category.sort_keys();

        let mut fuel_partition: IndexMap<FuelID, Vec<GeneratorID>> = IndexMap::new();
        let mut owned_generators: IndexMap<NodeKey, Vec<GeneratorID>> = IndexMap::new();
        for generator in generators.values() {
            let fuel = fuels.get(&generator.fuel_id).ok_or_else(|| {
                ConfigurationError::UnknownReference {
                    kind: "Generator",
                    id: generator.id.to_string(),
                    target_kind: "fuel category",
                    target: generator.fuel_id.to_string(),
                }
            })?;
            let node = nodes.get(&generator.node_id).ok_or_else(|| {
                ConfigurationError::UnknownReference {
                    kind: "Generator",
                    id: generator.id.to_string(),
                    target_kind: "node",
                    target: generator.node_id.to_string(),
                }
            })?;
            ensure!(
                node.category.hosts_generators(),
                ConfigurationError::Invalid(format!(
                    "Generator {} is located at node {}, which cannot host generators",
                    generator.id, node.id
                ))
            );

            fuel_partition
                .entry(fuel.id.clone())
                .or_default()
                .push(generator.id.clone());

            let ordinal = nodes_by_category[&node.category]
                .iter()
                .position(|id| *id == node.id)
                .context("Node missing from its category list")?;
            owned_generators
                .entry((node.category, ordinal))
                .or_default()
                .push(generator.id.clone());
        }

        // Keep partition in the order the categories were declared
        fuel_partition.sort_by_cached_key(|id, _| fuels.get_index_of(id));

        let reserve_eligible = fuel_partition
            .iter()
            .filter(|(fuel_id, _)| fuels[*fuel_id].reserve_eligible)
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect();

        let lines = LineMatrix::new(&nodes, links)?;
        lines.check_connected();

        debug!(
            "Topology has {} nodes, {} generators in {} fuel categories",
            nodes.len(),
            generators.len(),
            fuel_partition.len()
        );

        Ok(Self {
            fuels,
            nodes,
            generators,
            lines,
            reference_node,
            fuel_partition,
            reserve_eligible,
            nodes_by_category,
            owned_generators,
        })
    }

    /// Index of the reference bus in `nodes`
    pub fn reference_node(&self) -> usize {
        self.reference_node
    }

    /// Iterate over the fuel categories which have generators, with their generators
    pub fn iter_fuel_partition(&self) -> impl Iterator<Item = (&FuelCategory, &[GeneratorID])> {
        self.fuel_partition
            .iter()
            .map(|(id, generators)| (&self.fuels[id], generators.as_slice()))
    }

    /// The generators which can offer reserve
    pub fn reserve_eligible(&self) -> &IndexSet<GeneratorID> {
        &self.reserve_eligible
    }

    /// The nodes of the given category, in input order
    pub fn nodes_in(&self, category: NodeCategory) -> &[NodeID] {
        self.nodes_by_category
            .get(&category)
            .map_or(&[], Vec::as_slice)
    }

    /// Iterate over every node with its category ordinal key and its index in `nodes`
    pub fn iter_node_keys(&self) -> impl Iterator<Item = (NodeKey, &NodeID, usize)> {
        self.nodes_by_category.iter().flat_map(move |(category, ids)| {
            ids.iter().enumerate().map(move |(ordinal, id)| {
                let index = self.nodes.get_index_of(id).unwrap_or_default();
                ((*category, ordinal), id, index)
            })
        })
    }

    /// The generators located at the given node.
    ///
    /// Nodes without generators (including nodes whose category cannot host them) yield an empty
    /// slice.
    pub fn generators_at(&self, key: NodeKey) -> &[GeneratorID] {
        self.owned_generators.get(&key).map_or(&[], Vec::as_slice)
    }

    /// Get a generator by ID
    pub fn generator(&self, id: &GeneratorID) -> &Generator {
        &self.generators[id]
    }

    /// The cost of one MWh produced by the given generator
    pub fn energy_cost(&self, generator: &Generator) -> MoneyPerEnergy {
        self.fuels[&generator.fuel_id].energy_cost(generator.heat_rate, generator.var_om)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, fuels, generator, nodes, topology};
    use crate::units::Dimensionless;
    use indexmap::indexmap;
    use itertools::Itertools;
    use rstest::rstest;

    #[rstest]
    fn test_topology_subsets(topology: Topology) {
        let partition = topology
            .iter_fuel_partition()
            .map(|(fuel, ids)| (fuel.id.to_string(), ids.len()))
            .collect_vec();
        assert_eq!(partition, [("coal".into(), 1), ("import".into(), 1)]);

        // Only coal is reserve eligible
        assert_eq!(
            topology.reserve_eligible().iter().collect_vec(),
            [&GeneratorID::new("G1")]
        );

        assert_eq!(
            topology.generators_at((NodeCategory::GenerationWithDemand, 0)),
            [GeneratorID::new("G1"), GeneratorID::new("G2")]
        );
        assert!(
            topology
                .generators_at((NodeCategory::TransformerWithDemand, 0))
                .is_empty()
        );
        assert_eq!(
            topology.nodes_in(NodeCategory::TransformerWithDemand),
            [NodeID::new("B")]
        );
        assert!(topology.nodes_in(NodeCategory::Hydro).is_empty());
        assert_eq!(topology.reference_node(), 0);
    }

    #[rstest]
    fn test_topology_unknown_fuel(fuels: FuelMap, nodes: NodeMap, mut generator: Generator) {
        generator.fuel_id = "peat".into();
        let generators = indexmap! {generator.id.clone() => generator};
        let err = Topology::new(fuels, nodes, generators, &[], "A").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigurationError>(),
            Some(&ConfigurationError::UnknownReference {
                kind: "Generator",
                id: "G1".into(),
                target_kind: "fuel category",
                target: "peat".into()
            })
        );
    }

    #[rstest]
    fn test_topology_unknown_node(fuels: FuelMap, nodes: NodeMap, mut generator: Generator) {
        generator.node_id = "Z".into();
        let generators = indexmap! {generator.id.clone() => generator};
        assert_error!(
            Topology::new(fuels, nodes, generators, &[], "A"),
            "Generator G1 references unknown node Z"
        );
    }

    #[rstest]
    fn test_topology_generator_at_transformer(
        fuels: FuelMap,
        nodes: NodeMap,
        mut generator: Generator,
    ) {
        generator.node_id = "B".into();
        let generators = indexmap! {generator.id.clone() => generator};
        assert_error!(
            Topology::new(fuels, nodes, generators, &[], "A"),
            "Generator G1 is located at node B, which cannot host generators"
        );
    }

    #[rstest]
    fn test_topology_no_generators(fuels: FuelMap, nodes: NodeMap) {
        let err = Topology::new(fuels, nodes, GeneratorMap::new(), &[], "A").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigurationError>(),
            Some(&ConfigurationError::NoGenerators)
        );
    }

    #[rstest]
    fn test_topology_bad_reference_node(fuels: FuelMap, nodes: NodeMap, generator: Generator) {
        let generators = indexmap! {generator.id.clone() => generator};
        assert_error!(
            Topology::new(fuels, nodes, generators, &[], "Z"),
            "Reference node Z not found"
        );
    }

    #[rstest]
    fn test_energy_cost(topology: Topology) {
        let g1 = topology.generator(&"G1".into());
        assert_eq!(topology.energy_cost(g1), MoneyPerEnergy(10.0));

        // Import cost ignores heat rate and O&M
        let mut g2 = topology.generator(&"G2".into()).clone();
        g2.heat_rate = Dimensionless(3.0);
        assert_eq!(topology.energy_cost(&g2), MoneyPerEnergy(50.0));
    }
}
