//! Nodes (buses) of the transmission network.
use crate::id::{define_id_getter, define_id_type};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use strum::{EnumIter, IntoEnumIterator};

define_id_type! {NodeID}

/// A map of [`Node`]s, keyed by node ID
pub type NodeMap = IndexMap<NodeID, Node>;

/// The operating category of a node.
///
/// Every node belongs to exactly one category, which determines what its power balance looks
/// like.
#[derive(
    PartialEq, Eq, Hash, Debug, Clone, Copy, PartialOrd, Ord, EnumIter, DeserializeLabeledStringEnum,
)]
pub enum NodeCategory {
    /// A domestic hydropower dam
    #[string = "hydro"]
    Hydro,
    /// A hydropower import point
    #[string = "hydro_import"]
    HydroImport,
    /// A solar farm
    #[string = "solar"]
    Solar,
    /// A wind farm
    #[string = "wind"]
    Wind,
    /// Dispatchable generators with local demand
    #[string = "generation_with_demand"]
    GenerationWithDemand,
    /// Dispatchable generators without local demand
    #[string = "generation_without_demand"]
    GenerationWithoutDemand,
    /// A substation with demand
    #[string = "transformer_with_demand"]
    TransformerWithDemand,
    /// A substation without demand
    #[string = "transformer_without_demand"]
    TransformerWithoutDemand,
}

/// The kinds of variable resource which can be dispatched at a node
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, PartialOrd, Ord, EnumIter)]
pub enum ResourceKind {
    /// Domestic hydropower
    Hydro,
    /// Imported hydropower
    HydroImport,
    /// Solar power
    Solar,
    /// Wind power
    Wind,
}

impl ResourceKind {
    /// A short name for the resource, used in output file names
    pub fn name(self) -> &'static str {
        match self {
            Self::Hydro => "hydro",
            Self::HydroImport => "hydro_import",
            Self::Solar => "solar",
            Self::Wind => "wind",
        }
    }

    /// The node category hosting this resource
    pub fn node_category(self) -> NodeCategory {
        match self {
            Self::Hydro => NodeCategory::Hydro,
            Self::HydroImport => NodeCategory::HydroImport,
            Self::Solar => NodeCategory::Solar,
            Self::Wind => NodeCategory::Wind,
        }
    }
}

impl NodeCategory {
    /// Whether nodes of this category have a demand time series
    pub fn has_demand(self) -> bool {
        matches!(
            self,
            Self::GenerationWithDemand | Self::TransformerWithDemand
        )
    }

    /// Whether dispatchable generators may be located at nodes of this category
    pub fn hosts_generators(self) -> bool {
        matches!(
            self,
            Self::GenerationWithDemand | Self::GenerationWithoutDemand
        )
    }

    /// The variable resource dispatched at nodes of this category, if any
    pub fn resource(self) -> Option<ResourceKind> {
        ResourceKind::iter().find(|kind| kind.node_category() == self)
    }
}

/// A node of the transmission network
#[derive(PartialEq, Debug, Clone, Deserialize)]
pub struct Node {
    /// Unique identifier (e.g. substation name)
    pub id: NodeID,
    /// What kind of node this is
    pub category: NodeCategory,
}
define_id_getter! {Node, NodeID}
