//! Decision variables of the daily problem.
use super::Formulation;
use super::objective::CostCoefficients;
use crate::generator::GeneratorID;
use crate::node::{NodeID, ResourceKind};
use crate::solver::{ModelInstance, VarId};
use crate::time_series::DayContext;
use indexmap::IndexMap;

/// The variables of one generator, each indexed by hour `0..=H`
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorVariables {
    /// Power output
    pub dispatch: Vec<VarId>,
    /// Commitment state (binary)
    pub on: Vec<VarId>,
    /// Start-up indicator (binary)
    pub switch: Vec<VarId>,
    /// Spinning reserve offered
    pub spinning_reserve: Vec<VarId>,
    /// Non-spinning reserve offered
    pub non_spinning_reserve: Vec<VarId>,
}

/// Dispatch variables for a variable resource node, indexed by hour `0..=H`
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceVariables {
    /// Which resource the node supplies
    pub kind: ResourceKind,
    /// Power dispatched from the node
    pub dispatch: Vec<VarId>,
}

/// A map for easy lookup of variables in the problem.
///
/// We use this data structure for two things:
///
/// 1. In order define constraints for the optimisation
/// 2. To keep track of the entity and hour each variable corresponds to, for when we are reading
///    the results of the optimisation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableMap {
    /// Per-generator variables, in generator order
    pub generators: IndexMap<GeneratorID, GeneratorVariables>,
    /// Dispatch of each variable resource node
    pub resources: IndexMap<NodeID, ResourceVariables>,
    /// Voltage angle of each node, in node order
    pub angles: IndexMap<NodeID, Vec<VarId>>,
}

/// Add the day's variables to the instance, with their objective coefficients.
///
/// Variables exist for every hour `0..=H`, but only hours `1..=H` carry a cost.
pub fn add_variables(
    instance: &mut ModelInstance,
    formulation: &Formulation,
    ctx: &DayContext,
) -> VariableMap {
    let topology = formulation.topology;
    let costs = CostCoefficients::new(topology, formulation.parameters.hydro_import_cost);
    let hours = 0..=ctx.horizon();
    let cost_in = |hour: usize, cost: f64| if hour == 0 { 0.0 } else { cost };

    let mut variables = VariableMap::default();
    for generator in topology.generators.values() {
        let on_cost = costs.commitment[&generator.id];
        let switch_cost = costs.startup[&generator.id];
        let dispatch_cost = costs.dispatch[&generator.id];

        let vars = GeneratorVariables {
            dispatch: hours
                .clone()
                .map(|hour| instance.add_column(cost_in(hour, dispatch_cost), 0.0..))
                .collect(),
            on: hours
                .clone()
                .map(|hour| instance.add_binary_column(cost_in(hour, on_cost)))
                .collect(),
            switch: hours
                .clone()
                .map(|hour| instance.add_binary_column(cost_in(hour, switch_cost)))
                .collect(),
            spinning_reserve: hours
                .clone()
                .map(|_| instance.add_column(0.0, 0.0..))
                .collect(),
            non_spinning_reserve: hours
                .clone()
                .map(|_| instance.add_column(0.0, 0.0..))
                .collect(),
        };
        variables.generators.insert(generator.id.clone(), vars);
    }

    for node in topology.nodes.values() {
        if let Some(kind) = node.category.resource() {
            let cost = costs.resource(kind);
            let dispatch = hours
                .clone()
                .map(|hour| instance.add_column(cost_in(hour, cost), 0.0..))
                .collect();
            variables
                .resources
                .insert(node.id.clone(), ResourceVariables { kind, dispatch });
        }
    }

    for node_id in topology.nodes.keys() {
        let angles = hours.clone().map(|_| instance.add_column(0.0, ..)).collect();
        variables.angles.insert(node_id.clone(), angles);
    }

    variables
}
