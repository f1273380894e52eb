//! Code for adding constraints to the daily problem.
//!
//! Unless stated otherwise, constraints apply to the decision hours `1..=H`.
use super::Formulation;
use super::variables::{GeneratorVariables, VariableMap};
use crate::generator::Generator;
use crate::node::NodeCategory;
use crate::solver::{ModelInstance, VarId};
use crate::time_series::DayContext;
use itertools::Itertools;

/// Add every enabled constraint group to the instance
pub fn add_constraints(
    instance: &mut ModelInstance,
    variables: &VariableMap,
    formulation: &Formulation,
    ctx: &DayContext,
) {
    let groups = formulation.parameters.constraints;
    if groups.logical {
        add_logical_constraints(instance, variables, formulation, ctx);
    }
    if groups.up_down_time {
        add_up_down_time_constraints(instance, variables, formulation, ctx);
    }
    if groups.ramp_rate {
        add_ramp_constraints(instance, variables, formulation, ctx);
    }
    if groups.capacity {
        add_capacity_constraints(instance, variables, formulation, ctx);
    }
    if groups.power_balance {
        add_power_balance_constraints(instance, variables, formulation, ctx);
    }
    if groups.transmission {
        add_transmission_constraints(instance, variables, formulation, ctx);
    }
    if groups.reserve_and_zero_sum {
        add_reserve_constraints(instance, variables, formulation, ctx);
    }
}

/// Iterate over every generator together with its variables
fn iter_generators<'a>(
    variables: &'a VariableMap,
    formulation: &'a Formulation,
) -> impl Iterator<Item = (&'a Generator, &'a GeneratorVariables)> {
    variables
        .generators
        .iter()
        .map(|(id, vars)| (formulation.topology.generator(id), vars))
}

/// Link dispatch to commitment, fix the initial state and define start-ups.
///
/// Dispatch is linked to commitment in every hour including hour 0.
fn add_logical_constraints(
    instance: &mut ModelInstance,
    variables: &VariableMap,
    formulation: &Formulation,
    ctx: &DayContext,
) {
    let m = formulation.parameters.big_m;
    for (generator, vars) in iter_generators(variables, formulation) {
        for hour in 0..=ctx.horizon() {
            instance.add_row(..=0.0, [(vars.dispatch[hour], 1.0), (vars.on[hour], -m)]);
        }

        let initial = if ctx.initial_on(&generator.id) {
            1.0
        } else {
            0.0
        };
        instance.add_row(initial..=initial, [(vars.on[0], 1.0)]);

        for hour in 1..=ctx.horizon() {
            let (on, prev_on, switch) = (vars.on[hour], vars.on[hour - 1], vars.switch[hour]);
            instance.add_row(..=0.0, [(switch, 1.0), (on, -m)]);
            instance.add_row(..=m, [(switch, 1.0), (prev_on, m)]);
            instance.add_row(..=0.0, [(on, 1.0), (prev_on, -1.0), (switch, -1.0)]);
        }
    }
}

/// The hours `k` which a change of state in `hour` constrains, for a minimum time of `min_hours`
fn min_time_window(hour: usize, min_hours: u32, horizon: usize) -> std::ops::Range<usize> {
    let end = (hour + min_hours as usize).saturating_sub(1).min(horizon);
    (hour + 1)..end.max(hour + 1)
}

/// Keep generators on (off) for their minimum up (down) time after a start (stop).
///
/// The window is truncated at the end of the horizon.
fn add_up_down_time_constraints(
    instance: &mut ModelInstance,
    variables: &VariableMap,
    formulation: &Formulation,
    ctx: &DayContext,
) {
    let horizon = ctx.horizon();
    for (generator, vars) in iter_generators(variables, formulation) {
        for hour in 1..=horizon {
            let (on, prev_on) = (vars.on[hour], vars.on[hour - 1]);
            for k in min_time_window(hour, generator.min_up, horizon) {
                instance.add_row(..=0.0, [(on, 1.0), (prev_on, -1.0), (vars.on[k], -1.0)]);
            }
            for k in min_time_window(hour, generator.min_down, horizon) {
                instance.add_row(..=1.0, [(prev_on, 1.0), (on, -1.0), (vars.on[k], 1.0)]);
            }
        }
    }
}

/// Limit the change in output between consecutive hours.
///
/// Applies from hour 2: the step from the warm-start hour into hour 1 is not limited.
fn add_ramp_constraints(
    instance: &mut ModelInstance,
    variables: &VariableMap,
    formulation: &Formulation,
    ctx: &DayContext,
) {
    for (generator, vars) in iter_generators(variables, formulation) {
        let ramp = generator.ramp.value();
        for hour in 2..=ctx.horizon() {
            instance.add_row(
                -ramp..=ramp,
                [(vars.dispatch[hour], 1.0), (vars.dispatch[hour - 1], -1.0)],
            );
        }
    }
}

/// Bound generator output by its minimum and derated maximum, and resource dispatch by
/// availability
fn add_capacity_constraints(
    instance: &mut ModelInstance,
    variables: &VariableMap,
    formulation: &Formulation,
    ctx: &DayContext,
) {
    for (generator, vars) in iter_generators(variables, formulation) {
        let max = generator.available_capacity().value();
        let min = generator.min_capacity.value();
        for hour in 1..=ctx.horizon() {
            let (dispatch, on) = (vars.dispatch[hour], vars.on[hour]);
            instance.add_row(..=0.0, [(dispatch, 1.0), (on, -max)]);
            instance.add_row(0.0.., [(dispatch, 1.0), (on, -min)]);
        }
    }

    for (node_id, resource) in &variables.resources {
        for hour in 1..=ctx.horizon() {
            let limit = ctx.availability(node_id, hour);
            instance.add_row(..=limit, [(resource.dispatch[hour], 1.0)]);
        }
    }
}

/// Balance injections against the DC power flow at every node.
///
/// The net flow out of node `z` is `Σ_k sus(z, k) · (angle(z) − angle(k))`. It must equal the
/// node's dispatch, less transmission losses, minus its demand.
fn add_power_balance_constraints(
    instance: &mut ModelInstance,
    variables: &VariableMap,
    formulation: &Formulation,
    ctx: &DayContext,
) {
    let topology = formulation.topology;
    let delivered = 1.0 - formulation.parameters.transmission_loss;
    for ((category, ordinal), node_id, index) in topology.iter_node_keys() {
        let injections: Vec<&[VarId]> = match category {
            NodeCategory::GenerationWithDemand | NodeCategory::GenerationWithoutDemand => topology
                .generators_at((category, ordinal))
                .iter()
                .map(|id| variables.generators[id].dispatch.as_slice())
                .collect(),
            NodeCategory::Hydro
            | NodeCategory::HydroImport
            | NodeCategory::Solar
            | NodeCategory::Wind => vec![variables.resources[node_id].dispatch.as_slice()],
            NodeCategory::TransformerWithDemand | NodeCategory::TransformerWithoutDemand => {
                Vec::new()
            }
        };
        let neighbours = topology.lines.iter_neighbours(index).collect_vec();
        let own_coefficient: f64 = neighbours.iter().map(|(_, sus)| sus).sum();

        for hour in 1..=ctx.horizon() {
            let mut terms = vec![(variables.angles[index][hour], own_coefficient)];
            terms.extend(
                neighbours
                    .iter()
                    .map(|(other, sus)| (variables.angles[*other][hour], -sus)),
            );
            terms.extend(injections.iter().map(|vars| (vars[hour], -delivered)));

            let rhs = -ctx.demand(node_id, hour);
            instance.add_row(rhs..=rhs, terms);
        }
    }
}

/// Fix the reference angle and apply N-1 thermal limits to every line
fn add_transmission_constraints(
    instance: &mut ModelInstance,
    variables: &VariableMap,
    formulation: &Formulation,
    ctx: &DayContext,
) {
    let topology = formulation.topology;
    let reference = &variables.angles[topology.reference_node()];
    for hour in 1..=ctx.horizon() {
        instance.add_row(0.0..=0.0, [(reference[hour], 1.0)]);
    }

    let n1 = formulation.parameters.n1_criterion;
    for (source, sink, line) in topology.lines.iter_links() {
        let limit = n1 * line.capacity;
        for hour in 1..=ctx.horizon() {
            instance.add_row(
                -limit..=limit,
                [
                    (variables.angles[source][hour], line.susceptance),
                    (variables.angles[sink][hour], -line.susceptance),
                ],
            );
        }
    }
}

/// Meet the system reserve requirement and keep each generator within its capacity.
///
/// Only reserve-eligible generators count towards the requirement, but reserve bounds and
/// headroom apply to all generators.
fn add_reserve_constraints(
    instance: &mut ModelInstance,
    variables: &VariableMap,
    formulation: &Formulation,
    ctx: &DayContext,
) {
    let eligible = formulation
        .topology
        .reserve_eligible()
        .iter()
        .map(|id| &variables.generators[id])
        .collect_vec();
    let spin_margin = formulation.parameters.spin_margin;

    for hour in 1..=ctx.horizon() {
        let requirement = ctx.reserve(hour);
        let spinning = eligible.iter().map(|vars| (vars.spinning_reserve[hour], 1.0));
        let non_spinning = eligible
            .iter()
            .map(|vars| (vars.non_spinning_reserve[hour], 1.0));
        instance.add_row(requirement.., spinning.clone().chain(non_spinning));
        instance.add_row((spin_margin * requirement).., spinning);
    }

    for (generator, vars) in iter_generators(variables, formulation) {
        let available = generator.available_capacity().value();
        let max = generator.max_capacity.value();
        for hour in 1..=ctx.horizon() {
            let (on, srsv, nrsv) = (
                vars.on[hour],
                vars.spinning_reserve[hour],
                vars.non_spinning_reserve[hour],
            );
            instance.add_row(..=0.0, [(srsv, 1.0), (on, -available)]);
            instance.add_row(..=available, [(nrsv, 1.0), (on, available)]);
            instance.add_row(
                ..=max,
                [(vars.dispatch[hour], 1.0), (srsv, 1.0), (nrsv, 1.0)],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 4, 24, 2..4)]
    #[case(1, 1, 24, 2..2)]
    #[case(1, 0, 24, 2..2)]
    #[case(22, 5, 24, 23..24)]
    #[case(24, 8, 24, 25..25)]
    fn test_min_time_window(
        #[case] hour: usize,
        #[case] min_hours: u32,
        #[case] horizon: usize,
        #[case] expected: std::ops::Range<usize>,
    ) {
        assert_eq!(min_time_window(hour, min_hours, horizon), expected);
    }
}
