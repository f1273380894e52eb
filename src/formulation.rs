//! Translates the grid and one day's inputs into a unit commitment MILP.
//!
//! The [`Formulation`] holds everything which is the same for every day: the topology and the
//! model parameters. [`Formulation::build_instance`] combines it with a [`DayContext`] to give a
//! fresh [`ModelInstance`], so each day's problem depends only on its inputs.
use crate::error::ConfigurationError;
use crate::model::{ConstraintGroups, ModelParameters};
use crate::solver::ModelInstance;
use crate::time_series::{DayContext, HOURS_PER_DAY};
use crate::topology::Topology;
use crate::units::MoneyPerEnergy;
use anyhow::{Result, ensure};
use log::debug;

pub mod constraints;
use constraints::add_constraints;
mod objective;
pub mod variables;
use variables::{VariableMap, add_variables};

/// Scalar parameters of the formulation
#[derive(Debug, Clone, PartialEq)]
pub struct FormulationParameters {
    /// Number of decision hours
    pub horizon: usize,
    /// Fraction of dispatch lost before reaching the network
    pub transmission_loss: f64,
    /// Usable fraction of line capacity
    pub n1_criterion: f64,
    /// Fraction of the reserve requirement which must be spinning
    pub spin_margin: f64,
    /// Price of imported hydropower
    pub hydro_import_cost: MoneyPerEnergy,
    /// Big-M constant for the logical constraints
    pub big_m: f64,
    /// Which constraint groups to include
    pub constraints: ConstraintGroups,
}

impl From<&ModelParameters> for FormulationParameters {
    fn from(params: &ModelParameters) -> Self {
        Self {
            horizon: params.horizon_hours,
            transmission_loss: params.transmission_loss,
            n1_criterion: params.n1_criterion,
            spin_margin: params.spin_margin,
            hydro_import_cost: params.hydro_import_cost,
            big_m: params.big_m,
            constraints: params.constraints,
        }
    }
}

/// The static structure of the daily problem
#[derive(Debug, Clone)]
pub struct Formulation<'a> {
    topology: &'a Topology,
    parameters: FormulationParameters,
}

impl<'a> Formulation<'a> {
    /// Create the formulation for a grid.
    ///
    /// # Arguments
    ///
    /// * `topology` - The grid
    /// * `parameters` - Scalar parameters. The horizon must be at least 24 hours.
    pub fn new(topology: &'a Topology, parameters: FormulationParameters) -> Result<Self> {
        ensure!(
            parameters.horizon >= HOURS_PER_DAY,
            ConfigurationError::Invalid(format!(
                "The horizon must be at least {HOURS_PER_DAY} hours, got {}",
                parameters.horizon
            ))
        );

        Ok(Self {
            topology,
            parameters,
        })
    }

    /// The grid being modelled
    pub fn topology(&self) -> &'a Topology {
        self.topology
    }

    /// Number of decision hours
    pub fn horizon(&self) -> usize {
        self.parameters.horizon
    }

    /// Build a solver instance for one day.
    ///
    /// # Returns
    ///
    /// The instance and a map from entities and hours to its variables
    pub fn build_instance(&self, ctx: &DayContext) -> (ModelInstance, VariableMap) {
        let mut instance = ModelInstance::default();
        let variables = add_variables(&mut instance, self, ctx);
        add_constraints(&mut instance, &variables, self, ctx);

        debug!(
            "Built instance for day {} with {} variables and {} constraints",
            ctx.day,
            instance.variables().len(),
            instance.constraints().len()
        );

        (instance, variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, model_parameters, time_series, topology};
    use crate::solver::{HighsSolver, Solver};
    use crate::time_series::{HorizonWindow, TimeSeriesStore};
    use float_cmp::assert_approx_eq;
    use indexmap::IndexMap;
    use rstest::rstest;

    #[rstest]
    fn test_horizon_too_short(topology: Topology, model_parameters: ModelParameters) {
        let mut parameters = FormulationParameters::from(&model_parameters);
        parameters.horizon = 12;
        assert_error!(
            Formulation::new(&topology, parameters),
            "The horizon must be at least 24 hours, got 12"
        );
    }

    #[rstest]
    fn test_instance_size(
        topology: Topology,
        model_parameters: ModelParameters,
        time_series: TimeSeriesStore,
    ) {
        let formulation = Formulation::new(&topology, (&model_parameters).into()).unwrap();
        let mut window = HorizonWindow::new(&topology, 24);
        window.bind(&time_series, 1).unwrap();
        let initial_on = IndexMap::new();
        let ctx = DayContext::new(1, &window, &initial_on);
        let (instance, variables) = formulation.build_instance(&ctx);

        // 5 series per generator and one angle per node, all over hours 0..=24
        assert_eq!(instance.variables().len(), (2 * 5 + 3) * 25);
        assert_eq!(variables.generators["G1"].on.len(), 25);
        assert!(variables.resources.is_empty());
        assert!(
            instance
                .variables()
                .iter()
                .filter(|var| var.integer)
                .all(|var| var.lower == 0.0 && var.upper == 1.0)
        );
    }

    #[rstest]
    fn test_solve_fixture_day(
        topology: Topology,
        model_parameters: ModelParameters,
        time_series: TimeSeriesStore,
    ) {
        let formulation = Formulation::new(&topology, (&model_parameters).into()).unwrap();
        let mut window = HorizonWindow::new(&topology, 24);
        window.bind(&time_series, 1).unwrap();
        let initial_on = IndexMap::new();
        let ctx = DayContext::new(1, &window, &initial_on);
        let (instance, variables) = formulation.build_instance(&ctx);
        let solver = HighsSolver {
            mip_rel_gap: 0.0,
            ..Default::default()
        };
        let assignment = solver.solve(&instance).unwrap();

        // 60 MW of demand is met by the cheap coal unit, which also covers the reserve
        let g1 = &variables.generators["G1"];
        for hour in 1..=24 {
            assert_approx_eq!(f64, assignment.value(g1.dispatch[hour]), 60.0, epsilon = 1e-6);
            assert_approx_eq!(f64, assignment.value(g1.on[hour]), 1.0, epsilon = 1e-6);
            assert!(assignment.value(g1.spinning_reserve[hour]) >= 5.0 - 1e-6);
        }
        assert_approx_eq!(f64, assignment.objective(), 24.0 * 60.0 * 10.0, epsilon = 1e-3);
    }

    /// Count the constraint rows of the first day's instance
    fn count_rows(
        topology: &Topology,
        parameters: FormulationParameters,
        time_series: &TimeSeriesStore,
    ) -> usize {
        let formulation = Formulation::new(topology, parameters).unwrap();
        let mut window = HorizonWindow::new(topology, 24);
        window.bind(time_series, 1).unwrap();
        let initial_on = IndexMap::new();
        let ctx = DayContext::new(1, &window, &initial_on);
        formulation.build_instance(&ctx).0.constraints().len()
    }

    #[rstest]
    #[case::logical(|groups: &mut ConstraintGroups| groups.logical = false, 2 * (25 + 1 + 3 * 24))]
    #[case::up_down_time(|groups: &mut ConstraintGroups| groups.up_down_time = false, 22)]
    #[case::ramp_rate(|groups: &mut ConstraintGroups| groups.ramp_rate = false, 2 * 23)]
    #[case::capacity(|groups: &mut ConstraintGroups| groups.capacity = false, 2 * 2 * 24)]
    #[case::power_balance(|groups: &mut ConstraintGroups| groups.power_balance = false, 3 * 24)]
    #[case::transmission(|groups: &mut ConstraintGroups| groups.transmission = false, 24 + 4 * 24)]
    #[case::reserve(
        |groups: &mut ConstraintGroups| groups.reserve_and_zero_sum = false,
        2 * 24 + 2 * 3 * 24
    )]
    fn test_disable_constraint_group(
        mut topology: Topology,
        model_parameters: ModelParameters,
        time_series: TimeSeriesStore,
        #[case] disable: fn(&mut ConstraintGroups),
        #[case] removed: usize,
    ) {
        // A 3-hour minimum up time gives G1 one row for each of hours 1 to 22
        topology.generators["G1"].min_up = 3;
        let parameters = FormulationParameters::from(&model_parameters);
        let all_rows = count_rows(&topology, parameters.clone(), &time_series);
        assert_eq!(all_rows, 744);

        let mut reduced = parameters;
        disable(&mut reduced.constraints);
        assert_eq!(count_rows(&topology, reduced, &time_series), all_rows - removed);
    }

    #[rstest]
    fn test_all_constraint_groups_disabled(
        topology: Topology,
        model_parameters: ModelParameters,
        time_series: TimeSeriesStore,
    ) {
        let mut parameters = FormulationParameters::from(&model_parameters);
        parameters.constraints = ConstraintGroups {
            logical: false,
            up_down_time: false,
            ramp_rate: false,
            capacity: false,
            power_balance: false,
            transmission: false,
            reserve_and_zero_sum: false,
        };
        assert_eq!(count_rows(&topology, parameters, &time_series), 0);
    }
}
