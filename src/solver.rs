//! A solver-agnostic representation of a MILP instance and the HiGHS backend which solves it.
//!
//! The formulation builds a [`ModelInstance`]: a list of variables (bounds, objective coefficient
//! and integrality) and a list of sparse rows of the form
//!
//! lower <= a1*x1 + a2*x2 + ... <= upper
//!
//! Any [`Solver`] can then minimise the objective over it.
use crate::model::SolverParameters;
use highs::{HighsModelStatus, RowProblem as Problem, Sense};
use log::debug;
use std::ops::{Bound, RangeBounds};
use thiserror::Error;

/// Refers to a column of a [`ModelInstance`]
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub struct VarId(usize);

/// The definition of a variable to be optimised
#[derive(PartialEq, Debug, Clone)]
pub struct VariableDefinition {
    /// The variable's minimum value
    pub lower: f64,
    /// The variable's maximum value
    pub upper: f64,
    /// The coefficient of the variable in the objective
    pub cost: f64,
    /// Whether the variable must take an integer value
    pub integer: bool,
}

/// A linear constraint over the variables of an instance
#[derive(PartialEq, Debug, Clone)]
pub struct Constraint {
    /// The minimum value of the row
    pub lower: f64,
    /// The maximum value of the row
    pub upper: f64,
    /// Non-zero coefficients of the row
    pub terms: Vec<(VarId, f64)>,
}

/// A mixed-integer linear program, to be minimised
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ModelInstance {
    variables: Vec<VariableDefinition>,
    constraints: Vec<Constraint>,
}

/// Convert range bounds to a (lower, upper) pair, with infinities for missing bounds
fn to_limits<B: RangeBounds<f64>>(bounds: &B) -> (f64, f64) {
    let lower = match bounds.start_bound() {
        Bound::Included(value) | Bound::Excluded(value) => *value,
        Bound::Unbounded => f64::NEG_INFINITY,
    };
    let upper = match bounds.end_bound() {
        Bound::Included(value) | Bound::Excluded(value) => *value,
        Bound::Unbounded => f64::INFINITY,
    };
    (lower, upper)
}

impl ModelInstance {
    /// Add a continuous variable
    pub fn add_column<B: RangeBounds<f64>>(&mut self, cost: f64, bounds: B) -> VarId {
        self.add_variable(cost, &bounds, false)
    }

    /// Add a binary variable
    pub fn add_binary_column(&mut self, cost: f64) -> VarId {
        self.add_variable(cost, &(0.0..=1.0), true)
    }

    fn add_variable<B: RangeBounds<f64>>(&mut self, cost: f64, bounds: &B, integer: bool) -> VarId {
        let (lower, upper) = to_limits(bounds);
        self.variables.push(VariableDefinition {
            lower,
            upper,
            cost,
            integer,
        });
        VarId(self.variables.len() - 1)
    }

    /// Add a constraint row
    pub fn add_row<B, I>(&mut self, bounds: B, terms: I)
    where
        B: RangeBounds<f64>,
        I: IntoIterator<Item = (VarId, f64)>,
    {
        let (lower, upper) = to_limits(&bounds);
        self.constraints.push(Constraint {
            lower,
            upper,
            terms: terms.into_iter().collect(),
        });
    }

    /// The variables of the instance, indexed by [`VarId`]
    pub fn variables(&self) -> &[VariableDefinition] {
        &self.variables
    }

    /// The constraint rows of the instance
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The objective value of the given column values
    pub fn objective(&self, columns: &[f64]) -> f64 {
        self.variables
            .iter()
            .zip(columns)
            .map(|(var, value)| var.cost * value)
            .sum()
    }
}

/// The values assigned to every variable of an instance
#[derive(PartialEq, Debug, Clone)]
pub struct Assignment {
    columns: Vec<f64>,
    objective: f64,
}

impl Assignment {
    /// Create an assignment from column values
    pub fn new(instance: &ModelInstance, columns: Vec<f64>) -> Self {
        let objective = instance.objective(&columns);
        Self { columns, objective }
    }

    /// The value of a variable
    pub fn value(&self, var: VarId) -> f64 {
        self.columns[var.0]
    }

    /// The objective value
    pub fn objective(&self) -> f64 {
        self.objective
    }
}

/// Why a solve didn't produce an assignment
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolveError {
    /// No feasible solution exists
    #[error("Instance is infeasible")]
    Infeasible,
    /// The time limit was reached before an optimal solution was proven
    #[error("Time limit reached")]
    Timeout,
    /// Any other failure reported by the solver
    #[error("Solver error: {0}")]
    Other(String),
}

/// Something which can minimise a [`ModelInstance`]
pub trait Solver {
    /// Solve the instance to optimality
    fn solve(&self, instance: &ModelInstance) -> Result<Assignment, SolveError>;
}

/// Solves instances with the HiGHS MILP solver
#[derive(PartialEq, Debug, Clone)]
pub struct HighsSolver {
    /// Wall-clock limit for one solve, in seconds
    pub time_limit: Option<f64>,
    /// Relative gap at which a MIP solution counts as optimal
    pub mip_rel_gap: f64,
    /// Whether to let HiGHS print its own log to the console
    pub output: bool,
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self {
            time_limit: None,
            mip_rel_gap: 1e-4,
            output: false,
        }
    }
}

impl HighsSolver {
    /// Create a solver configured from the model's solver parameters
    pub fn new(parameters: &SolverParameters, output: bool) -> Self {
        Self {
            time_limit: parameters.time_limit,
            mip_rel_gap: parameters.mip_rel_gap,
            output,
        }
    }
}

impl Solver for HighsSolver {
    fn solve(&self, instance: &ModelInstance) -> Result<Assignment, SolveError> {
        let mut problem = Problem::default();
        let columns: Vec<_> = instance
            .variables()
            .iter()
            .map(|var| {
                let bounds = var.lower..=var.upper;
                if var.integer {
                    problem.add_integer_column(var.cost, bounds)
                } else {
                    problem.add_column(var.cost, bounds)
                }
            })
            .collect();

        for constraint in instance.constraints() {
            problem.add_row(
                constraint.lower..=constraint.upper,
                constraint
                    .terms
                    .iter()
                    .map(|(var, coeff)| (columns[var.0], *coeff)),
            );
        }

        debug!(
            "Solving instance with {} variables and {} constraints",
            instance.variables().len(),
            instance.constraints().len()
        );

        let mut model = problem.optimise(Sense::Minimise);
        model.set_option("output_flag", self.output);
        model.set_option("mip_rel_gap", self.mip_rel_gap);
        if let Some(time_limit) = self.time_limit {
            model.set_option("time_limit", time_limit);
        }

        let solved = model
            .try_solve()
            .map_err(|status| SolveError::Other(format!("{status:?}")))?;
        match solved.status() {
            HighsModelStatus::Optimal => {
                let columns = solved.get_solution().columns().to_vec();
                Ok(Assignment::new(instance, columns))
            }
            HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
                Err(SolveError::Infeasible)
            }
            HighsModelStatus::ReachedTimeLimit => Err(SolveError::Timeout),
            status => Err(SolveError::Other(format!("{status:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    /// Minimise x + 2y subject to x + y >= 1.5, y integer, x <= 1
    fn small_instance() -> (ModelInstance, VarId, VarId) {
        let mut instance = ModelInstance::default();
        let x = instance.add_column(1.0, 0.0..=1.0);
        let y = instance.add_variable(2.0, &(0.0..=10.0), true);
        instance.add_row(1.5.., [(x, 1.0), (y, 1.0)]);
        (instance, x, y)
    }

    #[test]
    fn test_to_limits() {
        assert_eq!(to_limits(&(1.0..)), (1.0, f64::INFINITY));
        assert_eq!(to_limits(&(..=2.0)), (f64::NEG_INFINITY, 2.0));
        assert_eq!(to_limits(&(3.0..=3.0)), (3.0, 3.0));
    }

    #[test]
    fn test_objective() {
        let (instance, _, _) = small_instance();
        assert_approx_eq!(f64, instance.objective(&[0.5, 1.0]), 2.5);
    }

    #[test]
    fn test_highs_mixed_integer() {
        let (instance, x, y) = small_instance();
        let assignment = HighsSolver::default().solve(&instance).unwrap();
        assert_approx_eq!(f64, assignment.value(x), 0.5, epsilon = 1e-6);
        assert_approx_eq!(f64, assignment.value(y), 1.0, epsilon = 1e-6);
        assert_approx_eq!(f64, assignment.objective(), 2.5, epsilon = 1e-6);
    }

    #[test]
    fn test_highs_infeasible() {
        let mut instance = ModelInstance::default();
        let x = instance.add_binary_column(1.0);
        instance.add_row(2.0.., [(x, 1.0)]);
        assert_eq!(
            HighsSolver::default().solve(&instance),
            Err(SolveError::Infeasible)
        );
    }
}
