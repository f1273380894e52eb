//! Error types raised while building and running a simulation.
//!
//! Functions in this crate return [`anyhow::Result`]; the types here are carried inside the
//! [`anyhow::Error`] so callers can tell the categories apart with `downcast_ref`.
use std::fmt;
use thiserror::Error;

/// Malformed references or missing fields in the model definition.
///
/// Always raised before the first solve.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    /// An ID referenced something which doesn't exist
    #[error("{kind} {id} references unknown {target_kind} {target}")]
    UnknownReference {
        /// What sort of thing holds the reference (e.g. "Generator")
        kind: &'static str,
        /// The ID of the referencing thing
        id: String,
        /// What sort of thing is referenced (e.g. "node")
        target_kind: &'static str,
        /// The unknown ID
        target: String,
    },
    /// The model has no generators
    #[error("The model contains no generators")]
    NoGenerators,
    /// A required input is missing for a member of a set
    #[error("Missing {what} for {id}")]
    MissingParameter {
        /// The missing parameter
        what: &'static str,
        /// The set member missing it
        id: String,
    },
    /// Anything else wrong with how the model is put together
    #[error("{0}")]
    Invalid(String),
}

/// A value which is present but not acceptable.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Minimum capacity of a generator is above its maximum
    #[error("Generator {id}: min capacity ({min}) exceeds max capacity ({max})")]
    MinAboveMax {
        /// Generator ID
        id: String,
        /// Minimum capacity
        min: f64,
        /// Maximum capacity
        max: f64,
    },
    /// A quantity which must not be negative was negative
    #[error("{what} for {id} must be non-negative, got {value}")]
    Negative {
        /// The quantity
        what: &'static str,
        /// The owner of the quantity
        id: String,
        /// The bad value
        value: f64,
    },
    /// A derate factor outside (0, 1]
    #[error("Generator {id}: derate factor must be in (0, 1], got {value}")]
    DerateOutOfRange {
        /// Generator ID
        id: String,
        /// The bad value
        value: f64,
    },
    /// A binary variable came back from the solver too far from 0 or 1
    #[error("Day {day}: on-state of generator {id} at hour {hour} is not binary ({value})")]
    NonBinaryState {
        /// Simulated day
        day: u32,
        /// Generator ID
        id: String,
        /// Local hour
        hour: usize,
        /// The value returned by the solver
        value: f64,
    },
}

/// Why the solver didn't produce an assignment
#[derive(Debug, Clone, PartialEq)]
pub enum SolveFailureCause {
    /// The instance has no feasible solution
    Infeasible,
    /// The solver hit its time limit on every attempt
    Timeout {
        /// Number of attempts made
        attempts: u32,
    },
    /// Any other solver-reported problem
    Solver(String),
}

impl fmt::Display for SolveFailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infeasible => write!(f, "instance is infeasible"),
            Self::Timeout { attempts } => {
                write!(f, "solver timed out ({attempts} attempt(s))")
            }
            Self::Solver(msg) => write!(f, "solver error: {msg}"),
        }
    }
}

/// Key inputs of a failed day, for diagnosis
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DayDiagnostics {
    /// Total demand over the decision hours of the window
    pub total_demand: f64,
    /// Highest hourly reserve requirement in the window
    pub peak_reserve: f64,
    /// Number of generators committed at hour 0
    pub committed_units: usize,
}

impl fmt::Display for DayDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total demand {:.3}, peak reserve requirement {:.3}, {} unit(s) initially on",
            self.total_demand, self.peak_reserve, self.committed_units
        )
    }
}

/// The solve for a simulated day failed
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Solve failed for day {day}: {cause} ({diagnostics})")]
pub struct SolveFailure {
    /// Simulated day
    pub day: u32,
    /// What went wrong
    pub cause: SolveFailureCause,
    /// Key inputs of the failed instance
    pub diagnostics: DayDiagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_failure_message() {
        let failure = SolveFailure {
            day: 12,
            cause: SolveFailureCause::Infeasible,
            diagnostics: DayDiagnostics {
                total_demand: 1440.0,
                peak_reserve: 9.0,
                committed_units: 2,
            },
        };
        assert_eq!(
            failure.to_string(),
            "Solve failed for day 12: instance is infeasible (total demand 1440.000, peak reserve \
             requirement 9.000, 2 unit(s) initially on)"
        );
    }

    #[test]
    fn test_downcast_from_anyhow() {
        let err: anyhow::Error = ConfigurationError::NoGenerators.into();
        assert_eq!(
            err.downcast_ref::<ConfigurationError>(),
            Some(&ConfigurationError::NoGenerators)
        );
    }
}
