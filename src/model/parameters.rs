//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::error::ConfigurationError;
use crate::input::{deserialise_proportion, input_err_msg, read_toml};
use crate::time_series::HOURS_PER_DAY;
use crate::units::MoneyPerEnergy;
use anyhow::{Context, Result, ensure};
use log::warn;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_start_day, u32, 1);
define_param_default!(default_horizon_hours, usize, 24);
define_param_default!(default_transmission_loss, f64, 0.075);
define_param_default!(default_n1_criterion, f64, 0.75);
define_param_default!(default_spin_margin, f64, 0.5);
define_param_default!(default_reserve_margin, f64, 0.15);
define_unit_param_default!(default_hydro_import_cost, MoneyPerEnergy, 48.0);
define_param_default!(default_big_m, f64, 1e5);
define_param_default!(default_timeout_retries, u32, 1);
define_param_default!(default_mip_rel_gap, f64, 1e-4);
define_param_default!(default_true, bool, true);

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelParameters {
    /// The year being simulated. Selects generator derate factors.
    pub year: u32,
    /// First day to simulate (1-based)
    #[serde(default = "default_start_day")]
    pub start_day: u32,
    /// Last day to simulate (inclusive)
    pub last_day: u32,
    /// Number of decision hours in each daily problem.
    ///
    /// Must be at least 24. Hours beyond 24 are look-ahead and are not reported.
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: usize,
    /// ID of the reference (slack) bus, whose voltage angle is fixed at zero
    pub reference_node: String,
    /// Fraction of dispatched power lost before it reaches the network
    #[serde(default = "default_transmission_loss")]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub transmission_loss: f64,
    /// Fraction of line capacity usable under the N-1 security criterion
    #[serde(default = "default_n1_criterion")]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub n1_criterion: f64,
    /// Fraction of the reserve requirement which must be spinning
    #[serde(default = "default_spin_margin")]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub spin_margin: f64,
    /// Reserve requirement as a fraction of total demand, used when no reserve series is given
    #[serde(default = "default_reserve_margin")]
    pub reserve_margin: f64,
    /// Price of imported hydropower
    #[serde(default = "default_hydro_import_cost")]
    pub hydro_import_cost: MoneyPerEnergy,
    /// Big-M constant linking continuous variables to commitment binaries.
    ///
    /// Don't change unless you know what you're doing.
    #[serde(default = "default_big_m")]
    pub big_m: f64,
    /// What to do when a day can't be solved
    #[serde(default)]
    pub on_solve_failure: SolveFailurePolicy,
    /// Options for the MILP solver
    #[serde(default)]
    pub solver: SolverParameters,
    /// Which groups of constraints to include
    #[serde(default)]
    pub constraints: ConstraintGroups,
}

/// What the driver does when a day's problem can't be solved
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum SolveFailurePolicy {
    /// Stop the simulation with an error
    #[default]
    #[string = "abort"]
    Abort,
    /// Log the failure, skip the day and keep the previous initial state
    #[string = "hold_previous_state"]
    HoldPreviousState,
}

/// The `[solver]` section of the model file
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct SolverParameters {
    /// Time limit for one solve attempt, in seconds. No limit if absent.
    pub time_limit: Option<f64>,
    /// How many times to retry a day after the solver times out
    #[serde(default = "default_timeout_retries")]
    pub timeout_retries: u32,
    /// Relative MIP gap at which a solution is accepted
    #[serde(default = "default_mip_rel_gap")]
    pub mip_rel_gap: f64,
}

impl Default for SolverParameters {
    fn default() -> Self {
        Self {
            time_limit: None,
            timeout_retries: default_timeout_retries(),
            mip_rel_gap: default_mip_rel_gap(),
        }
    }
}

/// The `[constraints]` section of the model file: switches for each constraint group
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct ConstraintGroups {
    /// Commitment linkage, initial state and start-up logic
    #[serde(default = "default_true")]
    pub logical: bool,
    /// Minimum up and down times
    #[serde(default = "default_true")]
    pub up_down_time: bool,
    /// Ramp limits
    #[serde(default = "default_true")]
    pub ramp_rate: bool,
    /// Generator and resource capacity limits
    #[serde(default = "default_true")]
    pub capacity: bool,
    /// Nodal power balance
    #[serde(default = "default_true")]
    pub power_balance: bool,
    /// Reference bus and line thermal limits
    #[serde(default = "default_true")]
    pub transmission: bool,
    /// Reserve requirements, reserve bounds and generator headroom
    #[serde(default = "default_true")]
    pub reserve_and_zero_sum: bool,
}

impl Default for ConstraintGroups {
    fn default() -> Self {
        Self {
            logical: true,
            up_down_time: true,
            ramp_rate: true,
            capacity: true,
            power_balance: true,
            transmission: true,
            reserve_and_zero_sum: true,
        }
    }
}

/// Check that the simulated days are valid
fn check_days(start_day: u32, last_day: u32) -> Result<()> {
    ensure!(
        start_day >= 1,
        ConfigurationError::Invalid("start_day must be at least 1".into())
    );
    ensure!(
        last_day >= start_day,
        ConfigurationError::Invalid(format!(
            "last_day ({last_day}) must not be before start_day ({start_day})"
        ))
    );

    Ok(())
}

/// Check that the horizon covers at least one full day
fn check_horizon_hours(value: usize) -> Result<()> {
    ensure!(
        value >= HOURS_PER_DAY,
        ConfigurationError::Invalid(format!(
            "horizon_hours must be at least {HOURS_PER_DAY}, got {value}"
        ))
    );

    Ok(())
}

/// Check that a parameter is a finite, non-negative number
fn check_non_negative(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a finite number greater than or equal to zero"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_days(self.start_day, self.last_day)?;
        check_horizon_hours(self.horizon_hours)?;

        // transmission_loss, n1_criterion and spin_margin already validated with
        // deserialise_proportion

        check_non_negative("reserve_margin", self.reserve_margin)?;
        check_non_negative("hydro_import_cost", self.hydro_import_cost.value())?;
        ensure!(
            self.big_m.is_finite() && self.big_m > 0.0,
            "big_m must be a finite number greater than zero"
        );
        check_non_negative("solver.mip_rel_gap", self.solver.mip_rel_gap)?;
        if let Some(time_limit) = self.solver.time_limit {
            ensure!(
                time_limit.is_finite() && time_limit > 0.0,
                "solver.time_limit must be a finite number greater than zero"
            );
        }

        if self.on_solve_failure == SolveFailurePolicy::HoldPreviousState {
            warn!(
                "on_solve_failure is set to 'hold_previous_state'. Days which can't be solved \
                will be missing from the results."
            );
        }
        if self.n1_criterion == 0.0 {
            warn!("n1_criterion is zero, so no power can flow on any line");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::model_parameters;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_check_days() {
        assert!(check_days(1, 1).is_ok());
        assert!(check_days(3, 365).is_ok());
        assert!(check_days(0, 1).is_err());
        assert!(check_days(5, 4).is_err());
    }

    #[test]
    fn test_day_and_horizon_errors_are_typed() {
        let err = check_days(5, 4).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigurationError>(),
            Some(&ConfigurationError::Invalid(
                "last_day (4) must not be before start_day (5)".into()
            ))
        );

        let err = check_horizon_hours(12).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigurationError>(),
            Some(&ConfigurationError::Invalid(
                "horizon_hours must be at least 24, got 12".into()
            ))
        );
    }

    #[test]
    fn test_model_params_from_path_typed_error() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "year = 2016\nlast_day = 3\nreference_node = \"GS1\"\nhorizon_hours = 12"
            )
            .unwrap();
        }

        // The typed error survives the file context
        let err = ModelParameters::from_path(dir.path()).unwrap_err();
        assert!(err.downcast_ref::<ConfigurationError>().is_some());
    }

    #[rstest]
    #[case(24, true)]
    #[case(48, true)]
    #[case(23, false)]
    #[case(0, false)]
    fn test_check_horizon_hours(#[case] value: usize, #[case] valid: bool) {
        assert_eq!(check_horizon_hours(value).is_ok(), valid);
    }

    #[rstest]
    fn test_validate(mut model_parameters: ModelParameters) {
        assert!(model_parameters.validate().is_ok());

        model_parameters.big_m = 0.0;
        assert!(model_parameters.validate().is_err());
    }

    #[test]
    fn test_model_params_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "year = 2016\nlast_day = 3\nreference_node = \"GS1\"\n\n[solver]\ntime_limit = 60.0\n\n[constraints]\nramp_rate = false"
            )
            .unwrap();
        }

        let params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(params.year, 2016);
        assert_eq!(params.start_day, 1);
        assert_eq!(params.last_day, 3);
        assert_eq!(params.horizon_hours, 24);
        assert_eq!(params.reference_node, "GS1");
        assert_eq!(params.transmission_loss, 0.075);
        assert_eq!(params.big_m, 1e5);
        assert_eq!(params.on_solve_failure, SolveFailurePolicy::Abort);
        assert_eq!(params.solver.time_limit, Some(60.0));
        assert_eq!(params.solver.timeout_retries, 1);
        assert!(!params.constraints.ramp_rate);
        assert!(params.constraints.logical);
    }

    #[test]
    fn test_model_params_bad_proportion() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "year = 2016\nlast_day = 3\nreference_node = \"GS1\"\nn1_criterion = 1.5"
            )
            .unwrap();
        }

        assert!(ModelParameters::from_path(dir.path()).is_err());
    }

    #[test]
    fn test_solve_failure_policy_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: SolveFailurePolicy,
        }
        let wrapper: Wrapper = toml::from_str("policy = \"hold_previous_state\"").unwrap();
        assert_eq!(wrapper.policy, SolveFailurePolicy::HoldPreviousState);
    }
}
