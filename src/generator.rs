//! Dispatchable generating units.
use crate::error::ValidationError;
use crate::fuel::FuelID;
use crate::id::{define_id_getter, define_id_type};
use crate::node::NodeID;
use crate::units::{Dimensionless, MoneyPerCapacity, MoneyPerEnergy, Power};
use anyhow::Result;
use indexmap::IndexMap;

define_id_type! {GeneratorID}

/// A map of [`Generator`]s, keyed by generator ID
pub type GeneratorMap = IndexMap<GeneratorID, Generator>;

/// A dispatchable generating unit (thermal plant, import link or slack unit)
#[derive(PartialEq, Debug, Clone)]
pub struct Generator {
    /// Unique identifier
    pub id: GeneratorID,
    /// The node the unit is connected to
    pub node_id: NodeID,
    /// The fuel/operating category of the unit
    pub fuel_id: FuelID,
    /// Nameplate capacity
    pub max_capacity: Power,
    /// Minimum stable output when on
    pub min_capacity: Power,
    /// Fuel used per MWh produced
    pub heat_rate: Dimensionless,
    /// Variable operation and maintenance cost
    pub var_om: MoneyPerEnergy,
    /// Fixed operation and maintenance cost, per MW of capacity per hour on
    pub fix_om: MoneyPerCapacity,
    /// Start-up cost, per MW of capacity
    pub startup_cost: MoneyPerCapacity,
    /// Maximum change in output between consecutive hours
    pub ramp: Power,
    /// Minimum number of hours to stay on after starting
    pub min_up: u32,
    /// Minimum number of hours to stay off after stopping
    pub min_down: u32,
    /// Availability factor for the simulation year, scaling the nameplate capacity
    pub derate: Dimensionless,
    /// Whether the unit is on at the start of the first simulated day
    pub initial_on: bool,
}
define_id_getter! {Generator, GeneratorID}

impl Generator {
    /// The maximum output of the unit once derated
    pub fn available_capacity(&self) -> Power {
        self.max_capacity * self.derate
    }

    /// Check that the unit's parameters are physically meaningful
    pub fn validate(&self) -> Result<()> {
        let id = || self.id.to_string();
        let check_non_negative = |what, value: f64| -> Result<()> {
            if value < 0.0 || value.is_nan() {
                Err(ValidationError::Negative {
                    what,
                    id: id(),
                    value,
                })?;
            }
            Ok(())
        };

        check_non_negative("max_capacity", self.max_capacity.value())?;
        check_non_negative("min_capacity", self.min_capacity.value())?;
        check_non_negative("ramp", self.ramp.value())?;
        check_non_negative("heat_rate", self.heat_rate.value())?;

        if self.min_capacity > self.max_capacity {
            Err(ValidationError::MinAboveMax {
                id: id(),
                min: self.min_capacity.value(),
                max: self.max_capacity.value(),
            })?;
        }

        if !(self.derate.value() > 0.0 && self.derate.value() <= 1.0) {
            Err(ValidationError::DerateOutOfRange {
                id: id(),
                value: self.derate.value(),
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::generator;
    use rstest::rstest;

    #[rstest]
    fn test_validate_ok(generator: Generator) {
        assert!(generator.validate().is_ok());
    }

    #[rstest]
    fn test_validate_min_above_max(mut generator: Generator) {
        generator.min_capacity = Power(150.0);
        let err = generator.validate().unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::MinAboveMax {
                id: "G1".into(),
                min: 150.0,
                max: 100.0
            })
        );
    }

    #[rstest]
    fn test_validate_negative_capacity(mut generator: Generator) {
        generator.max_capacity = Power(-1.0);
        generator.min_capacity = Power(-2.0);
        assert!(generator.validate().is_err());
    }

    #[rstest]
    #[case(0.0, false)]
    #[case(0.5, true)]
    #[case(1.0, true)]
    #[case(1.1, false)]
    fn test_validate_derate(mut generator: Generator, #[case] derate: f64, #[case] ok: bool) {
        generator.derate = Dimensionless(derate);
        assert_eq!(generator.validate().is_ok(), ok);
    }
}
