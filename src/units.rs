//! This module defines various unit types and their conversions.
//!
//! Quantities are hourly, so a power level held for one hour is also the energy produced in that
//! hour (MW ≡ MWh per time step).
use serde::{Deserialize, Serialize};

/// Represents a dimensionless quantity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::Display,
)]
pub struct Dimensionless(pub f64);

impl Dimensionless {
    /// Create a new dimensionless value
    pub fn new(val: f64) -> Self {
        Self(val)
    }

    /// The underlying value as a f64
    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether the value is finite
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::Display,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Creates a new instance of the unit type from a f64 value.
            pub fn new(val: f64) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a f64.
            pub fn value(self) -> f64 {
                self.0
            }

            /// Whether the value is finite
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                $name(iter.map(|x| x.0).sum())
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

// Base quantities
unit_struct!(Money);
unit_struct!(Power);

// Derived quantities
unit_struct!(MoneyPerEnergy);
unit_struct!(MoneyPerCapacity);

/// Susceptance of a transmission line, in per-unit on the system base
pub type Susceptance = Dimensionless;

// Multiplication rules
impl_mul!(MoneyPerEnergy, Power, Money);
impl_mul!(MoneyPerCapacity, Power, Money);

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_unit_arithmetic() {
        let cost = MoneyPerEnergy(5.0) * Power(10.0);
        assert_approx_eq!(f64, cost.value(), 50.0);

        let derated = Power(100.0) * Dimensionless(0.8);
        assert_approx_eq!(f64, derated.value(), 80.0);

        let total: Power = [Power(1.0), Power(2.5)].into_iter().sum();
        assert_approx_eq!(f64, total.value(), 3.5);
    }
}
