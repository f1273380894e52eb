//! Fuel categories group generators by what they burn or where they import from.
//!
//! The set of categories is data-driven: whatever `fuels.csv` declares. Each category says how
//! the energy cost of its generators is calculated and whether they may offer reserve.
use crate::id::{define_id_getter, define_id_type};
use crate::units::{Dimensionless, MoneyPerEnergy};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;

define_id_type! {FuelID}

/// A map of [`FuelCategory`]s, keyed by fuel ID
pub type FuelMap = IndexMap<FuelID, FuelCategory>;

/// How the energy cost of generators in a category is calculated
#[derive(PartialEq, Eq, Debug, Clone, Copy, DeserializeLabeledStringEnum)]
pub enum CostModel {
    /// Heat rate times fuel cost, plus variable O&M
    #[string = "thermal"]
    Thermal,
    /// Import price only
    #[string = "import"]
    Import,
    /// Heat rate times fuel cost, without variable O&M
    #[string = "slack"]
    Slack,
}

/// A fuel or operating category (e.g. coal steam, oil internal combustion, imports)
#[derive(PartialEq, Debug, Clone, Deserialize)]
pub struct FuelCategory {
    /// Unique identifier (e.g. `coal_st`)
    pub id: FuelID,
    /// How generator energy costs are calculated
    pub cost_model: CostModel,
    /// Cost per unit of fuel (or per MWh for imports)
    pub unit_cost: MoneyPerEnergy,
    /// Whether generators of this category count towards the system reserve requirement
    pub reserve_eligible: bool,
}
define_id_getter! {FuelCategory, FuelID}

impl FuelCategory {
    /// The cost of one MWh from a generator with the given heat rate and variable O&M
    pub fn energy_cost(&self, heat_rate: Dimensionless, var_om: MoneyPerEnergy) -> MoneyPerEnergy {
        match self.cost_model {
            CostModel::Thermal => heat_rate * self.unit_cost + var_om,
            CostModel::Import => self.unit_cost,
            CostModel::Slack => heat_rate * self.unit_cost,
        }
    }
}
