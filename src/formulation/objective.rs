//! Objective coefficients: the cost of each variable in one decision hour.
use crate::generator::GeneratorID;
use crate::node::ResourceKind;
use crate::topology::Topology;
use crate::units::MoneyPerEnergy;
use indexmap::IndexMap;

/// Cost per unit of each cost-bearing variable, for one hour
#[derive(Debug, Clone, PartialEq)]
pub struct CostCoefficients {
    /// Cost of keeping a generator on: fixed O&M on its full capacity
    pub commitment: IndexMap<GeneratorID, f64>,
    /// Cost of starting a generator, on its full capacity
    pub startup: IndexMap<GeneratorID, f64>,
    /// Cost per MWh dispatched, following the generator's fuel cost model
    pub dispatch: IndexMap<GeneratorID, f64>,
    hydro_import_cost: MoneyPerEnergy,
}

impl CostCoefficients {
    /// Calculate coefficients for every generator
    pub fn new(topology: &Topology, hydro_import_cost: MoneyPerEnergy) -> Self {
        let commitment = topology
            .generators
            .values()
            .map(|g| (g.id.clone(), (g.fix_om * g.max_capacity).value()))
            .collect();
        let startup = topology
            .generators
            .values()
            .map(|g| (g.id.clone(), (g.startup_cost * g.max_capacity).value()))
            .collect();

        // Only categories which have generators contribute
        let dispatch = topology
            .iter_fuel_partition()
            .flat_map(|(_, ids)| ids)
            .map(|id| {
                let cost = topology.energy_cost(topology.generator(id));
                (id.clone(), cost.value())
            })
            .collect();

        Self {
            commitment,
            startup,
            dispatch,
            hydro_import_cost,
        }
    }

    /// Cost per MWh of a variable resource. Only imported hydropower is priced.
    pub fn resource(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::HydroImport => self.hydro_import_cost.value(),
            ResourceKind::Hydro | ResourceKind::Solar | ResourceKind::Wind => 0.0,
        }
    }
}
