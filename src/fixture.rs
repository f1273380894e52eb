//! Fixtures for tests
//!
//! The fixture grid has three nodes: `A` hosts two generators and has demand, `B` is a substation
//! with demand and `C` is a substation without demand. `A` is the reference bus.
use crate::fuel::{CostModel, FuelCategory, FuelMap};
use crate::generator::{Generator, GeneratorMap};
use crate::model::{ConstraintGroups, Model, ModelParameters, SolverParameters};
use crate::network::TransmissionLink;
use crate::node::{Node, NodeCategory, NodeMap};
use crate::time_series::TimeSeriesStore;
use crate::topology::Topology;
use crate::units::{Dimensionless, MoneyPerCapacity, MoneyPerEnergy, Power};
use indexmap::{IndexMap, indexmap};
use rstest::fixture;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn fuels() -> FuelMap {
    [
        FuelCategory {
            id: "coal".into(),
            cost_model: CostModel::Thermal,
            unit_cost: MoneyPerEnergy(10.0),
            reserve_eligible: true,
        },
        FuelCategory {
            id: "import".into(),
            cost_model: CostModel::Import,
            unit_cost: MoneyPerEnergy(50.0),
            reserve_eligible: false,
        },
    ]
    .into_iter()
    .map(|fuel| (fuel.id.clone(), fuel))
    .collect()
}

#[fixture]
pub fn nodes() -> NodeMap {
    [
        ("A", NodeCategory::GenerationWithDemand),
        ("B", NodeCategory::TransformerWithDemand),
        ("C", NodeCategory::TransformerWithoutDemand),
    ]
    .into_iter()
    .map(|(id, category)| {
        let node = Node {
            id: id.into(),
            category,
        };
        (node.id.clone(), node)
    })
    .collect()
}

#[fixture]
pub fn generator() -> Generator {
    Generator {
        id: "G1".into(),
        node_id: "A".into(),
        fuel_id: "coal".into(),
        max_capacity: Power(100.0),
        min_capacity: Power(20.0),
        heat_rate: Dimensionless(1.0),
        var_om: MoneyPerEnergy(0.0),
        fix_om: MoneyPerCapacity(0.0),
        startup_cost: MoneyPerCapacity(0.0),
        ramp: Power(100.0),
        min_up: 1,
        min_down: 1,
        derate: Dimensionless(1.0),
        initial_on: false,
    }
}

#[fixture]
pub fn generators(generator: Generator) -> GeneratorMap {
    let g2 = Generator {
        id: "G2".into(),
        fuel_id: "import".into(),
        max_capacity: Power(50.0),
        min_capacity: Power(0.0),
        ramp: Power(50.0),
        ..generator.clone()
    };
    indexmap! {
        generator.id.clone() => generator,
        g2.id.clone() => g2,
    }
}

#[fixture]
pub fn links() -> Vec<TransmissionLink> {
    vec![
        TransmissionLink {
            source: "A".into(),
            sink: "B".into(),
            capacity: Power(200.0),
            susceptance: Dimensionless(10.0),
        },
        TransmissionLink {
            source: "B".into(),
            sink: "C".into(),
            capacity: Power(200.0),
            susceptance: Dimensionless(10.0),
        },
    ]
}

#[fixture]
pub fn topology(
    fuels: FuelMap,
    nodes: NodeMap,
    generators: GeneratorMap,
    links: Vec<TransmissionLink>,
) -> Topology {
    Topology::new(fuels, nodes, generators, &links, "A").unwrap()
}

/// Two days of hourly data: 30 MW at each demand node and a 10 MW reserve requirement
#[fixture]
pub fn time_series() -> TimeSeriesStore {
    let demand: IndexMap<_, _> = ["A", "B"]
        .into_iter()
        .map(|id| (id.into(), vec![30.0; 48]))
        .collect();
    TimeSeriesStore::new(demand, IndexMap::new(), vec![10.0; 48]).unwrap()
}

#[fixture]
pub fn model_parameters() -> ModelParameters {
    ModelParameters {
        year: 2016,
        start_day: 1,
        last_day: 2,
        horizon_hours: 24,
        reference_node: "A".into(),
        transmission_loss: 0.0,
        n1_criterion: 1.0,
        spin_margin: 0.5,
        reserve_margin: 0.15,
        hydro_import_cost: MoneyPerEnergy(48.0),
        big_m: 1e5,
        on_solve_failure: Default::default(),
        solver: SolverParameters {
            mip_rel_gap: 0.0,
            ..Default::default()
        },
        constraints: ConstraintGroups::default(),
    }
}

#[fixture]
pub fn model(
    model_parameters: ModelParameters,
    topology: Topology,
    time_series: TimeSeriesStore,
) -> Model {
    Model {
        model_path: PathBuf::from("fixture"),
        parameters: model_parameters,
        topology,
        time_series,
    }
}
