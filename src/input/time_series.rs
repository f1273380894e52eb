//! Code for reading hourly demand, availability and reserve series.
use super::*;
use crate::error::ConfigurationError;
use crate::id::IDCollection;
use crate::node::{Node, NodeMap};
use crate::time_series::{NodeSeriesMap, TimeSeriesStore};
use serde::Deserialize;
use std::path::Path;

const DEMAND_FILE_NAME: &str = "demand.csv";
const AVAILABILITY_FILE_NAME: &str = "availability.csv";
const RESERVES_FILE_NAME: &str = "reserves.csv";

/// Represents a row of the reserves CSV file
#[derive(PartialEq, Debug, Deserialize)]
struct ReserveRaw {
    hour: usize,
    requirement: f64,
}

/// Read the hourly input series.
///
/// If no reserves file is present, the reserve requirement in each hour is `reserve_margin` times
/// total demand in that hour.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `topology` - The grid the series belong to
/// * `reserve_margin` - Reserve requirement as a fraction of demand
pub fn read_time_series(
    model_dir: &Path,
    topology: &Topology,
    reserve_margin: f64,
) -> Result<TimeSeriesStore> {
    let file_path = model_dir.join(DEMAND_FILE_NAME);
    let demand = read_node_series(&file_path, &topology.nodes, |node| {
        node.category.has_demand()
    })?;

    let file_path = model_dir.join(AVAILABILITY_FILE_NAME);
    let availability = if file_path.exists() {
        read_node_series(&file_path, &topology.nodes, |node| {
            node.category.resource().is_some()
        })?
    } else {
        NodeSeriesMap::new()
    };

    let file_path = model_dir.join(RESERVES_FILE_NAME);
    let reserves = if file_path.exists() {
        let reserves_csv = read_csv(&file_path)?;
        read_reserves_from_iter(reserves_csv).with_context(|| input_err_msg(&file_path))?
    } else {
        info!("No reserves file found; using {reserve_margin} of total demand as reserve");
        derive_reserves(&demand, &availability, reserve_margin)?
    };

    TimeSeriesStore::new(demand, availability, reserves)
}

/// Read a wide-format file with one column per node, checking each column names a suitable node
fn read_node_series<F>(file_path: &Path, nodes: &NodeMap, accept: F) -> Result<NodeSeriesMap>
where
    F: Fn(&Node) -> bool,
{
    let columns = read_wide_csv(file_path)?;
    columns
        .into_iter()
        .map(|(name, values)| {
            let id = nodes
                .get_id_by_str(&name)
                .with_context(|| format!("Column {name} is not a known node"))?;
            ensure!(
                accept(&nodes[&id]),
                "Node {id} doesn't take a series of this kind"
            );
            Ok((id, values))
        })
        .try_collect::<_, NodeSeriesMap, _>()
        .with_context(|| input_err_msg(file_path))
}

fn read_reserves_from_iter<I>(iter: I) -> Result<Vec<f64>>
where
    I: Iterator<Item = ReserveRaw>,
{
    iter.enumerate()
        .map(|(row, raw)| {
            ensure!(
                raw.hour == row + 1,
                "Hours must count up from 1 without gaps, found hour {} on row {row}",
                raw.hour
            );
            ensure!(
                raw.requirement.is_finite() && raw.requirement >= 0.0,
                "Reserve requirement at hour {} must be non-negative",
                raw.hour
            );
            Ok(raw.requirement)
        })
        .try_collect()
}

/// Calculate the reserve requirement as a fraction of total demand in each hour.
///
/// The series covers as many hours as the demand series, or the availability series if no node
/// has demand.
fn derive_reserves(
    demand: &NodeSeriesMap,
    availability: &NodeSeriesMap,
    reserve_margin: f64,
) -> Result<Vec<f64>> {
    let len = demand
        .values()
        .chain(availability.values())
        .map(Vec::len)
        .max()
        .unwrap_or_default();
    ensure!(
        len > 0,
        ConfigurationError::Invalid(format!(
            "No demand or availability series to derive reserves from; provide {RESERVES_FILE_NAME}"
        ))
    );

    Ok((0..len)
        .map(|hour| {
            let total: f64 = demand.values().filter_map(|series| series.get(hour)).sum();
            reserve_margin * total
        })
        .collect())
}
