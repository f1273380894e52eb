//! Common routines for handling input data.
use crate::id::{HasID, IDLike};
use crate::model::{Model, ModelParameters};
use crate::topology::Topology;
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use log::info;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fmt::Display;
use std::fs;
use std::path::Path;

mod fuel;
use fuel::read_fuels;
mod generator;
use generator::read_generators;
mod line;
use line::read_lines;
mod node;
use node::read_nodes;
mod time_series;
use time_series::read_time_series;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    ensure!(!vec.is_empty(), "CSV file {} cannot be empty", file_path.display());

    Ok(vec.into_iter())
}

/// Read a series of type `T`s from a CSV file.
///
/// Returns an empty iterator if the file doesn't exist.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv_optional<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    if !file_path.exists() {
        return Ok(Vec::new().into_iter());
    }

    let vec = read_csv_internal(file_path)?;
    Ok(vec.into_iter())
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec: Vec<T> = csv::Reader::from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read an f64, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value must be between 0 and 1"))?;
    }

    Ok(value)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read a CSV file of items with IDs.
///
/// As this function is only ever used for top-level CSV files (i.e. the ones which actually define
/// the IDs for a given type), we use an ordered map to maintain the order in the input files.
pub fn read_csv_id_file<T, ID>(file_path: &Path) -> Result<IndexMap<ID, T>>
where
    T: HasID<ID> + DeserializeOwned,
    ID: IDLike,
{
    fn fill_and_validate_map<T, ID>(file_path: &Path) -> Result<IndexMap<ID, T>>
    where
        T: HasID<ID> + DeserializeOwned,
        ID: IDLike,
    {
        let mut map = IndexMap::new();
        for record in read_csv::<T>(file_path)? {
            let id = record.get_id().clone();
            let existing = map.insert(id.clone(), record).is_some();
            ensure!(!existing, "Duplicate ID found: {id}");
        }

        Ok(map)
    }

    fill_and_validate_map(file_path).with_context(|| input_err_msg(file_path))
}

/// Insert a key-value pair into a map, raising an error if the key already exists
pub fn try_insert<K, V>(map: &mut IndexMap<K, V>, key: K, value: V) -> Result<()>
where
    K: Eq + std::hash::Hash + Clone + Display,
{
    let existing = map.insert(key.clone(), value).is_some();
    ensure!(!existing, "Key {key} already exists in the map");
    Ok(())
}

/// Read a wide-format hourly CSV file.
///
/// The first column must be called `hour` and count up from 1 without gaps. Each remaining column
/// holds one series, named by its header.
pub fn read_wide_csv(file_path: &Path) -> Result<IndexMap<String, Vec<f64>>> {
    fn read_inner(file_path: &Path) -> Result<IndexMap<String, Vec<f64>>> {
        let mut reader = csv::Reader::from_path(file_path)?;
        let headers = reader.headers()?.clone();
        ensure!(
            headers.get(0) == Some("hour"),
            "The first column must be called \"hour\""
        );

        let mut columns: IndexMap<String, Vec<f64>> = IndexMap::new();
        for name in headers.iter().skip(1) {
            try_insert(&mut columns, name.to_string(), Vec::new())
                .with_context(|| format!("Duplicate column {name}"))?;
        }

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let hour: usize = record[0]
                .trim()
                .parse()
                .with_context(|| format!("Invalid hour: {}", &record[0]))?;
            if hour != row + 1 {
                bail!("Hours must count up from 1 without gaps, found hour {hour} on row {row}");
            }

            for ((name, values), field) in columns.iter_mut().zip(record.iter().skip(1)) {
                let value: f64 = field
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid value for {name} at hour {hour}: {field}"))?;
                ensure!(
                    value.is_finite() && value >= 0.0,
                    "Value for {name} at hour {hour} must be non-negative, got {value}"
                );
                values.push(value);
            }
        }
        ensure!(
            columns.values().next().is_none_or(|values| !values.is_empty()),
            "File contains no data rows"
        );

        Ok(columns)
    }

    read_inner(file_path).with_context(|| input_err_msg(file_path))
}

/// Read a model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The static model data or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;

    let fuels = read_fuels(model_dir)?;
    let nodes = read_nodes(model_dir)?;
    let generators = read_generators(model_dir, parameters.year)?;
    let links = read_lines(model_dir, &nodes)?;
    let topology = Topology::new(
        fuels,
        nodes,
        generators,
        &links,
        &parameters.reference_node,
    )?;

    let time_series = read_time_series(model_dir, &topology, parameters.reserve_margin)?;
    time_series.check_complete(&topology)?;
    time_series.check_covers(parameters.last_day, parameters.horizon_hours)?;

    info!(
        "Loaded {} generators at {} nodes with {} hours of time series data",
        topology.generators.len(),
        topology.nodes.len(),
        time_series.len()
    );

    Ok(Model {
        model_path: model_dir.to_path_buf(),
        parameters,
        topology,
        time_series,
    })
}
