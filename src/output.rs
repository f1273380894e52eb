//! The module responsible for writing output data to disk.
use crate::generator::GeneratorID;
use crate::node::NodeID;
use crate::simulation::results::{GeneratorSeries, NodeSeries, ResultSink};
use crate::topology::Topology;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

pub mod metadata;
pub use metadata::write_metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "gridplan_results";

/// The output file name for the objective value of each day
const SYSTEM_COST_FILE_NAME: &str = "system_cost.csv";

/// Get the default output folder for the model at the specified path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory.
///
/// If the directory exists and is not empty, it is only reused if `allow_overwrite` is set.
///
/// # Returns
///
/// Whether an existing, non-empty directory will be overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let is_empty = match fs::read_dir(output_dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) if !output_dir.exists() => true,
        Err(err) => Err(err)?,
    };

    if !is_empty {
        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Use --overwrite to replace it."
        );

        fs::remove_dir_all(output_dir)?;
    }

    fs::create_dir_all(output_dir)?;

    Ok(!is_empty)
}

/// Represents a row in a per-generator output file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct GeneratorRow {
    generator_id: GeneratorID,
    hour: usize,
    value: f64,
}

/// Represents a row in a per-node output file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct NodeRow {
    node_id: NodeID,
    hour: usize,
    value: f64,
}

/// Represents a row in the system cost file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SystemCostRow {
    day: u32,
    objective: f64,
}

/// Writes each result series to its own CSV file
pub struct DataWriter {
    generator_writers: IndexMap<GeneratorSeries, csv::Writer<File>>,
    node_writers: IndexMap<NodeSeries, csv::Writer<File>>,
    system_cost_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to.
    ///
    /// Files for a resource are only created if the topology has nodes of that kind.
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `topology` - The grid whose results will be written
    pub fn create(output_path: &Path, topology: &Topology) -> Result<Self> {
        let new_writer = |name: &str| {
            let file_path = output_path.join(format!("{name}.csv"));
            csv::Writer::from_path(&file_path)
                .with_context(|| format!("Could not create {}", file_path.display()))
        };

        let generator_writers = GeneratorSeries::iter()
            .map(|series| Ok((series, new_writer(series.name())?)))
            .collect::<Result<_>>()?;
        let node_writers = NodeSeries::iter()
            .filter(|series| match series {
                NodeSeries::Resource(kind) => !topology.nodes_in(kind.node_category()).is_empty(),
                NodeSeries::VoltageAngle => true,
            })
            .map(|series| Ok((series, new_writer(series.name())?)))
            .collect::<Result<_>>()?;

        Ok(Self {
            generator_writers,
            node_writers,
            system_cost_writer: csv::Writer::from_path(output_path.join(SYSTEM_COST_FILE_NAME))?,
        })
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        for writer in self.generator_writers.values_mut() {
            writer.flush()?;
        }
        for writer in self.node_writers.values_mut() {
            writer.flush()?;
        }
        self.system_cost_writer.flush()?;

        Ok(())
    }
}

impl ResultSink for DataWriter {
    fn record_generator(
        &mut self,
        series: GeneratorSeries,
        id: &GeneratorID,
        hour: usize,
        value: f64,
    ) -> Result<()> {
        let row = GeneratorRow {
            generator_id: id.clone(),
            hour,
            value,
        };
        self.generator_writers[&series].serialize(row)?;

        Ok(())
    }

    fn record_node(
        &mut self,
        series: NodeSeries,
        id: &NodeID,
        hour: usize,
        value: f64,
    ) -> Result<()> {
        let row = NodeRow {
            node_id: id.clone(),
            hour,
            value,
        };
        self.node_writers
            .get_mut(&series)
            .with_context(|| format!("No {} output for node {id}", series.name()))?
            .serialize(row)?;

        Ok(())
    }

    fn record_objective(&mut self, day: u32, objective: f64) -> Result<()> {
        self.system_cost_writer
            .serialize(SystemCostRow { day, objective })?;

        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{fuels, generators, links, nodes, topology};
    use crate::fuel::FuelMap;
    use crate::generator::GeneratorMap;
    use crate::network::TransmissionLink;
    use crate::node::{Node, NodeCategory, NodeMap, ResourceKind};
    use crate::units::{Dimensionless, Power};
    use itertools::{Itertools, assert_equal};
    use rstest::{fixture, rstest};
    use std::iter;
    use tempfile::tempdir;

    /// The fixture grid plus a hydro import point linked to node A
    #[fixture]
    fn topology_with_import(
        fuels: FuelMap,
        mut nodes: NodeMap,
        generators: GeneratorMap,
        mut links: Vec<TransmissionLink>,
    ) -> Topology {
        let node = Node {
            id: "HI1".into(),
            category: NodeCategory::HydroImport,
        };
        nodes.insert(node.id.clone(), node);
        links.push(TransmissionLink {
            source: "HI1".into(),
            sink: "A".into(),
            capacity: Power(100.0),
            susceptance: Dimensionless(10.0),
        });
        Topology::new(fuels, nodes, generators, &links, "A").unwrap()
    }

    #[rstest]
    fn test_creates_files(topology_with_import: Topology) {
        let dir = tempdir().unwrap();
        DataWriter::create(dir.path(), &topology_with_import).unwrap();

        for name in [
            "dispatch.csv",
            "on.csv",
            "switch.csv",
            "spinning_reserve.csv",
            "non_spinning_reserve.csv",
            "hydro_import.csv",
            "voltage_angle.csv",
            "system_cost.csv",
        ] {
            assert!(dir.path().join(name).is_file(), "{name} not created");
        }
        for name in ["hydro.csv", "solar.csv", "wind.csv"] {
            assert!(!dir.path().join(name).exists(), "{name} created");
        }
    }

    #[rstest]
    fn test_no_resource_files_without_resource_nodes(topology: Topology) {
        let dir = tempdir().unwrap();
        let mut writer = DataWriter::create(dir.path(), &topology).unwrap();
        for kind in ResourceKind::iter() {
            assert!(!dir.path().join(format!("{}.csv", kind.name())).exists());
        }
        assert!(
            writer
                .record_node(NodeSeries::Resource(ResourceKind::Wind), &"W1".into(), 1, 5.0)
                .is_err()
        );
    }

    #[rstest]
    fn test_write_generator_series(topology: Topology) {
        let dir = tempdir().unwrap();

        {
            let mut writer = DataWriter::create(dir.path(), &topology).unwrap();
            writer
                .record_generator(GeneratorSeries::Dispatch, &"G1".into(), 25, 60.0)
                .unwrap();
            writer.finish().unwrap();
        }

        // Read back and compare
        let expected = GeneratorRow {
            generator_id: "G1".into(),
            hour: 25,
            value: 60.0,
        };
        let records: Vec<GeneratorRow> = csv::Reader::from_path(dir.path().join("dispatch.csv"))
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap();
        assert_equal(records, iter::once(expected));
    }

    #[rstest]
    fn test_write_node_series(topology_with_import: Topology) {
        let dir = tempdir().unwrap();

        {
            let mut writer = DataWriter::create(dir.path(), &topology_with_import).unwrap();
            writer
                .record_node(
                    NodeSeries::Resource(ResourceKind::HydroImport),
                    &"HI1".into(),
                    3,
                    12.5,
                )
                .unwrap();
            writer.finish().unwrap();
        }

        let expected = NodeRow {
            node_id: "HI1".into(),
            hour: 3,
            value: 12.5,
        };
        let records: Vec<NodeRow> = csv::Reader::from_path(dir.path().join("hydro_import.csv"))
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap();
        assert_equal(records, iter::once(expected));
    }

    #[rstest]
    fn test_write_system_cost(topology: Topology) {
        let dir = tempdir().unwrap();

        {
            let mut writer = DataWriter::create(dir.path(), &topology).unwrap();
            writer.record_objective(1, 14400.0).unwrap();
            writer.record_objective(2, 14000.0).unwrap();
            writer.finish().unwrap();
        }

        let records: Vec<SystemCostRow> =
            csv::Reader::from_path(dir.path().join(SYSTEM_COST_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert_equal(
            records,
            [
                SystemCostRow {
                    day: 1,
                    objective: 14400.0,
                },
                SystemCostRow {
                    day: 2,
                    objective: 14000.0,
                },
            ],
        );
    }

    #[test]
    fn test_create_output_directory_new() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());
    }

    #[test]
    fn test_create_output_directory_existing() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");
        fs::create_dir(&output_dir).unwrap();
        fs::write(output_dir.join("dispatch.csv"), "old").unwrap();

        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(output_dir.is_dir());
        assert!(!output_dir.join("dispatch.csv").exists());
    }

    #[test]
    fn test_create_output_directory_empty() {
        let dir = tempdir().unwrap();
        assert!(!create_output_directory(dir.path(), false).unwrap());
    }
}
