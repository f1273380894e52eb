//! Code for reading network nodes from a CSV file.
use super::*;
use crate::node::NodeMap;
use std::path::Path;

const NODES_FILE_NAME: &str = "nodes.csv";

/// Read nodes from a CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A map of nodes, keyed by ID, in the order they appear in the file
pub fn read_nodes(model_dir: &Path) -> Result<NodeMap> {
    read_csv_id_file(&model_dir.join(NODES_FILE_NAME))
}
