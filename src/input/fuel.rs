//! Code for reading fuel categories from a CSV file.
use super::*;
use crate::fuel::FuelMap;
use std::path::Path;

const FUELS_FILE_NAME: &str = "fuels.csv";

/// Read fuel categories from a CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A map of fuel categories, keyed by ID, in the order they appear in the file
pub fn read_fuels(model_dir: &Path) -> Result<FuelMap> {
    let file_path = model_dir.join(FUELS_FILE_NAME);
    let fuels: FuelMap = read_csv_id_file(&file_path)?;
    for fuel in fuels.values() {
        ensure!(
            fuel.unit_cost.is_finite() && fuel.unit_cost.value() >= 0.0,
            "{}: unit_cost for fuel {} must be non-negative",
            input_err_msg(&file_path),
            fuel.id
        );
    }

    Ok(fuels)
}
