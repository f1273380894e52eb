//! Code for reading generators and their derate factors from CSV files.
use super::*;
use crate::generator::{Generator, GeneratorID, GeneratorMap};
use crate::id::IDCollection;
use crate::units::{Dimensionless, MoneyPerCapacity, MoneyPerEnergy, Power};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const GENERATORS_FILE_NAME: &str = "generators.csv";
const GENERATOR_DERATES_FILE_NAME: &str = "generator_derates.csv";

/// Represents a row of the generators CSV file
#[derive(PartialEq, Debug, Deserialize)]
struct GeneratorRaw {
    id: GeneratorID,
    node_id: String,
    fuel_id: String,
    max_capacity: Power,
    min_capacity: Power,
    heat_rate: Dimensionless,
    var_om: MoneyPerEnergy,
    fix_om: MoneyPerCapacity,
    startup_cost: MoneyPerCapacity,
    ramp: Power,
    min_up: u32,
    min_down: u32,
    #[serde(default)]
    initial_on: Option<bool>,
}

/// Represents a row of the generator derates CSV file
#[derive(PartialEq, Debug, Deserialize)]
struct GeneratorDerateRaw {
    generator_id: String,
    year: u32,
    value: Dimensionless,
}

/// Read generators from the model directory.
///
/// Derate factors are taken from the optional derates file for the simulated year; generators
/// without an entry for that year are not derated.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `year` - The simulated year
pub fn read_generators(model_dir: &Path, year: u32) -> Result<GeneratorMap> {
    let file_path = model_dir.join(GENERATORS_FILE_NAME);
    let generators_csv = read_csv(&file_path)?;
    let mut generators =
        read_generators_from_iter(generators_csv).with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(GENERATOR_DERATES_FILE_NAME);
    let derates_csv = read_csv_optional(&file_path)?;
    apply_derates_from_iter(derates_csv, &mut generators, year)
        .with_context(|| input_err_msg(&file_path))?;

    for generator in generators.values() {
        generator
            .validate()
            .with_context(|| format!("Invalid parameters for generator {}", generator.id))?;
    }

    Ok(generators)
}

fn read_generators_from_iter<I>(iter: I) -> Result<GeneratorMap>
where
    I: Iterator<Item = GeneratorRaw>,
{
    let mut generators = GeneratorMap::new();
    for raw in iter {
        let generator = Generator {
            id: raw.id.clone(),
            node_id: raw.node_id.into(),
            fuel_id: raw.fuel_id.into(),
            max_capacity: raw.max_capacity,
            min_capacity: raw.min_capacity,
            heat_rate: raw.heat_rate,
            var_om: raw.var_om,
            fix_om: raw.fix_om,
            startup_cost: raw.startup_cost,
            ramp: raw.ramp,
            min_up: raw.min_up,
            min_down: raw.min_down,
            derate: Dimensionless(1.0),
            initial_on: raw.initial_on.unwrap_or_default(),
        };
        try_insert(&mut generators, raw.id, generator)?;
    }

    Ok(generators)
}

fn apply_derates_from_iter<I>(iter: I, generators: &mut GeneratorMap, year: u32) -> Result<()>
where
    I: Iterator<Item = GeneratorDerateRaw>,
{
    let mut derates = HashMap::new();
    for raw in iter {
        let id = generators.get_id_by_str(&raw.generator_id)?;
        if raw.year != year {
            continue;
        }

        ensure!(
            derates.insert(id.clone(), raw.value).is_none(),
            "More than one derate factor given for generator {id} in {year}"
        );
    }

    for (id, derate) in derates {
        generators[&id].derate = derate;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const HEADER: &str = "id,node_id,fuel_id,max_capacity,min_capacity,heat_rate,var_om,\
                          fix_om,startup_cost,ramp,min_up,min_down,initial_on";

    fn create_generators_file(dir_path: &Path, rows: &str) {
        let mut file = File::create(dir_path.join(GENERATORS_FILE_NAME)).unwrap();
        writeln!(file, "{HEADER}\n{rows}").unwrap();
    }

    fn create_derates_file(dir_path: &Path, rows: &str) {
        let mut file = File::create(dir_path.join(GENERATOR_DERATES_FILE_NAME)).unwrap();
        writeln!(file, "generator_id,year,value\n{rows}").unwrap();
    }

    #[test]
    fn test_read_generators() {
        let dir = tempdir().unwrap();
        create_generators_file(
            dir.path(),
            "G1,GS1,coal_st,100,20,10.5,2,1,5,50,4,2,true\nG2,GS1,imp_thai,50,0,0,0,0,0,50,1,1,",
        );
        create_derates_file(dir.path(), "G1,2016,0.8\nG1,2017,0.5\nG2,2017,0.9");

        let generators = read_generators(dir.path(), 2016).unwrap();
        let g1 = &generators["G1"];
        assert_eq!(g1.node_id, "GS1".into());
        assert_eq!(g1.max_capacity, Power(100.0));
        assert_eq!(g1.min_up, 4);
        assert_eq!(g1.derate, Dimensionless(0.8));
        assert!(g1.initial_on);

        let g2 = &generators["G2"];
        assert_eq!(g2.derate, Dimensionless(1.0));
        assert!(!g2.initial_on);
    }

    #[test]
    fn test_read_generators_min_above_max() {
        let dir = tempdir().unwrap();
        create_generators_file(dir.path(), "G1,GS1,coal_st,100,120,10,2,1,5,50,4,2,");

        let err = read_generators(dir.path(), 2016).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::MinAboveMax {
                id: "G1".into(),
                min: 120.0,
                max: 100.0
            })
        );
    }

    #[test]
    fn test_read_generators_bad_derate() {
        let dir = tempdir().unwrap();
        create_generators_file(dir.path(), "G1,GS1,coal_st,100,20,10,2,1,5,50,4,2,");
        create_derates_file(dir.path(), "G1,2016,1.5");
        assert!(read_generators(dir.path(), 2016).is_err());

        create_derates_file(dir.path(), "G9,2016,0.5");
        assert!(read_generators(dir.path(), 2016).is_err());

        create_derates_file(dir.path(), "G1,2016,0.5\nG1,2016,0.6");
        assert!(read_generators(dir.path(), 2016).is_err());
    }

    #[test]
    fn test_read_generators_duplicate() {
        let dir = tempdir().unwrap();
        create_generators_file(
            dir.path(),
            "G1,GS1,coal_st,100,20,10,2,1,5,50,4,2,\nG1,GS1,coal_st,100,20,10,2,1,5,50,4,2,",
        );
        assert!(read_generators(dir.path(), 2016).is_err());
    }
}
