//! Code for writing run metadata to file
use crate::model::Model;
use anyhow::{Result, anyhow};
use chrono::prelude::*;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

/// Information about the program build via `built` crate
mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Get information about program version from git
fn get_git_hash() -> String {
    let Some(hash) = built_info::GIT_COMMIT_HASH_SHORT else {
        return "unknown".into();
    };

    if built_info::GIT_DIRTY == Some(true) {
        format!("{hash}-dirty")
    } else {
        hash.into()
    }
}

#[derive(Serialize)]
struct Metadata<'a> {
    run: RunMetadata<'a>,
    grid: GridMetadata<'a>,
    program: ProgramMetadata<'a>,
    platform: PlatformMetadata,
}

/// Information about the model run
#[derive(Serialize)]
struct RunMetadata<'a> {
    /// Path to the model which was run
    model_path: &'a Path,
    /// The date and time on which the run started
    datetime: String,
    /// First simulated day
    start_day: u32,
    /// Last simulated day
    last_day: u32,
    /// Number of hours in each day's problem
    horizon_hours: usize,
}

impl<'a> RunMetadata<'a> {
    fn new(model: &'a Model) -> Self {
        Self {
            model_path: &model.model_path,
            datetime: Local::now().to_rfc2822(),
            start_day: model.parameters.start_day,
            last_day: model.parameters.last_day,
            horizon_hours: model.parameters.horizon_hours,
        }
    }
}

/// Size of the modelled grid
#[derive(Serialize)]
struct GridMetadata<'a> {
    reference_node: &'a str,
    nodes: usize,
    lines: usize,
    fuel_categories: usize,
    generators: usize,
    reserve_eligible_generators: usize,
}

impl<'a> GridMetadata<'a> {
    fn new(model: &'a Model) -> Self {
        let topology = &model.topology;
        Self {
            reference_node: &model.parameters.reference_node,
            nodes: topology.nodes.len(),
            // Each physical line is stored in both directions
            lines: topology
                .lines
                .iter_links()
                .filter(|(source, sink, _)| source < sink)
                .count(),
            fuel_categories: topology.fuels.len(),
            generators: topology.generators.len(),
            reserve_eligible_generators: topology.reserve_eligible().len(),
        }
    }
}

#[derive(Serialize)]
struct ProgramMetadata<'a> {
    /// The program name
    name: &'a str,
    /// The program version as specified in Cargo.toml
    version: &'a str,
    /// The target architecture for the build (e.g. x86_64-unknown-linux-gnu)
    target: &'a str,
    /// Whether it is a debug build
    is_debug: bool,
    /// The version of rustc used to compile gridplan
    rustc_version: &'a str,
    /// When gridplan was built
    build_time_utc: &'a str,
    /// The git commit hash for the build (if known)
    git_commit_hash: String,
}

impl Default for ProgramMetadata<'_> {
    fn default() -> Self {
        Self {
            name: built_info::PKG_NAME,
            version: built_info::PKG_VERSION,
            target: built_info::TARGET,
            is_debug: built_info::DEBUG,
            rustc_version: built_info::RUSTC_VERSION,
            build_time_utc: built_info::BUILT_TIME_UTC,
            git_commit_hash: get_git_hash(),
        }
    }
}

/// Information about the platform on which the program is running.
///
/// The fields correspond to different data available from the [`PlatformInfo`] struct.
#[derive(Serialize)]
struct PlatformMetadata {
    sysname: String,
    nodename: String,
    release: String,
    version: String,
    machine: String,
    osname: String,
}

impl PlatformMetadata {
    fn new() -> Result<Self> {
        let info =
            PlatformInfo::new().map_err(|err| anyhow!("Unable to determine platform info: {err}"))?;
        Ok(Self {
            sysname: info.sysname().to_string_lossy().into(),
            nodename: info.nodename().to_string_lossy().into(),
            release: info.release().to_string_lossy().into(),
            version: info.version().to_string_lossy().into(),
            machine: info.machine().to_string_lossy().into(),
            osname: info.osname().to_string_lossy().into(),
        })
    }
}

/// Write metadata to the specified output path in TOML format
pub fn write_metadata(output_path: &Path, model: &Model) -> Result<()> {
    let metadata = Metadata {
        run: RunMetadata::new(model),
        grid: GridMetadata::new(model),
        program: ProgramMetadata::default(),
        platform: PlatformMetadata::new()?,
    };
    let file_path = output_path.join(METADATA_FILE_NAME);
    fs::write(&file_path, toml::to_string(&metadata)?)?;

    Ok(())
}
