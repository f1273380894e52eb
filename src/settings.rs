//! Code for loading program settings.
use crate::get_config_dir;
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::{Context, Result};
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

const DEFAULT_SETTINGS_FILE_HEADER: &str = "# This file contains the program settings for gridplan.
# Uncomment a line to change the default value.
";

/// Default log level for program
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Get the path to where the settings file will be read from
pub fn get_settings_file_path() -> PathBuf {
    let mut path = get_config_dir();
    path.push(SETTINGS_FILE_NAME);

    path
}

/// Program settings from config file
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// The default program log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether to overwrite output files by default
    #[serde(default)]
    pub overwrite: bool,
    /// Whether to show the solver's own log for each day
    #[serde(default)]
    pub solver_output: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite: false,
            solver_output: false,
        }
    }
}

impl Settings {
    /// Read the settings file from the user's config directory.
    ///
    /// If the file is not present, default values for settings will be used
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    /// Read from the specified path, falling back to defaults if there is no file
    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        read_toml(file_path)
    }

    /// The contents of the default settings file.
    ///
    /// Each setting is commented out and preceded by its documentation.
    pub fn default_file_contents() -> Result<String> {
        let settings_raw = toml::to_string(&Settings::default())?;

        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for line in settings_raw.lines() {
            let Some(last) = line.find('=') else {
                continue;
            };

            let field = line[..last].trim();
            let docs = Settings::get_field_docs(field)
                .with_context(|| format!("Missing doc comment for setting {field}"))?;
            for doc_line in docs.lines() {
                out.push_str(&format!("\n# # {}\n", doc_line.trim()));
            }
            out.push_str(&format!("# {}\n", line.trim()));
        }

        Ok(out)
    }
}
