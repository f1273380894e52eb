//! Code related to CLI interface for managing the settings file
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::Path;

/// Subcommands for settings
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Edit the program settings file
    Edit,
    /// Get the path to where the settings file is read from
    Path,
    /// Write the contents of a placeholder `settings.toml` to the console
    DumpDefault,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Edit => handle_edit_command()?,
            Self::Path => handle_path_command(),
            Self::DumpDefault => handle_dump_default_command()?,
        }

        Ok(())
    }
}

/// Create a placeholder settings file, if there isn't one already
fn ensure_settings_file_exists(file_path: &Path) -> Result<()> {
    if file_path.is_file() {
        return Ok(());
    }

    if let Some(dir_path) = file_path.parent() {
        fs::create_dir_all(dir_path)
            .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
    }

    fs::write(file_path, Settings::default_file_contents()?)?;

    Ok(())
}

/// Handle the `edit` command
fn handle_edit_command() -> Result<()> {
    let file_path = get_settings_file_path();
    ensure_settings_file_exists(&file_path)?;

    println!("Opening settings file for editing: {}", file_path.display());
    edit::edit_file(&file_path)?;

    Ok(())
}

/// Handle the `path` command
fn handle_path_command() {
    println!("{}", get_settings_file_path().display());
}

/// Handle the `dump-default` command
fn handle_dump_default_command() -> Result<()> {
    print!("{}", Settings::default_file_contents()?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_settings_file_exists() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("gridplan").join("settings.toml");
        ensure_settings_file_exists(&file_path).unwrap();
        let contents = fs::read_to_string(&file_path).unwrap();
        assert_eq!(contents, Settings::default_file_contents().unwrap());

        // An existing file is left alone
        fs::write(&file_path, "log_level = \"debug\"\n").unwrap();
        ensure_settings_file_exists(&file_path).unwrap();
        assert_eq!(
            fs::read_to_string(&file_path).unwrap(),
            "log_level = \"debug\"\n"
        );
    }
}
