//! Initialisation of the program logger.
//!
//! Messages go to the console, coloured when attached to a terminal, and optionally to log files
//! in the output folder.
use anyhow::{Context, Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// A flag indicating whether the logger has been initialised
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The default log level for the program.
///
/// Used as a fallback if the user hasn't specified something else with the `GRIDPLAN_LOG_LEVEL`
/// environment variable or the settings.toml file.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable which overrides the log level
const LOG_LEVEL_ENV_VAR: &str = "GRIDPLAN_LOG_LEVEL";

/// The file name for the log file containing messages about ordinary operation
const LOG_INFO_FILE_NAME: &str = "gridplan_info.log";

/// The file name for the log file containing warnings and error messages
const LOG_ERROR_FILE_NAME: &str = "gridplan_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Initialise the program logger using the `fern` logging library with colourised output.
///
/// The user can specify their preferred logging level via the `settings.toml` file (defaulting to
/// `info` if not present) or with the `GRIDPLAN_LOG_LEVEL` environment variable. If both are provided,
/// the environment variable takes precedence.
///
/// Possible log level options are:
///
/// * `error`
/// * `warn`
/// * `info`
/// * `debug`
/// * `trace`
///
/// # Arguments
///
/// * `log_level_from_settings`: The log level specified in `settings.toml`
/// * `log_file_path`: The location to save log files (if Some, log files will be created)
pub fn init(log_level_from_settings: Option<&str>, log_file_path: Option<&Path>) -> Result<()> {
    let log_level = resolve_log_level(env::var(LOG_LEVEL_ENV_VAR).ok(), log_level_from_settings)?;

    let mut dispatch = console_dispatch(log_level);
    if let Some(log_file_path) = log_file_path {
        dispatch = dispatch.chain(file_dispatch(log_file_path, log_level)?);
    }

    dispatch.apply().context("Logger already initialised")?;
    LOGGER_INIT.get_or_init(|| ());

    Ok(())
}

/// Pick the log level, preferring the environment variable over the settings file
fn resolve_log_level(from_env: Option<String>, from_settings: Option<&str>) -> Result<LevelFilter> {
    let name = from_env.unwrap_or_else(|| from_settings.unwrap_or(DEFAULT_LOG_LEVEL).to_string());
    parse_log_level(&name)
}

/// Messages below warning level go to stdout, the rest to stderr
fn console_dispatch(log_level: LevelFilter) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let use_colour_stdout = std::io::stdout().is_terminal();
    let use_colour_stderr = std::io::stderr().is_terminal();

    Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, use_colour_stdout, &colours);
                })
                .level(log_level)
                .chain(std::io::stdout()),
        )
        .chain(
            Dispatch::new()
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, use_colour_stderr, &colours);
                })
                .level(log_level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        )
}

/// Write ordinary messages and warnings/errors to separate files in `log_file_path`.
///
/// The info file always records at least `info` level, whatever the console shows.
fn file_dispatch(log_file_path: &Path, log_level: LevelFilter) -> Result<Dispatch> {
    let new_log_file = |file_name: &str| {
        let file_path = log_file_path.join(file_name);
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&file_path)
            .with_context(|| format!("Could not create log file {}", file_path.display()))
    };

    Ok(Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(write_log_plain)
                .level(log_level.max(LevelFilter::Info))
                .chain(new_log_file(LOG_INFO_FILE_NAME)?),
        )
        .chain(
            Dispatch::new()
                .format(write_log_plain)
                .level(LevelFilter::Warn)
                .chain(new_log_file(LOG_ERROR_FILE_NAME)?),
        ))
}

/// Convert a log level name to a [`LevelFilter`]
fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    Ok(match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    })
}

/// Write a timestamped log line
fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

/// Write to the log with no colours
fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_log(out, record.level(), record.target(), message);
}

/// Write to the log with optional colours
fn write_log_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    // Format output with or without colour based on `use_colour`
    if use_colour {
        write_log(out, colours.color(record.level()), record.target(), message);
    } else {
        write_log_plain(out, message, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("off", LevelFilter::Off)]
    #[case("warn", LevelFilter::Warn)]
    #[case("DEBUG", LevelFilter::Debug)]
    #[case("Info", LevelFilter::Info)]
    fn test_parse_log_level(#[case] name: &str, #[case] expected: LevelFilter) {
        assert_eq!(parse_log_level(name).unwrap(), expected);
    }

    #[rstest]
    #[case(Some("debug"), Some("warn"), LevelFilter::Debug)]
    #[case(None, Some("warn"), LevelFilter::Warn)]
    #[case(None, None, LevelFilter::Info)]
    fn test_resolve_log_level(
        #[case] from_env: Option<&str>,
        #[case] from_settings: Option<&str>,
        #[case] expected: LevelFilter,
    ) {
        let level = resolve_log_level(from_env.map(str::to_string), from_settings).unwrap();
        assert_eq!(level, expected);
    }

    #[test]
    fn test_file_dispatch_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        file_dispatch(dir.path(), LevelFilter::Debug).unwrap();
        assert!(dir.path().join(LOG_INFO_FILE_NAME).is_file());
        assert!(dir.path().join(LOG_ERROR_FILE_NAME).is_file());
    }

    #[test]
    fn test_parse_log_level_unknown() {
        assert_eq!(
            parse_log_level("loud").unwrap_err().to_string(),
            "Unknown log level: loud"
        );
    }
}
