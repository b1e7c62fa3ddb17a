//! Set up logging for bedcast.
//!
//! Messages go to the terminal (coloured, if supported) and, for the `run` command, to a pair of
//! log files in the output folder. The log level comes from the `BEDCAST_LOG_LEVEL` environment
//! variable, falling back on the program settings.
use anyhow::{Context, Result};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// Set once the global logger is in place
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Environment variable which overrides the log level in the settings file
const LOG_LEVEL_ENV_VAR: &str = "BEDCAST_LOG_LEVEL";

/// The log level used if none is given in `settings.toml`
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log file for messages about the ordinary operation of the program
const LOG_INFO_FILE_NAME: &str = "bedcast_info.log";

/// Log file for warnings and errors
const LOG_ERROR_FILE_NAME: &str = "bedcast_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Work out which log level to use.
///
/// Accepts `off`, `error`, `warn`, `info`, `debug` or `trace` (in any case). The environment
/// variable takes precedence over the value from the settings file.
fn get_log_level(log_level_from_settings: &str) -> Result<LevelFilter> {
    let log_level =
        env::var(LOG_LEVEL_ENV_VAR).unwrap_or_else(|_| log_level_from_settings.to_string());

    log_level
        .parse()
        .ok()
        .with_context(|| format!("Unknown log level: {log_level}"))
}

/// Open (or truncate) a log file in the output folder
fn create_log_file(output_path: &Path, file_name: &str) -> Result<File> {
    let path = output_path.join(file_name);
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .with_context(|| format!("Could not create log file {}", path.display()))
}

/// Initialise the program logger.
///
/// # Arguments
///
/// * `log_level_from_settings`: The log level given in `settings.toml`
/// * `log_file_path`: Folder in which to create log files, if any
pub fn init(log_level_from_settings: &str, log_file_path: Option<&Path>) -> Result<()> {
    let log_level = get_log_level(log_level_from_settings)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let colour_stdout = std::io::stdout().is_terminal();
    let colour_stderr = std::io::stderr().is_terminal();

    // Info and below to stdout, warnings and errors to stderr
    let mut dispatch = Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, colour_stdout, &colours);
                })
                .level(log_level)
                .chain(std::io::stdout()),
        )
        .chain(
            Dispatch::new()
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, colour_stderr, &colours);
                })
                .level(log_level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        );

    if let Some(output_path) = log_file_path {
        // The info log always gets at least info-level messages, whatever is shown on screen
        let info_file = create_log_file(output_path, LOG_INFO_FILE_NAME)?;
        let error_file = create_log_file(output_path, LOG_ERROR_FILE_NAME)?;
        dispatch = dispatch
            .chain(
                Dispatch::new()
                    .filter(|metadata| metadata.level() > LevelFilter::Warn)
                    .format(write_log_plain)
                    .level(log_level.max(LevelFilter::Info))
                    .chain(info_file),
            )
            .chain(
                Dispatch::new()
                    .format(write_log_plain)
                    .level(LevelFilter::Warn)
                    .chain(error_file),
            );
    }

    dispatch.apply()?;
    LOGGER_INIT.get_or_init(|| ());

    Ok(())
}

/// Write a log line as `[HH:MM:SS LEVEL target] message`
fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");
    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_log(out, record.level(), record.target(), message);
}

fn write_log_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    if use_colour {
        write_log(out, colours.color(record.level()), record.target(), message);
    } else {
        write_log_plain(out, message, record);
    }
}
