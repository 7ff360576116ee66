//! Logger set-up for the program.
//!
//! Messages go to the console (stdout for ordinary messages, stderr for warnings and errors) and,
//! when a run has an output folder, to two log files inside it. The level comes from the
//! `HHBARGAIN_LOG_LEVEL` environment variable if set, otherwise from the program settings.
use anyhow::{Context, Result, bail};
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

/// Set once the global logger has been installed
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The log level used when neither the environment nor the settings file says otherwise
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The environment variable which overrides the log level
const LOG_LEVEL_ENV_VAR: &str = "HHBARGAIN_LOG_LEVEL";

/// Log file for messages below warning level
pub const LOG_INFO_FILE_NAME: &str = "hhbargain_info.log";

/// Log file for warnings and errors
pub const LOG_ERROR_FILE_NAME: &str = "hhbargain_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Install the program logger.
///
/// Accepted levels are `off`, `error`, `warn`, `info`, `debug` and `trace` (case-insensitive).
///
/// # Arguments
///
/// * `log_level_from_settings` - The level given in `settings.toml`, used unless
///   `HHBARGAIN_LOG_LEVEL` is set
/// * `log_file_dir` - Folder in which to create log files, if any
pub fn init(log_level_from_settings: &str, log_file_dir: Option<&Path>) -> Result<()> {
    let log_level = env::var(LOG_LEVEL_ENV_VAR)
        .map_or_else(|_| parse_log_level(log_level_from_settings), |level| parse_log_level(&level))?;

    let mut dispatch = Dispatch::new()
        .chain(console_dispatch(log_level, false))
        .chain(console_dispatch(log_level, true));

    if let Some(dir) = log_file_dir {
        let info_file = open_log_file(dir, LOG_INFO_FILE_NAME)?;
        let error_file = open_log_file(dir, LOG_ERROR_FILE_NAME)?;
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

    dispatch.apply().context("Logger already initialised")?;
    let _ = LOGGER_INIT.set(());

    Ok(())
}

/// A console sink: stderr for warnings and errors, stdout for everything else
fn console_dispatch(log_level: LevelFilter, errors: bool) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    if errors {
        let use_colour = std::io::stderr().is_terminal();
        Dispatch::new()
            .format(move |out, message, record| {
                write_log_colour(out, message, record, use_colour, &colours);
            })
            .level(log_level.min(LevelFilter::Warn))
            .chain(std::io::stderr())
    } else {
        let use_colour = std::io::stdout().is_terminal();
        Dispatch::new()
            .filter(|metadata| metadata.level() > LevelFilter::Warn)
            .format(move |out, message, record| {
                write_log_colour(out, message, record, use_colour, &colours);
            })
            .level(log_level)
            .chain(std::io::stdout())
    }
}

/// Create (or truncate) a log file in the given folder
fn open_log_file(dir: &Path, file_name: &str) -> Result<File> {
    let path = dir.join(file_name);
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .with_context(|| format!("Could not create log file {}", path.display()))
}

/// Convert a log level string to a [`LevelFilter`]
fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    let level = match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    Ok(level)
}

/// Write a line as `[HH:MM:SS LEVEL target] message`
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

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    #[case("off", LevelFilter::Off)]
    #[case("error", LevelFilter::Error)]
    #[case("WARN", LevelFilter::Warn)]
    #[case("info", LevelFilter::Info)]
    #[case("Debug", LevelFilter::Debug)]
    #[case("trace", LevelFilter::Trace)]
    fn test_parse_log_level(#[case] log_level: &str, #[case] expected: LevelFilter) {
        assert_eq!(parse_log_level(log_level).unwrap(), expected);
    }

    #[test]
    fn test_parse_log_level_unknown() {
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn test_open_log_file_truncates() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(LOG_INFO_FILE_NAME), "old run").unwrap();
        open_log_file(dir.path(), LOG_INFO_FILE_NAME).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join(LOG_INFO_FILE_NAME)).unwrap(),
            ""
        );

        assert!(open_log_file(&dir.path().join("missing"), LOG_INFO_FILE_NAME).is_err());
    }
}
