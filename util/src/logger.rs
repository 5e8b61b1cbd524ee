//! # Logging setup
//!
//! Log records go to stdout with coloured level tags and to the session log file without them.
//! Each line is stamped with the seconds since the session started. Records from this
//! workspace's crates and from dependencies are filtered separately, so a verbose run doesn't
//! drown in library chatter.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::info;
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Log targets which belong to this workspace and use [`LogConfig::level`].
const WORKSPACE_TARGETS: [&str; 4] = ["guide_lib", "guidance_sim", "util", "comms_if"];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Log filtering for a run.
#[derive(Debug, Clone, Copy)]
pub struct LogConfig {
    /// Level for records from this workspace, at least `Info`
    pub level: LevelFilter,

    /// Level for records from dependencies
    pub dep_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The workspace log level must include `INFO`, found `{0}`")]
    LevelTooQuiet(LevelFilter),

    #[error("Could not open the log file: {0}")]
    LogFileError(std::io::Error),

    #[error("A logger is already installed: {0}")]
    AlreadyInstalled(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LogConfig {
    /// Info for the workspace, or debug when `verbose`. Dependencies only report warnings.
    pub fn new(verbose: bool) -> Self {
        Self {
            level: if verbose { LevelFilter::Debug } else { LevelFilter::Info },
            dep_level: LevelFilter::Warn,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Install the logger for this run.
///
/// Must be called at most once per process, after the session has been started.
pub fn logger_init(config: &LogConfig, session: &Session) -> Result<(), LoggerInitError> {
    if config.level < log::Level::Info {
        return Err(LoggerInitError::LevelTooQuiet(config.level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileError)?;

    let mut dispatch = fern::Dispatch::new().level(config.dep_level);
    for target in WORKSPACE_TARGETS.iter() {
        dispatch = dispatch.level_for(*target, config.level);
    }

    dispatch
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| out.finish(format_args!(
                    "{} {}", prefix(record, true), message
                )))
                .chain(std::io::stdout())
        )
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| out.finish(format_args!(
                    "{} {}", prefix(record, false), message
                )))
                .chain(log_file)
        )
        .apply()
        .map_err(LoggerInitError::AlreadyInstalled)?;

    info!("Logging initialised");
    if let Some(epoch) = session::epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Level: {} (dependencies: {})", config.level, config.dep_level);
    info!("    Log file: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Line prefix: session time and level, plus the target below info.
fn prefix(record: &log::Record, coloured: bool) -> String {
    let elapsed = session::elapsed_seconds().unwrap_or(std::f64::NAN);
    let level = level_tag(record.level(), coloured);

    if record.level() > log::Level::Info {
        format!("[{:10.4} {}] {}:", elapsed, level, record.target())
    }
    else {
        format!("[{:10.4} {}]", elapsed, level)
    }
}

fn level_tag(level: log::Level, coloured: bool) -> ColoredString {
    let tag = match level {
        log::Level::Trace => "TRC",
        log::Level::Debug => "DBG",
        log::Level::Info  => "INF",
        log::Level::Warn  => "WRN",
        log::Level::Error => "ERR"
    };

    if !coloured {
        return tag.normal()
    }

    match level {
        log::Level::Trace => tag.dimmed().italic(),
        log::Level::Debug => tag.dimmed(),
        log::Level::Info  => tag.normal(),
        log::Level::Warn  => tag.yellow(),
        log::Level::Error => tag.red().bold()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_plain_prefix() {
        let record = log::Record::builder()
            .level(log::Level::Warn)
            .target("guide_lib::guidance")
            .build();
        assert!(prefix(&record, false).ends_with(" WRN]"));

        let record = log::Record::builder()
            .level(log::Level::Debug)
            .target("guide_lib::guidance")
            .build();
        assert!(prefix(&record, false).ends_with(" DBG] guide_lib::guidance:"));
    }

    #[test]
    fn test_config() {
        assert_eq!(LogConfig::new(false).level, LevelFilter::Info);
        assert_eq!(LogConfig::new(true).level, LevelFilter::Debug);
        assert_eq!(LogConfig::new(true).dep_level, LevelFilter::Warn);
    }
}
