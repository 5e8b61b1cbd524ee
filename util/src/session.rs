//! # Run sessions
//!
//! Every run of an executable gets its own directory, named after the executable and the time the
//! run began. The directory holds the log file and any traces the run records. The start time is
//! also the epoch from which log timestamps are measured.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static RUN_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Format of the timestamp in session directory names, see `chrono::format::strftime`.
const DIR_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name of the status trace within the session directory
pub const STATUS_FILE_NAME: &str = "status.jsonl";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Paths belonging to the current run.
#[derive(Clone, Debug)]
pub struct Session {
    /// Directory holding everything this run writes
    pub session_root: PathBuf,

    /// Log file written alongside stdout
    pub log_file_path: PathBuf,

    /// Default location of the per-cycle status trace
    pub status_file_path: PathBuf,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Cannot create the session directory {0:?}: {1}")]
    CannotCreateDir(PathBuf, std::io::Error),

    #[error("A session has already been started in this process ({0})")]
    AlreadyStarted(conquer_once::TryInitError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start the session for this run, creating `{sessions_dir}/{exec_name}_{timestamp}`.
    ///
    /// Only one session may be started per process since it fixes the log epoch.
    pub fn new(exec_name: &str, sessions_dir: impl AsRef<Path>) -> Result<Self, SessionError> {
        let now = Utc::now();
        RUN_EPOCH.try_init_once(|| now).map_err(SessionError::AlreadyStarted)?;

        let root = sessions_dir.as_ref().join(dir_name(exec_name, &now));
        fs::create_dir_all(&root).map_err(|e| SessionError::CannotCreateDir(root.clone(), e))?;

        Ok(Session {
            log_file_path: root.join(format!("{}.log", exec_name)),
            status_file_path: root.join(STATUS_FILE_NAME),
            session_root: root,
        })
    }

    /// Path of a file with the given name inside the session directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.session_root.join(name)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Seconds since the session started, or `None` if no session has been started.
pub fn elapsed_seconds() -> Option<f64> {
    let epoch = RUN_EPOCH.get()?;

    (Utc::now() - *epoch)
        .num_nanoseconds()
        .map(|ns| ns as f64 * 1e-9)
}

/// Time at which the session started.
pub fn epoch() -> Option<&'static DateTime<Utc>> {
    RUN_EPOCH.get()
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn dir_name(exec_name: &str, start: &DateTime<Utc>) -> String {
    format!("{}_{}", exec_name, start.format(DIR_TIMESTAMP_FORMAT))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_dir_name() {
        let start = Utc.ymd(2021, 3, 7).and_hms(14, 5, 9);
        assert_eq!(dir_name("guidance_sim", &start), "guidance_sim_20210307_140509");
    }
}
