//! State and parameter providers

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::path::{Path, PathBuf};

use comms_if::nav::{
    GlobalPosition, HomePosition, LocalPosition, MissionResult, NavState,
    PositionSetpointTriplet
};
use log::{info, warn};

use super::{ParamsProvider, StateProvider};
use crate::guidance::{load_params, GuidanceError, GuidanceParams, UpstreamSamples};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters which never change.
#[derive(Debug, Clone)]
pub struct StaticParams(GuidanceParams);

/// Parameters loaded from a TOML file, reloaded on request.
#[derive(Debug, Clone)]
pub struct FileParams {
    path: PathBuf,
    params: GuidanceParams,
}

/// Buffer of the latest upstream samples, emptied each time it is read.
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    pending: UpstreamSamples,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StaticParams {
    pub fn new(params: GuidanceParams) -> Self {
        Self(params)
    }
}

impl ParamsProvider for StaticParams {
    fn snapshot(&mut self) -> GuidanceParams {
        self.0
    }
}

impl FileParams {
    /// Load the parameters at `path`, which must be valid.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, GuidanceError> {
        let path = path.as_ref().to_path_buf();
        let params = load_params(&path)?;

        info!("Loaded guidance parameters from {:?}", path);

        Ok(Self { path, params })
    }

    /// Reload the parameter file.
    ///
    /// If the file can't be loaded or fails validation the previous parameters are kept and the
    /// error is returned.
    pub fn reload(&mut self) -> Result<(), GuidanceError> {
        match load_params(&self.path) {
            Ok(p) => {
                if p != self.params {
                    info!("Reloaded guidance parameters from {:?}", self.path);
                }
                self.params = p;
                Ok(())
            },
            Err(e) => {
                warn!("Could not reload guidance parameters, keeping the previous set: {}", e);
                Err(e)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ParamsProvider for FileParams {
    fn snapshot(&mut self) -> GuidanceParams {
        self.params
    }
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_global_pos(&mut self, sample: GlobalPosition) {
        self.pending.global_pos = Some(sample);
    }

    pub fn push_local_pos(&mut self, sample: LocalPosition) {
        self.pending.local_pos = Some(sample);
    }

    pub fn push_home(&mut self, sample: HomePosition) {
        self.pending.home = Some(sample);
    }

    pub fn push_triplet(&mut self, sample: PositionSetpointTriplet) {
        self.pending.triplet = Some(sample);
    }

    pub fn push_mission_result(&mut self, sample: MissionResult) {
        self.pending.mission_result = Some(sample);
    }

    pub fn push_nav_state(&mut self, sample: NavState) {
        self.pending.nav_state = Some(sample);
    }
}

impl StateProvider for SampleBuffer {
    fn latest(&mut self) -> UpstreamSamples {
        std::mem::take(&mut self.pending)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn write_params(name: &str, contents: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("guide_exec_{}_{}.toml", name, std::process::id()));

        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();

        path
    }

    fn params_toml(max_speed: f32) -> String {
        let mut p = GuidanceParams::default();
        p.max_speed_ms = max_speed;
        toml::to_string(&p).unwrap()
    }

    #[test]
    fn test_sample_buffer_drains() {
        let mut buf = SampleBuffer::new();
        buf.push_nav_state(NavState::Mission);
        buf.push_nav_state(NavState::Hold);

        let s = buf.latest();
        assert_eq!(s.nav_state, Some(NavState::Hold));
        assert_eq!(buf.latest(), UpstreamSamples::default());
    }

    #[test]
    fn test_file_params_reload() {
        let path = write_params("reload", &params_toml(3.0));

        let mut fp = FileParams::new(&path).unwrap();
        assert_eq!(fp.snapshot().max_speed_ms, 3.0);

        std::fs::write(&path, params_toml(1.5)).unwrap();
        assert!(fp.reload().is_ok());
        assert_eq!(fp.snapshot().max_speed_ms, 1.5);

        // Invalid parameters are rejected and the last good set kept
        std::fs::write(&path, params_toml(-1.0)).unwrap();
        assert!(matches!(fp.reload(), Err(GuidanceError::InvalidParams(_))));
        assert_eq!(fp.snapshot().max_speed_ms, 1.5);

        std::fs::write(&path, "not = [valid").unwrap();
        assert!(matches!(fp.reload(), Err(GuidanceError::ParamLoadError(_))));
        assert_eq!(fp.snapshot().max_speed_ms, 1.5);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_file_params_missing() {
        assert!(FileParams::new("/no/such/guidance.toml").is_err());
    }
}
