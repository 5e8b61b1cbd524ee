//! Status publishers

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::io::Write;

use comms_if::tm::GuidanceStatus;
use log::{debug, warn};

use super::StatusPublisher;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Publishes status records to the log at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

/// Writes each status record as one line of JSON.
pub struct JsonLinesPublisher<W: Write> {
    writer: W,

    /// Number of records which could not be written
    num_failed: u64,
}

/// Keeps every published status record in memory.
#[derive(Debug, Clone, Default)]
pub struct StatusLog {
    records: Vec<GuidanceStatus>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StatusPublisher for LogPublisher {
    fn publish(&mut self, status: &GuidanceStatus) {
        debug!(
            "[{:.2} s] {}: throttle {:.3}, yaw rate {:.3} rad/s, heading error {:.1} deg, \
            {:.1} m to go",
            status.time_s,
            status.mode,
            status.setpoint.throttle,
            status.setpoint.yaw_rate_rads,
            status.heading_error_deg,
            status.distance_to_wp_m
        );
    }
}

impl<W: Write> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            num_failed: 0,
        }
    }

    pub fn num_failed(&self) -> u64 {
        self.num_failed
    }

    /// Flush any buffered records to the writer.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record(&mut self, status: &GuidanceStatus) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, status)?;
        self.writer.write_all(b"\n")
    }
}

impl<W: Write> StatusPublisher for JsonLinesPublisher<W> {
    fn publish(&mut self, status: &GuidanceStatus) {
        if let Err(e) = self.write_record(status) {
            // Only report the first failure, a broken sink would otherwise flood the log
            if self.num_failed == 0 {
                warn!("Could not write guidance status: {}", e);
            }
            self.num_failed += 1;
        }
    }
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[GuidanceStatus] {
        &self.records
    }

    pub fn latest(&self) -> Option<&GuidanceStatus> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl StatusPublisher for StatusLog {
    fn publish(&mut self, status: &GuidanceStatus) {
        self.records.push(*status);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tm::GuidanceMode;

    #[test]
    fn test_json_lines() {
        let mut publisher = JsonLinesPublisher::new(Vec::new());

        let mut status = GuidanceStatus::default();
        publisher.publish(&status);
        status.mode = GuidanceMode::Stopped;
        publisher.publish(&status);

        let out = String::from_utf8(publisher.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: GuidanceStatus = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.mode, GuidanceMode::Stopped);
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "sink closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_lines_failure() {
        let mut publisher = JsonLinesPublisher::new(BrokenSink);
        publisher.publish(&GuidanceStatus::default());
        publisher.publish(&GuidanceStatus::default());
        assert_eq!(publisher.num_failed(), 2);
    }

    #[test]
    fn test_log_publisher() {
        let mut publisher = LogPublisher;
        publisher.publish(&GuidanceStatus {
            heading_error_deg: f32::NAN,
            ..Default::default()
        });
    }

    #[test]
    fn test_status_log() {
        let mut log = StatusLog::new();
        assert!(log.is_empty());

        log.publish(&GuidanceStatus { time_s: 1.0, ..Default::default() });
        log.publish(&GuidanceStatus { time_s: 2.0, ..Default::default() });

        assert_eq!(log.len(), 2);
        assert_eq!(log.latest().map(|s| s.time_s), Some(2.0));
    }
}
