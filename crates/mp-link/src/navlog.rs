//! Navigation log: one timestamped line per telemetry message and transition.

use crate::protocol::VehicleMessage;
use chrono::Utc;
use mp_core::MissionSnapshot;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const NAVLOG_FILE: &str = "NavLog.txt";

pub struct NavLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl NavLog {
    /// Create `<dir>/NavLog.txt`, truncating any previous log.
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(NAVLOG_FILE);
        let file = File::create(&path)?;
        tracing::info!(path = %path.display(), "navigation log started");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_message(&mut self, message: &VehicleMessage) -> io::Result<()> {
        self.write_line("telemetry", &serde_json::to_string(message)?)
    }

    pub fn record_transition(&mut self, snapshot: &MissionSnapshot) -> io::Result<()> {
        self.write_line("transition", &serde_json::to_string(snapshot)?)
    }

    fn write_line(&mut self, kind: &str, body: &str) -> io::Result<()> {
        writeln!(self.writer, "{} {} {}", Utc::now().to_rfc3339(), kind, body)
    }

    /// Flush and close the log.
    pub fn finish(mut self) -> io::Result<PathBuf> {
        self.writer.flush()?;
        tracing::info!(path = %self.path.display(), "navigation log stopped");
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_core::VehicleStatus;

    #[test]
    fn writes_one_line_per_record() {
        let dir = std::env::temp_dir().join(format!("mp-navlog-{}", std::process::id()));
        let mut log = NavLog::open(&dir).unwrap();
        log.record_message(&VehicleMessage::State(VehicleStatus {
            armed: true,
            guided: true,
        }))
        .unwrap();
        log.record_message(&VehicleMessage::State(VehicleStatus::default()))
            .unwrap();
        let path = log.finish().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(" telemetry "));
        assert!(lines[0].contains(r#""armed":true"#));
        let _ = fs::remove_dir_all(dir);
    }
}
