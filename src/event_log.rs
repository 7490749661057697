use crate::error::Result;
use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventLevel::Info => "INFO",
            EventLevel::Warn => "WARN",
            EventLevel::Error => "ERROR",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Power,
    Update,
    Source,
    Launch,
    Result,
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Power => "power",
            Phase::Update => "update",
            Phase::Source => "source",
            Phase::Launch => "launch",
            Phase::Result => "result",
            Phase::Teardown => "teardown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct LogEvent {
    pub run_id: Uuid,
    pub timestamp: DateTime<Local>,
    pub level: EventLevel,
    pub phase: Phase,
    pub message: String,
    pub code: Option<i32>,
}

impl LogEvent {
    /// Flat text form written to the status log file.
    pub fn render(&self) -> String {
        let mut line = format!(
            "{} [{}] [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.phase,
            self.message
        );
        if let Some(code) = self.code {
            line.push_str(&format!(" (code {})", code));
        }
        line
    }
}

/// Append-only audit trail of a single run.
///
/// Every event is kept in memory and, when backed by a file, appended to it
/// immediately. The file is never truncated.
pub struct StatusLog {
    run_id: Uuid,
    path: Option<PathBuf>,
    file: Option<File>,
    events: Vec<LogEvent>,
}

impl StatusLog {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            run_id: Uuid::new_v4(),
            path: Some(path.to_path_buf()),
            file: Some(file),
            events: Vec::new(),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            path: None,
            file: None,
            events: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn info(&mut self, phase: Phase, message: impl Into<String>) {
        self.record(EventLevel::Info, phase, message.into(), None);
    }

    pub fn info_with_code(&mut self, phase: Phase, message: impl Into<String>, code: i32) {
        self.record(EventLevel::Info, phase, message.into(), Some(code));
    }

    pub fn warn(&mut self, phase: Phase, message: impl Into<String>) {
        self.record(EventLevel::Warn, phase, message.into(), None);
    }

    pub fn error(&mut self, phase: Phase, message: impl Into<String>) {
        self.record(EventLevel::Error, phase, message.into(), None);
    }

    pub fn error_with_code(&mut self, phase: Phase, message: impl Into<String>, code: i32) {
        self.record(EventLevel::Error, phase, message.into(), Some(code));
    }

    fn record(&mut self, level: EventLevel, phase: Phase, message: String, code: Option<i32>) {
        let event = LogEvent {
            run_id: self.run_id,
            timestamp: Local::now(),
            level,
            phase,
            message,
            code,
        };

        match level {
            EventLevel::Info => tracing::info!(%phase, code = ?code, "{}", event.message),
            EventLevel::Warn => tracing::warn!(%phase, code = ?code, "{}", event.message),
            EventLevel::Error => tracing::error!(%phase, code = ?code, "{}", event.message),
        }

        if let Some(file) = self.file.as_mut() {
            // A failed write must not abort the run; the event stays in memory.
            if let Err(e) = writeln!(file, "{}", event.render()) {
                tracing::warn!("Failed to append to status log: {}", e);
            }
        }

        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_level_phase_and_code() {
        let mut log = StatusLog::in_memory();
        log.info_with_code(Phase::Update, "Installed 2 update(s)", 2);

        let line = log.events()[0].render();
        assert!(line.contains("[INFO] [update] Installed 2 update(s) (code 2)"));
    }

    #[test]
    fn render_omits_missing_code() {
        let mut log = StatusLog::in_memory();
        log.warn(Phase::Power, "Could not read standby (DC)");

        let line = log.events()[0].render();
        assert!(line.ends_with("[WARN] [power] Could not read standby (DC)"));
    }

    #[test]
    fn file_log_appends_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("status.log");

        {
            let mut log = StatusLog::open(&path).unwrap();
            log.info(Phase::Power, "first run");
        }
        {
            let mut log = StatusLog::open(&path).unwrap();
            log.error(Phase::Source, "second run");
            assert_eq!(log.path(), Some(path.as_path()));
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("first run"));
        assert!(lines[1].contains("[ERROR] [source] second run"));
    }

    #[test]
    fn events_share_the_run_id() {
        let mut log = StatusLog::in_memory();
        log.info(Phase::Launch, "a");
        log.error_with_code(Phase::Result, "b", 4);

        assert!(log.events().iter().all(|e| e.run_id == log.run_id()));
        assert_eq!(log.events()[1].code, Some(4));
        assert_eq!(log.events()[1].level, EventLevel::Error);
    }
}
