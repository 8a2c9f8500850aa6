//! Activity journaling.
//!
//! Scan, report and archive operations emit [`ActivityEvent`]s through an
//! [`EventSink`] handed in by the caller. There is no process-wide journal
//! state: a caller that does not care passes [`NullSink`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use serde::Serialize;
use serde_json::Value;

use crate::scanner::types::TIMESTAMP_FORMAT;

/// One recorded activity: a kind string plus a free-form field map.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    pub timestamp: String,
    pub action: String,
    pub details: Value,
}

impl ActivityEvent {
    pub fn new(action: impl Into<String>, details: Value) -> Self {
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            action: action.into(),
            details,
        }
    }
}

/// Receiver for activity events.
pub trait EventSink {
    fn record(&self, event: ActivityEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: ActivityEvent) {}
}

/// Sink that keeps events in memory and rewrites a JSON array file on every
/// record. Write failures are logged and swallowed: journaling is
/// best-effort and must never fail a scan.
#[derive(Debug)]
pub struct JsonJournal {
    path: PathBuf,
    events: Mutex<Vec<ActivityEvent>>,
}

impl JsonJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of events recorded so far.
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for JsonJournal {
    fn record(&self, event: ActivityEvent) {
        let Ok(mut events) = self.events.lock() else {
            return;
        };
        events.push(event);
        match serde_json::to_vec_pretty(&*events) {
            Ok(bytes) => {
                if let Err(e) = fs::write(&self.path, bytes) {
                    tracing::warn!(
                        "failed to write activity journal {}: {}",
                        self.path.display(),
                        e
                    );
                }
            }
            Err(e) => tracing::warn!("failed to serialize activity journal: {}", e),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::{ActivityEvent, EventSink};

    /// Captures events for assertions.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        events: Mutex<Vec<ActivityEvent>>,
    }

    impl RecordingSink {
        pub(crate) fn actions(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.action.clone())
                .collect()
        }

        pub(crate) fn events(&self) -> Vec<ActivityEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl EventSink for RecordingSink {
        fn record(&self, event: ActivityEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn event_timestamp_uses_journal_format() {
        let event = ActivityEvent::new("scan_started", json!({}));
        assert!(NaiveDateTime::parse_from_str(&event.timestamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn null_sink_accepts_events() {
        NullSink.record(ActivityEvent::new("scan_started", json!({"root": "."})));
    }

    #[test]
    fn json_journal_rewrites_file_per_event() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("activity_log.json");
        let journal = JsonJournal::new(&path);

        journal.record(ActivityEvent::new("scan_started", json!({"root": "."})));
        let first: Vec<Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(first.len(), 1);

        journal.record(ActivityEvent::new(
            "scan_completed",
            json!({"total_folders": 0}),
        ));
        let second: Vec<Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[0]["action"], "scan_started");
        assert_eq!(second[1]["action"], "scan_completed");
        assert_eq!(second[1]["details"]["total_folders"], 0);
        assert_eq!(journal.len(), 2);
    }
}
