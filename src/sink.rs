//! Compliance event sinks.
//!
//! A sink receives fully-formed compliance records and owns their
//! serialization. [`JsonlSink`] writes the standard `:::MLLOG` line format
//! consumed by submission checkers; [`RecordingSink`] buffers records in
//! memory for tests and embedders that post-process events themselves.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HooksError, Result};

/// JSON object attached to a compliance event.
pub type Metadata = serde_json::Map<String, Value>;

/// Verb of a compliance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Opens an interval (e.g. run start).
    IntervalStart,
    /// A point-in-time observation (e.g. a loss value).
    PointInTime,
    /// Closes an interval (e.g. run stop).
    IntervalEnd,
}

/// Destination for compliance records.
///
/// The three verb methods mirror the record vocabulary; all of them funnel
/// into [`log`](EventSink::log), which is the only method implementors must
/// provide. Failures propagate to the caller unretried.
pub trait EventSink {
    /// Write one record with an explicit verb.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or written.
    fn log(
        &mut self,
        event_type: EventType,
        key: &str,
        value: Option<Value>,
        metadata: Option<Metadata>,
    ) -> Result<()>;

    /// Write an interval-start record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn start(&mut self, key: &str, value: Option<Value>, metadata: Option<Metadata>) -> Result<()> {
        self.log(EventType::IntervalStart, key, value, metadata)
    }

    /// Write a point-in-time record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn event(&mut self, key: &str, value: Option<Value>, metadata: Option<Metadata>) -> Result<()> {
        self.log(EventType::PointInTime, key, value, metadata)
    }

    /// Write an interval-end record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn end(&mut self, key: &str, value: Option<Value>, metadata: Option<Metadata>) -> Result<()> {
        self.log(EventType::IntervalEnd, key, value, metadata)
    }
}

/// On-disk shape of one compliance line, after the `:::MLLOG ` prefix.
#[derive(Debug, Serialize)]
struct LogLine<'a> {
    namespace: &'a str,
    time_ms: i64,
    event_type: EventType,
    key: &'a str,
    value: Option<Value>,
    metadata: Option<Metadata>,
}

/// Prefix every compliance line starts with.
pub const MLLOG_PREFIX: &str = ":::MLLOG ";

const DEFAULT_LOG_FILE: &str = "mlperf_compliance.log";

/// Append-only file sink writing one `:::MLLOG {json}` line per record.
///
/// # Example
///
/// ```no_run
/// use mlperf_hooks_rs::sink::{EventSink, JsonlSink};
///
/// # fn main() -> mlperf_hooks_rs::Result<()> {
/// let mut sink = JsonlSink::create(Some("run42_compliance.log".as_ref()))?;
/// sink.event("seed", Some(1234.into()), None)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct JsonlSink {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl JsonlSink {
    /// Open (or create) the compliance log for appending.
    ///
    /// The path is the explicit `path` argument when given, else the
    /// `COMPLIANCE_FILE` environment variable, else `mlperf_compliance.log`
    /// in the working directory. The environment is read once, here.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn create(path: Option<&Path>) -> Result<Self> {
        let path = resolve_path(path, std::env::var_os("COMPLIANCE_FILE"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::debug!(path = %path.display(), "opened compliance log");
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    /// Path of the underlying log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn resolve_path(explicit: Option<&Path>, env: Option<std::ffi::OsString>) -> PathBuf {
    match (explicit, env) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(env)) => PathBuf::from(env),
        (None, None) => PathBuf::from(DEFAULT_LOG_FILE),
    }
}

impl EventSink for JsonlSink {
    fn log(
        &mut self,
        event_type: EventType,
        key: &str,
        value: Option<Value>,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        let line = LogLine {
            namespace: "",
            time_ms: Utc::now().timestamp_millis(),
            event_type,
            key,
            value,
            metadata,
        };
        let json = serde_json::to_string(&line)?;
        writeln!(self.writer, "{MLLOG_PREFIX}{json}")?;
        // One record per flush: a crashed run must still leave a usable log.
        self.writer.flush()?;
        Ok(())
    }
}

/// One record captured by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Verb of the record.
    pub event_type: EventType,
    /// Compliance event key.
    pub key: String,
    /// Logged value, if any.
    pub value: Option<Value>,
    /// Attached metadata, if any.
    pub metadata: Option<Metadata>,
}

/// In-memory sink buffering records for inspection.
///
/// Clones share one buffer, so a handle kept outside a gate observes
/// everything emitted through it.
///
/// # Example
///
/// ```rust
/// use mlperf_hooks_rs::sink::{EventSink, RecordingSink};
///
/// let sink = RecordingSink::new();
/// let mut writer = sink.clone();
/// writer.event("seed", Some(42.into()), None).unwrap();
///
/// let events = sink.events();
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].key, "seed");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records captured so far, in emission order.
    ///
    /// # Panics
    ///
    /// Panics if a previous holder of the buffer panicked mid-write.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().expect("event buffer poisoned").clone()
    }

    /// Number of records captured so far.
    ///
    /// # Panics
    ///
    /// Panics if a previous holder of the buffer panicked mid-write.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().expect("event buffer poisoned").len()
    }

    /// Whether no records have been captured.
    ///
    /// # Panics
    ///
    /// Panics if a previous holder of the buffer panicked mid-write.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn log(
        &mut self,
        event_type: EventType,
        key: &str,
        value: Option<Value>,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| HooksError::Sink("event buffer poisoned".to_string()))?;
        events.push(RecordedEvent {
            event_type,
            key: key.to_string(),
            value,
            metadata,
        });
        Ok(())
    }
}
