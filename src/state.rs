//! Externally-owned training-loop state read and written by the monitor.
//!
//! The training loop owns its step counters, metric history, and control
//! flags; the monitor only reads the first two and writes the third. Keeping
//! them as plain values passed into each callback keeps the state machine
//! pure and testable without a training loop.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{HooksError, Result};

/// One entry of the metric history: metric name to numeric value.
///
/// Entries typically carry `step` plus either `loss` (training intervals) or
/// `eval_loss` (evaluation intervals).
///
/// # Example
///
/// ```rust
/// use mlperf_hooks_rs::MetricRecord;
///
/// let record = MetricRecord::new().with("step", 20.0).with("eval_loss", 0.05);
/// assert_eq!(record.get("eval_loss"), Some(0.05));
/// assert!(record.require("loss").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricRecord(BTreeMap<String, f64>);

impl MetricRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    #[must_use]
    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or overwrite a metric.
    pub fn insert(&mut self, key: &str, value: f64) {
        self.0.insert(key.to_string(), value);
    }

    /// Look up a metric.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Look up a metric that the caller's configuration promises is present.
    ///
    /// # Errors
    ///
    /// Returns [`HooksError::MissingMetric`] when absent. Absence of a
    /// required metric is a caller-configuration error and is surfaced
    /// immediately instead of skipping a compliance record.
    pub fn require(&self, key: &str) -> Result<f64> {
        self.get(key).ok_or_else(|| HooksError::MissingMetric {
            key: key.to_string(),
        })
    }
}

/// Step counters owned by the training loop.
///
/// All fields are monotonically non-decreasing across calls. A zero
/// `logging_steps` or `eval_steps` disables the corresponding metric branch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StepCounters {
    /// Current global optimizer step.
    pub global_step: u64,
    /// Interval between training-loss records.
    pub logging_steps: u64,
    /// Interval between evaluation-loss records.
    pub eval_steps: u64,
    /// Step budget; reaching it fails the run.
    pub max_steps: u64,
}

/// Control flags owned by the training loop, written by the monitor.
///
/// Cooperative: the loop checks these on its own schedule. Passed into each
/// step callback by mutable reference; there is no global control object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainerControl {
    /// Ask the loop to record a log entry now.
    pub should_log: bool,
    /// Ask the loop to halt training now.
    pub should_training_stop: bool,
}

/// Terminal outcome of a monitored run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The target evaluation loss was reached.
    Success,
    /// The step budget ran out first.
    Fail,
}

impl RunOutcome {
    /// Status string recorded on the terminal compliance event.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => crate::keys::STATUS_SUCCESS,
            Self::Fail => crate::keys::STATUS_FAIL,
        }
    }
}

/// Phase of the monitored run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// No callbacks observed yet.
    NotStarted,
    /// Run start has been recorded.
    Running,
    /// A terminal event has been recorded.
    Stopped(RunOutcome),
}
