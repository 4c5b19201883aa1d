//! # mlperf-hooks-rs
//!
//! Compliance-grade event logging hooks for distributed LLM fine-tuning runs.
//!
//! This crate is a thin instrumentation layer hooked into an external
//! training loop's lifecycle callbacks. It records standardized milestones
//! (run start/stop, hyperparameters, loss metrics) to a structured audit log
//! for later validation against a benchmark submission protocol. It owns no
//! training logic, no model code, and no data pipeline.
//!
//! ## Components
//!
//! - [`Gate`] wraps an [`EventSink`] and ensures each logical compliance
//!   record is emitted by exactly one process of a distributed job, with an
//!   optional full-job barrier before emission.
//! - [`ComplianceMonitor`] is a callback-driven state machine: invoked at
//!   training start and at each step begin, it reads the loop's step counters
//!   and metric history, emits records through the gate, and raises the
//!   loop's stop flag on success (target evaluation loss reached) or failure
//!   (step budget exhausted).
//!
//! ## Quick start
//!
//! ```rust
//! use mlperf_hooks_rs::{
//!     ComplianceMonitor, Gate, MetricRecord, RecordingSink, RunConfig, StepCounters,
//!     TrainerControl,
//! };
//!
//! # fn main() -> mlperf_hooks_rs::Result<()> {
//! // A real run would use JsonlSink; the recording sink keeps events in memory.
//! let sink = RecordingSink::new();
//! let gate = Gate::single_process(Box::new(sink.clone()));
//!
//! let config = RunConfig {
//!     per_device_train_batch_size: 8,
//!     gradient_accumulation_steps: 4,
//!     learning_rate: 4e-4,
//!     max_steps: 1024,
//!     target_eval_loss: 0.92,
//!     ..RunConfig::default()
//! };
//! let mut monitor = ComplianceMonitor::new(gate, config)?;
//!
//! // Wired into the training loop's callbacks:
//! monitor.on_train_begin()?;
//!
//! let counters = StepCounters {
//!     global_step: 10,
//!     logging_steps: 10,
//!     eval_steps: 50,
//!     max_steps: 1024,
//! };
//! let history = vec![MetricRecord::new().with("step", 10.0).with("loss", 2.3)];
//! let mut control = TrainerControl::default();
//! monitor.on_step_begin(&counters, &history, &mut control)?;
//!
//! assert!(control.should_log);
//! assert!(!sink.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Distributed runs
//!
//! Implement [`DistributedContext`](distributed::DistributedContext) over the
//! embedding runtime's communicator and pass it to [`Gate::new`]. Every rank
//! runs the same callbacks; only the permitted rank (0 by default) writes.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod distributed;
pub mod error;
pub mod gate;
pub mod keys;
pub mod monitor;
pub mod sink;
pub mod state;

pub use config::{RunConfig, SubmissionInfo};
pub use error::{HooksError, Result};
pub use gate::{EmitOpts, Gate};
pub use monitor::ComplianceMonitor;
pub use sink::{EventSink, EventType, JsonlSink, Metadata, RecordedEvent, RecordingSink};
pub use state::{MetricRecord, RunOutcome, RunPhase, StepCounters, TrainerControl};
