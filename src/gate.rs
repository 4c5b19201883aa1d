//! Rank-aware, optionally synchronized emission gate.
//!
//! Every rank of a distributed job runs the same callback code, but each
//! logical compliance record must appear in the log exactly once. The gate
//! wraps an [`EventSink`] and forwards a record only when the current
//! process's rank matches the permitted logging rank (rank 0 by default).
//! When requested, it first blocks on a full-job barrier so the record marks
//! a point every process has reached.

use serde_json::Value;

use crate::distributed::{world_size_from_env, DistributedContext, SingleProcess};
use crate::error::Result;
use crate::sink::{EventSink, EventType, Metadata};

/// Per-call emission options.
///
/// The default is the common case: no barrier, log on rank 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitOpts {
    /// Block on a full-job barrier before the rank check.
    pub sync: bool,
    /// Rank permitted to emit; `None` means rank 0.
    pub log_rank: Option<u32>,
}

impl EmitOpts {
    /// Options with the barrier enabled.
    #[must_use]
    pub fn synced() -> Self {
        Self {
            sync: true,
            log_rank: None,
        }
    }

    /// Options permitting only the given rank to emit.
    #[must_use]
    pub fn on_rank(rank: u32) -> Self {
        Self {
            sync: false,
            log_rank: Some(rank),
        }
    }
}

/// Rank-gated wrapper around an event sink.
///
/// # Example
///
/// ```rust
/// use mlperf_hooks_rs::{EmitOpts, Gate, RecordingSink};
///
/// # fn main() -> mlperf_hooks_rs::Result<()> {
/// let sink = RecordingSink::new();
/// let mut gate = Gate::single_process(Box::new(sink.clone()));
///
/// gate.event("seed", Some(42.into()), None, EmitOpts::default())?;
/// assert_eq!(sink.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct Gate {
    sink: Box<dyn EventSink>,
    ctx: Box<dyn DistributedContext>,
}

impl Gate {
    /// Create a gate over the given sink and distributed context.
    #[must_use]
    pub fn new(sink: Box<dyn EventSink>, ctx: Box<dyn DistributedContext>) -> Self {
        Self { sink, ctx }
    }

    /// Create a gate for a run without a distributed context.
    #[must_use]
    pub fn single_process(sink: Box<dyn EventSink>) -> Self {
        Self::new(sink, Box::new(SingleProcess))
    }

    /// Rank of the current process; 0 when no distributed context is active.
    #[must_use]
    pub fn rank(&self) -> u32 {
        if self.ctx.is_active() {
            self.ctx.rank()
        } else {
            0
        }
    }

    /// World size of the job.
    ///
    /// Taken from the distributed context when active, else from the
    /// `WORLD_SIZE` environment variable, else 1.
    #[must_use]
    pub fn world_size(&self) -> u32 {
        if self.ctx.is_active() {
            self.ctx.world_size()
        } else {
            world_size_from_env()
        }
    }

    /// Whether the current process is the one permitted to emit.
    #[must_use]
    pub fn should_emit(&self, log_rank: Option<u32>) -> bool {
        self.rank() == log_rank.unwrap_or(0)
    }

    /// Emit an interval-start record, subject to the gate.
    ///
    /// # Errors
    ///
    /// Propagates barrier and sink failures.
    pub fn start(
        &mut self,
        key: &str,
        value: Option<Value>,
        metadata: Option<Metadata>,
        opts: EmitOpts,
    ) -> Result<()> {
        self.emit(EventType::IntervalStart, key, value, metadata, opts)
    }

    /// Emit a point-in-time record, subject to the gate.
    ///
    /// # Errors
    ///
    /// Propagates barrier and sink failures.
    pub fn event(
        &mut self,
        key: &str,
        value: Option<Value>,
        metadata: Option<Metadata>,
        opts: EmitOpts,
    ) -> Result<()> {
        self.emit(EventType::PointInTime, key, value, metadata, opts)
    }

    /// Emit an interval-end record, subject to the gate.
    ///
    /// # Errors
    ///
    /// Propagates barrier and sink failures.
    pub fn end(
        &mut self,
        key: &str,
        value: Option<Value>,
        metadata: Option<Metadata>,
        opts: EmitOpts,
    ) -> Result<()> {
        self.emit(EventType::IntervalEnd, key, value, metadata, opts)
    }

    fn emit(
        &mut self,
        event_type: EventType,
        key: &str,
        value: Option<Value>,
        metadata: Option<Metadata>,
        opts: EmitOpts,
    ) -> Result<()> {
        // The barrier comes first unconditionally: every rank must arrive
        // before any rank may write, including ranks that will not write.
        if opts.sync {
            self.ctx.barrier()?;
        }
        if self.should_emit(opts.log_rank) {
            self.sink.log(event_type, key, value, metadata)?;
        } else {
            tracing::trace!(key, rank = self.rank(), "suppressed on non-logging rank");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributed::FixedRank;
    use crate::sink::RecordingSink;

    #[test]
    fn test_default_opts() {
        let opts = EmitOpts::default();
        assert!(!opts.sync);
        assert_eq!(opts.log_rank, None);
    }

    #[test]
    fn test_rank_zero_without_context() {
        let gate = Gate::single_process(Box::new(RecordingSink::new()));
        assert_eq!(gate.rank(), 0);
        assert!(gate.should_emit(None));
    }

    #[test]
    fn test_active_context_rank_is_reported() {
        let gate = Gate::new(
            Box::new(RecordingSink::new()),
            Box::new(FixedRank::new(5, 8)),
        );
        assert_eq!(gate.rank(), 5);
        assert_eq!(gate.world_size(), 8);
        assert!(!gate.should_emit(None));
        assert!(gate.should_emit(Some(5)));
    }
}
