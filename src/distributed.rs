//! Distributed process-group abstraction.
//!
//! Compliance logging must behave identically whether a run spans one process
//! or many. This module defines the narrow capability the crate needs from a
//! distributed runtime (activity check, rank query, barrier) as a trait, plus
//! a single-process implementation and a fixed-rank implementation used to
//! simulate multi-rank jobs in tests without a real communicator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::Result;

/// Capability supplied by the embedding distributed runtime.
///
/// When no process group is initialized, implementations must report
/// [`is_active`](DistributedContext::is_active) as `false`; callers then treat
/// the rank as 0, the world size as 1, and the barrier as a no-op.
pub trait DistributedContext {
    /// Whether a distributed process group is initialized.
    fn is_active(&self) -> bool;

    /// Rank of the current process within the group.
    fn rank(&self) -> u32;

    /// Number of cooperating processes in the group.
    fn world_size(&self) -> u32;

    /// Block until every process in the group reaches this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying communicator fails. There is no
    /// timeout; a hung peer hangs the barrier for everyone.
    fn barrier(&self) -> Result<()>;
}

/// Context for a plain single-process run: rank 0, world size 1, no-op barrier.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl DistributedContext for SingleProcess {
    fn is_active(&self) -> bool {
        false
    }

    fn rank(&self) -> u32 {
        0
    }

    fn world_size(&self) -> u32 {
        1
    }

    fn barrier(&self) -> Result<()> {
        Ok(())
    }
}

/// An active context pinned to a fixed rank and world size.
///
/// Stands in for a real communicator when simulating one rank of a
/// multi-process job. The barrier never blocks; it only counts invocations so
/// tests can assert that synchronization happened.
///
/// # Example
///
/// ```rust
/// use mlperf_hooks_rs::distributed::{DistributedContext, FixedRank};
///
/// let ctx = FixedRank::new(3, 8);
/// assert!(ctx.is_active());
/// assert_eq!(ctx.rank(), 3);
/// ctx.barrier().unwrap();
/// assert_eq!(ctx.barrier_calls(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct FixedRank {
    rank: u32,
    world_size: u32,
    barriers: Arc<AtomicUsize>,
}

impl FixedRank {
    /// Create a context reporting the given rank and world size.
    #[must_use]
    pub fn new(rank: u32, world_size: u32) -> Self {
        Self {
            rank,
            world_size,
            barriers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times the barrier has been invoked.
    ///
    /// Clones share the counter, so a handle kept outside a gate observes
    /// barriers performed inside it.
    #[must_use]
    pub fn barrier_calls(&self) -> usize {
        self.barriers.load(Ordering::SeqCst)
    }
}

impl DistributedContext for FixedRank {
    fn is_active(&self) -> bool {
        true
    }

    fn rank(&self) -> u32 {
        self.rank
    }

    fn world_size(&self) -> u32 {
        self.world_size
    }

    fn barrier(&self) -> Result<()> {
        self.barriers.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// World size taken from the `WORLD_SIZE` environment variable.
///
/// Launchers export `WORLD_SIZE` before the process group exists; this is the
/// fallback used when the distributed context is inactive. Defaults to 1 when
/// the variable is unset or unparseable.
#[must_use]
pub fn world_size_from_env() -> u32 {
    parse_world_size(std::env::var("WORLD_SIZE").ok().as_deref())
}

fn parse_world_size(var: Option<&str>) -> u32 {
    var.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&w| w > 0)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_process_is_rank_zero() {
        let ctx = SingleProcess;
        assert!(!ctx.is_active());
        assert_eq!(ctx.rank(), 0);
        assert_eq!(ctx.world_size(), 1);
        assert!(ctx.barrier().is_ok());
    }

    #[test]
    fn test_fixed_rank_reports_configured_values() {
        let ctx = FixedRank::new(2, 4);
        assert!(ctx.is_active());
        assert_eq!(ctx.rank(), 2);
        assert_eq!(ctx.world_size(), 4);
    }

    #[test]
    fn test_fixed_rank_counts_barriers_across_clones() {
        let ctx = FixedRank::new(0, 2);
        let handle = ctx.clone();

        ctx.barrier().unwrap();
        ctx.barrier().unwrap();

        assert_eq!(handle.barrier_calls(), 2);
    }

    #[test]
    fn test_parse_world_size_defaults_to_one() {
        assert_eq!(parse_world_size(None), 1);
        assert_eq!(parse_world_size(Some("")), 1);
        assert_eq!(parse_world_size(Some("not-a-number")), 1);
        assert_eq!(parse_world_size(Some("0")), 1);
    }

    #[test]
    fn test_parse_world_size_reads_value() {
        assert_eq!(parse_world_size(Some("8")), 8);
        assert_eq!(parse_world_size(Some(" 16 ")), 16);
    }
}
