//! Gate behavior across simulated ranks.

use mlperf_hooks_rs::distributed::FixedRank;
use mlperf_hooks_rs::{EmitOpts, EventType, Gate, RecordingSink};

fn gate_at_rank(rank: u32, world_size: u32) -> (Gate, RecordingSink, FixedRank) {
    let sink = RecordingSink::new();
    let ctx = FixedRank::new(rank, world_size);
    let gate = Gate::new(Box::new(sink.clone()), Box::new(ctx.clone()));
    (gate, sink, ctx)
}

#[test]
fn non_permitted_ranks_write_nothing() {
    for rank in 1..4 {
        let (mut gate, sink, _ctx) = gate_at_rank(rank, 4);
        gate.event("seed", Some(42.into()), None, EmitOpts::default())
            .unwrap();
        assert!(sink.is_empty(), "rank {rank} must not write");
    }
}

#[test]
fn permitted_rank_writes_exactly_once() {
    let (mut gate, sink, _ctx) = gate_at_rank(0, 4);
    gate.event("seed", Some(42.into()), None, EmitOpts::default())
        .unwrap();
    assert_eq!(sink.len(), 1);

    let events = sink.events();
    assert_eq!(events[0].key, "seed");
    assert_eq!(events[0].event_type, EventType::PointInTime);
    assert_eq!(events[0].value, Some(42.into()));
}

#[test]
fn explicit_log_rank_overrides_the_default() {
    let (mut gate, sink, _ctx) = gate_at_rank(2, 4);

    gate.event("seed", Some(42.into()), None, EmitOpts::default())
        .unwrap();
    assert!(sink.is_empty());

    gate.event("seed", Some(42.into()), None, EmitOpts::on_rank(2))
        .unwrap();
    assert_eq!(sink.len(), 1);
}

#[test]
fn sync_runs_the_barrier_even_when_not_logging() {
    let (mut gate, sink, ctx) = gate_at_rank(3, 4);

    gate.start("run_start", None, None, EmitOpts::synced())
        .unwrap();

    assert!(sink.is_empty());
    assert_eq!(ctx.barrier_calls(), 1);
}

#[test]
fn unsynced_emission_skips_the_barrier() {
    let (mut gate, _sink, ctx) = gate_at_rank(0, 4);

    gate.end("run_stop", None, None, EmitOpts::default()).unwrap();

    assert_eq!(ctx.barrier_calls(), 0);
}

#[test]
fn sync_runs_the_barrier_before_a_logging_rank_writes() {
    let (mut gate, sink, ctx) = gate_at_rank(0, 4);

    gate.event("seed", Some(42.into()), None, EmitOpts::synced())
        .unwrap();

    assert_eq!(ctx.barrier_calls(), 1);
    assert_eq!(sink.len(), 1);
}

#[test]
fn inactive_context_always_logs() {
    let sink = RecordingSink::new();
    let mut gate = Gate::single_process(Box::new(sink.clone()));

    gate.event("seed", Some(42.into()), None, EmitOpts::default())
        .unwrap();
    gate.start("run_start", None, None, EmitOpts::synced())
        .unwrap();

    assert_eq!(sink.len(), 2);
}

#[test]
fn verbs_map_to_event_types() {
    let (mut gate, sink, _ctx) = gate_at_rank(0, 1);

    gate.start("run_start", None, None, EmitOpts::default())
        .unwrap();
    gate.event("train_loss", Some(2.3.into()), None, EmitOpts::default())
        .unwrap();
    gate.end("run_stop", None, None, EmitOpts::default()).unwrap();

    let events = sink.events();
    assert_eq!(events[0].event_type, EventType::IntervalStart);
    assert_eq!(events[1].event_type, EventType::PointInTime);
    assert_eq!(events[2].event_type, EventType::IntervalEnd);
}
