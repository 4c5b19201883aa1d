//! Lifecycle callbacks driving compliance logging for a training run.
//!
//! The [`ComplianceMonitor`] is invoked by the external training loop at two
//! points: once when training begins, and at the start of every step. It
//! reads the loop's step counters and metric history, emits the standardized
//! compliance records through the [`Gate`], and asks the loop to stop once a
//! terminal condition is met.

use serde_json::Value;

use crate::config::RunConfig;
use crate::error::Result;
use crate::gate::{EmitOpts, Gate};
use crate::keys;
use crate::sink::Metadata;
use crate::state::{MetricRecord, RunOutcome, RunPhase, StepCounters, TrainerControl};

/// Step-driven state machine emitting compliance milestones.
///
/// Phases move `NotStarted -> Running -> Stopped`. A stop is `success` when
/// the most recent evaluation loss reaches the configured target, `fail` when
/// the step budget runs out first; either way at most one terminal record is
/// written.
///
/// # Example
///
/// ```rust
/// use mlperf_hooks_rs::{
///     ComplianceMonitor, Gate, MetricRecord, RecordingSink, RunConfig, StepCounters,
///     TrainerControl,
/// };
///
/// # fn main() -> mlperf_hooks_rs::Result<()> {
/// let sink = RecordingSink::new();
/// let gate = Gate::single_process(Box::new(sink.clone()));
/// let config = RunConfig {
///     max_steps: 1024,
///     target_eval_loss: 0.1,
///     ..RunConfig::default()
/// };
/// let mut monitor = ComplianceMonitor::new(gate, config)?;
///
/// monitor.on_train_begin()?;
///
/// let counters = StepCounters {
///     global_step: 50,
///     logging_steps: 10,
///     eval_steps: 50,
///     max_steps: 1024,
/// };
/// let history = vec![MetricRecord::new().with("step", 50.0).with("eval_loss", 0.05)];
/// let mut control = TrainerControl::default();
/// monitor.on_step_begin(&counters, &history, &mut control)?;
///
/// assert!(control.should_training_stop);
/// # Ok(())
/// # }
/// ```
pub struct ComplianceMonitor {
    gate: Gate,
    config: RunConfig,
    world_size: u64,
    phase: RunPhase,
}

impl ComplianceMonitor {
    /// Create a monitor over the given gate and run configuration.
    ///
    /// The world size is resolved once, here: from the distributed context
    /// when active, else from the `WORLD_SIZE` environment variable, else 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(gate: Gate, config: RunConfig) -> Result<Self> {
        config.validate()?;
        let world_size = u64::from(gate.world_size());
        Ok(Self {
            gate,
            config,
            world_size,
            phase: RunPhase::NotStarted,
        })
    }

    /// Current phase of the run.
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// World size used for the global batch size computation.
    #[must_use]
    pub fn world_size(&self) -> u64 {
        self.world_size
    }

    /// Record the run configuration and the run-start marker.
    ///
    /// Emits one point-in-time record per configuration field, then the
    /// `run_start` interval-start record, all rank-0-only and unsynchronized.
    /// Not guarded against double invocation: calling this twice writes every
    /// record twice. The loop owns the guarantee that training begins once.
    ///
    /// # Errors
    ///
    /// Propagates sink failures.
    pub fn on_train_begin(&mut self) -> Result<()> {
        if self.phase != RunPhase::NotStarted {
            tracing::warn!("on_train_begin invoked again; duplicating submission records");
        }

        let cfg = self.config.clone();
        let global_batch_size = cfg.per_device_train_batch_size
            * cfg.gradient_accumulation_steps
            * self.world_size;

        self.config_event(keys::SUBMISSION_BENCHMARK, cfg.submission.benchmark.into())?;
        self.config_event(keys::SUBMISSION_DIVISION, cfg.submission.division.into())?;
        self.config_event(keys::SUBMISSION_ORG, cfg.submission.org.into())?;
        self.config_event(keys::SUBMISSION_PLATFORM, cfg.submission.platform.into())?;
        self.config_event(keys::SUBMISSION_POC_NAME, cfg.submission.poc_name.into())?;
        self.config_event(keys::SUBMISSION_POC_EMAIL, cfg.submission.poc_email.into())?;
        self.config_event(keys::SUBMISSION_STATUS, cfg.submission.status.into())?;
        self.config_event(keys::GLOBAL_BATCH_SIZE, global_batch_size.into())?;
        self.config_event(keys::TRAIN_SAMPLES, cfg.train_samples.into())?;
        self.config_event(keys::EVAL_SAMPLES, cfg.eval_samples.into())?;
        self.config_event(keys::SEED, cfg.seed.into())?;
        self.config_event(keys::OPT_LR_WARMUP_FACTOR, cfg.warmup_ratio.into())?;
        self.config_event(keys::OPT_LR_TRAINING_STEPS, cfg.max_steps.into())?;
        self.config_event(keys::OPT_BASE_LR, cfg.learning_rate.into())?;

        self.gate.start(
            keys::RUN_START,
            Some(Value::String(String::new())),
            None,
            EmitOpts::default(),
        )?;

        self.phase = RunPhase::Running;
        tracing::debug!(world_size = self.world_size, "run start recorded");
        Ok(())
    }

    /// Decide, at the start of a step, what to emit and whether to stop.
    ///
    /// On a logging-interval step a `train_loss` record is emitted; on an
    /// evaluation-interval step an `eval_loss` record instead (a step on both
    /// intervals counts as evaluation). Then the stop conditions are checked:
    /// target evaluation loss reached (success) or step budget exhausted
    /// (fail). Once stopped, later calls keep `should_training_stop` raised
    /// but emit nothing further.
    ///
    /// # Errors
    ///
    /// Returns [`HooksError::MissingMetric`](crate::HooksError::MissingMetric)
    /// when a fired branch needs a metric the latest history entry lacks, and
    /// propagates sink failures.
    pub fn on_step_begin(
        &mut self,
        counters: &StepCounters,
        history: &[MetricRecord],
        control: &mut TrainerControl,
    ) -> Result<()> {
        if matches!(self.phase, RunPhase::Stopped(_)) {
            control.should_training_stop = true;
            return Ok(());
        }

        let step = counters.global_step;
        let on_logging = counters.logging_steps > 0 && step % counters.logging_steps == 0;
        let on_eval = counters.eval_steps > 0 && step % counters.eval_steps == 0;

        if step > 0 && on_logging && !on_eval {
            self.metric_event(keys::TRAIN_LOSS, keys::LOSS, history)?;
            control.should_log = true;
        }
        if step > 0 && on_eval {
            self.metric_event(keys::EVAL_LOSS, keys::EVAL_LOSS, history)?;
            control.should_log = true;
        }

        let last_eval = history
            .iter()
            .filter_map(|record| record.get(keys::EVAL_LOSS))
            .last();
        if last_eval.is_some_and(|loss| loss <= self.config.target_eval_loss) {
            self.stop(RunOutcome::Success, last_eval, history, control)?;
        } else if step >= counters.max_steps {
            self.stop(RunOutcome::Fail, last_eval, history, control)?;
        }

        Ok(())
    }

    fn config_event(&mut self, key: &str, value: Value) -> Result<()> {
        self.gate.event(key, Some(value), None, EmitOpts::default())
    }

    /// Emit one metric record taken from the latest history entry.
    fn metric_event(
        &mut self,
        event_key: &str,
        metric_key: &str,
        history: &[MetricRecord],
    ) -> Result<()> {
        let value = Self::latest_metric(history, metric_key)?;
        let step_num = Self::latest_metric(history, keys::STEP)?;

        let mut metadata = Metadata::new();
        metadata.insert(keys::STEP_NUM.to_string(), step_value(step_num));
        self.gate
            .event(event_key, Some(value.into()), Some(metadata), EmitOpts::default())
    }

    fn stop(
        &mut self,
        outcome: RunOutcome,
        last_eval_loss: Option<f64>,
        history: &[MetricRecord],
        control: &mut TrainerControl,
    ) -> Result<()> {
        control.should_training_stop = true;

        // A success stop implies evaluation ran, so a missing step there is a
        // caller error. The fail path can fire before any history exists and
        // must tolerate an absent step and an absent eval loss.
        let step_num = match outcome {
            RunOutcome::Success => Some(Self::latest_metric(history, keys::STEP)?),
            RunOutcome::Fail => history.last().and_then(|record| record.get(keys::STEP)),
        };

        let mut metadata = Metadata::new();
        if let Some(step) = step_num {
            metadata.insert(keys::STEP_NUM.to_string(), step_value(step));
        }
        metadata.insert(keys::STATUS.to_string(), outcome.as_str().into());

        self.gate.end(
            keys::RUN_STOP,
            last_eval_loss.map(Value::from),
            Some(metadata),
            EmitOpts::default(),
        )?;

        self.phase = RunPhase::Stopped(outcome);
        tracing::info!(status = outcome.as_str(), "run stop recorded");
        Ok(())
    }

    fn latest_metric(history: &[MetricRecord], key: &str) -> Result<f64> {
        history
            .last()
            .ok_or_else(|| crate::error::HooksError::MissingMetric {
                key: key.to_string(),
            })?
            .require(key)
    }
}

/// Steps come out of the history as f64; log whole ones as integers.
fn step_value(step: f64) -> Value {
    if step.fract() == 0.0 && step >= 0.0 && step < u64::MAX as f64 {
        Value::from(step as u64)
    } else {
        Value::from(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_value_logs_whole_steps_as_integers() {
        assert_eq!(step_value(20.0), Value::from(20u64));
        assert_eq!(step_value(0.0), Value::from(0u64));
    }

    #[test]
    fn test_step_value_keeps_fractional_steps() {
        assert_eq!(step_value(1.5), Value::from(1.5));
    }
}
