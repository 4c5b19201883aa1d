//! Compliance event-key vocabulary.
//!
//! These keys form a fixed, externally-defined enumeration shared with
//! downstream compliance-log checkers. They must be emitted byte-for-byte
//! as written here; a misspelled key fails submission validation.

/// Benchmark name being submitted.
pub const SUBMISSION_BENCHMARK: &str = "submission_benchmark";
/// Submission division (e.g. "Closed").
pub const SUBMISSION_DIVISION: &str = "submission_division";
/// Submitting organization.
pub const SUBMISSION_ORG: &str = "submission_org";
/// Hardware/software platform of the submission.
pub const SUBMISSION_PLATFORM: &str = "submission_platform";
/// Point-of-contact name.
pub const SUBMISSION_POC_NAME: &str = "submission_poc_name";
/// Point-of-contact email.
pub const SUBMISSION_POC_EMAIL: &str = "submission_poc_email";
/// Submission status.
pub const SUBMISSION_STATUS: &str = "submission_status";

/// Effective global batch size (per-device batch x grad accumulation x world size).
pub const GLOBAL_BATCH_SIZE: &str = "global_batch_size";
/// Number of training samples.
pub const TRAIN_SAMPLES: &str = "train_samples";
/// Number of evaluation samples.
pub const EVAL_SAMPLES: &str = "eval_samples";
/// Random seed of the run.
pub const SEED: &str = "seed";
/// Learning-rate warmup factor.
pub const OPT_LR_WARMUP_FACTOR: &str = "opt_lr_warmup_factor";
/// Total learning-rate schedule steps.
pub const OPT_LR_TRAINING_STEPS: &str = "opt_lr_training_steps";
/// Base learning rate.
pub const OPT_BASE_LR: &str = "opt_base_lr";

/// Run start marker (interval start).
pub const RUN_START: &str = "run_start";
/// Run stop marker (interval end).
pub const RUN_STOP: &str = "run_stop";

/// Per-interval training loss event.
pub const TRAIN_LOSS: &str = "train_loss";
/// Per-interval evaluation loss event; also the metric-history field name.
pub const EVAL_LOSS: &str = "eval_loss";
/// Training loss field name in the metric history.
pub const LOSS: &str = "loss";
/// Step field name in the metric history.
pub const STEP: &str = "step";

/// Metadata key carrying the step a metric was measured at.
pub const STEP_NUM: &str = "step_num";
/// Metadata key carrying the terminal run status.
pub const STATUS: &str = "status";
/// Terminal status value for a run that met its target.
pub const STATUS_SUCCESS: &str = "success";
/// Terminal status value for a run that exhausted its step budget.
pub const STATUS_FAIL: &str = "fail";
