//! Run configuration and submission metadata.
//!
//! A [`RunConfig`] is set once, before any compliance event is emitted, and
//! is read-only thereafter. It carries the submission metadata and the
//! hyperparameters echoed into the compliance log at run start, plus the
//! target evaluation loss that decides a successful stop.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HooksError, Result};

/// Configuration for one monitored fine-tuning run.
///
/// # Example
///
/// ```rust
/// use mlperf_hooks_rs::RunConfig;
///
/// # fn main() -> mlperf_hooks_rs::Result<()> {
/// let config = RunConfig {
///     per_device_train_batch_size: 8,
///     gradient_accumulation_steps: 4,
///     learning_rate: 4e-4,
///     max_steps: 1024,
///     target_eval_loss: 0.92,
///     ..RunConfig::default()
/// };
/// config.validate()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Submission metadata echoed verbatim into the compliance log.
    #[serde(default)]
    pub submission: SubmissionInfo,

    /// Training batch size per device.
    #[serde(default = "default_batch_size")]
    pub per_device_train_batch_size: u64,

    /// Gradient accumulation steps per optimizer step.
    #[serde(default = "default_grad_accum")]
    pub gradient_accumulation_steps: u64,

    /// Base learning rate.
    pub learning_rate: f64,

    /// Warmup fraction of the learning-rate schedule.
    #[serde(default)]
    pub warmup_ratio: f64,

    /// Maximum number of training steps before the run is failed.
    pub max_steps: u64,

    /// Random seed of the run.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of training samples.
    #[serde(default)]
    pub train_samples: u64,

    /// Number of evaluation samples.
    #[serde(default)]
    pub eval_samples: u64,

    /// Evaluation loss at or below which the run stops successfully.
    pub target_eval_loss: f64,
}

fn default_batch_size() -> u64 {
    8
}
fn default_grad_accum() -> u64 {
    1
}
fn default_seed() -> u64 {
    42
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            submission: SubmissionInfo::default(),
            per_device_train_batch_size: default_batch_size(),
            gradient_accumulation_steps: default_grad_accum(),
            learning_rate: 4e-4,
            warmup_ratio: 0.0,
            max_steps: 1024,
            seed: default_seed(),
            train_samples: 0,
            eval_samples: 0,
            target_eval_loss: 0.92,
        }
    }
}

impl RunConfig {
    /// Load a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Write the configuration to a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = serde_yaml::to_string(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HooksError::Config`] describing the first violated
    /// constraint.
    pub fn validate(&self) -> Result<()> {
        if self.per_device_train_batch_size == 0 {
            return Err(HooksError::Config(
                "per_device_train_batch_size must be positive".to_string(),
            ));
        }
        if self.gradient_accumulation_steps == 0 {
            return Err(HooksError::Config(
                "gradient_accumulation_steps must be positive".to_string(),
            ));
        }
        if self.learning_rate <= 0.0 || !self.learning_rate.is_finite() {
            return Err(HooksError::Config(
                "learning_rate must be positive and finite".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.warmup_ratio) {
            return Err(HooksError::Config(
                "warmup_ratio must be within [0, 1]".to_string(),
            ));
        }
        if self.max_steps == 0 {
            return Err(HooksError::Config("max_steps must be positive".to_string()));
        }
        if !self.target_eval_loss.is_finite() {
            return Err(HooksError::Config(
                "target_eval_loss must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Benchmark submission metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionInfo {
    /// Benchmark name.
    #[serde(default = "default_benchmark")]
    pub benchmark: String,
    /// Submission division.
    #[serde(default = "default_division")]
    pub division: String,
    /// Submitting organization.
    #[serde(default = "default_placeholder")]
    pub org: String,
    /// Submission platform.
    #[serde(default = "default_placeholder")]
    pub platform: String,
    /// Point-of-contact name.
    #[serde(default = "default_placeholder")]
    pub poc_name: String,
    /// Point-of-contact email.
    #[serde(default = "default_placeholder")]
    pub poc_email: String,
    /// Submission status.
    #[serde(default = "default_placeholder")]
    pub status: String,
}

fn default_benchmark() -> String {
    "llm-finetuning".to_string()
}
fn default_division() -> String {
    "Closed".to_string()
}
fn default_placeholder() -> String {
    "reference".to_string()
}

impl Default for SubmissionInfo {
    fn default() -> Self {
        Self {
            benchmark: default_benchmark(),
            division: default_division(),
            org: default_placeholder(),
            platform: default_placeholder(),
            poc_name: default_placeholder(),
            poc_email: default_placeholder(),
            status: default_placeholder(),
        }
    }
}
