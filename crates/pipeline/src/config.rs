//! Pipeline configuration.
//!
//! All knobs are passed explicitly into the pipeline entry point; there is
//! no module-level or process-wide configuration state.

use serde::{Deserialize, Serialize};

use reportweave_core::Error;
pub use reportweave_oracle::DEFAULT_BATCH_SIZE;

/// Decisions below this confidence are ignored for placement.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.70;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// How many of the most recent corrections each oracle call sees.
    #[serde(default = "default_max_corrections")]
    pub max_corrections: usize,

    /// Retrieval budget for few-shot examples per batch.
    #[serde(default = "default_examples_per_batch")]
    pub examples_per_batch: usize,

    /// Run the second-opinion critic pass after classification.
    #[serde(default)]
    pub critic_enabled: bool,
}

fn default_confidence_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_max_corrections() -> usize {
    20
}
fn default_examples_per_batch() -> usize {
    8
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            batch_size: default_batch_size(),
            max_corrections: default_max_corrections(),
            examples_per_batch: default_examples_per_batch(),
            critic_enabled: false,
        }
    }
}

impl PipelineConfig {
    /// Validate before invoking the pipeline.
    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::Config {
                message: format!(
                    "confidence_threshold must be within [0, 1], got {}",
                    self.confidence_threshold
                ),
            });
        }
        if self.batch_size < 1 {
            return Err(Error::Config {
                message: "batch_size must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.confidence_threshold, 0.70);
        assert_eq!(config.batch_size, 50);
        assert!(!config.critic_enabled);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let config = PipelineConfig {
            confidence_threshold: 1.2,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn rejects_zero_batch_size() {
        let config = PipelineConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.max_corrections, 20);
    }
}
