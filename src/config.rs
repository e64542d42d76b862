use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregationMode;
use crate::alignment::shift::ShiftLimits;
use crate::error::MetricError;
use crate::metrics::retrieval::EmptyTargetAction;

/// How TER picks among several references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiReferencePolicy {
    /// Lowest rate wins.
    #[default]
    Best,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub shift_iteration_cap: usize,
    pub case_sensitive: bool,
    pub multi_reference_policy: MultiReferencePolicy,
    pub max_shift_size: usize,
    pub max_shift_distance: usize,
    pub strip_punctuation: bool,
    pub max_relevance_len: Option<usize>,
    pub empty_target_action: EmptyTargetAction,
    pub aggregation: AggregationMode,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            shift_iteration_cap: ShiftLimits::DEFAULT_ITERATION_CAP,
            case_sensitive: true,
            multi_reference_policy: MultiReferencePolicy::Best,
            max_shift_size: ShiftLimits::DEFAULT_MAX_SHIFT_SIZE,
            max_shift_distance: ShiftLimits::DEFAULT_MAX_SHIFT_DISTANCE,
            strip_punctuation: false,
            max_relevance_len: None,
            empty_target_action: EmptyTargetAction::Neg,
            aggregation: AggregationMode::Pooled,
        }
    }
}

impl MetricsConfig {
    pub fn from_json_str(data: &str) -> Result<Self, MetricError> {
        serde_json::from_str(data).map_err(|e| MetricError::json("parse metrics config", e))
    }

    pub fn load(path: &Path) -> Result<Self, MetricError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| MetricError::io("read metrics config", e))?;
        Self::from_json_str(&data)
    }

    pub fn shift_limits(&self) -> ShiftLimits {
        ShiftLimits {
            iteration_cap: self.shift_iteration_cap,
            max_shift_size: self.max_shift_size,
            max_shift_distance: self.max_shift_distance,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), MetricError> {
        if self.max_relevance_len == Some(0) {
            return Err(MetricError::invalid_input(
                "max_relevance_len must be at least 1 when set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_config_default() {
        let config = MetricsConfig::default();
        assert_eq!(config.shift_iteration_cap, 1_000);
        assert!(config.case_sensitive);
        assert_eq!(config.multi_reference_policy, MultiReferencePolicy::Best);
        assert_eq!(config.max_shift_size, 10);
        assert_eq!(config.max_shift_distance, 50);
        assert!(!config.strip_punctuation);
        assert_eq!(config.max_relevance_len, None);
        assert_eq!(config.empty_target_action, EmptyTargetAction::Neg);
        assert_eq!(config.aggregation, AggregationMode::Pooled);
        assert_eq!(config.shift_limits(), ShiftLimits::default());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = MetricsConfig::from_json_str(
            r#"{"case_sensitive": false, "empty_target_action": "skip", "aggregation": "mean_of_examples"}"#,
        )
        .expect("valid config json");
        assert!(!config.case_sensitive);
        assert_eq!(config.empty_target_action, EmptyTargetAction::Skip);
        assert_eq!(config.aggregation, AggregationMode::MeanOfExamples);
        assert_eq!(config.shift_iteration_cap, 1_000);
    }

    #[test]
    fn unknown_policy_is_json_error() {
        let err = MetricsConfig::from_json_str(r#"{"multi_reference_policy": "average"}"#)
            .unwrap_err();
        assert!(matches!(err, MetricError::Json { .. }));
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let path = std::env::temp_dir().join("corpus_metrics_config_load.json");
        std::fs::write(&path, r#"{"max_shift_size": 4, "max_relevance_len": 100}"#)
            .expect("write config");
        let config = MetricsConfig::load(&path).expect("load config");
        assert_eq!(config.shift_limits().max_shift_size, 4);
        assert_eq!(config.max_relevance_len, Some(100));
        let _ = std::fs::remove_file(&path);

        let err = MetricsConfig::load(Path::new("/nonexistent/metrics.json")).unwrap_err();
        assert!(matches!(err, MetricError::Io { .. }));
    }

    #[test]
    fn zero_relevance_bound_is_rejected() {
        let config = MetricsConfig {
            max_relevance_len: Some(0),
            ..MetricsConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MetricError::InvalidInput { .. })
        ));
    }
}
