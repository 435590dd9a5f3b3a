//! Evaluation configuration.
//!
//! Every parameter the engine needs (class count, ignore value, enabled
//! metrics, reporting cadence) is passed explicitly through
//! [`EvaluationConfig`]; nothing is inferred from the data.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SegEvalError};
use crate::types::{Label, IGNORE_INDEX};

/// The two mean-IoU variants the runner can track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// All `num_classes` classes, background included
    IncludeBackground,
    /// Background dropped, remaining classes shifted down by one
    ExcludeBackground,
}

impl MetricKind {
    /// Metric name without prefix.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::IncludeBackground => "mean_iou",
            Self::ExcludeBackground => "mean_iou_no_bg",
        }
    }
}

/// Configuration for one evaluation run.
///
/// # Example
///
/// ```
/// use seg_eval::config::EvaluationConfig;
///
/// let config = EvaluationConfig::from_json_str(r#"{ "num_classes": 7 }"#).unwrap();
/// assert_eq!(config.ignore_value, 255);
/// assert_eq!(config.report_interval, 50);
/// assert_eq!(config.enabled_metric_names(), vec!["val_mean_iou", "val_mean_iou_no_bg"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Number of classes including background
    pub num_classes: usize,

    /// Ground-truth label excluded from scoring
    #[serde(default = "default_ignore_value")]
    pub ignore_value: Label,

    /// Track mean-IoU over all classes
    #[serde(default = "default_true")]
    pub include_background: bool,

    /// Track mean-IoU with the background class removed
    #[serde(default = "default_true")]
    pub exclude_background: bool,

    /// Emit a progress report every this many batches
    #[serde(default = "default_report_interval")]
    pub report_interval: usize,

    /// Prefix of reported metric names (`val` gives `val_mean_iou`)
    #[serde(default = "default_metric_prefix")]
    pub metric_prefix: String,

    /// Metric used for the headline score and performance tier
    #[serde(default = "default_primary_metric")]
    pub primary_metric: String,

    /// Human-readable class names, index aligned with class ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_names: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,
}

fn default_ignore_value() -> Label {
    IGNORE_INDEX
}

fn default_true() -> bool {
    true
}

fn default_report_interval() -> usize {
    50
}

fn default_metric_prefix() -> String {
    "val".to_string()
}

fn default_primary_metric() -> String {
    "val_mean_iou".to_string()
}

impl EvaluationConfig {
    /// Create a configuration with defaults for everything but the class count.
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            ignore_value: default_ignore_value(),
            include_background: true,
            exclude_background: true,
            report_interval: default_report_interval(),
            metric_prefix: default_metric_prefix(),
            primary_metric: default_primary_metric(),
            class_names: None,
            model_name: None,
            dataset_name: None,
        }
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if
    /// validation fails.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check every field and report the first problem found.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if `num_classes <= 1`, `report_interval`
    /// is zero, neither metric is enabled, the ignore value collides with a
    /// real class, or `class_names` has the wrong length.
    pub fn validate(&self) -> Result<()> {
        if self.num_classes <= 1 {
            return Err(SegEvalError::config(format!(
                "num_classes must be greater than 1, got {}",
                self.num_classes
            )));
        }
        if self.report_interval == 0 {
            return Err(SegEvalError::config("report_interval must be greater than 0"));
        }
        if !self.include_background && !self.exclude_background {
            return Err(SegEvalError::config(
                "at least one of include_background / exclude_background must be enabled",
            ));
        }
        if usize::try_from(self.ignore_value).is_ok_and(|value| value < self.num_classes) {
            return Err(SegEvalError::config(format!(
                "ignore_value {} collides with class range [0, {})",
                self.ignore_value, self.num_classes
            )));
        }
        if let Some(names) = &self.class_names {
            if names.len() != self.num_classes {
                return Err(SegEvalError::config(format!(
                    "class_names has {} entries, expected {}",
                    names.len(),
                    self.num_classes
                )));
            }
        }
        Ok(())
    }

    /// Full metric name for `kind`, e.g. `val_mean_iou_no_bg`.
    pub fn metric_name(&self, kind: MetricKind) -> String {
        if self.metric_prefix.is_empty() {
            kind.suffix().to_string()
        } else {
            format!("{}_{}", self.metric_prefix, kind.suffix())
        }
    }

    /// Enabled metric kinds, background-inclusive first.
    pub fn enabled_metrics(&self) -> Vec<MetricKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.include_background {
            kinds.push(MetricKind::IncludeBackground);
        }
        if self.exclude_background {
            kinds.push(MetricKind::ExcludeBackground);
        }
        kinds
    }

    pub fn enabled_metric_names(&self) -> Vec<String> {
        self.enabled_metrics()
            .into_iter()
            .map(|kind| self.metric_name(kind))
            .collect()
    }

    /// Class count scored by the accumulator for `kind`.
    pub fn classes_for(&self, kind: MetricKind) -> usize {
        match kind {
            MetricKind::IncludeBackground => self.num_classes,
            MetricKind::ExcludeBackground => self.num_classes - 1,
        }
    }

    /// Names of the non-background classes, when class names are known.
    pub fn foreground_class_names(&self) -> Option<&[String]> {
        self.class_names.as_deref().and_then(|names| names.get(1..))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EvaluationConfig::new(7);
        assert!(config.validate().is_ok());
        assert_eq!(config.classes_for(MetricKind::ExcludeBackground), 6);
    }

    #[test]
    fn test_too_few_classes() {
        let result = EvaluationConfig::new(1).validate();
        assert!(matches!(result, Err(SegEvalError::ConfigurationError(_))));
    }

    #[test]
    fn test_no_metric_enabled() {
        let mut config = EvaluationConfig::new(3);
        config.include_background = false;
        config.exclude_background = false;
        match config.validate() {
            Err(SegEvalError::ConfigurationError(msg)) => {
                assert!(msg.contains("include_background"))
            }
            other => panic!("Expected ConfigurationError, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_report_interval() {
        let mut config = EvaluationConfig::new(3);
        config.report_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ignore_value_inside_class_range() {
        let mut config = EvaluationConfig::new(3);
        config.ignore_value = 2;
        assert!(config.validate().is_err());

        config.ignore_value = -1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_class_names_length() {
        let mut config = EvaluationConfig::new(3);
        config.class_names = Some(vec!["background".into(), "building".into()]);
        assert!(config.validate().is_err());

        config.class_names = Some(vec!["background".into(), "building".into(), "road".into()]);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.foreground_class_names(),
            Some(&["building".to_string(), "road".to_string()][..])
        );
    }

    #[test]
    fn test_metric_names() {
        let mut config = EvaluationConfig::new(3);
        assert_eq!(config.metric_name(MetricKind::IncludeBackground), "val_mean_iou");
        config.metric_prefix = "test".into();
        assert_eq!(config.metric_name(MetricKind::ExcludeBackground), "test_mean_iou_no_bg");
        config.metric_prefix.clear();
        assert_eq!(config.metric_name(MetricKind::IncludeBackground), "mean_iou");
    }

    #[test]
    fn test_from_json_str_validates() {
        let result = EvaluationConfig::from_json_str(r#"{ "num_classes": 0 }"#);
        assert!(result.is_err());

        let config = EvaluationConfig::from_json_str(
            r#"{ "num_classes": 4, "exclude_background": false, "report_interval": 10 }"#,
        )
        .unwrap();
        assert_eq!(config.enabled_metrics(), vec![MetricKind::IncludeBackground]);
        assert_eq!(config.report_interval, 10);
    }

    #[test]
    fn test_invalid_json() {
        let result = EvaluationConfig::from_json_str("{ num_classes: ");
        assert!(matches!(result, Err(SegEvalError::JsonError(_))));
    }
}
