//! Result reporting and persistence.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{EvaluationConfig, MetricKind};
use crate::error::Result;
use crate::types::{EvaluationResult, ProgressReport};

/// Receives progress reports and the final result of an evaluation run.
pub trait EvaluationSink {
    /// Called for every intermediate progress report. Ignored by default.
    fn progress(&mut self, _report: &ProgressReport) -> Result<()> {
        Ok(())
    }

    /// Called once with the final result.
    fn finalize(&mut self, result: &EvaluationResult) -> Result<()>;
}

/// Coarse qualitative bucket for a mean-IoU score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    Outstanding,
    Excellent,
    Strong,
    Good,
    NeedsImprovement,
}

impl PerformanceTier {
    /// Bucket a score: `> 0.5` outstanding, `> 0.4` excellent, `> 0.3`
    /// strong, `> 0.2` good, anything else needs improvement.
    ///
    /// # Example
    ///
    /// ```
    /// use seg_eval::report::PerformanceTier;
    ///
    /// assert_eq!(PerformanceTier::from_score(0.45), PerformanceTier::Excellent);
    /// assert_eq!(PerformanceTier::from_score(0.2), PerformanceTier::NeedsImprovement);
    /// ```
    pub fn from_score(score: f64) -> Self {
        if score > 0.5 {
            Self::Outstanding
        } else if score > 0.4 {
            Self::Excellent
        } else if score > 0.3 {
            Self::Strong
        } else if score > 0.2 {
            Self::Good
        } else {
            Self::NeedsImprovement
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Outstanding => "Outstanding performance",
            Self::Excellent => "Excellent performance",
            Self::Strong => "Strong performance",
            Self::Good => "Good performance",
            Self::NeedsImprovement => "Room for improvement",
        };
        f.write_str(label)
    }
}

/// Run metadata that is not part of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_path: Option<String>,
}

/// The document written to disk at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_path: Option<String>,
    pub evaluation_results: BTreeMap<String, f64>,
    pub per_class_iou: BTreeMap<String, Vec<Option<f64>>>,
    pub primary_metric: String,
    pub primary_score: f64,
    pub performance: PerformanceTier,
    pub num_classes: usize,
    pub samples_evaluated: usize,
    pub batches_evaluated: usize,
    /// Distinct evaluated resolutions as `HxW`
    #[serde(default)]
    pub image_sizes: Vec<String>,
    pub config_used: EvaluationConfig,
}

impl EvaluationSummary {
    /// Assemble a summary. A primary metric that was not computed scores 0.0.
    pub fn new(
        result: &EvaluationResult,
        config: &EvaluationConfig,
        metadata: &RunMetadata,
    ) -> Self {
        let primary_score = result.metric(&config.primary_metric).unwrap_or(0.0);
        Self {
            model: config.model_name.clone(),
            dataset: config.dataset_name.clone(),
            checkpoint_path: metadata.checkpoint_path.clone(),
            evaluation_results: result.metrics.clone(),
            per_class_iou: result.per_class_iou.clone(),
            primary_metric: config.primary_metric.clone(),
            primary_score,
            performance: PerformanceTier::from_score(primary_score),
            num_classes: config.num_classes,
            samples_evaluated: result.samples_evaluated,
            batches_evaluated: result.batches_evaluated,
            image_sizes: result.stats.resolution_strings(),
            config_used: config.clone(),
        }
    }
}

/// Writes the final [`EvaluationSummary`] as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
    config: EvaluationConfig,
    metadata: RunMetadata,
}

impl JsonFileSink {
    pub fn new<P: AsRef<Path>>(path: P, config: EvaluationConfig, metadata: RunMetadata) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
            metadata,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EvaluationSink for JsonFileSink {
    fn finalize(&mut self, result: &EvaluationResult) -> Result<()> {
        let summary = EvaluationSummary::new(result, &self.config, &self.metadata);
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&summary)?)?;
        info!("Detailed results saved to: {}", self.path.display());
        Ok(())
    }
}

/// Read a summary previously written by [`JsonFileSink`].
pub fn load_summary<P: AsRef<Path>>(path: P) -> Result<EvaluationSummary> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Log the final results: each metric, the comparison between the two
/// variants when both are enabled, and the performance tier.
pub fn log_summary(result: &EvaluationResult, config: &EvaluationConfig) {
    info!("FINAL EVALUATION RESULTS");
    if let Some(model) = &config.model_name {
        info!("Model: {model}");
    }
    if let Some(dataset) = &config.dataset_name {
        info!("Dataset: {dataset}");
    }
    info!("Samples evaluated: {}", result.samples_evaluated);
    if !result.stats.resolutions.is_empty() {
        info!("Image sizes: {}", result.stats.resolution_strings().join(", "));
    }

    let all_name = config.metric_name(MetricKind::IncludeBackground);
    let no_bg_name = config.metric_name(MetricKind::ExcludeBackground);
    let all = result.metric(&all_name);
    let no_bg = result.metric(&no_bg_name);

    if let Some(score) = all {
        info!(
            "Including background (all {} classes): mean IoU {:.4} ({:.1}%)",
            config.num_classes,
            score,
            score * 100.0
        );
    }
    if let Some(score) = no_bg {
        info!(
            "Excluding background ({} semantic classes): mean IoU {:.4} ({:.1}%)",
            config.num_classes - 1,
            score,
            score * 100.0
        );
        if let Some(names) = config.foreground_class_names() {
            info!("Classes: {}", names.join(", "));
        }
    }
    if let (Some(all), Some(no_bg)) = (all, no_bg) {
        let difference = no_bg - all;
        info!("Difference (no background - all): {difference:+.4}");
        if difference > 0.0 {
            info!("Semantic classes perform better than the overall average");
        } else {
            info!("Background class performs better than the semantic classes");
        }
    }

    let primary_score = result.metric(&config.primary_metric).unwrap_or(0.0);
    info!(
        "{} ({} = {:.4})",
        PerformanceTier::from_score(primary_score),
        config.primary_metric,
        primary_score
    );
}
