//! Evaluation orchestrator: streams batches into the mean-IoU accumulators.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::config::{EvaluationConfig, MetricKind};
use crate::error::Result;
use crate::metrics::confusion::StreamingConfusionAccumulator;
use crate::reconstruct::reconstruct_from_parts;
use crate::remap::remove_background;
use crate::report::EvaluationSink;
use crate::sanitize::sanitize_prediction_in_place;
use crate::stats::RunStats;
use crate::types::{Batch, DenseLabelMap, EvaluationResult, ProgressReport, Sample};

/// One enabled metric and the accumulator backing it.
#[derive(Debug, Clone)]
struct TrackedMetric {
    kind: MetricKind,
    name: String,
    accumulator: StreamingConfusionAccumulator,
}

/// A sample after reconstruction and sanitization, ready to be scored.
struct PreparedSample {
    prediction: DenseLabelMap,
    target: DenseLabelMap,
    clamped: usize,
    uncovered: usize,
}

/// Runs the per-batch evaluation pipeline.
///
/// For each sample: reconstruct the ground truth from its instance masks,
/// clamp the prediction into the class range, then feed the pair to every
/// enabled accumulator (after background removal for the no-background
/// metric). The same runner backs both a standalone evaluation pass
/// ([`run`](Self::run)) and per-epoch validation
/// ([`finish_epoch`](Self::finish_epoch)).
///
/// The runner owns its accumulators exclusively and processes batches
/// strictly in call order.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use seg_eval::config::EvaluationConfig;
/// use seg_eval::evaluator::EvaluationRunner;
/// use seg_eval::types::{Batch, DenseLabelMap, Sample, SampleAnnotations};
///
/// let mut runner = EvaluationRunner::new(EvaluationConfig::new(3)).unwrap();
/// let sample = Sample::new(
///     DenseLabelMap::from_rows(vec![vec![1, 2]]).unwrap(),
///     SampleAnnotations::new(vec![array![[true, false]], array![[false, true]]], vec![1, 2]),
/// );
/// runner.process_batch(&Batch::new(vec![sample])).unwrap();
///
/// let result = runner.finalize();
/// assert_eq!(result.metric("val_mean_iou"), Some(1.0));
/// assert_eq!(result.metric("val_mean_iou_no_bg"), Some(1.0));
/// ```
#[derive(Debug, Clone)]
pub struct EvaluationRunner {
    config: EvaluationConfig,
    metrics: Vec<TrackedMetric>,
    stats: RunStats,
    total_batches: Option<usize>,
}

impl EvaluationRunner {
    /// Create a runner for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid. This is
    /// the only place configuration problems surface; no batch is touched
    /// before it succeeds.
    pub fn new(config: EvaluationConfig) -> Result<Self> {
        config.validate()?;

        let metrics = config
            .enabled_metrics()
            .into_iter()
            .map(|kind| TrackedMetric {
                kind,
                name: config.metric_name(kind),
                accumulator: StreamingConfusionAccumulator::new(
                    config.classes_for(kind),
                    config.ignore_value,
                ),
            })
            .collect();

        Ok(Self {
            config,
            metrics,
            stats: RunStats::new(),
            total_batches: None,
        })
    }

    /// Attach the total number of batches, used in progress lines.
    pub fn with_total_batches(mut self, total_batches: usize) -> Self {
        self.total_batches = Some(total_batches);
        self
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Accumulator backing `kind`, if that metric is enabled.
    pub fn accumulator(&self, kind: MetricKind) -> Option<&StreamingConfusionAccumulator> {
        self.metrics
            .iter()
            .find(|metric| metric.kind == kind)
            .map(|metric| &metric.accumulator)
    }

    /// Evaluate one batch.
    ///
    /// Every sample is reconstructed and checked before any accumulator is
    /// updated, so a structural error aborts the whole batch and leaves the
    /// accumulated state exactly as it was.
    ///
    /// # Returns
    ///
    /// A progress report when this batch completes a reporting interval.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if a mask does not match its prediction's
    /// shape, and `LengthMismatch` if a sample's mask and class-id lists
    /// differ in length.
    pub fn process_batch(&mut self, batch: &Batch) -> Result<Option<ProgressReport>> {
        let prepared = batch
            .samples
            .iter()
            .map(|sample| self.prepare_sample(sample))
            .collect::<Result<Vec<_>>>()?;

        let mut predictions = Vec::with_capacity(prepared.len());
        let mut targets = Vec::with_capacity(prepared.len());
        let mut sample_counts = Vec::with_capacity(prepared.len());
        for sample in prepared {
            sample_counts.push((sample.target.shape(), sample.uncovered, sample.clamped));
            predictions.push(sample.prediction);
            targets.push(sample.target);
        }

        let num_classes = self.config.num_classes;
        let ignore_value = self.config.ignore_value;
        for metric in &mut self.metrics {
            match metric.kind {
                MetricKind::IncludeBackground => metric.accumulator.update(&predictions, &targets)?,
                MetricKind::ExcludeBackground => {
                    let predictions: Vec<DenseLabelMap> = predictions
                        .iter()
                        .map(|map| remove_background(map, num_classes, ignore_value))
                        .collect();
                    let targets: Vec<DenseLabelMap> = targets
                        .iter()
                        .map(|map| remove_background(map, num_classes, ignore_value))
                        .collect();
                    metric.accumulator.update(&predictions, &targets)?;
                }
            }
        }

        self.stats.add_batch();
        for (shape, uncovered, clamped) in sample_counts {
            self.stats.add_sample(shape, uncovered, clamped);
        }
        if let Some(primary) = self.metrics.first() {
            self.stats
                .set_out_of_range_targets(primary.accumulator.out_of_range_targets());
        }
        debug!(
            batch = self.stats.batches,
            samples = batch.len(),
            "batch accumulated"
        );

        if self.stats.batches % self.config.report_interval == 0 {
            let report = ProgressReport {
                batch_index: self.stats.batches,
                total_batches: self.total_batches,
                metrics: self.snapshot(),
            };
            match report.total_batches {
                Some(total) => info!(
                    "Batch {}/{}: {}",
                    report.batch_index,
                    total,
                    report.summary_string()
                ),
                None => info!("Batch {}: {}", report.batch_index, report.summary_string()),
            }
            return Ok(Some(report));
        }

        Ok(None)
    }

    fn prepare_sample(&self, sample: &Sample) -> Result<PreparedSample> {
        let shape = sample.prediction.shape();
        let target = reconstruct_from_parts(
            shape,
            &sample.annotations.masks,
            &sample.annotations.class_ids,
            self.config.ignore_value,
        )?;

        let mut prediction = sample.prediction.clone();
        let clamped = sanitize_prediction_in_place(&mut prediction, self.config.num_classes);
        let uncovered = target.count(self.config.ignore_value);

        Ok(PreparedSample {
            prediction,
            target,
            clamped,
            uncovered,
        })
    }

    /// Current value of every enabled metric, without resetting anything.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.metrics
            .iter()
            .map(|metric| (metric.name.clone(), metric.accumulator.compute()))
            .collect()
    }

    /// Compute the final result of everything accumulated so far.
    pub fn finalize(&self) -> EvaluationResult {
        if self.stats.samples == 0 {
            warn!("finalizing evaluation without any samples; metrics default to 0.0");
        }

        let mut result = EvaluationResult::new();
        for metric in &self.metrics {
            result
                .metrics
                .insert(metric.name.clone(), metric.accumulator.compute());
            result
                .per_class_iou
                .insert(metric.name.clone(), metric.accumulator.per_class_iou());
        }
        result.samples_evaluated = self.stats.samples;
        result.batches_evaluated = self.stats.batches;
        result.stats = self.stats.clone();
        result
    }

    /// End a validation epoch: finalize, log the epoch line, then reset so the
    /// next epoch starts from zero.
    pub fn finish_epoch(&mut self, epoch: usize) -> EvaluationResult {
        let result = self.finalize();

        let line = result
            .metrics
            .iter()
            .map(|(name, score)| format!("{name} = {score:.4} ({:.1}%)", score * 100.0))
            .collect::<Vec<_>>()
            .join(" | ");
        info!("Epoch {epoch}: {line}");

        self.reset();
        result
    }

    /// Zero every accumulator and statistic.
    pub fn reset(&mut self) {
        for metric in &mut self.metrics {
            metric.accumulator.reset();
        }
        self.stats.reset();
    }

    /// Evaluate a full sequence of batches and hand the result to `sink`.
    ///
    /// Progress reports are forwarded to the sink as they occur. The first
    /// structural error aborts the run and is returned; the sink does not
    /// receive a final result in that case.
    pub fn run<I>(&mut self, batches: I, sink: &mut dyn EvaluationSink) -> Result<EvaluationResult>
    where
        I: IntoIterator<Item = Batch>,
    {
        for batch in batches {
            if let Some(report) = self.process_batch(&batch)? {
                sink.progress(&report)?;
            }
        }

        let result = self.finalize();
        self.stats.log_summary();
        sink.finalize(&result)?;
        Ok(result)
    }
}
