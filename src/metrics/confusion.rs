//! Streaming confusion-count accumulator for multi-class mean-IoU.

use ndarray::Array2;
use tracing::warn;

use crate::error::{Result, SegEvalError};
use crate::metrics::iou::{class_iou, mean_iou};
use crate::types::{DenseLabelMap, Label};

/// Pixel counts of a single class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounts {
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
}

impl ClassCounts {
    /// IoU of this class, `None` when the class is absent.
    pub fn iou(&self) -> Option<f64> {
        class_iou(self.true_positives, self.false_positives, self.false_negatives)
    }
}

/// Accumulates per-class confusion counts across any number of batches.
///
/// For every pixel whose ground truth is not `ignore_value`, the accumulator
/// compares the predicted class with the ground-truth class:
///
/// - equal: true positive for that class
/// - different: false positive for the predicted class and false negative
///   for the ground-truth class
///
/// A prediction that is `ignore_value` or outside `[0, num_classes)` has no
/// class to blame, so it only produces a false negative. Ground-truth labels
/// outside `[0, num_classes)` are skipped, counted in
/// [`out_of_range_targets`](Self::out_of_range_targets) and logged.
///
/// # Absent-class policy
///
/// [`compute`](Self::compute) averages IoU over classes with a non-zero
/// denominator only. A class that never occurs in either the predictions or
/// the scored ground truth is excluded from the mean instead of counting as
/// IoU 0. With no scored pixels at all, `compute` returns `0.0`.
///
/// Counters are exact integers and only grow until [`reset`](Self::reset).
/// The accumulator has a single owner; `update` takes `&mut self`.
#[derive(Debug, Clone)]
pub struct StreamingConfusionAccumulator {
    num_classes: usize,
    ignore_value: Label,
    /// rows: ground truth, columns: prediction
    confusion: Array2<u64>,
    unmatched_targets: Vec<u64>,
    out_of_range_targets: u64,
}

impl StreamingConfusionAccumulator {
    /// Create an accumulator for `num_classes` classes.
    pub fn new(num_classes: usize, ignore_value: Label) -> Self {
        Self {
            num_classes,
            ignore_value,
            confusion: Array2::zeros((num_classes, num_classes)),
            unmatched_targets: vec![0; num_classes],
            out_of_range_targets: 0,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn ignore_value(&self) -> Label {
        self.ignore_value
    }

    /// Accumulate a batch of prediction / ground-truth pairs.
    ///
    /// # Errors
    ///
    /// Returns `BatchLengthMismatch` if the slices differ in length and
    /// `ShapeMismatch` if any pair differs in shape. Every pair is checked
    /// before counting, so a rejected batch leaves the state unchanged.
    pub fn update(
        &mut self,
        predictions: &[DenseLabelMap],
        targets: &[DenseLabelMap],
    ) -> Result<()> {
        if predictions.len() != targets.len() {
            return Err(SegEvalError::BatchLengthMismatch {
                predictions: predictions.len(),
                targets: targets.len(),
            });
        }
        for (prediction, target) in predictions.iter().zip(targets) {
            check_same_shape(prediction, target)?;
        }

        for (prediction, target) in predictions.iter().zip(targets) {
            self.accumulate(prediction, target);
        }
        Ok(())
    }

    /// Accumulate a single prediction / ground-truth pair.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the two maps differ in shape.
    pub fn update_pair(
        &mut self,
        prediction: &DenseLabelMap,
        target: &DenseLabelMap,
    ) -> Result<()> {
        check_same_shape(prediction, target)?;
        self.accumulate(prediction, target);
        Ok(())
    }

    fn accumulate(&mut self, prediction: &DenseLabelMap, target: &DenseLabelMap) {
        let mut out_of_range = 0u64;

        for (&predicted, &truth) in prediction.as_array().iter().zip(target.as_array().iter()) {
            if truth == self.ignore_value {
                continue;
            }
            let Some(truth) = self.class_index(truth) else {
                out_of_range += 1;
                continue;
            };
            match self.class_index(predicted) {
                Some(predicted) if predicted != self.ignore_index() => {
                    self.confusion[[truth, predicted]] += 1;
                }
                _ => self.unmatched_targets[truth] += 1,
            }
        }

        if out_of_range > 0 {
            warn!(
                pixels = out_of_range,
                num_classes = self.num_classes,
                "ground truth contains labels outside the class range; pixels skipped"
            );
            self.out_of_range_targets += out_of_range;
        }
    }

    /// Counts for class `class`. Out-of-range classes yield all zeros.
    pub fn class_counts(&self, class: usize) -> ClassCounts {
        if class >= self.num_classes {
            return ClassCounts::default();
        }
        let true_positives = self.confusion[[class, class]];
        let predicted_total: u64 = self.confusion.column(class).sum();
        let target_total: u64 = self.confusion.row(class).sum() + self.unmatched_targets[class];

        ClassCounts {
            true_positives,
            false_positives: predicted_total - true_positives,
            false_negatives: target_total - true_positives,
        }
    }

    /// IoU per class, `None` for classes absent from the accumulated data.
    pub fn per_class_iou(&self) -> Vec<Option<f64>> {
        (0..self.num_classes)
            .map(|class| self.class_counts(class).iou())
            .collect()
    }

    /// Mean IoU over present classes; `0.0` before any scored pixel.
    pub fn compute(&self) -> f64 {
        mean_iou(&self.per_class_iou())
    }

    /// Fraction of scored pixels predicted correctly, `None` before any scored pixel.
    pub fn pixel_accuracy(&self) -> Option<f64> {
        let scored = self.scored_pixels();
        if scored == 0 {
            return None;
        }
        let correct: u64 = self.confusion.diag().sum();
        Some(correct as f64 / scored as f64)
    }

    /// Number of ground-truth pixels that were scored.
    pub fn scored_pixels(&self) -> u64 {
        self.confusion.sum() + self.unmatched_targets.iter().sum::<u64>()
    }

    /// Number of ground-truth pixels skipped for carrying an out-of-range label.
    pub fn out_of_range_targets(&self) -> u64 {
        self.out_of_range_targets
    }

    /// Raw confusion matrix, rows indexed by ground truth.
    pub fn confusion_matrix(&self) -> &Array2<u64> {
        &self.confusion
    }

    /// True if no pixel has been scored since creation or the last reset.
    pub fn is_empty(&self) -> bool {
        self.scored_pixels() == 0 && self.out_of_range_targets == 0
    }

    /// Zero every counter.
    pub fn reset(&mut self) {
        self.confusion.fill(0);
        self.unmatched_targets.iter_mut().for_each(|count| *count = 0);
        self.out_of_range_targets = 0;
    }

    fn class_index(&self, label: Label) -> Option<usize> {
        usize::try_from(label)
            .ok()
            .filter(|&class| class < self.num_classes)
    }

    /// Column index that can never be a valid class, used when the ignore
    /// value itself falls inside the class range.
    fn ignore_index(&self) -> usize {
        usize::try_from(self.ignore_value).unwrap_or(usize::MAX)
    }
}

fn check_same_shape(prediction: &DenseLabelMap, target: &DenseLabelMap) -> Result<()> {
    if prediction.shape() != target.shape() {
        return Err(SegEvalError::ShapeMismatch {
            expected: target.shape(),
            found: prediction.shape(),
        });
    }
    Ok(())
}
