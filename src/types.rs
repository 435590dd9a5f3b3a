//! Core data types for label maps, instance annotations and evaluation results.

use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SegEvalError};
use crate::stats::RunStats;

/// Integer class label stored in a [`DenseLabelMap`].
///
/// Signed so that raw model output below zero survives until sanitization.
pub type Label = i64;

/// Sentinel label meaning "excluded from scoring".
pub const IGNORE_INDEX: Label = 255;

/// Class id reserved for background.
pub const BACKGROUND_CLASS: Label = 0;

/// Spatial shape of a label map as `(height, width)`.
pub type Shape = (usize, usize);

/// A dense per-pixel label grid of shape `(height, width)`.
///
/// Produced either by reconstruction from instance annotations (ground truth)
/// or by a model's post-processor (prediction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseLabelMap {
    labels: Array2<Label>,
}

impl DenseLabelMap {
    /// Create a label map of the given shape with every pixel set to `value`.
    pub fn filled(shape: Shape, value: Label) -> Self {
        Self {
            labels: Array2::from_elem(shape, value),
        }
    }

    /// Wrap an existing label array.
    pub fn from_array(labels: Array2<Label>) -> Self {
        Self { labels }
    }

    /// Build a label map from row vectors.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the rows are ragged.
    ///
    /// # Example
    ///
    /// ```
    /// use seg_eval::types::DenseLabelMap;
    ///
    /// let map = DenseLabelMap::from_rows(vec![vec![0, 1], vec![2, 3]]).unwrap();
    /// assert_eq!(map.shape(), (2, 2));
    /// assert_eq!(map.get(1, 0), Some(2));
    /// ```
    pub fn from_rows(rows: Vec<Vec<Label>>) -> Result<Self> {
        Ok(Self {
            labels: rows_to_array(rows)?,
        })
    }

    /// Shape as `(height, width)`.
    pub fn shape(&self) -> Shape {
        self.labels.dim()
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True if the map holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<Label> {
        self.labels.get((row, col)).copied()
    }

    /// Number of pixels carrying `value`.
    pub fn count(&self, value: Label) -> usize {
        self.labels.iter().filter(|&&v| v == value).count()
    }

    pub fn as_array(&self) -> &Array2<Label> {
        &self.labels
    }

    pub(crate) fn as_array_mut(&mut self) -> &mut Array2<Label> {
        &mut self.labels
    }

    pub fn into_array(self) -> Array2<Label> {
        self.labels
    }
}

/// One ground-truth object: a binary mask plus its class id.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceAnnotation {
    pub mask: Array2<bool>,
    pub class_id: Label,
}

impl InstanceAnnotation {
    /// Create a new instance annotation.
    pub fn new(mask: Array2<bool>, class_id: Label) -> Self {
        Self { mask, class_id }
    }

    /// Number of pixels covered by the mask.
    pub fn area(&self) -> usize {
        self.mask.iter().filter(|&&covered| covered).count()
    }
}

/// Per-sample annotations as delivered by a data loader: two parallel,
/// ordered lists of masks and class ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleAnnotations {
    pub masks: Vec<Array2<bool>>,
    pub class_ids: Vec<Label>,
}

impl SampleAnnotations {
    pub fn new(masks: Vec<Array2<bool>>, class_ids: Vec<Label>) -> Self {
        Self { masks, class_ids }
    }

    /// Pair masks with class ids, preserving order.
    ///
    /// # Errors
    ///
    /// Returns `LengthMismatch` if the two lists differ in length.
    pub fn to_instances(&self) -> Result<Vec<InstanceAnnotation>> {
        if self.masks.len() != self.class_ids.len() {
            return Err(SegEvalError::LengthMismatch {
                masks: self.masks.len(),
                class_ids: self.class_ids.len(),
            });
        }
        Ok(self
            .masks
            .iter()
            .zip(&self.class_ids)
            .map(|(mask, &class_id)| InstanceAnnotation::new(mask.clone(), class_id))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty() && self.class_ids.is_empty()
    }
}

/// A single evaluated sample: the model's prediction at original resolution
/// plus the ground-truth instance annotations.
#[derive(Debug, Clone)]
pub struct Sample {
    pub prediction: DenseLabelMap,
    pub annotations: SampleAnnotations,
}

impl Sample {
    pub fn new(prediction: DenseLabelMap, annotations: SampleAnnotations) -> Self {
        Self {
            prediction,
            annotations,
        }
    }
}

/// An ordered group of samples processed together.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub samples: Vec<Sample>,
}

impl Batch {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Intermediate metric values emitted every `report_interval` batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    /// One-based index of the batch that triggered the report
    pub batch_index: usize,
    /// Total number of batches, when known up front
    pub total_batches: Option<usize>,
    pub metrics: BTreeMap<String, f64>,
}

impl ProgressReport {
    /// Render as `name=value | name=value`.
    pub fn summary_string(&self) -> String {
        self.metrics
            .iter()
            .map(|(name, score)| format!("{name}={score:.4}"))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Final metrics of one evaluation run or validation epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Metric name to score in `[0, 1]`
    pub metrics: BTreeMap<String, f64>,
    /// Metric name to per-class IoU; `None` marks a class absent from the data
    pub per_class_iou: BTreeMap<String, Vec<Option<f64>>>,
    pub samples_evaluated: usize,
    pub batches_evaluated: usize,
    pub stats: RunStats,
}

impl EvaluationResult {
    /// Create a new empty EvaluationResult.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a metric by name.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Convert row vectors into a 2-D array, rejecting ragged input.
pub(crate) fn rows_to_array<T: Clone>(rows: Vec<Vec<T>>) -> Result<Array2<T>> {
    let height = rows.len();
    let width = rows.first().map_or(0, Vec::len);

    if let Some(bad) = rows.iter().find(|row| row.len() != width) {
        return Err(SegEvalError::ShapeMismatch {
            expected: (height, width),
            found: (height, bad.len()),
        });
    }

    let flat: Vec<T> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((height, width), flat).map_err(|_| SegEvalError::ShapeMismatch {
        expected: (height, width),
        found: (height, width),
    })
}
