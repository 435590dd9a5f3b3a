//! Statistics tracking for an evaluation run
//!
//! Counts what happened to the data on its way into the accumulators:
//! how much was scored, how much was ignored, how much had to be clamped.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::Shape;

/// Statistics collected while evaluating batches
///
/// None of these counters influence the metric values; they exist so that
/// lenient handling (clamping, skipping out-of-range labels) stays visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Number of batches processed
    pub batches: usize,

    /// Number of samples processed
    pub samples: usize,

    /// Total ground-truth pixels seen
    pub total_pixels: u64,

    /// Ground-truth pixels no annotation covered (left as the ignore value)
    pub uncovered_pixels: u64,

    /// Predicted pixels clamped into the class range
    pub clamped_predictions: u64,

    /// Ground-truth pixels skipped for carrying a label outside the class range
    pub out_of_range_targets: u64,

    /// Distinct `(height, width)` resolutions evaluated
    #[serde(default)]
    pub resolutions: BTreeSet<Shape>,
}

impl RunStats {
    /// Create a new `RunStats` with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one processed batch
    pub fn add_batch(&mut self) {
        self.batches += 1;
    }

    /// Record one processed sample of resolution `shape` and its pixel-level counts
    pub fn add_sample(&mut self, shape: Shape, uncovered: usize, clamped: usize) {
        self.samples += 1;
        self.total_pixels += (shape.0 * shape.1) as u64;
        self.resolutions.insert(shape);
        self.uncovered_pixels += uncovered as u64;
        self.clamped_predictions += clamped as u64;
    }

    /// Set the out-of-range ground-truth pixel count
    pub fn set_out_of_range_targets(&mut self, count: u64) {
        self.out_of_range_targets = count;
    }

    /// Number of ground-truth pixels that carried a label
    pub fn labeled_pixels(&self) -> u64 {
        self.total_pixels.saturating_sub(self.uncovered_pixels)
    }

    /// Fraction of ground-truth pixels that carried a label, `None` before any pixel
    pub fn coverage(&self) -> Option<f64> {
        if self.total_pixels == 0 {
            return None;
        }
        Some(self.labeled_pixels() as f64 / self.total_pixels as f64)
    }

    /// Zero every counter
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Log a summary of the statistics
    pub fn log_summary(&self) {
        info!(
            batches = self.batches,
            samples = self.samples,
            total_pixels = self.total_pixels,
            uncovered_pixels = self.uncovered_pixels,
            clamped_predictions = self.clamped_predictions,
            out_of_range_targets = self.out_of_range_targets,
            "evaluation statistics"
        );
    }

    /// Evaluated resolutions rendered as `HxW`, smallest first
    pub fn resolution_strings(&self) -> Vec<String> {
        self.resolutions
            .iter()
            .map(|(height, width)| format!("{height}x{width}"))
            .collect()
    }

    /// Get a formatted string summary of the statistics
    pub fn summary_string(&self) -> String {
        format!(
            "RunStats {{ batches: {}, samples: {}, pixels: {}, uncovered: {}, clamped: {}, \
             out_of_range: {} }}",
            self.batches,
            self.samples,
            self.total_pixels,
            self.uncovered_pixels,
            self.clamped_predictions,
            self.out_of_range_targets
        )
    }
}
