//! # seg-eval
//!
//! A Rust library for streaming mean-IoU evaluation of semantic and panoptic
//! segmentation models.
//!
//! Query-based segmentation heads emit predictions as dense label maps, while
//! their training data describes ground truth as a list of per-instance binary
//! masks with class ids. This library bridges the two and scores them:
//!
//! - **Reconstruction** of a dense ground-truth label map from ordered
//!   instance masks (later masks win where they overlap)
//! - **Sanitization** of raw predictions into the legal class range
//! - **Background removal**: a second label space without class 0, for a
//!   "semantic classes only" score
//! - **Streaming mean-IoU** accumulated over any number of batches with exact
//!   integer counts
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::array;
//! use seg_eval::config::EvaluationConfig;
//! use seg_eval::evaluator::EvaluationRunner;
//! use seg_eval::types::{Batch, DenseLabelMap, Sample, SampleAnnotations};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut runner = EvaluationRunner::new(EvaluationConfig::new(3))?;
//!
//! let prediction = DenseLabelMap::from_rows(vec![vec![0, 1], vec![2, 2]])?;
//! let annotations = SampleAnnotations::new(
//!     vec![array![[true, true], [false, false]], array![[false, false], [true, true]]],
//!     vec![1, 2],
//! );
//! runner.process_batch(&Batch::new(vec![Sample::new(prediction, annotations)]))?;
//!
//! let result = runner.finalize();
//! println!("mIoU: {:.4}", result.metric("val_mean_iou").unwrap_or(0.0));
//! # Ok(())
//! # }
//! ```
//!
//! ## Absent classes
//!
//! A class that never appears in the predictions or in the scored ground truth
//! is left out of the mean rather than scored as IoU 0. Before any pixel has
//! been scored the mean is `0.0`.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod metrics;
pub mod reconstruct;
pub mod remap;
pub mod report;
pub mod sanitize;
pub mod stats;
pub mod types;

// Re-export commonly used types and functions
pub use config::{EvaluationConfig, MetricKind};
pub use error::{Result, SegEvalError};
pub use evaluator::EvaluationRunner;
pub use loader::{into_batches, load_samples_from_file, load_samples_from_str};
pub use metrics::{ClassCounts, StreamingConfusionAccumulator};
pub use reconstruct::{reconstruct_from_parts, reconstruct_label_map};
pub use remap::remove_background;
pub use report::{EvaluationSink, EvaluationSummary, JsonFileSink, PerformanceTier, RunMetadata};
pub use sanitize::{sanitize_prediction, sanitize_prediction_in_place};
pub use stats::RunStats;
pub use types::{
    Batch, DenseLabelMap, EvaluationResult, InstanceAnnotation, Label, ProgressReport, Sample,
    SampleAnnotations, BACKGROUND_CLASS, IGNORE_INDEX,
};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
