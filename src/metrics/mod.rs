//! Metric calculation modules for segmentation evaluation.

pub mod confusion;
pub mod iou;

pub use confusion::{ClassCounts, StreamingConfusionAccumulator};
pub use iou::{class_iou, mean_iou};
