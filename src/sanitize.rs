//! Prediction sanitization: clamp raw predicted labels into the class range.

use tracing::debug;

use crate::types::{DenseLabelMap, Label};

/// Clamp every predicted label into `[0, num_classes - 1]`.
///
/// Values below zero become `0`, values at or above `num_classes` become
/// `num_classes - 1`. No special treatment is given to the ignore sentinel:
/// predictions are assumed to be dense, so a raw `255` is clamped like any
/// other out-of-range value.
///
/// # Example
///
/// ```
/// use seg_eval::sanitize::sanitize_prediction;
/// use seg_eval::types::DenseLabelMap;
///
/// let raw = DenseLabelMap::from_rows(vec![vec![-5, 1, 13]]).unwrap();
/// let clean = sanitize_prediction(&raw, 3);
/// assert_eq!(clean, DenseLabelMap::from_rows(vec![vec![0, 1, 2]]).unwrap());
/// ```
pub fn sanitize_prediction(prediction: &DenseLabelMap, num_classes: usize) -> DenseLabelMap {
    let mut sanitized = prediction.clone();
    sanitize_prediction_in_place(&mut sanitized, num_classes);
    sanitized
}

/// Clamp a prediction in place and return how many pixels were changed.
///
/// `num_classes` must be at least 1; configuration validation guarantees
/// this for the runner.
pub fn sanitize_prediction_in_place(prediction: &mut DenseLabelMap, num_classes: usize) -> usize {
    let max_label = max_label(num_classes);
    let mut clamped = 0usize;

    prediction.as_array_mut().map_inplace(|label| {
        let bounded = (*label).clamp(0, max_label);
        if bounded != *label {
            clamped += 1;
            *label = bounded;
        }
    });

    if clamped > 0 {
        debug!(clamped, num_classes, "clamped out-of-range predicted labels");
    }
    clamped
}

fn max_label(num_classes: usize) -> Label {
    Label::try_from(num_classes.saturating_sub(1)).unwrap_or(Label::MAX)
}
