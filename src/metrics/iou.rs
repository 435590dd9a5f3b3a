//! Intersection over Union (IoU) from pixel counts.

/// Calculate the IoU of one class from its pixel counts.
///
/// IoU is `TP / (TP + FP + FN)`: the intersection of the predicted and
/// ground-truth pixel sets divided by their union.
///
/// # Returns
///
/// `None` when the class never appears in either the prediction or the
/// ground truth (`TP + FP + FN == 0`), otherwise a value in `[0, 1]`.
///
/// # Example
///
/// ```
/// use seg_eval::metrics::iou::class_iou;
///
/// assert_eq!(class_iou(3, 1, 0), Some(0.75));
/// assert_eq!(class_iou(0, 0, 0), None);
/// ```
pub fn class_iou(true_positives: u64, false_positives: u64, false_negatives: u64) -> Option<f64> {
    let union = true_positives + false_positives + false_negatives;
    if union == 0 {
        return None;
    }
    Some(true_positives as f64 / union as f64)
}

/// Average per-class IoU values, skipping absent classes.
///
/// A class marked `None` contributes neither to the numerator nor to the
/// class count, so classes missing from the evaluated data do not pull the
/// mean towards zero. If every class is absent the result is `0.0`.
///
/// # Example
///
/// ```
/// use seg_eval::metrics::iou::mean_iou;
///
/// assert_eq!(mean_iou(&[Some(1.0), None, Some(0.5)]), 0.75);
/// assert_eq!(mean_iou(&[None, None]), 0.0);
/// ```
pub fn mean_iou(per_class: &[Option<f64>]) -> f64 {
    let present: Vec<f64> = per_class.iter().flatten().copied().collect();
    if present.is_empty() {
        return 0.0;
    }
    present.iter().sum::<f64>() / present.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_overlap() {
        let iou = class_iou(100, 0, 0).unwrap();
        assert!((iou - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_no_overlap() {
        assert_eq!(class_iou(0, 4, 6), Some(0.0));
    }

    #[test]
    fn test_partial_overlap() {
        // Intersection: 25, union: 25 + 75 + 75 = 175
        let iou = class_iou(25, 75, 75).unwrap();
        assert!((iou - 0.142857).abs() < 1e-5);
    }

    #[test]
    fn test_mean_of_nothing_is_zero() {
        assert_eq!(mean_iou(&[]), 0.0);
    }

    #[test]
    fn test_zero_iou_class_still_counts() {
        let mean = mean_iou(&[Some(1.0), Some(0.0)]);
        assert!((mean - 0.5).abs() < 1e-10);
    }
}
