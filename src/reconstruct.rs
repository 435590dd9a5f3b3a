//! Dense ground-truth reconstruction from per-instance masks.

use ndarray::{Array2, Zip};

use crate::error::{Result, SegEvalError};
use crate::types::{DenseLabelMap, InstanceAnnotation, Label, Shape};

/// Reconstruct a dense label map from an ordered list of instance annotations.
///
/// The output starts as `ignore_value` everywhere. Annotations are painted in
/// sequence order, so where masks overlap the class of the *last* annotation
/// wins. Pixels no mask covers stay `ignore_value`.
///
/// Class ids are written as given; out-of-range ids are dealt with when the
/// map is scored, not here.
///
/// # Arguments
///
/// * `shape` - Target `(height, width)`, normally the prediction's shape
/// * `annotations` - Instance annotations in painting order
/// * `ignore_value` - Fill value for uncovered pixels
///
/// # Errors
///
/// Returns `ShapeMismatch` if any mask differs from `shape`. All masks are
/// checked before anything is painted.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use seg_eval::reconstruct::reconstruct_label_map;
/// use seg_eval::types::{InstanceAnnotation, IGNORE_INDEX};
///
/// let annotations = vec![
///     InstanceAnnotation::new(array![[true, true], [false, false]], 1),
///     InstanceAnnotation::new(array![[false, true], [false, false]], 2),
/// ];
/// let map = reconstruct_label_map((2, 2), &annotations, IGNORE_INDEX).unwrap();
/// assert_eq!(map.get(0, 0), Some(1));
/// assert_eq!(map.get(0, 1), Some(2));
/// assert_eq!(map.get(1, 1), Some(IGNORE_INDEX));
/// ```
pub fn reconstruct_label_map(
    shape: Shape,
    annotations: &[InstanceAnnotation],
    ignore_value: Label,
) -> Result<DenseLabelMap> {
    for annotation in annotations {
        check_mask_shape(&annotation.mask, shape)?;
    }

    let mut map = DenseLabelMap::filled(shape, ignore_value);
    for annotation in annotations {
        paint(map.as_array_mut(), &annotation.mask, annotation.class_id);
    }

    Ok(map)
}

/// Reconstruct from the parallel mask / class-id lists a data loader yields.
///
/// # Errors
///
/// Returns `LengthMismatch` if `masks` and `class_ids` differ in length and
/// `ShapeMismatch` if any mask differs from `shape`.
pub fn reconstruct_from_parts(
    shape: Shape,
    masks: &[Array2<bool>],
    class_ids: &[Label],
    ignore_value: Label,
) -> Result<DenseLabelMap> {
    if masks.len() != class_ids.len() {
        return Err(SegEvalError::LengthMismatch {
            masks: masks.len(),
            class_ids: class_ids.len(),
        });
    }
    for mask in masks {
        check_mask_shape(mask, shape)?;
    }

    let mut map = DenseLabelMap::filled(shape, ignore_value);
    for (mask, &class_id) in masks.iter().zip(class_ids) {
        paint(map.as_array_mut(), mask, class_id);
    }

    Ok(map)
}

fn check_mask_shape(mask: &Array2<bool>, shape: Shape) -> Result<()> {
    if mask.dim() != shape {
        return Err(SegEvalError::ShapeMismatch {
            expected: shape,
            found: mask.dim(),
        });
    }
    Ok(())
}

fn paint(labels: &mut Array2<Label>, mask: &Array2<bool>, class_id: Label) {
    Zip::from(labels).and(mask).for_each(|label, &covered| {
        if covered {
            *label = class_id;
        }
    });
}
