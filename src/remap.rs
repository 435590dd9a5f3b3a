//! Background-excluded view of a label map.

use crate::types::{DenseLabelMap, Label, BACKGROUND_CLASS};

/// Drop the background class and shift the remaining class ids down by one.
///
/// Maps a label map in a `num_classes` space into a `num_classes - 1` space:
///
/// - background (`0`) becomes `ignore_value`
/// - `k` for `1 <= k < num_classes` becomes `k - 1`
/// - `ignore_value` stays `ignore_value`
///
/// Any other value is left untouched. Apply the same call to both the
/// prediction and the ground truth so the two stay comparable.
///
/// # Example
///
/// ```
/// use seg_eval::remap::remove_background;
/// use seg_eval::types::{DenseLabelMap, IGNORE_INDEX};
///
/// let map = DenseLabelMap::from_rows(vec![vec![0, 1, 2, IGNORE_INDEX]]).unwrap();
/// let remapped = remove_background(&map, 3, IGNORE_INDEX);
/// assert_eq!(
///     remapped,
///     DenseLabelMap::from_rows(vec![vec![IGNORE_INDEX, 0, 1, IGNORE_INDEX]]).unwrap()
/// );
/// ```
pub fn remove_background(
    map: &DenseLabelMap,
    num_classes: usize,
    ignore_value: Label,
) -> DenseLabelMap {
    let num_classes = Label::try_from(num_classes).unwrap_or(Label::MAX);

    DenseLabelMap::from_array(map.as_array().mapv(|label| {
        if label == ignore_value || label == BACKGROUND_CLASS {
            ignore_value
        } else if (1..num_classes).contains(&label) {
            label - 1
        } else {
            label
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IGNORE_INDEX;

    #[test]
    fn test_4x4_grid_remap() {
        let map = DenseLabelMap::from_rows(vec![
            vec![0, 1, 2, 0],
            vec![1, 1, 2, 2],
            vec![0, 0, 0, 0],
            vec![2, 1, 0, 1],
        ])
        .unwrap();
        let remapped = remove_background(&map, 3, IGNORE_INDEX);
        let i = IGNORE_INDEX;
        let expected = DenseLabelMap::from_rows(vec![
            vec![i, 0, 1, i],
            vec![0, 0, 1, 1],
            vec![i, i, i, i],
            vec![1, 0, i, 0],
        ])
        .unwrap();
        assert_eq!(remapped, expected);
    }

    #[test]
    fn test_no_background_shifts_by_one() {
        let map = DenseLabelMap::from_rows(vec![vec![1, 2, 3], vec![6, 5, 4]]).unwrap();
        let remapped = remove_background(&map, 7, IGNORE_INDEX);
        assert_eq!(remapped.shape(), map.shape());
        for (before, after) in map.as_array().iter().zip(remapped.as_array().iter()) {
            assert_eq!(*after, before - 1);
        }
    }

    #[test]
    fn test_out_of_range_left_untouched() {
        let map = DenseLabelMap::from_rows(vec![vec![7, -3]]).unwrap();
        let remapped = remove_background(&map, 7, IGNORE_INDEX);
        assert_eq!(remapped, map);
    }
}
