//! Edge case tests for reconstruction, remapping and metric accumulation.

use ndarray::{array, Array2};
use seg_eval::config::{EvaluationConfig, MetricKind};
use seg_eval::evaluator::EvaluationRunner;
use seg_eval::metrics::{ClassCounts, StreamingConfusionAccumulator};
use seg_eval::reconstruct::{reconstruct_from_parts, reconstruct_label_map};
use seg_eval::remap::remove_background;
use seg_eval::sanitize::sanitize_prediction;
use seg_eval::types::{
    Batch, DenseLabelMap, InstanceAnnotation, Sample, SampleAnnotations, IGNORE_INDEX,
};

fn map(rows: Vec<Vec<i64>>) -> DenseLabelMap {
    DenseLabelMap::from_rows(rows).unwrap()
}

#[test]
fn test_overlapping_masks_last_wins() {
    let annotations = vec![
        InstanceAnnotation::new(Array2::from_elem((2, 2), true), 1),
        InstanceAnnotation::new(array![[true, false], [false, false]], 3),
        InstanceAnnotation::new(array![[true, true], [false, false]], 2),
    ];
    let result = reconstruct_label_map((2, 2), &annotations, IGNORE_INDEX).unwrap();
    assert_eq!(result, map(vec![vec![2, 2], vec![1, 1]]));
}

#[test]
fn test_empty_mask_paints_nothing() {
    let result = reconstruct_from_parts(
        (1, 3),
        &[array![[false, false, false]], array![[false, true, false]]],
        &[4, 1],
        IGNORE_INDEX,
    )
    .unwrap();
    assert_eq!(result, map(vec![vec![IGNORE_INDEX, 1, IGNORE_INDEX]]));
}

#[test]
fn test_raw_ignore_value_in_prediction_is_clamped() {
    let raw = map(vec![vec![IGNORE_INDEX, 0, 1]]);
    assert_eq!(sanitize_prediction(&raw, 3), map(vec![vec![2, 0, 1]]));
}

#[test]
fn test_remove_background_4x4() {
    let grid = map(vec![
        vec![0, 1, 2, 3],
        vec![3, 2, 1, 0],
        vec![IGNORE_INDEX, 0, 0, 1],
        vec![2, 2, IGNORE_INDEX, 3],
    ]);
    let expected = map(vec![
        vec![IGNORE_INDEX, 0, 1, 2],
        vec![2, 1, 0, IGNORE_INDEX],
        vec![IGNORE_INDEX, IGNORE_INDEX, IGNORE_INDEX, 0],
        vec![1, 1, IGNORE_INDEX, 2],
    ]);
    assert_eq!(remove_background(&grid, 4, IGNORE_INDEX), expected);
}

#[test]
fn test_absent_classes_do_not_dilute_mean() {
    let mut accumulator = StreamingConfusionAccumulator::new(5, IGNORE_INDEX);
    accumulator
        .update_pair(&map(vec![vec![1, 2]]), &map(vec![vec![1, 2]]))
        .unwrap();

    assert_eq!(accumulator.compute(), 1.0);
    assert_eq!(
        accumulator.per_class_iou(),
        vec![None, Some(1.0), Some(1.0), None, None]
    );
}

#[test]
fn test_ignored_prediction_counts_as_false_negative_only() {
    let mut accumulator = StreamingConfusionAccumulator::new(3, IGNORE_INDEX);
    accumulator
        .update_pair(&map(vec![vec![IGNORE_INDEX, 1]]), &map(vec![vec![1, 1]]))
        .unwrap();

    assert_eq!(
        accumulator.class_counts(1),
        ClassCounts {
            true_positives: 1,
            false_positives: 0,
            false_negatives: 1,
        }
    );
    assert_eq!(accumulator.scored_pixels(), 2);
    assert_eq!(accumulator.pixel_accuracy(), Some(0.5));
}

#[test]
fn test_out_of_range_ground_truth_is_skipped() {
    let mut runner = EvaluationRunner::new(EvaluationConfig::new(3)).unwrap();
    let sample = Sample::new(
        map(vec![vec![1, 1]]),
        SampleAnnotations::new(vec![array![[true, false]], array![[false, true]]], vec![1, 7]),
    );
    runner.process_batch(&Batch::new(vec![sample])).unwrap();

    let result = runner.finalize();
    assert_eq!(result.metric("val_mean_iou"), Some(1.0));
    assert_eq!(result.stats.out_of_range_targets, 1);
    assert_eq!(
        runner
            .accumulator(MetricKind::IncludeBackground)
            .unwrap()
            .scored_pixels(),
        1
    );
}

#[test]
fn test_empty_batch() {
    let mut runner = EvaluationRunner::new(EvaluationConfig::new(3)).unwrap();
    assert!(runner.process_batch(&Batch::new(Vec::new())).unwrap().is_none());

    let result = runner.finalize();
    assert_eq!(result.batches_evaluated, 1);
    assert_eq!(result.samples_evaluated, 0);
    assert_eq!(result.metric("val_mean_iou"), Some(0.0));
}

#[test]
fn test_finalize_without_batches() {
    let runner = EvaluationRunner::new(EvaluationConfig::new(2)).unwrap();
    let result = runner.finalize();
    assert_eq!(result.metric("val_mean_iou"), Some(0.0));
    assert_eq!(result.metric("val_mean_iou_no_bg"), Some(0.0));
}

#[test]
fn test_negative_ignore_value() {
    let mut config = EvaluationConfig::new(3);
    config.ignore_value = -1;
    let mut runner = EvaluationRunner::new(config).unwrap();

    // pixel 0 is unannotated (-1), pixel 1 is background, pixel 2 is class 2
    let sample = Sample::new(
        map(vec![vec![1, 0, 2]]),
        SampleAnnotations::new(
            vec![array![[false, true, false]], array![[false, false, true]]],
            vec![0, 2],
        ),
    );
    runner.process_batch(&Batch::new(vec![sample])).unwrap();

    let result = runner.finalize();
    assert_eq!(result.metric("val_mean_iou"), Some(1.0));
    assert_eq!(result.metric("val_mean_iou_no_bg"), Some(1.0));
    assert_eq!(result.per_class_iou["val_mean_iou_no_bg"], vec![None, Some(1.0)]);
}

#[test]
fn test_single_metric_enabled() {
    let mut config = EvaluationConfig::new(3);
    config.include_background = false;
    let runner = EvaluationRunner::new(config).unwrap();

    assert!(runner.accumulator(MetricKind::IncludeBackground).is_none());
    let result = runner.finalize();
    assert_eq!(result.metrics.keys().collect::<Vec<_>>(), vec!["val_mean_iou_no_bg"]);
}

#[test]
fn test_two_class_problem() {
    // With two classes the no-background space holds a single class
    let mut runner = EvaluationRunner::new(EvaluationConfig::new(2)).unwrap();
    let sample = Sample::new(
        map(vec![vec![1, 1, 0, 0]]),
        SampleAnnotations::new(vec![array![[true, true, true, false]]], vec![1]),
    );
    runner.process_batch(&Batch::new(vec![sample])).unwrap();

    let result = runner.finalize();
    // all classes: class 0 has 1 FP (IoU 0), class 1 has 2 TP + 1 FN (IoU 2/3)
    assert!((result.metric("val_mean_iou").unwrap() - 1.0 / 3.0).abs() < 1e-10);
    // no background: the background prediction becomes a pure miss
    assert!((result.metric("val_mean_iou_no_bg").unwrap() - 2.0 / 3.0).abs() < 1e-10);
}

#[test]
fn test_large_image() {
    let labels = Array2::from_shape_fn((256, 256), |(row, _)| (row % 4) as i64);
    let masks: Vec<Array2<bool>> = (0..4)
        .map(|class| Array2::from_shape_fn((256, 256), |(row, _)| row % 4 == class))
        .collect();

    let mut runner = EvaluationRunner::new(EvaluationConfig::new(4)).unwrap();
    let sample = Sample::new(
        DenseLabelMap::from_array(labels),
        SampleAnnotations::new(masks, vec![0, 1, 2, 3]),
    );
    runner.process_batch(&Batch::new(vec![sample])).unwrap();

    let result = runner.finalize();
    assert_eq!(result.metric("val_mean_iou"), Some(1.0));
    assert_eq!(result.stats.total_pixels, 256 * 256);
    assert_eq!(result.stats.uncovered_pixels, 0);
}
