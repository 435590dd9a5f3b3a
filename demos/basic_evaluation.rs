//! Basic evaluation example demonstrating core functionality.

use ndarray::array;
use seg_eval::{
    load_samples_from_str, reconstruct_label_map, remove_background, sanitize_prediction, Batch,
    DenseLabelMap, EvaluationConfig, EvaluationRunner, InstanceAnnotation, IGNORE_INDEX,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Segmentation Evaluation Example ===\n");

    // Example 1: Ground-truth reconstruction
    println!("1. Reconstructing a label map from instance masks");
    let annotations = vec![
        InstanceAnnotation::new(array![[true, true, false], [true, true, false]], 1),
        InstanceAnnotation::new(array![[false, true, true], [false, false, false]], 2),
    ];
    let target = reconstruct_label_map((2, 3), &annotations, IGNORE_INDEX)?;
    let rows: Vec<Vec<i64>> = target.as_array().rows().into_iter().map(|r| r.to_vec()).collect();
    println!("   {rows:?}");
    println!();

    // Example 2: Prediction sanitization and background removal
    println!("2. Sanitizing and removing background");
    let raw = DenseLabelMap::from_rows(vec![vec![-1, 0, 1, 9]])?;
    let clean = sanitize_prediction(&raw, 3);
    let no_bg = remove_background(&clean, 3, IGNORE_INDEX);
    println!("   raw:       {:?}", raw.as_array().iter().collect::<Vec<_>>());
    println!("   sanitized: {:?}", clean.as_array().iter().collect::<Vec<_>>());
    println!("   no bg:     {:?}", no_bg.as_array().iter().collect::<Vec<_>>());
    println!();

    // Example 3: Streaming evaluation
    println!("3. Streaming mean-IoU");
    let dump = r#"{
        "samples": [
            {
                "prediction": [[0, 1, 1], [0, 2, 2]],
                "masks": [
                    [[true, false, false], [true, false, false]],
                    [[false, true, true], [false, false, false]],
                    [[false, false, false], [false, true, true]]
                ],
                "class_ids": [0, 1, 2]
            },
            {
                "prediction": [[1, 1, 0], [2, 2, 2]],
                "masks": [
                    [[true, true, true], [false, false, false]],
                    [[false, false, false], [true, true, true]]
                ],
                "class_ids": [1, 2]
            }
        ]
    }"#;
    let samples = load_samples_from_str(dump)?;

    let mut config = EvaluationConfig::new(3);
    config.report_interval = 1;
    let mut runner = EvaluationRunner::new(config)?;
    for sample in samples {
        if let Some(report) = runner.process_batch(&Batch::new(vec![sample]))? {
            println!("   batch {}: {}", report.batch_index, report.summary_string());
        }
    }

    let result = runner.finalize();
    println!();
    for (name, score) in &result.metrics {
        println!("   {name}: {score:.4}");
    }
    for (name, per_class) in &result.per_class_iou {
        println!("   {name} per class: {per_class:?}");
    }

    Ok(())
}
