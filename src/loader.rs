//! JSON loading utilities for offline prediction dumps.
//!
//! A dump pairs each model prediction (already resized to the sample's
//! original resolution) with the sample's instance annotations:
//!
//! ```json
//! {
//!   "samples": [
//!     {
//!       "prediction": [[0, 1], [1, 1]],
//!       "masks": [[[true, false], [false, false]]],
//!       "class_ids": [0]
//!     }
//!   ]
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SegEvalError};
use crate::types::{rows_to_array, Batch, DenseLabelMap, Label, Sample, SampleAnnotations};

/// On-disk representation of one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub prediction: Vec<Vec<Label>>,
    #[serde(default)]
    pub masks: Vec<Vec<Vec<bool>>>,
    #[serde(default)]
    pub class_ids: Vec<Label>,
}

/// On-disk representation of a prediction dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDump {
    pub samples: Vec<RawSample>,
}

/// Load samples from a JSON dump file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, if it contains no
/// samples, or if any sample is structurally invalid.
pub fn load_samples_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Sample>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let dump: RawDump = serde_json::from_reader(reader)?;
    convert_dump(dump)
}

/// Load samples from a JSON string.
///
/// # Example
///
/// ```
/// use seg_eval::loader::load_samples_from_str;
///
/// let json = r#"{
///     "samples": [
///         { "prediction": [[1, 1]], "masks": [[[true, true]]], "class_ids": [1] }
///     ]
/// }"#;
/// let samples = load_samples_from_str(json).unwrap();
/// assert_eq!(samples.len(), 1);
/// assert_eq!(samples[0].prediction.shape(), (1, 2));
/// ```
pub fn load_samples_from_str(json_str: &str) -> Result<Vec<Sample>> {
    let dump: RawDump = serde_json::from_str(json_str)?;
    convert_dump(dump)
}

fn convert_dump(dump: RawDump) -> Result<Vec<Sample>> {
    if dump.samples.is_empty() {
        return Err(SegEvalError::EmptyDataset(
            "Dump must contain at least one sample".to_string(),
        ));
    }
    dump.samples.into_iter().map(convert_sample).collect()
}

fn convert_sample(raw: RawSample) -> Result<Sample> {
    if raw.masks.len() != raw.class_ids.len() {
        return Err(SegEvalError::LengthMismatch {
            masks: raw.masks.len(),
            class_ids: raw.class_ids.len(),
        });
    }

    let prediction = DenseLabelMap::from_rows(raw.prediction)?;
    let masks = raw
        .masks
        .into_iter()
        .map(rows_to_array)
        .collect::<Result<Vec<_>>>()?;

    Ok(Sample::new(
        prediction,
        SampleAnnotations::new(masks, raw.class_ids),
    ))
}

/// Group samples into batches of `batch_size`, preserving order. The last
/// batch may be shorter.
///
/// # Errors
///
/// Returns `ConfigurationError` if `batch_size` is zero.
pub fn into_batches(samples: Vec<Sample>, batch_size: usize) -> Result<Vec<Batch>> {
    if batch_size == 0 {
        return Err(SegEvalError::config("batch_size must be greater than 0"));
    }

    let mut batches = Vec::with_capacity(samples.len().div_ceil(batch_size));
    let mut current = Vec::with_capacity(batch_size);
    for sample in samples {
        current.push(sample);
        if current.len() == batch_size {
            batches.push(Batch::new(std::mem::take(&mut current)));
        }
    }
    if !current.is_empty() {
        batches.push(Batch::new(current));
    }
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_str() {
        let json = r#"{
            "samples": [
                {
                    "prediction": [[0, 1], [1, 2]],
                    "masks": [[[true, true], [false, false]], [[false, false], [true, true]]],
                    "class_ids": [0, 2]
                },
                {
                    "prediction": [[2]]
                }
            ]
        }"#;

        let samples = load_samples_from_str(json).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].annotations.len(), 2);
        assert_eq!(samples[0].annotations.class_ids, vec![0, 2]);
        assert!(samples[1].annotations.is_empty());
    }

    #[test]
    fn test_empty_samples() {
        let result = load_samples_from_str(r#"{ "samples": [] }"#);
        assert!(matches!(result, Err(SegEvalError::EmptyDataset(_))));
    }

    #[test]
    fn test_mask_count_mismatch() {
        let json = r#"{
            "samples": [
                { "prediction": [[0]], "masks": [[[true]]], "class_ids": [0, 1] }
            ]
        }"#;
        let result = load_samples_from_str(json);
        assert!(matches!(result, Err(SegEvalError::LengthMismatch { .. })));
    }

    #[test]
    fn test_ragged_prediction() {
        let json = r#"{ "samples": [ { "prediction": [[0, 1], [1]] } ] }"#;
        let result = load_samples_from_str(json);
        assert!(matches!(result, Err(SegEvalError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_into_batches() {
        let json = r#"{ "samples": [
            { "prediction": [[0]] }, { "prediction": [[1]] }, { "prediction": [[2]] }
        ] }"#;
        let samples = load_samples_from_str(json).unwrap();
        let batches = into_batches(samples, 2).unwrap();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1].len(), 1);
        assert_eq!(batches[1].samples[0].prediction.get(0, 0), Some(2));
    }

    #[test]
    fn test_zero_batch_size() {
        assert!(matches!(
            into_batches(Vec::new(), 0),
            Err(SegEvalError::ConfigurationError(_))
        ));
    }
}
