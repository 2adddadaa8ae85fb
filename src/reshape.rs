//! Stage 1: pivot a long-format measurement table into a wide one.

use std::collections::HashMap;

use log::debug;
use ndarray::Array2;

use crate::error::PipelineError;
use crate::table::{LongTable, WideTable};

/// Pivots `long` into a wide table: one row per sample column, one numeric
/// column per distinct feature id, feature columns sorted ascending.
///
/// `feature_key` names the column holding the numeric feature ids; every
/// other column is treated as a sample identifier and becomes one output row.
/// The sort is stable, so rows whose feature ids compare equal keep their
/// original relative order. Values are placed by keyed lookup (feature id to
/// column, sample name to row), never by positional copying, so input row
/// order cannot silently misalign the output.
///
/// Duplicate feature ids: rows that repeat a feature id with identical
/// measurements for every sample collapse last-write-wins. Rows that repeat a
/// feature id but disagree on any sample's measurement fail with
/// `DuplicateFeature` instead of being silently overwritten.
///
/// # Errors
/// `Schema` if the table has zero data rows, `feature_key` is not a column,
/// or any feature id is NaN or infinite; `DuplicateFeature` on conflicting
/// duplicates.
pub fn reshape(long: &LongTable, feature_key: &str) -> Result<WideTable, PipelineError> {
    let headers = long.headers();
    let feature_col = headers
        .iter()
        .position(|h| h == feature_key)
        .ok_or_else(|| {
            PipelineError::Schema(format!("feature column `{}` not found", feature_key))
        })?;

    if long.n_rows() == 0 {
        return Err(PipelineError::Schema(
            "long table has zero data rows".to_string(),
        ));
    }

    let samples: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != feature_col)
        .map(|(_, h)| h.clone())
        .collect();
    let n_samples = samples.len();

    // One slot per distinct feature id, in first-seen order. Keyed on the
    // id's bit pattern so exact duplicates land in the same slot.
    let mut slot_by_id: HashMap<u64, usize> = HashMap::new();
    let mut feature_ids: Vec<f64> = Vec::new();
    let mut measurements: Vec<Vec<f64>> = Vec::new();

    for row in long.rows() {
        let feature_id = row[feature_col];
        if !feature_id.is_finite() {
            return Err(PipelineError::Schema(format!(
                "feature column `{}` contains non-finite id {}",
                feature_key, feature_id
            )));
        }
        let row_values: Vec<f64> = row
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != feature_col)
            .map(|(_, &v)| v)
            .collect();

        match slot_by_id.get(&feature_id.to_bits()) {
            Some(&slot) => {
                for (sample_idx, &value) in row_values.iter().enumerate() {
                    if measurements[slot][sample_idx] != value {
                        return Err(PipelineError::DuplicateFeature {
                            feature_id,
                            sample: samples[sample_idx].clone(),
                        });
                    }
                }
                // Identical repeat: last write wins, which is a no-op here.
                measurements[slot] = row_values;
            }
            None => {
                slot_by_id.insert(feature_id.to_bits(), feature_ids.len());
                feature_ids.push(feature_id);
                measurements.push(row_values);
            }
        }
    }

    // Stable ascending sort of the slots by feature id.
    let mut order: Vec<usize> = (0..feature_ids.len()).collect();
    order.sort_by(|&a, &b| feature_ids[a].total_cmp(&feature_ids[b]));

    let n_features = order.len();
    let mut values = Array2::<f64>::zeros((n_samples, n_features));
    for (col, &slot) in order.iter().enumerate() {
        for sample_idx in 0..n_samples {
            values[(sample_idx, col)] = measurements[slot][sample_idx];
        }
    }
    let sorted_ids: Vec<f64> = order.iter().map(|&slot| feature_ids[slot]).collect();

    debug!(
        "pivoted {} long rows into {} samples x {} features",
        long.n_rows(),
        n_samples,
        n_features
    );

    Ok(WideTable {
        samples,
        feature_ids: sorted_ids,
        values,
    })
}
