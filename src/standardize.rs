//! Stage 2: rescale each feature column to zero mean and unit variance.

use log::debug;
use ndarray::{Array2, Axis};

use crate::error::PipelineError;
use crate::table::{StandardizedTable, WideTable};

/// Mean-centers and scales every feature column of `wide` to zero mean and
/// unit **population** variance (ddof = 0; the sample-variance convention
/// would divide by n - 1 instead, and this crate deliberately does not).
///
/// Constant columns (population standard deviation of zero) map to all-zero
/// rather than dividing by zero.
///
/// Returns the transformed matrix (row-major, sample order preserved) plus a
/// labeled table carrying the same feature headers, "Samples" excluded.
///
/// # Errors
/// `EmptyInput` if the numeric block has zero rows or zero columns.
pub fn standardize(
    wide: &WideTable,
) -> Result<(Array2<f64>, StandardizedTable), PipelineError> {
    let n_samples = wide.n_samples();
    let n_features = wide.n_features();
    if n_samples == 0 || n_features == 0 {
        return Err(PipelineError::EmptyInput(format!(
            "numeric block is {} samples x {} features",
            n_samples, n_features
        )));
    }

    let mean = wide
        .values
        .mean_axis(Axis(0))
        .ok_or_else(|| PipelineError::EmptyInput("cannot compute column means".to_string()))?;
    let mut standardized = &wide.values - &mean;

    // Population standard deviation. A constant column centers to exactly
    // zero, so substituting 1.0 for its zero scale leaves it all-zero.
    let std_dev = standardized.map_axis(Axis(0), |column| column.std(0.0));
    let scale = std_dev.mapv(|s| if s == 0.0 { 1.0 } else { s });
    standardized /= &scale;

    debug!(
        "standardized {} samples x {} features ({} constant columns)",
        n_samples,
        n_features,
        std_dev.iter().filter(|&&s| s == 0.0).count()
    );

    let labeled = StandardizedTable {
        feature_ids: wide.feature_ids.clone(),
        values: standardized.clone(),
    };
    Ok((standardized, labeled))
}
