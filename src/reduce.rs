//! Stage 3: project the standardized matrix onto its top-k principal
//! components.

use log::debug;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use ndarray_linalg::{Eigh, UPLO};

use crate::error::PipelineError;
use crate::table::ComponentTable;

/// Projects `standardized` onto its top-`k` directions of maximum variance
/// and labels the result.
///
/// The decomposition is pinned rather than left to library defaults: a dense
/// symmetric eigendecomposition of the sample covariance matrix
/// `Xᵀ X / (n - 1)` of the already-centered input, components ordered by
/// descending eigenvalue and normalized to unit length. Component sign is
/// stable only for a fixed backend and input; callers comparing against other
/// PCA implementations should compare up to sign.
///
/// `samples` is the wide table's label column; it rides through unchanged and
/// in order as the output's "Samples" column. The returned matrix holds the
/// same scores as the table, without labels.
///
/// # Errors
/// `InvalidComponentCount` unless `1 <= k <= min(n_samples, n_features)`;
/// `Schema` if `samples` and the matrix disagree on row count; `Linalg` if
/// the eigendecomposition fails.
pub fn reduce(
    samples: &[String],
    standardized: &Array2<f64>,
    k: usize,
) -> Result<(ComponentTable, Array2<f64>), PipelineError> {
    let n_samples = standardized.nrows();
    let n_features = standardized.ncols();

    let max_k = n_samples.min(n_features);
    if k == 0 || k > max_k {
        return Err(PipelineError::InvalidComponentCount {
            requested: k,
            max: max_k,
        });
    }
    if samples.len() != n_samples {
        return Err(PipelineError::Schema(format!(
            "{} sample labels for a matrix of {} rows",
            samples.len(),
            n_samples
        )));
    }

    // Sample covariance of the centered input. The max(1) keeps a lone-row
    // matrix (necessarily all-zero after standardization) from dividing by
    // zero.
    let mut covariance = standardized.t().dot(standardized);
    covariance /= n_samples.saturating_sub(1).max(1) as f64;

    let (eigenvalues, eigenvectors) = covariance.eigh(UPLO::Upper)?;

    // eigh returns ascending eigenvalues; re-pair and sort descending.
    let mut eig_pairs: Vec<(f64, Array1<f64>)> = eigenvalues
        .into_iter()
        .zip(eigenvectors.columns().into_iter().map(|col| col.to_owned()))
        .collect();
    eig_pairs.sort_by(|(a, _), (b, _)| b.total_cmp(a));

    let mut axes: Vec<Array1<f64>> = Vec::with_capacity(k);
    let mut top_eigenvalues: Vec<f64> = Vec::with_capacity(k);
    for (eigenvalue, mut axis) in eig_pairs.into_iter().take(k) {
        top_eigenvalues.push(eigenvalue.max(0.0));
        let norm = axis.dot(&axis).sqrt();
        if norm > 1e-9 {
            axis.mapv_inplace(|x| x / norm);
        } else {
            axis.fill(0.0);
        }
        axes.push(axis);
    }
    let views: Vec<ArrayView1<f64>> = axes.iter().map(|a| a.view()).collect();
    let rotation = ndarray::stack(Axis(1), &views).map_err(|e| {
        PipelineError::Schema(format!("failed to assemble rotation matrix: {}", e))
    })?;

    let scores = standardized.dot(&rotation);
    debug!(
        "projected {} samples onto {} components, top eigenvalues {:?}",
        n_samples, k, top_eigenvalues
    );

    let table = ComponentTable {
        samples: samples.to_vec(),
        component_names: (1..=k).map(|i| format!("PC{}", i)).collect(),
        scores: scores.clone(),
    };
    Ok((table, scores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2, Axis};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use crate::standardize::standardize;
    use crate::table::WideTable;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("S{}", i)).collect()
    }

    fn standardized_random(n_samples: usize, n_features: usize, seed: u64) -> Array2<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let values = Array2::from_shape_fn((n_samples, n_features), |_| rng.gen_range(-1.0..1.0));
        let wide = WideTable {
            samples: labels(n_samples),
            feature_ids: (0..n_features).map(|i| i as f64).collect(),
            values,
        };
        standardize(&wide).unwrap().0
    }

    #[test]
    fn returns_k_components_plus_labels() {
        let matrix = standardized_random(10, 6, 7);
        let sample_labels = labels(10);
        let (table, scores) = reduce(&sample_labels, &matrix, 3).unwrap();
        assert_eq!(table.n_components(), 3);
        assert_eq!(table.component_names, vec!["PC1", "PC2", "PC3"]);
        assert_eq!(table.samples, sample_labels);
        assert_eq!(scores.dim(), (10, 3));
        assert_eq!(table.scores, scores);
    }

    #[test]
    fn rejects_out_of_range_component_counts() {
        let matrix = standardized_random(5, 8, 1);
        let sample_labels = labels(5);

        let err = reduce(&sample_labels, &matrix, 0).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidComponentCount { requested: 0, max: 5 }
        ));

        // k is capped by min(n_samples, n_features) = 5 here.
        let err = reduce(&sample_labels, &matrix, 6).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidComponentCount { requested: 6, max: 5 }
        ));
    }

    #[test]
    fn rejects_label_row_mismatch() {
        let matrix = standardized_random(5, 4, 2);
        let err = reduce(&labels(4), &matrix, 2).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }

    #[test]
    fn first_component_captures_a_perfectly_correlated_pair() {
        // Two identical standardized columns: all variance lies along the
        // diagonal, so PC2 scores are numerically zero.
        let wide = WideTable {
            samples: labels(4),
            feature_ids: vec![10.0, 20.0],
            values: array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]],
        };
        let (matrix, _) = standardize(&wide).unwrap();
        let (_, scores) = reduce(&wide.samples, &matrix, 2).unwrap();
        for &s in scores.column(1).iter() {
            assert_abs_diff_eq!(s, 0.0, epsilon = 1e-9);
        }
        // Sign is not canonical, so compare magnitudes only.
        let pc1_var = scores.column(0).std(0.0).powi(2);
        assert!(pc1_var > 1.0);
    }

    #[test]
    fn component_variances_are_non_increasing() {
        let matrix = standardized_random(30, 10, 11);
        let sample_labels = labels(30);
        let (_, scores) = reduce(&sample_labels, &matrix, 10).unwrap();
        let variances: Vec<f64> = scores
            .axis_iter(Axis(1))
            .map(|col| col.std(1.0).powi(2))
            .collect();
        for pair in variances.windows(2) {
            assert!(pair[0] >= pair[1] - 1e-9);
        }
    }

    #[test]
    fn full_rank_projection_preserves_total_variance() {
        let matrix = standardized_random(25, 6, 3);
        let sample_labels = labels(25);
        let (_, scores) = reduce(&sample_labels, &matrix, 6).unwrap();

        let total_in: f64 = matrix
            .axis_iter(Axis(1))
            .map(|col| col.std(1.0).powi(2))
            .sum();
        let total_out: f64 = scores
            .axis_iter(Axis(1))
            .map(|col| col.std(1.0).powi(2))
            .sum();
        assert_abs_diff_eq!(total_in, total_out, epsilon = 1e-8);
    }
}
