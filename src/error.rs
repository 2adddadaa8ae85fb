/// Errors raised by the pivot / standardize / reduce pipeline.
///
/// Every stage either returns a complete value or fails with one of these;
/// no partial results are handed back.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Malformed input table: missing expected column, zero data rows,
    /// ragged rows, unparseable numeric cells, or non-finite feature ids.
    #[error("schema error: {0}")]
    Schema(String),

    /// Two long-table rows carry the same feature id but disagree on the
    /// measurement for at least one sample.
    #[error("duplicate feature id {feature_id} has conflicting values for sample `{sample}`")]
    DuplicateFeature { feature_id: f64, sample: String },

    /// The numeric block handed to standardization has zero rows or columns.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Requested component count is outside `1..=min(n_samples, n_features)`.
    #[error("invalid component count: requested {requested}, valid range is 1..={max}")]
    InvalidComponentCount { requested: usize, max: usize },

    /// CSV parsing error from the delimited-file reader.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error while reading an input file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Eigendecomposition failure surfaced from the LAPACK backend.
    #[error("linear algebra error: {0}")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),
}
