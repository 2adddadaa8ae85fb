//! Value types passed between the pipeline stages, plus CSV ingestion of the
//! long-format source table.
//!
//! All of these are plain immutable values: each stage builds a fresh one and
//! never mutates its input.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// A long-format measurement table as read from a delimited file.
///
/// One physical row per feature: a numeric feature-id cell (for mass-spectral
/// data, the mass-to-charge ratio) plus one measurement cell per sample
/// column. Which column holds the feature ids is decided at reshape time, so
/// the table itself is just named, rectangular, all-numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct LongTable {
    headers: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl LongTable {
    /// Builds a long table from already-parsed columns.
    ///
    /// # Errors
    /// Returns `SchemaError` if the header is empty, contains duplicate
    /// column names, or any row's width differs from the header's.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, PipelineError> {
        if headers.is_empty() {
            return Err(PipelineError::Schema("table has no columns".to_string()));
        }
        for (i, name) in headers.iter().enumerate() {
            if headers[..i].contains(name) {
                return Err(PipelineError::Schema(format!(
                    "duplicate column name `{}`",
                    name
                )));
            }
        }
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(PipelineError::Schema(format!(
                    "row {} has {} cells, expected {}",
                    row_idx,
                    row.len(),
                    headers.len()
                )));
            }
        }
        Ok(Self { headers, rows })
    }

    /// Reads a long table from a CSV file on disk.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let file = File::open(path.as_ref())?;
        let table = Self::from_reader(file)?;
        debug!(
            "loaded {} rows x {} columns from {:?}",
            table.n_rows(),
            table.headers.len(),
            path.as_ref()
        );
        Ok(table)
    }

    /// Reads a long table from any CSV source.
    ///
    /// The first record is taken as the header row; every remaining cell must
    /// parse as `f64`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PipelineError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for (row_idx, record) in csv_reader.records().enumerate() {
            let record = record?;
            let mut row = Vec::with_capacity(headers.len());
            for (cell, column) in record.iter().zip(headers.iter()) {
                let value: f64 = cell.parse().map_err(|_| {
                    PipelineError::Schema(format!(
                        "row {}, column `{}`: cannot parse `{}` as a number",
                        row_idx, column, cell
                    ))
                })?;
                row.push(value);
            }
            rows.push(row);
        }

        Self::new(headers, rows)
    }

    /// Column names, in source order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows (one per feature measurement row).
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }
}

/// A wide-format table: one row per sample, one numeric column per feature
/// id, feature columns sorted strictly ascending.
///
/// `samples` is the "Samples" label column; its order matches the sample
/// column order of the source long table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideTable {
    pub samples: Vec<String>,
    pub feature_ids: Vec<f64>,
    /// Shape: (n_samples, n_features).
    pub values: Array2<f64>,
}

impl WideTable {
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_ids.len()
    }
}

/// The standardized numeric block: same feature headers as the wide table it
/// came from, "Samples" column excluded, every column at zero mean and unit
/// population variance (all-zero for constant columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedTable {
    pub feature_ids: Vec<f64>,
    /// Shape: (n_samples, n_features).
    pub values: Array2<f64>,
}

/// Principal component scores with their sample labels.
///
/// `component_names` is always `["PC1", ..., "PCk"]`; `samples` carries the
/// wide table's label column through unchanged, in the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentTable {
    pub samples: Vec<String>,
    pub component_names: Vec<String>,
    /// Shape: (n_samples, k).
    pub scores: Array2<f64>,
}

impl ComponentTable {
    pub fn n_components(&self) -> usize {
        self.component_names.len()
    }
}
