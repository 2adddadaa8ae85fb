// Long-to-wide pivoting, standardization, and PCA for sample tables

#![doc = include_str!("../README.md")]

mod error;
mod reduce;
mod reshape;
mod standardize;
mod table;

pub use error::PipelineError;
pub use reduce::reduce;
pub use reshape::reshape;
pub use standardize::standardize;
pub use table::{ComponentTable, LongTable, StandardizedTable, WideTable};
