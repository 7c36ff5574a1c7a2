//! slicegen compiler: Java sources from a resolved type model.
//!
//! - `typegen::java` - per-definition emitters and the generation driver
//! - `diagnostics` - warnings and errors reported while generating

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod diagnostics;
pub mod typegen;

#[cfg(test)]
pub mod test_utils;

pub use diagnostics::{Diagnostics, DiagnosticsPrinter, Severity};
pub use typegen::java::{Config, GeneratedFile, Generation, generate};

/// Errors that abort a generation run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("generation failed with {} errors", .0.error_count())]
    Generation(Diagnostics),
}

pub type Result<T> = std::result::Result<T, Error>;
