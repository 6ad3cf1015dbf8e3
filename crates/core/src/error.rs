//! Error types for the reportweave domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context
//! has its own error type; fatal errors propagate as the top-level `Error`,
//! while `CriticError` is surfaced as a side channel and never aborts a
//! build.

use thiserror::Error;

use crate::decision::OracleUsage;

/// The top-level error type for a pipeline build.
#[derive(Debug, Error)]
pub enum Error {
    /// The prior report is structurally unusable. Fatal.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// A classification batch failed. Fatal, but partial usage is carried.
    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    /// Invalid pipeline configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Structural failures while parsing a prior report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The report text contains no category headings at all.
    #[error("report has no categories")]
    NoCategories,
}

/// Transport- and parse-level failures from a single oracle call.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("oracle transport failed: {0}")]
    Transport(String),

    #[error("oracle response could not be parsed: {0}")]
    Parse(String),

    #[error("rate limited by oracle, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("oracle call timed out: {0}")]
    Timeout(String),
}

/// A failed classification run.
///
/// Fatal to the build, but carries the usage accumulated from batches whose
/// transport completed, so the caller can still account for spend.
#[derive(Debug, Error)]
#[error("batch {failed_batch} of {total_batches} failed: {source}")]
pub struct ClassifyError {
    #[source]
    pub source: OracleError,
    pub usage: OracleUsage,
    /// Zero-based index of the first batch that failed.
    pub failed_batch: usize,
    pub total_batches: usize,
}

/// A failed critic pass. Never fatal: the pipeline reports it alongside the
/// build output and keeps the pre-critic decisions.
#[derive(Debug, Clone, Error)]
#[error("critic pass failed: {0}")]
pub struct CriticError(#[source] pub OracleError);

impl From<OracleError> for CriticError {
    fn from(err: OracleError) -> Self {
        CriticError(err)
    }
}
