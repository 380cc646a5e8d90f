//! Countries ETL pipeline
//!
//! Extract -> transform -> load refresh of the countries dataset:
//!
//! - [`extractor`] fetches the raw dataset from the external source
//! - [`transformer`] flattens it into the normalized relational shape
//! - [`loader`] performs the transactional full-replace refresh under
//!   retry/timeout policies
//! - [`pipeline`] composes the three stages into one run
//! - [`scheduler`] triggers runs on a cron schedule and on demand
//!
//! Each stage owns its error type; [`EtlError`] is the union surfaced to
//! the trigger origin. A failed run leaves the previously loaded dataset
//! untouched.

pub mod extractor;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod policy;
pub mod scheduler;
pub mod transformer;

use thiserror::Error;

pub use extractor::{CountryExtractor, ExtractionError};
pub use loader::CountryLoader;
pub use model::{CountryRecord, Currency, Language, RawCountryRecord};
pub use pipeline::{EtlPipeline, RefreshStats};
pub use transformer::{CountryTransformer, MalformedRecordError};

/// SQLSTATE codes classified as transient
///
/// Connection exceptions (class 08) and transaction conflicts
/// (serialization failure, deadlock).
const RETRYABLE_SQLSTATES: [&str; 5] = ["08000", "08003", "08006", "40001", "40P01"];

/// Errors raised while loading into the relational store
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An operation exceeded its timeout budget. The server-side statement
    /// may still be in flight; the transaction is rolled back regardless.
    #[error("Timeout: {operation} exceeded {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },
}

impl LoadError {
    /// Whether this failure is transient and eligible for re-attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            LoadError::Timeout { .. } => true,
            LoadError::Database(err) => is_retryable_db(err),
        }
    }
}

fn is_retryable_db(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => {
            if let Some(code) = db.code() {
                if RETRYABLE_SQLSTATES.contains(&code.as_ref()) {
                    return true;
                }
            }
            let message = db.message().to_lowercase();
            message.contains("timeout") || message.contains("timed out")
        },
        other => {
            let message = other.to_string().to_lowercase();
            message.contains("timeout") || message.contains("timed out")
        },
    }
}

/// Union of the stage errors, surfaced to the trigger origin
///
/// The scheduler logs and swallows these; the on-demand API converts them
/// to a 500 response.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Transformation failed: {0}")]
    MalformedRecord(#[from] MalformedRecordError),

    #[error("Load failed: {0}")]
    Load(#[from] LoadError),
}
