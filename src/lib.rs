//! # Langtrend - Trending Repository Snapshot Store
//!
//! Persists periodic snapshots of per-language trending-repository rankings
//! into SQLite as a small star schema.
//!
//! Langtrend provides:
//! - Idempotent get-or-create resolution for languages, repositories and categories
//! - Batch recording of top-project and language-summary facts
//! - A best-effort ingestion posture with an observable per-batch summary

pub mod category;
pub mod repo_name;
pub mod record;
pub mod storage;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use category::Category;
pub use repo_name::RepoName;
pub use record::{LanguageRecord, LanguageRecords};
pub use storage::{BatchSummary, SchemaReport, TrendStore};

/// Result type alias for Langtrend operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Langtrend operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Invalid repository name: {0}")]
    InvalidRepoName(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input error: {0}")]
    Input(#[from] serde_json::Error),
}
