//! Storage Layer - SQLite-backed persistence
//!
//! Star schema with dimension tables:
//! - githubupdate(id, create_date) - one row per ingestion batch
//! - proglang(id, name, create_date)
//! - repo(id, username, reponame, create_date)
//! - topcategory(id, name, create_date)
//!
//! and fact tables:
//! - repoupdate(update_id, proglang_id, repo_id, category_id, rank)
//! - languageupdate(update_id, proglang_id, num_projects, rank)

pub mod schema;
pub mod sqlite;
pub mod resolver;
pub mod recorder;

pub use sqlite::{TrendStore, DbStats, LanguageSummaryRow};
pub use schema::{SchemaReport, TableOutcome};
pub use resolver::ResolverStats;
pub use recorder::BatchSummary;
