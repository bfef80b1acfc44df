//! Database schema definitions
//!
//! Statements intentionally omit `IF NOT EXISTS`: each table is created on its
//! own and a pre-existing table is reported as [`TableOutcome::AlreadyExists`].

use rusqlite::Connection;
use serde::Serialize;
use std::fmt;

/// One row per ingestion run
pub const CREATE_UPDATE_TABLE: &str = r#"
CREATE TABLE githubupdate (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    create_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Language dimension
pub const CREATE_LANGUAGE_TABLE: &str = r#"
CREATE TABLE proglang (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(64),
    create_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Repository dimension, keyed by (username, reponame)
pub const CREATE_REPOSITORY_TABLE: &str = r#"
CREATE TABLE repo (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username VARCHAR(64),
    reponame VARCHAR(64),
    create_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Ranking-list category dimension
pub const CREATE_CATEGORY_TABLE: &str = r#"
CREATE TABLE topcategory (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(64),
    create_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Top-projects fact: one row per (batch, language, category, position)
pub const CREATE_REPO_UPDATE_TABLE: &str = r#"
CREATE TABLE repoupdate (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    update_id INTEGER NOT NULL REFERENCES githubupdate(id),
    proglang_id INTEGER NOT NULL REFERENCES proglang(id),
    repo_id INTEGER NOT NULL REFERENCES repo(id),
    category_id INTEGER NOT NULL REFERENCES topcategory(id),
    rank INTEGER
)
"#;

/// Language summary fact: one row per (batch, language)
pub const CREATE_LANGUAGE_UPDATE_TABLE: &str = r#"
CREATE TABLE languageupdate (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    update_id INTEGER NOT NULL REFERENCES githubupdate(id),
    proglang_id INTEGER NOT NULL REFERENCES proglang(id),
    num_projects INTEGER NOT NULL,
    rank INTEGER NOT NULL
)
"#;

/// Table names paired with their DDL, parents before children
pub const TABLES: &[(&str, &str)] = &[
    ("githubupdate", CREATE_UPDATE_TABLE),
    ("proglang", CREATE_LANGUAGE_TABLE),
    ("repo", CREATE_REPOSITORY_TABLE),
    ("topcategory", CREATE_CATEGORY_TABLE),
    ("repoupdate", CREATE_REPO_UPDATE_TABLE),
    ("languageupdate", CREATE_LANGUAGE_UPDATE_TABLE),
];

/// What happened to one table during initialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum TableOutcome {
    Created,
    AlreadyExists,
    Failed(String),
}

impl TableOutcome {
    pub fn is_usable(&self) -> bool {
        !matches!(self, TableOutcome::Failed(_))
    }
}

/// Per-table results of [`ensure_schema`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaReport {
    pub tables: Vec<(&'static str, TableOutcome)>,
}

impl SchemaReport {
    /// True when every table exists after initialization
    pub fn is_complete(&self) -> bool {
        self.tables.iter().all(|(_, outcome)| outcome.is_usable())
    }

    pub fn created(&self) -> usize {
        self.tables
            .iter()
            .filter(|(_, outcome)| *outcome == TableOutcome::Created)
            .count()
    }

    pub fn failures(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|(_, outcome)| !outcome.is_usable())
            .map(|(name, _)| *name)
            .collect()
    }
}

impl fmt::Display for SchemaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Schema:")?;
        for (name, outcome) in &self.tables {
            match outcome {
                TableOutcome::Created => writeln!(f, "  {}: created", name)?,
                TableOutcome::AlreadyExists => writeln!(f, "  {}: already exists", name)?,
                TableOutcome::Failed(msg) => writeln!(f, "  {}: FAILED ({})", name, msg)?,
            }
        }
        Ok(())
    }
}

/// Create every table, tolerating tables that already exist.
///
/// A failure on one table never stops the others from being attempted.
pub fn ensure_schema(conn: &Connection) -> SchemaReport {
    create_tables(conn, TABLES)
}

fn create_tables(conn: &Connection, tables: &[(&'static str, &str)]) -> SchemaReport {
    let mut report = SchemaReport::default();
    for (name, ddl) in tables {
        let outcome = create_table(conn, name, ddl);
        report.tables.push((*name, outcome));
    }
    report
}

fn create_table(conn: &Connection, name: &str, ddl: &str) -> TableOutcome {
    match conn.execute_batch(ddl) {
        Ok(()) => {
            tracing::debug!(table = name, "created table");
            TableOutcome::Created
        }
        Err(e) if is_table_exists(&e) => {
            tracing::info!(table = name, "table already exists");
            TableOutcome::AlreadyExists
        }
        Err(e) => {
            tracing::error!(table = name, error = %e, "error creating table");
            TableOutcome::Failed(e.to_string())
        }
    }
}

/// SQLite reports a duplicate table as a generic SQLITE_ERROR; the message is the only signal.
fn is_table_exists(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.contains("already exists"),
        _ => false,
    }
}
