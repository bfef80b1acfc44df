//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, OpenFlags, params};
use crate::Result;
use super::resolver::{DimensionCache, ResolverStats};
use super::schema::{self, SchemaReport};

/// SQLite-backed store for trending snapshots.
///
/// Owns the single connection plus the resolver's natural-key caches. The
/// caches assume one sequential writer; two stores resolving the same new key
/// at the same time can both insert it.
pub struct TrendStore {
    pub(super) conn: Connection,
    pub(super) cache: DimensionCache,
    pub(super) resolver_stats: ResolverStats,
    schema: SchemaReport,
}

impl TrendStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).inspect_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to open database");
        })?;
        Self::with_connection(conn)
    }

    /// Open a database file that must already exist
    pub fn open_existing(path: &Path) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).inspect_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to open existing database");
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().inspect_err(|e| {
            tracing::error!(error = %e, "failed to open in-memory database");
        })?;
        Self::with_connection(conn)
    }

    /// Open from a configured location; `:memory:` selects an in-memory database
    pub fn open_location(location: &str) -> Result<Self> {
        if location == ":memory:" {
            Self::open_in_memory()
        } else {
            Self::open(Path::new(location))
        }
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        // SQLite leaves FK enforcement off unless asked
        conn.execute_batch("PRAGMA foreign_keys = ON;").inspect_err(|e| {
            tracing::error!(error = %e, "failed to enable foreign keys");
        })?;

        let schema = schema::ensure_schema(&conn);
        if !schema.is_complete() {
            tracing::error!(failed = ?schema.failures(), "schema incomplete; dependent writes will fail");
        }

        Ok(Self {
            conn,
            cache: DimensionCache::default(),
            resolver_stats: ResolverStats::default(),
            schema,
        })
    }

    /// Outcome of schema initialization at construction time
    pub fn schema_report(&self) -> &SchemaReport {
        &self.schema
    }

    /// Re-run schema initialization against the open connection
    pub fn ensure_schema(&mut self) -> &SchemaReport {
        self.schema = schema::ensure_schema(&self.conn);
        &self.schema
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, releasing cached statements.
    ///
    /// Dropping the store also closes it; this variant reports the failure.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| {
            tracing::error!(error = %e, "error closing database");
            e.into()
        })
    }

    // ========== Read-side helpers ==========

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            batches: self.count_rows("githubupdate")?,
            languages: self.count_rows("proglang")?,
            repositories: self.count_rows("repo")?,
            categories: self.count_rows("topcategory")?,
            top_project_facts: self.count_rows("repoupdate")?,
            language_facts: self.count_rows("languageupdate")?,
        })
    }

    fn count_rows(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Top-project rows of one list in a batch, as `(owner/name, rank)` ordered by rank
    pub fn top_project_ranks(&self, batch_id: i64, language_id: i64, category_id: i64) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT r.username, r.reponame, u.rank
            FROM repoupdate u JOIN repo r ON r.id = u.repo_id
            WHERE u.update_id = ?1 AND u.proglang_id = ?2 AND u.category_id = ?3
            ORDER BY u.rank
            "#,
        )?;

        let rows = stmt
            .query_map(params![batch_id, language_id, category_id], |row| {
                let owner: String = row.get(0)?;
                let name: String = row.get(1)?;
                Ok((format!("{}/{}", owner, name), row.get(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Language summary rows of one batch, in insertion order
    pub fn language_summaries(&self, batch_id: i64) -> Result<Vec<LanguageSummaryRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT l.id, l.name, u.num_projects, u.rank
            FROM languageupdate u JOIN proglang l ON l.id = u.proglang_id
            WHERE u.update_id = ?1
            ORDER BY u.id
            "#,
        )?;

        let rows = stmt
            .query_map([batch_id], |row| {
                Ok(LanguageSummaryRow {
                    language_id: row.get(0)?,
                    language: row.get(1)?,
                    num_projects: row.get(2)?,
                    rank: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }
}

/// A `languageupdate` row joined with its language name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSummaryRow {
    pub language_id: i64,
    pub language: String,
    pub num_projects: i64,
    pub rank: i64,
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DbStats {
    pub batches: usize,
    pub languages: usize,
    pub repositories: usize,
    pub categories: usize,
    pub top_project_facts: usize,
    pub language_facts: usize,
}

impl DbStats {
    /// `(label, count)` pairs in schema order
    pub fn rows(&self) -> [(&'static str, usize); 6] {
        [
            ("Batches", self.batches),
            ("Languages", self.languages),
            ("Repositories", self.repositories),
            ("Categories", self.categories),
            ("Top-project facts", self.top_project_facts),
            ("Language facts", self.language_facts),
        ]
    }
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        for (label, count) in self.rows() {
            writeln!(f, "  {}: {}", label, count)?;
        }
        Ok(())
    }
}
