//! Dimension resolution - get-or-create by natural key
//!
//! Languages and categories are keyed by name, repositories by
//! `(owner, name)`. A resolved id is cached for the lifetime of the store, so
//! each key costs at most one lookup and one insert per store.

use std::collections::HashMap;
use rusqlite::{Connection, OptionalExtension, ToSql, params};
use serde::Serialize;
use crate::Result;
use crate::category::Category;
use crate::repo_name::RepoName;
use super::sqlite::TrendStore;

/// Natural key to id maps, scoped to one store
#[derive(Debug, Default)]
pub(super) struct DimensionCache {
    languages: HashMap<String, i64>,
    categories: HashMap<String, i64>,
    repositories: HashMap<RepoName, i64>,
}

impl DimensionCache {
    pub(super) fn len(&self) -> usize {
        self.languages.len() + self.categories.len() + self.repositories.len()
    }
}

/// Round-trip counters for the resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    /// Resolutions answered from the cache
    pub cache_hits: usize,
    /// SELECTs issued on a cache miss
    pub lookups: usize,
    /// Rows created because the lookup found nothing
    pub inserts: usize,
}

impl TrendStore {
    /// Resolve a language name to its `proglang` id, creating the row on first sight.
    pub fn resolve_language(&mut self, name: &str) -> Result<i64> {
        if let Some(&id) = self.cache.languages.get(name) {
            self.resolver_stats.cache_hits += 1;
            return Ok(id);
        }

        let id = get_or_create(
            &self.conn,
            &mut self.resolver_stats,
            "SELECT id FROM proglang WHERE name = ?1 ORDER BY id LIMIT 1",
            "INSERT INTO proglang (name) VALUES (?1)",
            params![name],
        )
        .inspect_err(|e| tracing::error!(language = name, error = %e, "failed to resolve language"))?;

        self.cache.languages.insert(name.to_string(), id);
        Ok(id)
    }

    /// Resolve a category label. Labels outside [`Category`] are stored as given.
    pub fn resolve_category(&mut self, label: &str) -> Result<i64> {
        if let Some(&id) = self.cache.categories.get(label) {
            self.resolver_stats.cache_hits += 1;
            return Ok(id);
        }

        let id = get_or_create(
            &self.conn,
            &mut self.resolver_stats,
            "SELECT id FROM topcategory WHERE name = ?1 ORDER BY id LIMIT 1",
            "INSERT INTO topcategory (name) VALUES (?1)",
            params![label],
        )
        .inspect_err(|e| tracing::error!(category = label, error = %e, "failed to resolve category"))?;

        self.cache.categories.insert(label.to_string(), id);
        Ok(id)
    }

    pub fn resolve_category_kind(&mut self, category: Category) -> Result<i64> {
        self.resolve_category(category.as_str())
    }

    /// Resolve a combined `owner/name` string (see [`RepoName::parse`]).
    pub fn resolve_repository(&mut self, raw: &str) -> Result<i64> {
        let repo = RepoName::parse(raw)
            .inspect_err(|e| tracing::warn!(repository = raw, error = %e, "malformed repository name"))?;
        self.resolve_repository_name(&repo)
    }

    pub fn resolve_repository_name(&mut self, repo: &RepoName) -> Result<i64> {
        if let Some(&id) = self.cache.repositories.get(repo) {
            self.resolver_stats.cache_hits += 1;
            return Ok(id);
        }

        let id = get_or_create(
            &self.conn,
            &mut self.resolver_stats,
            "SELECT id FROM repo WHERE username = ?1 AND reponame = ?2 ORDER BY id LIMIT 1",
            "INSERT INTO repo (username, reponame) VALUES (?1, ?2)",
            params![repo.owner, repo.name],
        )
        .inspect_err(|e| {
            tracing::error!(owner = %repo.owner, name = %repo.name, error = %e, "failed to resolve repository")
        })?;

        self.cache.repositories.insert(repo.clone(), id);
        Ok(id)
    }

    pub fn resolver_stats(&self) -> ResolverStats {
        self.resolver_stats
    }

    /// Number of natural keys currently cached
    pub fn cached_keys(&self) -> usize {
        self.cache.len()
    }
}

/// Query-then-insert. Not atomic across connections.
fn get_or_create(
    conn: &Connection,
    stats: &mut ResolverStats,
    select: &str,
    insert: &str,
    params: &[&dyn ToSql],
) -> rusqlite::Result<i64> {
    stats.lookups += 1;
    let existing: Option<i64> = conn
        .prepare_cached(select)?
        .query_row(params, |row| row.get(0))
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    conn.prepare_cached(insert)?.execute(params)?;
    stats.inserts += 1;
    Ok(conn.last_insert_rowid())
}
