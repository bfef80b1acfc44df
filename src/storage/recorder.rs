//! Batch recording - one update batch plus its fact rows
//!
//! Recording is best-effort and not transactional end-to-end: a row that cannot
//! be written is skipped and counted, and the run moves on.

use std::fmt;
use rusqlite::params;
use serde::Serialize;
use crate::Result;
use crate::category::Category;
use crate::record::{LanguageRecord, LanguageRecords};
use super::sqlite::TrendStore;

/// Outcome of one [`TrendStore::record_batch`] call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// `None` when the `githubupdate` row could not be created
    pub batch_id: Option<i64>,
    pub languages: usize,
    pub top_project_facts: usize,
    pub language_facts: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl BatchSummary {
    /// True when every fact was written
    pub fn is_clean(&self) -> bool {
        self.batch_id.is_some() && self.skipped == 0 && self.errors.is_empty()
    }

    pub fn facts_written(&self) -> usize {
        self.top_project_facts + self.language_facts
    }

    fn skip(&mut self, reason: String) {
        self.skipped += 1;
        self.errors.push(reason);
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batch Summary:")?;
        match self.batch_id {
            Some(id) => writeln!(f, "  Batch: {}", id)?,
            None => writeln!(f, "  Batch: <not created>")?,
        }
        writeln!(f, "  Languages: {}", self.languages)?;
        writeln!(f, "  Top-project facts: {}", self.top_project_facts)?;
        writeln!(f, "  Language facts: {}", self.language_facts)?;
        writeln!(f, "  Skipped: {}", self.skipped)?;
        for err in &self.errors {
            writeln!(f, "    - {}", err)?;
        }
        Ok(())
    }
}

impl TrendStore {
    /// Record one snapshot of per-language rankings.
    ///
    /// Creates a new batch, then for each language (in map order) writes the
    /// top-project rows of all eight lists followed by the language summary row.
    /// Ranks are 1-based positions within each input list. Failures never abort
    /// the run; they are logged and reported in the returned summary.
    /// A skipped row keeps its position, leaving a gap in the stored ranks.
    pub fn record_batch(&mut self, records: &LanguageRecords) -> BatchSummary {
        let mut summary = BatchSummary::default();

        summary.batch_id = match self.create_batch() {
            Ok(id) => {
                tracing::info!(batch_id = id, languages = records.len(), "created update batch");
                Some(id)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to create update batch");
                summary.errors.push(format!("batch: {}", e));
                None
            }
        };

        for (language, record) in records {
            summary.languages += 1;
            self.record_language(&mut summary, language, record);
        }

        tracing::info!(
            batch_id = ?summary.batch_id,
            top_project_facts = summary.top_project_facts,
            language_facts = summary.language_facts,
            skipped = summary.skipped,
            "recorded batch"
        );
        summary
    }

    fn record_language(&mut self, summary: &mut BatchSummary, language: &str, record: &LanguageRecord) {
        let language_id = match self.resolve_language(language) {
            Ok(id) => Some(id),
            Err(e) => {
                summary.errors.push(format!("language {}: {}", language, e));
                None
            }
        };

        for &category in Category::all() {
            self.record_top_projects(summary, language, language_id, category, record.list(category));
        }

        let (Some(batch_id), Some(language_id)) = (summary.batch_id, language_id) else {
            summary.skipped += 1;
            return;
        };
        match self.insert_language_update(batch_id, language_id, record.num_projects, record.rank) {
            Ok(()) => summary.language_facts += 1,
            Err(e) => {
                tracing::error!(
                    batch_id,
                    language_id,
                    num_projects = record.num_projects,
                    rank = record.rank,
                    error = %e,
                    "failed to save language update"
                );
                summary.skip(format!("language update {}: {}", language, e));
            }
        }
    }

    fn record_top_projects(
        &mut self,
        summary: &mut BatchSummary,
        language: &str,
        language_id: Option<i64>,
        category: Category,
        repositories: &[String],
    ) {
        // Empty lists never materialize a category row
        if repositories.is_empty() {
            return;
        }

        let category_id = match self.resolve_category_kind(category) {
            Ok(id) => Some(id),
            Err(e) => {
                summary.errors.push(format!("category {}: {}", category, e));
                None
            }
        };

        for (position, raw) in repositories.iter().enumerate() {
            let rank = position as i64 + 1;

            let repo_id = match self.resolve_repository(raw) {
                Ok(id) => id,
                Err(e) => {
                    summary.skip(format!("{} / {} #{} {:?}: {}", language, category, rank, raw, e));
                    continue;
                }
            };

            let (Some(batch_id), Some(language_id), Some(category_id)) =
                (summary.batch_id, language_id, category_id)
            else {
                summary.skipped += 1;
                continue;
            };

            match self.insert_repo_update(batch_id, language_id, repo_id, category_id, rank) {
                Ok(()) => summary.top_project_facts += 1,
                Err(e) => {
                    tracing::error!(
                        batch_id,
                        language_id,
                        category = %category,
                        rank,
                        error = %e,
                        "failed to save top project"
                    );
                    summary.skip(format!("{} / {} #{}: {}", language, category, rank, e));
                }
            }
        }
    }

    fn create_batch(&self) -> Result<i64> {
        self.conn
            .execute("INSERT INTO githubupdate (create_date) VALUES (CURRENT_TIMESTAMP)", [])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_repo_update(
        &self,
        batch_id: i64,
        language_id: i64,
        repo_id: i64,
        category_id: i64,
        rank: i64,
    ) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO repoupdate (update_id, proglang_id, repo_id, category_id, rank) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(params![batch_id, language_id, repo_id, category_id, rank])?;
        Ok(())
    }

    fn insert_language_update(&self, batch_id: i64, language_id: i64, num_projects: i64, rank: i64) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO languageupdate (update_id, proglang_id, num_projects, rank) VALUES (?1, ?2, ?3, ?4)",
            )?
            .execute(params![batch_id, language_id, num_projects, rank])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn go_record() -> LanguageRecord {
        LanguageRecord::new(42, 1).with_list(Category::MostWatchedOverall, ["alice/repo1", "bob/repo2"])
    }

    fn single(language: &str, record: LanguageRecord) -> LanguageRecords {
        let mut records = LanguageRecords::new();
        records.insert(language.to_string(), record);
        records
    }

    #[test]
    fn test_end_to_end_single_language() {
        let mut store = TrendStore::open_in_memory().unwrap();
        let summary = store.record_batch(&single("Go", go_record()));

        assert!(summary.is_clean());
        assert_eq!(summary.top_project_facts, 2);
        assert_eq!(summary.language_facts, 1);

        let stats = store.stats().unwrap();
        assert_eq!(stats.batches, 1);
        assert_eq!(stats.languages, 1);
        assert_eq!(stats.repositories, 2);
        assert_eq!(stats.categories, 1);
        assert_eq!(stats.top_project_facts, 2);
        assert_eq!(stats.language_facts, 1);

        let batch_id = summary.batch_id.unwrap();
        let go = store.resolve_language("Go").unwrap();
        let category = store.resolve_category("most watched overall").unwrap();
        assert_eq!(
            store.top_project_ranks(batch_id, go, category).unwrap(),
            vec![("alice/repo1".to_string(), 1), ("bob/repo2".to_string(), 2)]
        );

        let summaries = store.language_summaries(batch_id).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].language, "Go");
        assert_eq!(summaries[0].num_projects, 42);
        assert_eq!(summaries[0].rank, 1);
    }

    #[test]
    fn test_existing_category_is_reused() {
        let mut store = TrendStore::open_in_memory().unwrap();
        let existing = store.resolve_category_kind(Category::MostWatchedOverall).unwrap();

        store.record_batch(&single("Go", go_record()));
        assert_eq!(store.stats().unwrap().categories, 1);
        assert_eq!(store.resolve_category("most watched overall").unwrap(), existing);
    }

    #[test]
    fn test_rank_density_per_list() {
        let repos: Vec<String> = (0..10).map(|i| format!("owner{}/repo{}", i, i)).collect();
        let record = LanguageRecord::new(10, 4)
            .with_list(Category::MostForkedThisWeek, repos.clone())
            .with_list(Category::MostWatchedToday, ["z/last", "a/first"]);

        let mut store = TrendStore::open_in_memory().unwrap();
        let summary = store.record_batch(&single("Rust", record));
        let batch_id = summary.batch_id.unwrap();
        let rust = store.resolve_language("Rust").unwrap();

        let forked = store.resolve_category_kind(Category::MostForkedThisWeek).unwrap();
        let rows = store.top_project_ranks(batch_id, rust, forked).unwrap();
        let ranks: Vec<i64> = rows.iter().map(|(_, rank)| *rank).collect();
        assert_eq!(ranks, (1..=10).collect::<Vec<i64>>());
        let names: Vec<String> = rows.into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, repos);

        // Counter restarts per list and follows input order, not name order
        let watched = store.resolve_category_kind(Category::MostWatchedToday).unwrap();
        assert_eq!(
            store.top_project_ranks(batch_id, rust, watched).unwrap(),
            vec![("z/last".to_string(), 1), ("a/first".to_string(), 2)]
        );
    }

    #[test]
    fn test_same_repository_in_several_lists() {
        let record = LanguageRecord::new(1, 1)
            .with_list(Category::MostWatchedOverall, ["alice/repo1"])
            .with_list(Category::MostForkedOverall, ["/alice/repo1"]);

        let mut store = TrendStore::open_in_memory().unwrap();
        let summary = store.record_batch(&single("Go", record));
        assert!(summary.is_clean());

        let stats = store.stats().unwrap();
        assert_eq!(stats.repositories, 1);
        assert_eq!(stats.categories, 2);
        assert_eq!(stats.top_project_facts, 2);
    }

    #[test]
    fn test_malformed_repository_skips_only_its_row() {
        let record = LanguageRecord::new(3, 2)
            .with_list(Category::MostWatchedOverall, ["alice/repo1", "ownername-only", "bob/repo2"]);

        let mut store = TrendStore::open_in_memory().unwrap();
        let summary = store.record_batch(&single("Go", record));

        assert!(!summary.is_clean());
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("ownername-only"));
        assert_eq!(summary.top_project_facts, 2);
        assert_eq!(summary.language_facts, 1);

        let batch_id = summary.batch_id.unwrap();
        let go = store.resolve_language("Go").unwrap();
        let category = store.resolve_category_kind(Category::MostWatchedOverall).unwrap();
        assert_eq!(
            store.top_project_ranks(batch_id, go, category).unwrap(),
            vec![("alice/repo1".to_string(), 1), ("bob/repo2".to_string(), 3)]
        );
    }

    #[test]
    fn test_repeated_language_across_batches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trends.db");

        let first = {
            let mut store = TrendStore::open(&path).unwrap();
            store.record_batch(&single("Go", go_record()))
        };
        let mut store = TrendStore::open(&path).unwrap();
        let second = store.record_batch(&single("Go", LanguageRecord::new(50, 2)));

        let first_id = first.batch_id.unwrap();
        let second_id = second.batch_id.unwrap();
        assert_ne!(first_id, second_id);

        let a = store.language_summaries(first_id).unwrap();
        let b = store.language_summaries(second_id).unwrap();
        assert_eq!(a[0].language_id, b[0].language_id);
        assert_eq!((b[0].num_projects, b[0].rank), (50, 2));

        let stats = store.stats().unwrap();
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.languages, 1);
        assert_eq!(stats.language_facts, 2);
    }

    #[test]
    fn test_languages_written_in_map_order() {
        let mut records = LanguageRecords::new();
        records.insert("Ruby".to_string(), LanguageRecord::new(5, 3));
        records.insert("C".to_string(), LanguageRecord::new(8, 1));
        records.insert("Go".to_string(), LanguageRecord::new(6, 2));

        let mut store = TrendStore::open_in_memory().unwrap();
        let summary = store.record_batch(&records);
        assert_eq!(summary.languages, 3);

        let names: Vec<String> = store
            .language_summaries(summary.batch_id.unwrap())
            .unwrap()
            .into_iter()
            .map(|row| row.language)
            .collect();
        assert_eq!(names, vec!["Ruby", "C", "Go"]);
    }

    #[test]
    fn test_empty_input_still_creates_batch() {
        let mut store = TrendStore::open_in_memory().unwrap();
        let summary = store.record_batch(&LanguageRecords::new());
        assert!(summary.is_clean());
        assert_eq!(summary.facts_written(), 0);
        assert_eq!(store.stats().unwrap().batches, 1);
    }

    #[test]
    fn test_missing_batch_table_skips_facts() {
        let mut store = TrendStore::open_in_memory().unwrap();
        store
            .conn()
            .execute_batch("DROP TABLE repoupdate; DROP TABLE languageupdate; DROP TABLE githubupdate;")
            .unwrap();

        let summary = store.record_batch(&single("Go", go_record()));
        assert_eq!(summary.batch_id, None);
        assert_eq!(summary.facts_written(), 0);
        assert_eq!(summary.skipped, 3);
        assert!(summary.errors[0].starts_with("batch:"));

        // Dimensions are still resolved
        let stats = (
            store.conn().query_row("SELECT COUNT(*) FROM proglang", [], |r| r.get::<_, i64>(0)).unwrap(),
            store.conn().query_row("SELECT COUNT(*) FROM repo", [], |r| r.get::<_, i64>(0)).unwrap(),
        );
        assert_eq!(stats, (1, 2));
    }

    #[test]
    fn test_fact_insert_failure_is_skipped() {
        let mut store = TrendStore::open_in_memory().unwrap();
        store.conn().execute_batch("DROP TABLE repoupdate;").unwrap();

        let summary = store.record_batch(&single("Go", go_record()));
        assert!(summary.batch_id.is_some());
        assert_eq!(summary.top_project_facts, 0);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.language_facts, 1);
    }

    #[test]
    fn test_dangling_foreign_key_rejected() {
        let store = TrendStore::open_in_memory().unwrap();
        assert!(store.insert_repo_update(1, 1, 1, 1, 1).is_err());
        assert!(store.insert_language_update(7, 7, 1, 1).is_err());
    }

    fn reject_inserts(store: &TrendStore, table: &str) {
        store
            .conn()
            .execute_batch(&format!(
                "CREATE TRIGGER reject_{table} BEFORE INSERT ON {table} \
                 BEGIN SELECT RAISE(ABORT, 'inserts into {table} disabled'); END;"
            ))
            .unwrap();
    }

    #[test]
    fn test_unresolved_language_skips_all_its_facts() {
        let mut store = TrendStore::open_in_memory().unwrap();
        reject_inserts(&store, "proglang");

        let summary = store.record_batch(&single("Go", go_record()));
        assert!(summary.batch_id.is_some());
        assert_eq!(summary.top_project_facts, 0);
        assert_eq!(summary.language_facts, 0);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].starts_with("language Go:"));

        // Other dimensions are still resolved
        let stats = store.stats().unwrap();
        assert_eq!(stats.languages, 0);
        assert_eq!(stats.repositories, 2);
        assert_eq!(stats.categories, 1);
    }

    #[test]
    fn test_unresolved_category_skips_its_list() {
        let mut store = TrendStore::open_in_memory().unwrap();
        reject_inserts(&store, "topcategory");

        let summary = store.record_batch(&single("Go", go_record()));
        assert!(summary.batch_id.is_some());
        assert_eq!(summary.top_project_facts, 0);
        assert_eq!(summary.language_facts, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].starts_with("category most watched overall:"));

        let stats = store.stats().unwrap();
        assert_eq!(stats.categories, 0);
        assert_eq!(stats.repositories, 2);
        assert_eq!(stats.language_facts, 1);
    }
}
