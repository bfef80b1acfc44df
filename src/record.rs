//! Per-language trending records
//!
//! One `LanguageRecord` per language per run: the language's project count,
//! its overall rank, and eight ordered lists of `owner/name` strings.

use crate::Result;
use crate::category::Category;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Input for one batch, keyed by language name in iteration order.
pub type LanguageRecords = IndexMap<String, LanguageRecord>;

/// Snapshot of one language's trending page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageRecord {
    pub num_projects: i64,
    pub rank: i64,
    pub most_watched_overall: Vec<String>,
    pub most_watched_today: Vec<String>,
    pub most_watched_this_week: Vec<String>,
    pub most_watched_this_month: Vec<String>,
    pub most_forked_overall: Vec<String>,
    pub most_forked_today: Vec<String>,
    pub most_forked_this_week: Vec<String>,
    pub most_forked_this_month: Vec<String>,
}

impl LanguageRecord {
    pub fn new(num_projects: i64, rank: i64) -> Self {
        Self {
            num_projects,
            rank,
            ..Self::default()
        }
    }

    /// Replace one ranking list
    pub fn with_list<I, S>(mut self, category: Category, repos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.list_mut(category) = repos.into_iter().map(Into::into).collect();
        self
    }

    /// The ordered repository strings for a category
    pub fn list(&self, category: Category) -> &[String] {
        match category {
            Category::MostWatchedOverall => &self.most_watched_overall,
            Category::MostWatchedToday => &self.most_watched_today,
            Category::MostWatchedThisWeek => &self.most_watched_this_week,
            Category::MostWatchedThisMonth => &self.most_watched_this_month,
            Category::MostForkedOverall => &self.most_forked_overall,
            Category::MostForkedToday => &self.most_forked_today,
            Category::MostForkedThisWeek => &self.most_forked_this_week,
            Category::MostForkedThisMonth => &self.most_forked_this_month,
        }
    }

    fn list_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::MostWatchedOverall => &mut self.most_watched_overall,
            Category::MostWatchedToday => &mut self.most_watched_today,
            Category::MostWatchedThisWeek => &mut self.most_watched_this_week,
            Category::MostWatchedThisMonth => &mut self.most_watched_this_month,
            Category::MostForkedOverall => &mut self.most_forked_overall,
            Category::MostForkedToday => &mut self.most_forked_today,
            Category::MostForkedThisWeek => &mut self.most_forked_this_week,
            Category::MostForkedThisMonth => &mut self.most_forked_this_month,
        }
    }

    /// Total repository entries across all eight lists
    pub fn total_entries(&self) -> usize {
        Category::all().iter().map(|c| self.list(*c).len()).sum()
    }
}

/// Parse a JSON object of `{ "<language>": LanguageRecord }`, keeping document order.
pub fn parse_records(json: &str) -> Result<LanguageRecords> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a records file.
pub fn load_records(path: &Path) -> Result<LanguageRecords> {
    let contents = std::fs::read_to_string(path)?;
    parse_records(&contents)
}
