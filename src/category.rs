//! Ranking-list kinds
//!
//! Every top-projects list belongs to one of eight categories:
//! most watched / most forked, crossed with overall / today / this week / this month.
//! The resolver stores categories by label, so labels outside this set are
//! still accepted on the generic path.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Closed set of top-projects list kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MostWatchedOverall,
    MostWatchedToday,
    MostWatchedThisWeek,
    MostWatchedThisMonth,
    MostForkedOverall,
    MostForkedToday,
    MostForkedThisWeek,
    MostForkedThisMonth,
}

impl Category {
    /// Label stored in `topcategory.name`
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MostWatchedOverall => "most watched overall",
            Category::MostWatchedToday => "most watched today",
            Category::MostWatchedThisWeek => "most watched this week",
            Category::MostWatchedThisMonth => "most watched this month",
            Category::MostForkedOverall => "most forked overall",
            Category::MostForkedToday => "most forked today",
            Category::MostForkedThisWeek => "most forked this week",
            Category::MostForkedThisMonth => "most forked this month",
        }
    }

    /// All categories, in the order the recorder writes them
    pub fn all() -> &'static [Category] {
        &[
            Category::MostWatchedOverall,
            Category::MostWatchedToday,
            Category::MostWatchedThisWeek,
            Category::MostWatchedThisMonth,
            Category::MostForkedOverall,
            Category::MostForkedToday,
            Category::MostForkedThisWeek,
            Category::MostForkedThisMonth,
        ]
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Accept the stored label as well as kebab/snake spellings
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        Category::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
