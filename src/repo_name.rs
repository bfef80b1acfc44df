//! Repository natural key - `owner/name`
//!
//! Trending lists carry repositories as combined strings such as
//! `alice/repo1` or `/alice/repo1`. The store keys repositories by the
//! parsed `(owner, name)` pair, never by the raw string.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Column width of `repo.username` and `repo.reponame`
pub const MAX_SEGMENT_LEN: usize = 64;

/// Parsed `(owner, name)` pair identifying a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoName {
    pub owner: String,
    pub name: String,
}

impl RepoName {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse a combined `owner/name` string.
    ///
    /// The input is trimmed and a single leading `/` is dropped before
    /// splitting on the first `/`. Exactly two non-empty segments of at most
    /// [`MAX_SEGMENT_LEN`] characters are required.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);

        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| Error::InvalidRepoName(format!("missing '/' in {:?}", raw)))?;

        if owner.is_empty() || name.is_empty() {
            return Err(Error::InvalidRepoName(format!("empty segment in {:?}", raw)));
        }
        if name.contains('/') {
            return Err(Error::InvalidRepoName(format!("more than two segments in {:?}", raw)));
        }
        if owner.chars().count() > MAX_SEGMENT_LEN || name.chars().count() > MAX_SEGMENT_LEN {
            return Err(Error::InvalidRepoName(format!(
                "segment longer than {} characters in {:?}",
                MAX_SEGMENT_LEN, raw
            )));
        }

        Ok(Self::new(owner, name))
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
