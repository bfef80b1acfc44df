use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TrendConfig {
    /// Database file, or `:memory:`
    pub database: Option<String>,
    /// Default records file for `ingest`
    pub input: Option<String>,
}

impl TrendConfig {
    /// CLI value wins, then config, then the built-in default
    pub fn database_location(&self, cli: Option<&Path>) -> String {
        cli.map(|p| p.display().to_string())
            .or_else(|| self.database.clone())
            .unwrap_or_else(|| default_database_path().display().to_string())
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("langtrend.toml")
}

pub fn default_database_path() -> PathBuf {
    default_database_path_in(Path::new("."))
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".langtrend").join("langtrend.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<TrendConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: TrendConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &TrendConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(location: &str) -> anyhow::Result<()> {
    if location == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = Path::new(location).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("langtrend.toml");
        let config = TrendConfig {
            database: Some("trends.db".to_string()),
            input: None,
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        assert_eq!(load_config(Some(&path)).unwrap(), Some(config));
    }

    #[test]
    fn test_database_location_precedence() {
        let config = TrendConfig {
            database: Some("from-config.db".to_string()),
            input: None,
        };
        assert_eq!(config.database_location(Some(Path::new("cli.db"))), "cli.db");
        assert_eq!(config.database_location(None), "from-config.db");
        assert_eq!(
            TrendConfig::default().database_location(None),
            default_database_path().display().to_string()
        );
    }

    #[test]
    fn test_ensure_db_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("langtrend.db");
        ensure_db_dir(&db.display().to_string()).unwrap();
        assert!(db.parent().unwrap().is_dir());
        ensure_db_dir(":memory:").unwrap();
    }
}
