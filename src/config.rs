use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

use crate::db::default_db_path;
use crate::tasks::filter::StatusFilter;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub storage: Option<StorageConfig>,
    pub display: Option<DisplayConfig>,
    pub log:     Option<LogConfig>,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    /// all | open | done | today | overdue
    pub default_filter: Option<String>,
    pub color:          Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    pub level: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let path = config_dir().join("config.toml");
        if path.exists() {
            Self::parse(&std::fs::read_to_string(&path)?)
        } else {
            Ok(AppConfig::default())
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage.as_ref()
            .and_then(|s| s.path.clone())
            .unwrap_or_else(default_db_path)
    }

    /// Falls back to the open filter when unset or unrecognised.
    pub fn default_filter(&self) -> StatusFilter {
        self.display.as_ref()
            .and_then(|d| d.default_filter.as_deref())
            .and_then(|f| f.parse().ok())
            .unwrap_or_default()
    }

    pub fn color(&self) -> bool {
        self.display.as_ref().and_then(|d| d.color).unwrap_or(true)
    }

    pub fn log_level(&self) -> &str {
        self.log.as_ref().and_then(|l| l.level.as_deref()).unwrap_or("info")
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studyplanner")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = AppConfig::parse("").unwrap();
        assert_eq!(cfg.default_filter(), StatusFilter::Open);
        assert!(cfg.color());
        assert_eq!(cfg.log_level(), "info");
        assert_eq!(cfg.db_path(), default_db_path());
    }

    #[test]
    fn reads_every_section() {
        let cfg = AppConfig::parse(r#"
            [storage]
            path = "/tmp/planner.db"

            [display]
            default_filter = "today"
            color = false

            [log]
            level = "debug"
        "#).unwrap();
        assert_eq!(cfg.db_path(), PathBuf::from("/tmp/planner.db"));
        assert_eq!(cfg.default_filter(), StatusFilter::Today);
        assert!(!cfg.color());
        assert_eq!(cfg.log_level(), "debug");
    }

    #[test]
    fn unknown_filter_falls_back_to_open() {
        let cfg = AppConfig::parse("[display]\ndefault_filter = \"someday\"").unwrap();
        assert_eq!(cfg.default_filter(), StatusFilter::Open);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(AppConfig::parse("[storage\npath = 1").is_err());
    }
}
