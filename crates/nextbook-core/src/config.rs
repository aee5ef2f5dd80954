use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NextbookError, Result};

/// Root application configuration, loaded from `~/.config/nextbook/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub goodreads: GoodReadsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub data_path: String,
}

/// Settings for the GoodReads book-by-title endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoodReadsConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is not set.
    pub api_key_env: String,
    /// Minimum delay between two requests to the API.
    pub min_interval_ms: u64,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("nextbook");

        Self {
            data_path: data_dir.to_string_lossy().to_string(),
        }
    }
}

impl Default for GoodReadsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.goodreads.com/book/title.xml".to_string(),
            api_key: None,
            api_key_env: "GOODREADS_API_KEY".to_string(),
            min_interval_ms: 1000,
        }
    }
}

impl GoodReadsConfig {
    /// The configured key, or the value of `api_key_env`.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.to_string());
        }

        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                NextbookError::ConfigError(format!(
                    "no GoodReads API key: set goodreads.api_key or ${}",
                    self.api_key_env
                ))
            })
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/nextbook/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("NEXTBOOK_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("nextbook")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.core.data_path).join("nextbook.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.goodreads.base_url, "https://www.goodreads.com/book/title.xml");
        assert_eq!(cfg.goodreads.min_interval_ms, 1000);
        assert!(!cfg.core.data_path.is_empty());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.goodreads.api_key = Some("abc123".to_string());
        cfg.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.goodreads.api_key.as_deref(), Some("abc123"));
        assert_eq!(loaded.goodreads.base_url, cfg.goodreads.base_url);
        assert_eq!(loaded.core.data_path, cfg.core.data_path);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[goodreads]\nmin_interval_ms = 0\n").unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.goodreads.min_interval_ms, 0);
        assert_eq!(loaded.goodreads.api_key_env, "GOODREADS_API_KEY");
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg = AppConfig::load_from(Path::new("/tmp/nonexistent_nextbook_config.toml")).unwrap();
        assert_eq!(cfg.goodreads.api_key_env, "GOODREADS_API_KEY");
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let cfg = GoodReadsConfig {
            api_key: Some("from-file".to_string()),
            api_key_env: "NEXTBOOK_TEST_KEY_UNUSED".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_api_key().unwrap(), "from-file");
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let cfg = GoodReadsConfig {
            api_key: None,
            api_key_env: "NEXTBOOK_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(matches!(cfg.resolve_api_key(), Err(NextbookError::ConfigError(_))));
    }

    #[test]
    fn test_database_path() {
        let cfg = AppConfig::default();
        assert!(cfg.database_path().to_string_lossy().ends_with("nextbook.db"));
    }
}
