use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub const ARXIV_EXPORT_API: &str = "https://export.arxiv.org/api";
pub const SNAPSHOT_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %Z";

/// Root application configuration, loaded from `~/.config/paperline/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Metadata source URLs, in resolution priority order.
    pub sources: Vec<String>,
    pub sink: SinkConfig,
    pub http: HttpConfig,
    pub dates: DatesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    pub auth_token_env: String,
    pub concurrent_authors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub min_interval_ms: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatesConfig {
    pub snapshot_format: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            auth_token_env: "PAPERLINE_API_TOKEN".to_string(),
            concurrent_authors: false,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "paperline/0.1".to_string(),
            min_interval_ms: 3000,
            max_retries: 3,
        }
    }
}

impl Default for DatesConfig {
    fn default() -> Self {
        Self {
            snapshot_format: SNAPSHOT_DATE_FORMAT.to_string(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/paperline/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PAPERLINE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("paperline")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.dates.snapshot_format.trim_end().ends_with("%Z") {
            return Err(CoreError::Config(format!(
                "snapshot date format must end with a %Z zone token: {}",
                self.dates.snapshot_format
            )));
        }
        for url in &self.sources {
            if url.trim().is_empty() {
                return Err(CoreError::Config("empty metadata source URL".to_string()));
            }
        }
        Ok(())
    }

    /// Reads the sink bearer token from the configured environment variable.
    pub fn sink_token(&self) -> Option<String> {
        std::env::var(&self.sink.auth_token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.sources.is_empty());
        assert_eq!(cfg.http.max_retries, 3);
        assert_eq!(cfg.dates.snapshot_format, SNAPSHOT_DATE_FORMAT);
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.sources = vec![
            "file:///data/arxiv-metadata.json".to_string(),
            ARXIV_EXPORT_API.to_string(),
        ];
        cfg.sink.api_url = Some("https://api.example.org".to_string());
        cfg.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.sources, cfg.sources);
        assert_eq!(loaded.sink.api_url, cfg.sink.api_url);
        assert_eq!(loaded.http.min_interval_ms, cfg.http.min_interval_ms);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg = AppConfig::load_from(Path::new("/tmp/nonexistent_paperline_config.toml")).unwrap();
        assert!(cfg.sources.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sink]\nconcurrent_authors = true\n").unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert!(cfg.sink.concurrent_authors);
        assert_eq!(cfg.sink.auth_token_env, "PAPERLINE_API_TOKEN");
        assert_eq!(cfg.http.user_agent, "paperline/0.1");
    }

    #[test]
    fn test_rejects_format_without_zone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[dates]\nsnapshot_format = \"%Y-%m-%d\"\n").unwrap();

        assert!(matches!(
            AppConfig::load_from(&path),
            Err(CoreError::Config(_))
        ));
    }
}
