// src/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::freshness::DEFAULT_CACHE_DURATION_SECS;
use crate::remote::newsapi::DEFAULT_BASE_URL;
use crate::sync::DEFAULT_RETENTION_DAYS;

pub const ENV_CONFIG_PATH: &str = "HEADLINES_CONFIG_PATH";
pub const ENV_API_KEY: &str = "NEWS_API_KEY";

fn default_source_id() -> String {
    "bbc-news".to_string()
}
fn default_source_name() -> String {
    "BBC News".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_cache_duration_secs() -> u64 {
    DEFAULT_CACHE_DURATION_SECS as u64
}
fn default_retention_days() -> u64 {
    DEFAULT_RETENTION_DAYS as u64
}
fn default_timeout_secs() -> u64 {
    30
}

/// Which partition to sync, with what credential, and the cache windows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    #[serde(default = "default_source_id")]
    pub source_id: String,
    #[serde(default = "default_source_name")]
    pub source_name: String,
    /// "ENV" means: read from NEWS_API_KEY.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_cache_duration_secs")]
    pub cache_duration_secs: u64,
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Token the access gate expects; `None` bypasses the gate.
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_id: default_source_id(),
            source_name: default_source_name(),
            api_key: default_api_key(),
            base_url: default_base_url(),
            cache_duration_secs: default_cache_duration_secs(),
            retention_days: default_retention_days(),
            connect_timeout_secs: default_timeout_secs(),
            request_timeout_secs: default_timeout_secs(),
            access_token: None,
        }
    }
}

impl SyncConfig {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading headlines config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, &ext)?;
        cfg.finish()
    }

    /// Load using env var + fallbacks:
    /// 1) $HEADLINES_CONFIG_PATH
    /// 2) config/headlines.toml
    /// 3) config/headlines.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        for candidate in ["config/headlines.toml", "config/headlines.json"] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from(&p);
            }
        }
        SyncConfig::default().finish()
    }

    /// Resolve "ENV" api key and sanitize zero windows.
    fn finish(mut self) -> Result<Self> {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = std::env::var(ENV_API_KEY).unwrap_or_default();
        }
        self.source_id = self.source_id.trim().to_string();
        if self.source_id.is_empty() {
            bail!("source_id must not be empty");
        }
        if self.cache_duration_secs == 0 {
            self.cache_duration_secs = default_cache_duration_secs();
        }
        if self.retention_days == 0 {
            self.retention_days = default_retention_days();
        }
        if self.connect_timeout_secs == 0 {
            self.connect_timeout_secs = default_timeout_secs();
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_timeout_secs();
        }
        if self.access_token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            self.access_token = None;
        }
        Ok(self)
    }

    pub fn cache_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_duration_secs as i64)
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention_days as i64)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<SyncConfig> {
    if hint_ext == "json" {
        return serde_json::from_str(s).context("parsing headlines config json");
    }
    if hint_ext == "toml" {
        return toml::from_str(s).context("parsing headlines config toml");
    }
    // No usable extension: JSON first, then TOML.
    if let Ok(v) = serde_json::from_str(s) {
        return Ok(v);
    }
    toml::from_str(s).map_err(|e| anyhow!("unsupported headlines config format: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_and_json_fill_defaults() {
        let t = parse_config(r#"source_id = "cnn""#, "toml").unwrap();
        assert_eq!(t.source_id, "cnn");
        assert_eq!(t.cache_duration_secs, 3600);
        assert_eq!(t.retention_days, 7);

        let j = parse_config(r#"{"source_id":"reuters","api_key":"k"}"#, "").unwrap();
        assert_eq!(j.source_id, "reuters");
        assert_eq!(j.api_key, "k");
        assert_eq!(j.base_url, "https://newsapi.org/");
    }

    #[test]
    fn zero_windows_fall_back_and_blank_token_bypasses() {
        let cfg = SyncConfig {
            api_key: "literal".into(),
            cache_duration_secs: 0,
            retention_days: 0,
            access_token: Some("  ".into()),
            ..SyncConfig::default()
        }
        .finish()
        .unwrap();
        assert_eq!(cfg.cache_duration(), chrono::Duration::hours(1));
        assert_eq!(cfg.retention(), chrono::Duration::days(7));
        assert_eq!(cfg.access_token, None);
        assert_eq!(cfg.api_key, "literal");
    }

    #[test]
    fn empty_source_is_rejected() {
        let cfg = SyncConfig {
            source_id: " ".into(),
            ..SyncConfig::default()
        };
        assert!(cfg.finish().is_err());
    }
}
