// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ranking::{DEFAULT_PREVIEW_LINES, DEFAULT_TOP_POSTS};

pub const ENV_CONFIG_PATH: &str = "X_MONITOR_CONFIG";
pub const ENV_API_BASE_URL: &str = "X_MONITOR_API_BASE_URL";
pub const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_connect_timeout_secs() -> u64 {
    4
}
// Manual runs search posts and summarize them server-side; give them room.
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_top_posts() -> usize {
    DEFAULT_TOP_POSTS
}
fn default_preview_lines() -> usize {
    DEFAULT_PREVIEW_LINES
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Base URL of the X Monitor API (without the `/api` suffix).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How many posts a result card shows when expanded.
    #[serde(default = "default_top_posts")]
    pub top_posts: usize,
    /// Summary lines visible while a result card is collapsed.
    #[serde(default = "default_preview_lines")]
    pub preview_lines: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            top_posts: default_top_posts(),
            preview_lines: default_preview_lines(),
        }
    }
}

impl MonitorConfig {
    /// Load from an explicit TOML file. Missing keys take their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading monitor config from {}", path.display()))?;
        let mut cfg: MonitorConfig = toml::from_str(&content)
            .with_context(|| format!("parsing monitor config {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Resolve config using env var + fallbacks:
    /// 1) $X_MONITOR_CONFIG (must exist)
    /// 2) config/monitor.toml
    /// 3) built-in defaults
    ///
    /// `$X_MONITOR_API_BASE_URL` then overrides the base URL.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default()
            }
        };

        if let Ok(url) = std::env::var(ENV_API_BASE_URL) {
            if !url.trim().is_empty() {
                cfg.api_base_url = url;
                cfg.sanitize();
            }
        }
        Ok(cfg)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn sanitize(&mut self) {
        self.api_base_url = self.api_base_url.trim().trim_end_matches('/').to_string();
        if self.api_base_url.is_empty() {
            self.api_base_url = default_api_base_url();
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout_secs();
        }
        if self.connect_timeout_secs == 0 {
            self.connect_timeout_secs = default_connect_timeout_secs();
        }
    }
}
