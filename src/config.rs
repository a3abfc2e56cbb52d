//! # Configuration
//!
//! Service settings come from `config.yml` in the service root. A missing file is
//! not an error: every field has a default. A few values can be overridden from the
//! environment so containers can be configured without editing the file.
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 8080
//! resources: resources     # schema directory, relative to the service root
//! list_limit: 100
//! coercion:
//!   strict_numbers: false  # reject unparseable numeric path params with 400
//! ```
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `CRUDHOOK_HOST` | `server.host` |
//! | `CRUDHOOK_PORT` | `server.port` |
//! | `CRUDHOOK_STACK_SIZE` | coroutine stack size (decimal or `0x` hex) |

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::controller::DEFAULT_LIST_LIMIT;

/// File name looked up in the service root.
pub const CONFIG_FILE: &str = "config.yml";

/// Default coroutine stack size (16 KB).
pub const DEFAULT_STACK_SIZE: usize = 0x4000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoercionConfig {
    pub strict_numbers: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// Schema directory; relative paths resolve against the service root.
    pub resources: PathBuf,
    pub list_limit: usize,
    pub coercion: CoercionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            resources: PathBuf::from("resources"),
            list_limit: DEFAULT_LIST_LIMIT,
            coercion: CoercionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse a YAML document. An empty document yields the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Failed to parse service config")
    }

    /// Load `config.yml` from `root` (defaults when absent) and apply env overrides.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config = Self::from_yaml(&contents)
                .with_context(|| format!("Invalid config: {}", path.display()))?;
            info!(path = %path.display(), "Config loaded");
            config
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Apply `CRUDHOOK_HOST` / `CRUDHOOK_PORT` through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("CRUDHOOK_HOST").filter(|h| !h.trim().is_empty()) {
            self.server.host = host.trim().to_string();
        }
        if let Some(raw) = lookup("CRUDHOOK_PORT") {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %raw, "Ignoring invalid CRUDHOOK_PORT"),
            }
        }
    }

    /// Schema directory resolved against `root`.
    #[must_use]
    pub fn resources_dir(&self, root: &Path) -> PathBuf {
        if self.resources.is_absolute() {
            self.resources.clone()
        } else {
            root.join(&self.resources)
        }
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Coroutine runtime settings read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for request coroutines in bytes
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self {
            stack_size: env::var("CRUDHOOK_STACK_SIZE")
                .ok()
                .and_then(|v| parse_stack_size(&v))
                .unwrap_or(DEFAULT_STACK_SIZE),
        }
    }

    /// Configure `may` for this process. Call once before the server starts.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
        info!(stack_size = self.stack_size, "Coroutine runtime configured");
    }
}

/// Parse `16384` or `0x4000`.
fn parse_stack_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}
