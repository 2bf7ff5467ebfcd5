//! Configuration loading and persistence.
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. `config.json` in the config directory (missing file = defaults)
//! 2. `SHELLDOCK_*` environment variables
//! 3. Command-line flags (applied by `main`)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::constants;

/// Configuration for shelldock.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Shell to launch in new windows. `None` resolves `$SHELL` then a
    /// platform fallback list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    /// Prefix chord, e.g. `ctrl+b` or `ctrl+a`.
    pub prefix: String,
    /// Start with automatic tiling enabled.
    pub tiling: bool,
    /// Animate minimize/restore/snap/tile transitions.
    pub animations: bool,
    /// Duration of one geometry animation in milliseconds.
    pub animation_ms: u64,
    /// Minimum window width in cells, border included.
    pub min_window_width: i32,
    /// Minimum window height in cells, border included.
    pub min_window_height: i32,
    /// Scrollback lines kept per window.
    pub scrollback_lines: usize,
    /// How long notifications stay on screen, in milliseconds.
    pub notification_ms: u64,
    /// How long the prefix stays armed, in milliseconds.
    pub prefix_timeout_ms: u64,
    /// Delay before the which-key hint shows, in milliseconds.
    pub which_key_delay_ms: u64,
    /// Maximum entries in the render style cache.
    pub style_cache_capacity: usize,
    /// Log lines retained for the in-app log viewer.
    pub log_buffer_lines: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: None,
            prefix: constants::DEFAULT_PREFIX.to_string(),
            tiling: false,
            animations: true,
            animation_ms: 250,
            min_window_width: constants::MIN_WINDOW_WIDTH,
            min_window_height: constants::MIN_WINDOW_HEIGHT,
            scrollback_lines: constants::DEFAULT_SCROLLBACK,
            notification_ms: 3000,
            prefix_timeout_ms: constants::PREFIX_TIMEOUT.as_millis() as u64,
            which_key_delay_ms: constants::WHICH_KEY_DELAY.as_millis() as u64,
            style_cache_capacity: 4096,
            log_buffer_lines: 500,
        }
    }
}

impl Config {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// Directory selection priority:
    /// 1. `SHELLDOCK_CONFIG_DIR` env var: explicit override
    /// 2. Platform config dir joined with `shelldock`
    pub fn config_dir() -> Result<PathBuf> {
        let dir = if let Ok(dir) = std::env::var("SHELLDOCK_CONFIG_DIR") {
            PathBuf::from(dir)
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("shelldock")
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config dir {}", dir.display()))?;
        Ok(dir)
    }

    /// Loads configuration from the default location with environment
    /// overrides. A missing or unreadable file falls back to defaults.
    pub fn load() -> Self {
        let mut config = Self::config_dir()
            .map(|dir| dir.join("config.json"))
            .and_then(|path| Self::load_from(&path))
            .unwrap_or_else(|e| {
                log::debug!("Using default config: {e:#}");
                Self::default()
            });
        config.apply_env_overrides();
        config
    }

    /// Loads configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config.sanitized())
    }

    /// Loads `path` (which must exist) and applies environment overrides,
    /// for an explicit `--config` file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Persists the configuration to `path` as pretty JSON.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(shell) = std::env::var("SHELLDOCK_SHELL") {
            if !shell.is_empty() {
                self.shell = Some(shell);
            }
        }

        if let Ok(prefix) = std::env::var("SHELLDOCK_PREFIX") {
            self.prefix = prefix;
        }

        if let Ok(tiling) = std::env::var("SHELLDOCK_TILING") {
            self.tiling = matches!(tiling.as_str(), "1" | "true" | "yes");
        }

        if let Ok(animations) = std::env::var("SHELLDOCK_ANIMATIONS") {
            self.animations = !matches!(animations.as_str(), "0" | "false" | "no");
        }
    }

    /// Clamp values that would make the UI unusable.
    fn sanitized(mut self) -> Self {
        self.min_window_width = self.min_window_width.max(4);
        self.min_window_height = self.min_window_height.max(3);
        self.style_cache_capacity = self.style_cache_capacity.max(16);
        self.log_buffer_lines = self.log_buffer_lines.max(1);
        self
    }

    /// Animation duration as a [`Duration`].
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    /// Notification lifetime as a [`Duration`].
    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    /// Prefix timeout as a [`Duration`].
    pub fn prefix_timeout(&self) -> Duration {
        Duration::from_millis(self.prefix_timeout_ms)
    }

    /// Which-key delay as a [`Duration`].
    pub fn which_key_delay(&self) -> Duration {
        Duration::from_millis(self.which_key_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.prefix, "ctrl+b");
        assert!(config.animations);
        assert!(!config.tiling);
        assert_eq!(config.animation_duration(), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "prefix": "ctrl+a", "tiling": true }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.prefix, "ctrl+a");
        assert!(config.tiling);
        assert_eq!(config.scrollback_lines, constants::DEFAULT_SCROLLBACK);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_from(&dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            shell: Some("/bin/zsh".to_string()),
            animations: false,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_sanitize_clamps_min_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "min_window_width": 0, "min_window_height": -3 }"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.min_window_width, 4);
        assert_eq!(config.min_window_height, 3);
    }
}
