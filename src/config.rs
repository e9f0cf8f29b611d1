use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use anyhow::{Context, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use tracing::debug;

const CONFIG_PATH_ENV: &str = "ALFRED_TMUX_CONFIG";
const TERMINAL_ENV: &str = "TMUX_TERMINAL";
const REFRESH_KEYWORD_ENV: &str = "TMUX_REFRESH_KEYWORD";

const DEFAULT_CONFIG_DIR: &str = "alfred-tmux";
const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Runtime configuration, read once per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Terminal preference: `auto`, `iterm`, `ghostty`, `terminal` or an
    /// application name.
    pub terminal: String,
    pub tmux: TmuxConfig,
    pub timing: TimingConfig,
    pub refresh: RefreshConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TmuxConfig {
    /// Explicit tmux binary; looked up on `PATH` when unset.
    pub path: Option<PathBuf>,
    /// Working directory of new sessions; the home directory when unset.
    pub session_root: Option<PathBuf>,
    /// Server socket name (`tmux -L`); the default server when unset.
    pub socket: Option<String>,
}

/// Delays and polling bounds for terminal automation, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub iterm_window_delay_ms: u64,
    pub startup_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub settle_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Launcher keyword re-opened after a delete or detach. Empty disables
    /// the refresh.
    pub keyword: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            terminal: "auto".to_string(),
            tmux: TmuxConfig::default(),
            timing: TimingConfig::default(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            iterm_window_delay_ms: 100,
            startup_timeout_ms: 2000,
            poll_interval_ms: 100,
            settle_delay_ms: 300,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            keyword: "tm".to_string(),
        }
    }
}

impl TimingConfig {
    pub fn iterm_window_delay(&self) -> Duration {
        Duration::from_millis(self.iterm_window_delay_ms)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Config {
    /// Loads the config file, if any, and applies environment overrides.
    pub fn load() -> Result<Self> {
        let path = get_config_file_path()?;
        let config = Self::from_file(&path)?;
        Ok(config.with_overrides(|key| env::var(key).ok()))
    }

    /// Reads `path` as TOML. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let data = fs::read_to_string(path).with_context(|| {
            format!("Failed to read config file {}", path.display())
        })?;

        toml::from_str(&data).with_context(|| {
            format!("Failed to parse config file {}", path.display())
        })
    }

    /// Applies the launcher's workflow variables on top of the file values.
    /// Blank values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(terminal) =
            lookup(TERMINAL_ENV).filter(|v| !v.trim().is_empty())
        {
            self.terminal = terminal.trim().to_string();
        }

        if let Some(keyword) = lookup(REFRESH_KEYWORD_ENV) {
            self.refresh.keyword = keyword.trim().to_string();
        }

        self
    }

    /// Directory new sessions start in.
    pub fn session_root(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.tmux.session_root {
            return Ok(dir.clone());
        }

        home_dir()
            .ok_or_else(|| anyhow::anyhow!("Failed to determine HOME directory"))
    }
}

pub fn get_config_file_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let home = home_dir()
        .ok_or_else(|| anyhow::anyhow!("Failed to determine HOME directory"))?;
    Ok(home
        .join(".config")
        .join(DEFAULT_CONFIG_DIR)
        .join(DEFAULT_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config =
            Config::from_file(Path::new("/nonexistent/alfred-tmux.toml"))
                .unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.terminal, "auto");
        assert_eq!(config.refresh.keyword, "tm");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
terminal = "Ghostty"

[tmux]
session_root = "/srv/work"

[timing]
startup_timeout_ms = 5000
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.terminal, "Ghostty");
        assert_eq!(config.tmux.session_root, Some(PathBuf::from("/srv/work")));
        assert_eq!(config.tmux.path, None);
        assert_eq!(config.tmux.socket, None);
        assert_eq!(config.timing.startup_timeout_ms, 5000);
        assert_eq!(config.timing.iterm_window_delay_ms, 100);
        assert_eq!(config.session_root().unwrap(), PathBuf::from("/srv/work"));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "terminal = [").unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let vars: HashMap<&str, &str> =
            [("TMUX_TERMINAL", " iterm2 "), ("TMUX_REFRESH_KEYWORD", "")]
                .into_iter()
                .collect();

        let config = Config::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.terminal, "iterm2");
        assert_eq!(config.refresh.keyword, "");
    }

    #[test]
    fn blank_terminal_override_is_ignored() {
        let config = Config::default().with_overrides(|key| {
            (key == "TMUX_TERMINAL").then(|| "   ".to_string())
        });
        assert_eq!(config.terminal, "auto");
    }

    #[test]
    fn poll_interval_is_never_zero() {
        let timing = TimingConfig {
            poll_interval_ms: 0,
            ..TimingConfig::default()
        };
        assert_eq!(timing.poll_interval(), Duration::from_millis(1));
    }
}
