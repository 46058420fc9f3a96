//! Client configuration: a JSON file plus `PHYLOGEN_*` environment overrides.

use std::fs;
use std::path::{Path, PathBuf};

use phylogen::config::LoopConfig;
use phylogen::genome::DisplayMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::paths::AppPaths;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
/// Points at a config file outside the config directory.
pub const CONFIG_ENV: &str = "PHYLOGEN_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    /// Falls back to [`AppPaths::layout_file`].
    pub layout_file: Option<PathBuf>,
    /// Cycles to run before exiting. `0` runs until Ctrl-C.
    pub cycles: u32,
    pub reset_on_start: bool,
    pub request_timeout_ms: u64,
    #[serde(rename = "loop")]
    pub polling: LoopConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            layout_file: None,
            cycles: 1,
            reset_on_start: true,
            request_timeout_ms: 30_000,
            polling: LoopConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Reads `PHYLOGEN_CONFIG` or the default config file, then applies
    /// environment overrides. A missing file yields the defaults.
    pub fn load(paths: &AppPaths) -> Result<Self, ConfigError> {
        Self::load_with(paths, |key| std::env::var(key).ok())
    }

    pub fn load_with(
        paths: &AppPaths,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| paths.config_file());
        let mut cfg = if file.exists() {
            Self::read(&file)?
        } else {
            info!("No config at {}; using defaults", file.display());
            Self::default()
        };
        cfg.apply_overrides(var);
        Ok(cfg)
    }

    /// The default config file to create on first run, unless it exists or
    /// `PHYLOGEN_CONFIG` points somewhere else.
    pub fn first_run_file(
        paths: &AppPaths,
        var: impl Fn(&str) -> Option<String>,
    ) -> Option<PathBuf> {
        if var(CONFIG_ENV).is_some() {
            return None;
        }
        let file = paths.config_file();
        (!file.exists()).then_some(file)
    }

    pub fn read(file: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(file).map_err(|source| ConfigError::Read {
            path: file.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: file.to_path_buf(),
            source,
        })
    }

    pub fn write(&self, file: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: file.to_path_buf(),
            source,
        })?;
        fs::write(file, text).map_err(|source| ConfigError::Write {
            path: file.to_path_buf(),
            source,
        })
    }

    /// Unparseable values are reported and ignored.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("PHYLOGEN_SERVER_URL") {
            self.server_url = v.trim().to_string();
        }
        if let Some(v) = var("PHYLOGEN_LAYOUT") {
            self.layout_file = Some(PathBuf::from(v.trim()));
        }
        if let Some(v) = var("PHYLOGEN_CYCLES") {
            match v.trim().parse() {
                Ok(n) => self.cycles = n,
                Err(_) => warn!("Unknown PHYLOGEN_CYCLES value: {}", v),
            }
        }
        if let Some(v) = var("PHYLOGEN_GENOME_MODE") {
            match DisplayMode::parse(&v) {
                Some(mode) => self.polling.display_mode = mode,
                None => warn!("Unknown PHYLOGEN_GENOME_MODE value: {}", v),
            }
        }
        if let Some(v) = var("PHYLOGEN_STEP_DELAY_MS") {
            match v.trim().parse() {
                Ok(ms) => self.polling.step_delay_ms = ms,
                Err(_) => warn!("Unknown PHYLOGEN_STEP_DELAY_MS value: {}", v),
            }
        }
    }

    pub fn layout_path(&self, paths: &AppPaths) -> PathBuf {
        self.layout_file
            .clone()
            .unwrap_or_else(|| paths.layout_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: ClientConfig =
            serde_json::from_str(r#"{"cycles": 3, "loop": {"display_mode": "genotype"}}"#).unwrap();
        assert_eq!(cfg.cycles, 3);
        assert_eq!(cfg.server_url, DEFAULT_SERVER_URL);
        assert_eq!(cfg.polling.display_mode, DisplayMode::Genotype);
        assert_eq!(cfg.polling.step_delay_ms, 800);
        assert!(cfg.reset_on_start);
    }

    #[test]
    fn env_overrides_win() {
        let vars = env(&[
            ("PHYLOGEN_SERVER_URL", "http://sim.local:8080/ "),
            ("PHYLOGEN_CYCLES", "0"),
            ("PHYLOGEN_GENOME_MODE", "letters"),
            ("PHYLOGEN_STEP_DELAY_MS", "250"),
        ]);
        let mut cfg = ClientConfig::default();
        cfg.apply_overrides(|k| vars.get(k).cloned());
        assert_eq!(cfg.server_url, "http://sim.local:8080/");
        assert_eq!(cfg.cycles, 0);
        assert_eq!(cfg.polling.display_mode, DisplayMode::Genotype);
        assert_eq!(cfg.polling.step_delay_ms, 250);
    }

    #[test]
    fn bad_env_values_are_ignored() {
        let vars = env(&[("PHYLOGEN_CYCLES", "many"), ("PHYLOGEN_GENOME_MODE", "hex")]);
        let mut cfg = ClientConfig::default();
        cfg.apply_overrides(|k| vars.get(k).cloned());
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ClientConfig::read(Path::new("/nonexistent/phylogen/client.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn first_run_writes_only_the_default_location() {
        let paths = AppPaths::at(PathBuf::from("/nonexistent/phylogen"));
        assert_eq!(
            ClientConfig::first_run_file(&paths, |_| None),
            Some(PathBuf::from("/nonexistent/phylogen/client.json"))
        );
        let vars = env(&[(CONFIG_ENV, "/etc/phylogen/ocean.json")]);
        assert_eq!(ClientConfig::first_run_file(&paths, |k| vars.get(k).cloned()), None);
    }

    #[test]
    fn config_env_with_missing_file_uses_defaults() {
        let paths = AppPaths::at(PathBuf::from("/nonexistent/phylogen"));
        let vars = env(&[(CONFIG_ENV, "/nonexistent/ocean.json"), ("PHYLOGEN_CYCLES", "4")]);
        let cfg = ClientConfig::load_with(&paths, |k| vars.get(k).cloned()).unwrap();
        assert_eq!(cfg.cycles, 4);
        assert_eq!(cfg.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn layout_defaults_to_config_dir() {
        let paths = AppPaths::at(PathBuf::from("/tmp/phylogen"));
        let mut cfg = ClientConfig::default();
        assert_eq!(cfg.layout_path(&paths), PathBuf::from("/tmp/phylogen/layout.json"));
        cfg.layout_file = Some(PathBuf::from("ocean.json"));
        assert_eq!(cfg.layout_path(&paths), PathBuf::from("ocean.json"));
    }
}
