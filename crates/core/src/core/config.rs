use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::genome::DisplayMode;
use crate::protocol::{RESET_PATH, SAVE_PATH, STEP_PATH};

pub const DEFAULT_STEP_DELAY_MS: u64 = 800;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub step: String,
    pub save: String,
    pub reset: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            step: STEP_PATH.to_string(),
            save: SAVE_PATH.to_string(),
            reset: RESET_PATH.to_string(),
        }
    }
}

impl Endpoints {
    /// Joins each path onto `base` (e.g. `http://127.0.0.1:5000`).
    pub fn resolved(&self, base: &str) -> Endpoints {
        Endpoints {
            step: join_url(base, &self.step),
            save: join_url(base, &self.save),
            reset: join_url(base, &self.reset),
        }
    }
}

pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return path.to_string();
    }
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

/// Settings shared by every front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub step_delay_ms: u64,
    pub display_mode: DisplayMode,
    pub endpoints: Endpoints,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: DEFAULT_STEP_DELAY_MS,
            display_mode: DisplayMode::default(),
            endpoints: Endpoints::default(),
        }
    }
}

impl LoopConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_server_contract() {
        let cfg = LoopConfig::default();
        assert_eq!(cfg.step_delay(), Duration::from_millis(800));
        assert_eq!(cfg.endpoints.step, "/api/simulation/step");
        assert_eq!(cfg.display_mode, DisplayMode::Numeric);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: LoopConfig =
            serde_json::from_str(r#"{"display_mode": "genotype", "endpoints": {"save": "/x"}}"#)
                .unwrap();
        assert_eq!(cfg.step_delay_ms, 800);
        assert_eq!(cfg.display_mode, DisplayMode::Genotype);
        assert_eq!(cfg.endpoints.save, "/x");
        assert_eq!(cfg.endpoints.reset, "/api/simulation/reset");
    }

    #[test]
    fn endpoints_resolve_against_base() {
        let e = Endpoints::default().resolved("http://127.0.0.1:5000/");
        assert_eq!(e.step, "http://127.0.0.1:5000/api/simulation/step");
        assert_eq!(join_url("", "/api/x"), "/api/x");
    }
}
