//! Cross-platform application paths

use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self, String> {
        let base = dirs::config_dir().ok_or("Could not determine config directory")?;
        Ok(Self::at(base.join("phylogen")))
    }

    pub fn at(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Creates the config directory so a default config can be written there.
    pub fn ensure(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("client.json")
    }

    /// Layout used when none is configured.
    pub fn layout_file(&self) -> PathBuf {
        self.config_dir.join("layout.json")
    }
}
