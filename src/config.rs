use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub docs_url: String,
    pub bot_name: String,
    pub greeting: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            docs_url: "http://localhost:5000/docs".to_string(),
            bot_name: "Service Desk Assistant".to_string(),
            greeting: None,
        }
    }

    /// The greeting shown as the first transcript entry.
    pub fn greeting_text(&self) -> String {
        self.greeting.clone().unwrap_or_else(|| {
            format!("Hello! I'm the {}. How can I help you today?", self.bot_name)
        })
    }

    /// Load the config, writing the defaults to disk on first run so the
    /// file is there to edit.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            let config = Self::new();
            config.save_to(&path)?;
            return Ok(config);
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("deskchat").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.bot_name, "Service Desk Assistant");
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::new();
        config.base_url = "http://example.test:8080".to_string();
        config.greeting = Some("Welcome back".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.base_url, "http://example.test:8080");
        assert_eq!(loaded.greeting_text(), "Welcome back");
    }

    #[test]
    fn default_greeting_names_the_bot() {
        let config = Config::new();
        assert!(config.greeting_text().contains("Service Desk Assistant"));
    }
}
