use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// `"bundled"`, a path to a puzzles JSON file, or an http(s) URL.
    #[serde(default = "default_puzzle_source")]
    pub puzzle_source: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_share_title")]
    pub share_title: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_puzzle_source() -> String {
    "bundled".to_string()
}
fn default_theme() -> String {
    "midnight".to_string()
}
fn default_share_title() -> String {
    crate::session::game::DEFAULT_SHARE_TITLE.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            puzzle_source: default_puzzle_source(),
            theme: default_theme(),
            share_title: default_share_title(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the defaults out on first run so the file can be edited.
    /// Returns the path when a file was created.
    pub fn write_default_if_missing() -> Result<Option<PathBuf>> {
        let path = Self::config_path();
        Ok(write_default_at(&path)?.then_some(path))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dailyword")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// An existing file, readable or not, is left alone.
fn write_default_at(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    Config::default().save_to(path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.puzzle_source, "bundled");
        assert_eq!(config.theme, "midnight");
        assert_eq!(config.share_title, "Daily Word");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_config_partial_file_keeps_other_defaults() {
        let toml_str = r#"
puzzle_source = "https://example.com/puzzles.json"
share_title = "Preguntita"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.puzzle_source, "https://example.com/puzzles.json");
        assert_eq!(config.share_title, "Preguntita");
        assert_eq!(config.theme, "midnight");
    }

    #[test]
    fn test_default_file_written_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dailyword").join("config.toml");
        assert!(write_default_at(&path).unwrap());
        let config: Config = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.theme, "midnight");

        fs::write(&path, "theme = \"daylight\"").unwrap();
        assert!(!write_default_at(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "theme = \"daylight\"");
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.puzzle_source, deserialized.puzzle_source);
        assert_eq!(config.theme, deserialized.theme);
    }
}
