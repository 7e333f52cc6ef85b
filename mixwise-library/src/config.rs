//! Simple configuration persistence for Mixwise
//!
//! Stores user preferences like the default target style and model path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug)]
pub struct Config {
    /// Default target style for optimization ("balanced", "bright", ...)
    pub default_style: Option<String>,
    /// Preferred extractor ("full_fidelity" or "lightweight")
    pub extractor: Option<String>,
    /// Path to a trained model artifact
    pub model_path: Option<PathBuf>,
    /// Whether the feature cache is consulted
    pub cache_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_style: None,
            extractor: None,
            model_path: None,
            cache_enabled: true,
        }
    }
}

impl Config {
    /// Load config from the default location
    ///
    /// Returns default config if the file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let path = Self::config_path();
        Self::load_from(&path).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Save config to the default location
    pub fn save(&self) -> io::Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = self.serialize();
        fs::write(path, content)
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mixwise")
            .join("config.txt")
    }

    /// Get the default feature-cache database path
    pub fn cache_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mixwise")
            .join("features.db")
    }

    /// Parse config from simple key=value format
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                match key {
                    "default_style" => {
                        if !value.is_empty() {
                            config.default_style = Some(value.to_string());
                        }
                    }
                    "extractor" => {
                        if !value.is_empty() {
                            config.extractor = Some(value.to_string());
                        }
                    }
                    "model_path" => {
                        if !value.is_empty() {
                            config.model_path = Some(PathBuf::from(value));
                        }
                    }
                    "cache_enabled" => {
                        config.cache_enabled = value != "false" && value != "0";
                    }
                    _ => {} // Ignore unknown keys
                }
            }
        }

        config
    }

    /// Serialize config to key=value format
    fn serialize(&self) -> String {
        let mut out = String::from("# Mixwise configuration\n");
        if let Some(style) = &self.default_style {
            out.push_str(&format!("default_style={style}\n"));
        }
        if let Some(extractor) = &self.extractor {
            out.push_str(&format!("extractor={extractor}\n"));
        }
        if let Some(path) = &self.model_path {
            out.push_str(&format!("model_path={}\n", path.display()));
        }
        out.push_str(&format!("cache_enabled={}\n", self.cache_enabled));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");

        let config = Config {
            default_style: Some("warm".to_string()),
            extractor: Some("lightweight".to_string()),
            model_path: Some(PathBuf::from("/models/mix.json")),
            cache_enabled: false,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_style.as_deref(), Some("warm"));
        assert_eq!(loaded.extractor.as_deref(), Some("lightweight"));
        assert_eq!(loaded.model_path, Some(PathBuf::from("/models/mix.json")));
        assert!(!loaded.cache_enabled);
    }

    #[test]
    fn test_unknown_keys_and_comments_are_ignored() {
        let parsed = Config::parse("# comment\nmystery=42\ndefault_style=bright\n");
        assert_eq!(parsed.default_style.as_deref(), Some("bright"));
        assert!(parsed.cache_enabled);
    }

    #[test]
    fn test_missing_file_yields_default() {
        let loaded = Config::load_from(Path::new("/nonexistent/config.txt"));
        assert!(loaded.is_err());
        // Config::load falls back to defaults in that case
        let config = Config::default();
        assert!(config.cache_enabled);
        assert!(config.default_style.is_none());
    }
}
