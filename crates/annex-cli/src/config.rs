//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for annex
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model to request
    pub model: Option<String>,
    /// API base URL
    pub base_url: Option<String>,
    /// System prompt sent with every request
    pub system_prompt: Option<String>,
    /// Whether to stream replies token by token
    pub stream: Option<bool>,
    /// API key (alternative to the XAI_API_KEY environment variable)
    pub api_key: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("annex")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for ANNEX_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("ANNEX_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            model: Some(annex_ai::DEFAULT_MODEL.to_string()),
            base_url: Some(annex_ai::DEFAULT_BASE_URL.to_string()),
            system_prompt: None,
            stream: Some(true),
            api_key: None,
        };

        default_config.save()?;
        Ok(path)
    }

    /// Get the API key, checking config then the XAI_API_KEY env var
    pub fn api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            let key = key.trim();
            if !key.is_empty() {
                return Some(key.to_string());
            }
        }

        std::env::var("XAI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# annex configuration file
# Place at ~/.config/annex/config.toml (Linux/Mac) or %APPDATA%\annex\config.toml (Windows)

# Model to request
model = "grok-3"

# API base URL
base_url = "https://api.x.ai/v1"

# System prompt sent with every request (optional)
# system_prompt = "You are Grok."

# Stream replies token by token (true by default)
stream = true

# API key (optional - the XAI_API_KEY environment variable is
# recommended instead for security)
# api_key = "xai-..."
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(example_config()).unwrap();
        assert_eq!(config.model.as_deref(), Some("grok-3"));
        assert_eq!(config.stream, Some(true));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_unknown_fields_ignored_by_default() {
        let config: Config = toml::from_str("model = \"grok-3\"").unwrap();
        assert_eq!(config.model.as_deref(), Some("grok-3"));
        assert!(config.base_url.is_none());
    }
}
