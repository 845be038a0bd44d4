use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::github::{Endpoint, DEFAULT_API_URL, DEFAULT_USER_AGENT};

/// File looked up in the current directory by [`Config::load`].
pub const CONFIG_FILE: &str = ".pr-review-tools.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-review-tools.toml.
///
/// Only the command-line front end reads this; library callers pass the
/// endpoint and token themselves. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,

    /// REST API root, e.g. https://ghe.example.com/api/v3 for GitHub Enterprise.
    pub api_url: Option<String>,

    pub user_agent: Option<String>,
}

impl Config {
    /// Load configuration from .pr-review-tools.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|token| !token.is_empty())
    }

    /// API endpoint described by the `[github]` table.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(
            self.github
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        )
        .with_user_agent(
            self.github
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github.token.is_none());
        assert_eq!(config.endpoint(), Endpoint::default());
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[github]
token = "ghp_example"
api_url = "https://ghe.example.com/api/v3"
user_agent = "review-bot"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.github_token().as_deref(), Some("ghp_example"));

        let endpoint = config.endpoint();
        assert_eq!(endpoint.api_url(), "https://ghe.example.com/api/v3");
        assert_eq!(endpoint.user_agent(), "review-bot");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[github]\napi_url = \"http://127.0.0.1:9999\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.endpoint().api_url(), "http://127.0.0.1:9999");
        assert_eq!(config.endpoint().user_agent(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_load_from_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[github\ntoken = ").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = Config::load_from(Path::new("/nonexistent/.pr-review-tools.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(_)));
    }
}
