use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub repositories: Vec<RepositoryRef>,
    pub rss: FeedMeta,
    pub github: GitHubConfig,
}

/// A monitored repository as listed in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl RepositoryRef {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedMeta {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub link: String,
    pub author: AuthorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorConfig {
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    pub max_prs: u32,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_web_url")]
    pub web_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_web_url() -> String {
    "https://github.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl GitHubConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Reads and validates the YAML config at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.repositories.is_empty() {
            return Err(ConfigError::Invalid("no repositories configured".into()));
        }
        if self.github.max_prs == 0 {
            return Err(ConfigError::Invalid(
                "github.max_prs must be a positive integer".into(),
            ));
        }
        if self.github.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "github.request_timeout_secs must be a positive integer".into(),
            ));
        }
        for (field, value) in [
            ("rss.link", &self.rss.link),
            ("github.api_url", &self.github.api_url),
            ("github.web_url", &self.github.web_url),
        ] {
            Url::parse(value)
                .map_err(|e| ConfigError::Invalid(format!("{field} is not a valid URL: {e}")))?;
        }
        for repo in &self.repositories {
            check_path_segment("owner", &repo.owner)?;
            check_path_segment("name", &repo.name)?;
        }
        Ok(())
    }
}

// owner and name are spliced into API paths and output filenames
fn check_path_segment(field: &str, value: &str) -> Result<(), ConfigError> {
    let valid = !value.is_empty()
        && value != "."
        && value != ".."
        && !value
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '?' || c == '#' || c.is_whitespace());
    if valid {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "repository {field} {value:?} is not a valid path segment"
        )))
    }
}
