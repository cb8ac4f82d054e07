//! Configuration module for gitpix

use anyhow::{Context, Result};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::api::github::DEFAULT_API_BASE;
use crate::cache::DEFAULT_CAPACITY;
use crate::error::Error;
use crate::index::{
    DEFAULT_EXTENSIONS, DEFAULT_MAX_ENTRIES, DEFAULT_PATH_PREFIX, DEFAULT_WINDOW, ImageFilter,
    IndexBuilder,
};
use crate::links::LinkResolver;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Target repository (`owner/name`)
    #[serde(default)]
    pub repository: String,

    /// Base URL used for image links instead of raw.githubusercontent.com
    #[serde(default)]
    pub custom_url: Option<String>,

    /// Branch used for raw links and uploads
    #[serde(default = "default_branch")]
    pub branch: String,

    /// GitHub API endpoint
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Number of recent commits scanned per refresh
    #[serde(default = "default_recency_window")]
    pub recency_window: usize,

    /// Number of images listed
    #[serde(default = "default_max_images")]
    pub max_images: usize,

    /// Number of commit details kept in the cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Directory images live under
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,

    /// File extensions treated as images
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Refresh interval for `gitpix watch`, in seconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

const fn default_recency_window() -> usize {
    DEFAULT_WINDOW
}

const fn default_max_images() -> usize {
    DEFAULT_MAX_ENTRIES
}

const fn default_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_path_prefix() -> String {
    DEFAULT_PATH_PREFIX.to_string()
}

fn default_allowed_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect()
}

const fn default_refresh_interval() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: String::new(),
            custom_url: None,
            branch: default_branch(),
            api_base: default_api_base(),
            recency_window: default_recency_window(),
            max_images: default_max_images(),
            cache_capacity: default_cache_capacity(),
            path_prefix: default_path_prefix(),
            allowed_extensions: default_allowed_extensions(),
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        crate::paths::config_path()
    }

    /// Load config from the default path or create default
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Check the values the core depends on
    pub fn validate(&self) -> Result<(), Error> {
        let repo_pattern = Regex::new(r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$")
            .map_err(|e| Error::Configuration(e.to_string()))?;

        if self.repository.is_empty() {
            return Err(Error::Configuration(
                "no repository configured (run: gitpix config set repository owner/name)"
                    .to_string(),
            ));
        }
        if !repo_pattern.is_match(&self.repository) {
            return Err(Error::Configuration(format!(
                "repository must look like owner/name, got '{}'",
                self.repository
            )));
        }
        if self.cache_capacity == 0 {
            return Err(Error::Configuration(
                "cache_capacity must be a positive integer".to_string(),
            ));
        }
        if self.recency_window == 0 || self.max_images == 0 {
            return Err(Error::Configuration(
                "recency_window and max_images must be positive".to_string(),
            ));
        }
        if self.branch.trim().is_empty() {
            return Err(Error::Configuration("branch must not be empty".to_string()));
        }

        Ok(())
    }

    /// Link resolver for the configured repository
    pub fn link_resolver(&self) -> LinkResolver {
        LinkResolver::new(&self.repository, &self.branch, self.custom_url.as_deref())
    }

    /// Image filter for the configured prefix and extensions
    pub fn image_filter(&self) -> ImageFilter {
        ImageFilter::new(&self.path_prefix, &self.allowed_extensions)
    }

    /// Index builder for this configuration
    pub fn index_builder(&self) -> IndexBuilder {
        IndexBuilder::new(self.link_resolver())
            .window(self.recency_window)
            .max_entries(self.max_images)
            .filter(self.image_filter())
    }

    /// Update a single setting from its string form
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        let value = value.trim();
        match key {
            "repository" | "repo" => self.repository = value.to_string(),
            "custom_url" | "url" => {
                self.custom_url = (!value.is_empty()).then(|| value.to_string());
            }
            "branch" => self.branch = value.to_string(),
            "api_base" => self.api_base = value.to_string(),
            "recency_window" => self.recency_window = parse_count(key, value)?,
            "max_images" => self.max_images = parse_count(key, value)?,
            "cache_capacity" => self.cache_capacity = parse_count(key, value)?,
            "path_prefix" => self.path_prefix = value.to_string(),
            "allowed_extensions" => {
                self.allowed_extensions = value
                    .split(',')
                    .map(|ext| ext.trim().to_string())
                    .filter(|ext| !ext.is_empty())
                    .collect();
            }
            "refresh_interval_secs" => {
                self.refresh_interval_secs = value.parse().map_err(|_| {
                    Error::Configuration(format!("{key} must be a number of seconds"))
                })?;
            }
            other => {
                return Err(Error::Configuration(format!("unknown setting: {other}")));
            }
        }
        Ok(())
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize, Error> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::Configuration(format!(
            "{key} must be a positive integer, got '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn configured() -> Config {
        Config {
            repository: "me/pics".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.recency_window, 20);
        assert_eq!(config.max_images, 20);
        assert_eq!(config.cache_capacity, 50);
        assert_eq!(config.path_prefix, "img/");
        assert_eq!(config.branch, "main");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(r#"repository = "me/pics""#).unwrap();
        assert_eq!(config.repository, "me/pics");
        assert_eq!(config.allowed_extensions.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = configured();
        config.custom_url = Some("https://cdn.example.com".to_string());
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate() {
        assert!(matches!(Config::default().validate(), Err(Error::Configuration(_))));

        let mut config = configured();
        assert!(config.validate().is_ok());

        config.repository = "not a repo".to_string();
        assert!(config.validate().is_err());

        let mut config = configured();
        config.cache_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_set() {
        let mut config = configured();
        config.set("repo", "you/shots").unwrap();
        config.set("custom_url", "https://cdn.example.com").unwrap();
        config.set("allowed_extensions", "png, svg").unwrap();
        config.set("max_images", "5").unwrap();

        assert_eq!(config.repository, "you/shots");
        assert_eq!(config.custom_url.as_deref(), Some("https://cdn.example.com"));
        assert_eq!(config.allowed_extensions, vec!["png", "svg"]);
        assert_eq!(config.max_images, 5);

        config.set("custom_url", "").unwrap();
        assert_eq!(config.custom_url, None);

        assert!(config.set("cache_capacity", "-3").is_err());
        assert!(config.set("cache_capacity", "0").is_err());
        assert!(config.set("colour", "blue").is_err());
    }

    #[test]
    fn test_link_resolver_uses_custom_url() {
        let mut config = configured();
        config.custom_url = Some("https://cdn.example.com/".to_string());
        assert_eq!(
            config.link_resolver().url_for("img/a.png"),
            "https://cdn.example.com/img/a.png"
        );
    }
}
