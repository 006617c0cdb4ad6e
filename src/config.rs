use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::BuildLensError;

/// Configuration file structure for buildlens.
///
/// Describes the Jenkins instance and, per product, the jobs whose build
/// history makes up that product's version view. Loaded once at startup and
/// passed into the aggregation entry points; nothing reads it ambiently.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub jenkins: JenkinsConfig,

    /// Product definitions, keyed by product name
    #[serde(default)]
    pub products: IndexMap<String, ProductConfig>,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JenkinsConfig {
    /// Jenkins base URL, used both for API requests and for deep links
    #[serde(default = "default_jenkins_url")]
    pub url: String,

    /// Separate API endpoint (e.g. an internal proxy); defaults to `url`
    pub api_url: Option<String>,

    /// API token for authenticated instances
    pub token: Option<String>,
}

impl JenkinsConfig {
    /// URL requests go to; deep links always use `url`.
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(&self.url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProductConfig {
    /// Cap on retained development versions per major.minor.patch line;
    /// 0 disables truncation
    #[serde(default)]
    pub max_dev_builds: usize,

    /// Jenkins jobs contributing builds to this product, keyed by job name
    pub jobs: IndexMap<String, JobConfig>,
}

/// How to pull a version string out of one job's build parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobConfig {
    /// Build parameter holding the version (e.g. `OCS_REGISTRY_IMAGE`)
    pub version_param: String,

    /// Regex whose first capture group is the version; when unset the value
    /// is split on `:` and the part after the first colon is taken
    /// (the "registry/image:TAG" convention)
    pub version_regex: Option<String>,

    /// Extracted values treated as "no version"
    #[serde(default = "default_version_exclude")]
    pub version_exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            url: default_jenkins_url(),
            api_url: None,
            token: None,
        }
    }
}

fn default_jenkins_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_version_exclude() -> Vec<String> {
    vec!["latest".to_string()]
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./buildlens.toml
    /// 3. ./buildlens.json
    /// 4. ./buildlens.yaml
    /// 5. ./buildlens.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "buildlens.toml",
            "buildlens.json",
            "buildlens.yaml",
            "buildlens.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Case-insensitive product lookup, returning the canonical name as
    /// spelled in the configuration.
    pub fn product(&self, name: &str) -> crate::error::Result<(&str, &ProductConfig)> {
        self.products
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(key, product)| (key.as_str(), product))
            .ok_or_else(|| BuildLensError::UnknownProduct(name.to_string()))
    }
}
