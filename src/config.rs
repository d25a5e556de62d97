use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const WEBFLOW_API_KEY: &str = "WEBFLOW_API_KEY";
pub const SANITY_PROJECT_ID: &str = "SANITY_PROJECT_ID";
pub const SANITY_DATASET: &str = "SANITY_DATASET";
pub const SANITY_TOKEN: &str = "SANITY_TOKEN";

/// Largest `limit` the Webflow v1 items endpoint honours.
pub const MAX_PAGE_SIZE: usize = 100;

/// Tunables read from an optional TOML file. Every field has a default.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub webflow: WebflowSettings,
    pub sanity: SanitySettings,
    pub mapping: MappingSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WebflowSettings {
    pub base_url: String,
    pub page_size: usize,
}

impl Default for WebflowSettings {
    fn default() -> Self {
        Self { base_url: "https://api.webflow.com".to_string(), page_size: 100 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SanitySettings {
    pub api_version: String,
    /// Overrides `https://<project>.api.sanity.io`.
    pub api_host: Option<String>,
}

impl Default for SanitySettings {
    fn default() -> Self {
        Self { api_version: "v2021-06-07".to_string(), api_host: None }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MappingSettings {
    pub document_type: String,
    pub id_prefix: String,
    pub file_content_type: String,
}

impl Default for MappingSettings {
    fn default() -> Self {
        Self {
            document_type: "exampleSchema".to_string(),
            id_prefix: "imported-".to_string(),
            file_content_type: "application/json".to_string(),
        }
    }
}

impl Settings {
    /// Load from `path`, or from the per-user config dir when `path` is None.
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config file: {}", path.display()))?;
        let settings: Settings = toml::from_str(&raw)
            .with_context(|| format!("parsing config file: {}", path.display()))?;
        if !(1..=MAX_PAGE_SIZE).contains(&settings.webflow.page_size) {
            anyhow::bail!(
                "webflow.page_size must be between 1 and {} ({})",
                MAX_PAGE_SIZE,
                path.display()
            );
        }
        Ok(settings)
    }
}

fn default_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("dev", "wf2sanity", "wf2sanity")?;
    Some(proj.config_dir().join("config.toml"))
}

/// The four secrets the run needs, all supplied through the environment.
#[derive(Clone)]
pub struct Credentials {
    pub webflow_api_key: String,
    pub sanity_project_id: String,
    pub sanity_dataset: String,
    pub sanity_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("sanity_project_id", &self.sanity_project_id)
            .field("sanity_dataset", &self.sanity_dataset)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .with_context(|| format!("environment variable {key} is not set"))
        };
        Ok(Self {
            webflow_api_key: get(WEBFLOW_API_KEY)?,
            sanity_project_id: get(SANITY_PROJECT_ID)?,
            sanity_dataset: get(SANITY_DATASET)?,
            sanity_token: get(SANITY_TOKEN)?,
        })
    }
}
