//! Configuration parsing and management.

use crate::service::{MemoryService, ServiceResult};
use crate::workspace::Workspace;
use pressroom_types::{Site, SiteMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unknown site mode '{mode}' for site '{site}'")]
    InvalidMode { site: String, mode: String },

    #[error("Site '{0}' is listed more than once")]
    DuplicateSite(String),
}

/// Main configuration struct matching the pressroom.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,

    #[serde(default)]
    pub sites: Vec<SiteConfig>,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_workspace() -> PathBuf {
    PathBuf::from("workspace")
}

fn default_mode() -> String {
    SiteMode::default().as_str().to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub slug: String,

    #[serde(default)]
    pub name: String,

    #[serde(default = "default_mode")]
    pub mode: String,

    #[serde(default = "default_true")]
    pub active: bool,

    /// Import root the site is built from
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Raw site settings, e.g. `repo.url` or `publish.interval`
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

impl SiteConfig {
    pub fn site_mode(&self) -> Result<SiteMode, ConfigError> {
        SiteMode::from_str(&self.mode).ok_or_else(|| ConfigError::InvalidMode {
            site: self.slug.clone(),
            mode: self.mode.clone(),
        })
    }

    pub fn to_site(&self) -> Result<Site, ConfigError> {
        Ok(Site {
            slug: self.slug.clone(),
            name: if self.name.is_empty() {
                self.slug.clone()
            } else {
                self.name.clone()
            },
            mode: self.site_mode()?,
            active: self.active,
            ..Default::default()
        })
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for site in &self.sites {
            if site.slug.trim().is_empty() {
                return Err(ConfigError::MissingField("sites[].slug".into()));
            }
            if !seen.insert(site.slug.as_str()) {
                return Err(ConfigError::DuplicateSite(site.slug.clone()));
            }
            site.site_mode()?;
        }
        Ok(())
    }

    /// Get the workspace, resolved relative to config file
    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.resolve_path(&self.workspace))
    }

    pub fn site(&self, slug: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.slug == slug)
    }

    /// Import root of a site, resolved relative to config file
    pub fn source_dir(&self, site: &SiteConfig) -> Option<PathBuf> {
        site.source.as_ref().map(|p| self.resolve_path(p))
    }

    /// Register every configured site and its settings with `service`
    pub fn seed(&self, service: &MemoryService) -> ServiceResult<Vec<Site>> {
        let mut sites = Vec::with_capacity(self.sites.len());
        for site_config in &self.sites {
            // Modes were checked when the config was loaded
            let site = match site_config.to_site() {
                Ok(site) => site,
                Err(e) => {
                    tracing::warn!(site = %site_config.slug, error = %e, "skipping site");
                    continue;
                }
            };
            let site = service.insert_site(site)?;
            for (name, value) in &site_config.settings {
                service.set_setting(site.id, name, value)?;
            }
            sites.push(site);
        }
        Ok(sites)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }
}
