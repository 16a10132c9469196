//! Configuration for libseed.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (LIBSEED_HOME, LIBSEED_DB)
//! 2. Config file (.libseed/config.yaml)
//! 3. Defaults (~/.libseed)
//!
//! Config file discovery:
//! - Searches current directory and parents for .libseed/config.yaml
//! - Paths in config file are relative to the .libseed/ directory
//!
//! The `generate` section of the config file holds the default
//! [`GenerateConfig`]; a plan file passed on the command line replaces it.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::linker::fan_out;
use crate::domain::{is_valid_slug, ComponentType, ContainerType};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub generate: Option<GenerateConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .libseed/)
    pub home: Option<String>,
    /// SQLite database file (relative to .libseed/)
    pub database: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to libseed home
    pub home: PathBuf,
    /// Path to the SQLite database
    pub database: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Default generation plan
    pub generate: GenerateConfig,
}

/// Plan validation failures, raised before any side effect
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} '{value}' may only contain letters, digits, '_', '-' and '.'")]
    InvalidSlug { field: &'static str, value: String },

    #[error("link rate for {tier} must be a finite, non-negative number (got {rate})")]
    InvalidLinkRate { tier: &'static str, rate: f64 },

    #[error("components requested but no component types configured")]
    NoComponentTypes,

    #[error("each {child} must be linked under {fan_out} {parent}(s), but no {parent}s are created")]
    NoParents {
        child: &'static str,
        parent: &'static str,
        fan_out: usize,
    },
}

/// Count and link rate for one child tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Number of entities to create
    pub count: usize,

    /// Fraction of `count` giving how many parents each entity is linked under
    #[serde(default = "default_link_rate")]
    pub link_rate: f64,
}

impl TierConfig {
    pub fn new(count: usize, link_rate: f64) -> Self {
        Self { count, link_rate }
    }

    /// Number of parent draws per entity of this tier
    pub fn fan_out(&self) -> usize {
        fan_out(self.count, self.link_rate)
    }
}

impl Default for TierConfig {
    fn default() -> Self {
        Self::new(30, default_link_rate())
    }
}

/// Parameters of one synthetic library generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Email of the user the authoring calls act as
    #[serde(default = "default_user_email")]
    pub user_email: String,

    /// Organization owning the library (also used as its short name)
    #[serde(default = "default_org_name")]
    pub org_name: String,

    #[serde(default = "default_library_slug")]
    pub library_slug: String,

    #[serde(default = "default_library_title")]
    pub library_title: String,

    /// Number of sections (top tier, never linked under anything)
    #[serde(default = "default_section_count")]
    pub sections: usize,

    #[serde(default)]
    pub subsections: TierConfig,

    #[serde(default)]
    pub units: TierConfig,

    #[serde(default)]
    pub components: TierConfig,

    /// Block types components are drawn from
    #[serde(default = "default_component_types")]
    pub component_types: Vec<ComponentType>,

    /// Seed for the random source; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_user_email() -> String {
    "edx@example.com".to_string()
}
fn default_org_name() -> String {
    "SampleLibraryOrg".to_string()
}
fn default_library_slug() -> String {
    "sample_large_library_1".to_string()
}
fn default_library_title() -> String {
    "Sample Large library 1".to_string()
}
fn default_section_count() -> usize {
    50
}
fn default_link_rate() -> f64 {
    0.5
}
fn default_component_types() -> Vec<ComponentType> {
    ComponentType::ALL.to_vec()
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            user_email: default_user_email(),
            org_name: default_org_name(),
            library_slug: default_library_slug(),
            library_title: default_library_title(),
            sections: default_section_count(),
            subsections: TierConfig::default(),
            units: TierConfig::default(),
            components: TierConfig::default(),
            component_types: default_component_types(),
            seed: None,
        }
    }
}

impl GenerateConfig {
    /// Load a plan from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file: {}", path.display()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse plan file: {}", path.display()))
    }

    /// Check names, rates and tier sizes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_email.trim().is_empty() {
            return Err(ConfigError::EmptyField { field: "user_email" });
        }
        if self.library_title.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                field: "library_title",
            });
        }
        for (field, value) in [
            ("org_name", &self.org_name),
            ("library_slug", &self.library_slug),
        ] {
            if value.is_empty() {
                return Err(ConfigError::EmptyField { field });
            }
            if !is_valid_slug(value) {
                return Err(ConfigError::InvalidSlug {
                    field,
                    value: value.clone(),
                });
            }
        }

        let links = [
            ("subsection", ContainerType::Section.as_str(), &self.subsections, self.sections),
            ("unit", ContainerType::Subsection.as_str(), &self.units, self.subsections.count),
            ("component", ContainerType::Unit.as_str(), &self.components, self.units.count),
        ];
        for (child, parent, tier, parent_count) in links {
            if !tier.link_rate.is_finite() || tier.link_rate < 0.0 {
                return Err(ConfigError::InvalidLinkRate {
                    tier: child,
                    rate: tier.link_rate,
                });
            }
            let fan_out = tier.fan_out();
            if tier.count > 0 && fan_out > 0 && parent_count == 0 {
                return Err(ConfigError::NoParents {
                    child,
                    parent,
                    fan_out,
                });
            }
        }

        if self.components.count > 0 && self.component_types.is_empty() {
            return Err(ConfigError::NoComponentTypes);
        }

        Ok(())
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".libseed").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".libseed");

    let config_file = find_config_file();
    let parsed = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    // Paths in the config file are relative to .libseed/
    let config_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."));

    let home = if let Ok(env_home) = std::env::var("LIBSEED_HOME") {
        PathBuf::from(env_home)
    } else if let Some(home_path) = parsed.as_ref().and_then(|c| c.paths.home.as_deref()) {
        resolve_path(config_dir, home_path)
    } else {
        default_home
    };

    let database = if let Ok(env_db) = std::env::var("LIBSEED_DB") {
        PathBuf::from(env_db)
    } else if let Some(db_path) = parsed.as_ref().and_then(|c| c.paths.database.as_deref()) {
        resolve_path(config_dir, db_path)
    } else {
        home.join("libseed.db")
    };

    let generate = parsed.and_then(|c| c.generate).unwrap_or_default();

    Ok(ResolvedConfig {
        home,
        database,
        config_file,
        generate,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
