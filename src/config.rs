use std::{
    collections::BTreeMap,
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fingerprint::FingerprintAlgorithm;

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(s) = path.to_str() {
        if let Some(stripped) = s.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if s == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

/// Defaults for image-rebuild, read from an optional YAML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RebuildConfig {
    /// Tags used when `-t` is not given
    #[serde(default = "defaults::default_tags")]
    pub default_tags: Vec<String>,
    /// Directory holding base-image records (default: working directory)
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    /// Engine executable used when none is selected on the command line
    #[serde(default)]
    pub engine: Option<PathBuf>,
    /// Hash for the build-file fingerprint
    #[serde(default)]
    pub fingerprint_algorithm: FingerprintAlgorithm,
    /// Extra labels added to every build
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl RebuildConfig {
    /// Load configuration from the config file (if any) and environment variables
    pub fn load() -> Result<Self> {
        Self::load_with_env(|name| env::var(name).ok())
    }

    /// Same as [`load`](Self::load), with variables read through `var`
    fn load_with_env(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config_path = Self::config_file_path(&var)?;
        tracing::debug!("loading image-rebuild config from {:?}", config_path);
        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::with_defaults()
        };

        if let Some(path) = var("IMAGE_REBUILD_STATE_DIR") {
            config.state_dir = Some(expand_tilde(&PathBuf::from(path)));
        }

        if let Some(path) = var("IMAGE_REBUILD_ENGINE") {
            config.engine = Some(expand_tilde(&PathBuf::from(path)));
        }

        Ok(config)
    }

    /// Built-in defaults, as if the config file were empty
    pub fn with_defaults() -> Self {
        Self {
            default_tags: defaults::default_tags(),
            ..Self::default()
        }
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        // An empty file is valid and means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::with_defaults());
        }

        let mut config: RebuildConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.state_dir = config.state_dir.as_deref().map(expand_tilde);
        config.engine = config.engine.as_deref().map(expand_tilde);

        Ok(config)
    }

    /// Get the config file path: `$IMAGE_REBUILD_CONFIG` or
    /// `~/.config/image-rebuild/config.yaml`
    fn config_file_path(var: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
        if let Some(path) = var("IMAGE_REBUILD_CONFIG") {
            return Ok(expand_tilde(&PathBuf::from(path)));
        }
        dirs::home_dir()
            .map(|home| home.join(".config/image-rebuild/config.yaml"))
            .context("Could not determine home directory for config file")
    }
}

mod defaults {
    pub(crate) fn default_tags() -> Vec<String> {
        vec!["latest".to_string()]
    }
}
