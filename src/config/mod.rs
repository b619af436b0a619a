//! Configuration loading and types for harmonique.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files and the environment (`load`)

mod load;
mod types;

use std::path::{Path, PathBuf};

pub use load::CONFIG_FILE_NAME;
pub use types::{
    BuildConfig, DevConfig, LinkConfig, MarkdownConfig, OutputScheme, PathsConfig, ServerConfig,
    SiteConfig, SiteMeta, ThemeConfig, WatchConfig,
};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Deserialize(#[from] ::config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("{0}")]
    Validation(String),
}

// =============================================================================
// Resolved config
// =============================================================================

/// A loaded config together with the directory its relative paths resolve against.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SiteConfig,
    /// Directory of the config file (or the working directory)
    pub base_path: PathBuf,
    /// The config file path, whether or not it exists
    pub config_path: PathBuf,
}

impl LoadedConfig {
    /// Absolute source root.
    pub fn source_dir(&self) -> PathBuf {
        resolve(&self.base_path, &self.config.paths.source)
    }

    /// Absolute destination root.
    pub fn output_dir(&self) -> PathBuf {
        resolve(&self.base_path, &self.config.paths.output)
    }

    /// Absolute theme directory.
    pub fn theme_dir(&self) -> PathBuf {
        resolve(&self.base_path, &self.config.theme.path)
    }
}

fn resolve(base_path: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base_path.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Check the invariants serde cannot express.
pub(crate) fn validate(config: &SiteConfig) -> Result<(), ConfigError> {
    let template = &config.links.interlink_url_template;
    if !template.contains("{path}") {
        return Err(ConfigError::Validation(format!(
            "invalid config: links.interlink_url_template must contain '{{path}}' (got '{template}')"
        )));
    }
    if !config.links.base_path.starts_with('/') && !config.links.base_path.contains("://") {
        return Err(ConfigError::Validation(format!(
            "invalid config: links.base_path must start with '/' or be an absolute URL (got '{}')",
            config.links.base_path
        )));
    }
    if config.paths.source == config.paths.output {
        return Err(ConfigError::Validation(
            "invalid config: paths.source and paths.output must differ".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&SiteConfig::default()).is_ok());
    }

    #[test]
    fn test_template_without_path_is_rejected() {
        let mut config = SiteConfig::default();
        config.links.interlink_url_template = "/posts/".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("interlink_url_template"));
    }

    #[test]
    fn test_same_source_and_output_is_rejected() {
        let mut config = SiteConfig::default();
        config.paths.output = config.paths.source.clone();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_loaded_config_resolves_relative_paths() {
        let loaded = LoadedConfig {
            config: SiteConfig::default(),
            base_path: PathBuf::from("/project"),
            config_path: PathBuf::from("/project/harmonique.yaml"),
        };
        assert_eq!(loaded.source_dir(), PathBuf::from("/project/source"));
        assert_eq!(loaded.output_dir(), PathBuf::from("/project/output"));
        assert_eq!(loaded.theme_dir(), PathBuf::from("/project/theme"));
    }
}
