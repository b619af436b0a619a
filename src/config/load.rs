//! Configuration loading from files.
//!
//! The YAML file is optional; environment variables prefixed with
//! `HARMONIQUE_` override individual keys (`HARMONIQUE_SERVER__PORT=9000`).

use std::path::{Path, PathBuf};

use super::{ConfigError, LoadedConfig, SiteConfig, validate};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "harmonique.yaml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "HARMONIQUE";

impl SiteConfig {
    /// Load the config from the command line argument, defaulting to `harmonique.yaml`
    pub fn load_from_arg(config_file: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        let config_file = config_file.unwrap_or(Path::new(CONFIG_FILE_NAME));
        let config_file = if config_file.is_relative() {
            std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file)
        } else {
            config_file.to_path_buf()
        };

        let config = Self::load_from_file(&config_file)?;
        Ok(LoadedConfig {
            config,
            base_path: base_path_from_config(&config_file),
            config_path: config_file,
        })
    }

    /// Load the config from a file path. A missing file yields the defaults.
    pub(crate) fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
        }

        let settings = ::config::Config::builder()
            .add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: SiteConfig = settings.try_deserialize()?;
        validate(&config)?;
        Ok(config)
    }
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputScheme;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::load_from_file(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.paths.source, PathBuf::from("source"));
        assert_eq!(config.paths.output, PathBuf::from("output"));
        assert_eq!(config.server.port, 8888);
        assert_eq!(config.links.output_scheme, OutputScheme::Pretty);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "site:\n  title: Notes\n  url: https://notes.example/\nlinks:\n  output_scheme: flat\nbuild:\n  minify: true\n",
        )
        .unwrap();

        let config = SiteConfig::load_from_file(&path).unwrap();
        assert_eq!(config.site.title, "Notes");
        assert_eq!(config.site.url, "https://notes.example/");
        assert_eq!(config.links.output_scheme, OutputScheme::Flat);
        assert!(config.build.minify);
        // Untouched sections keep their defaults
        assert_eq!(config.links.base_path, "/");
        assert!(config.dev.live_reload);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "site: [unterminated\n").unwrap();
        assert!(SiteConfig::load_from_file(&path).is_err());
    }

    #[test]
    fn test_load_from_arg_sets_base_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "paths:\n  output: public\n").unwrap();

        let loaded = SiteConfig::load_from_arg(Some(&path)).unwrap();
        assert_eq!(loaded.base_path, dir.path());
        assert_eq!(loaded.output_dir(), dir.path().join("public"));
    }

    #[test]
    fn test_base_path_from_config() {
        assert_eq!(
            base_path_from_config(Path::new("/project/harmonique.yaml")),
            PathBuf::from("/project")
        );
        assert_eq!(
            base_path_from_config(Path::new("harmonique.yaml")),
            PathBuf::from("")
        );
    }
}
