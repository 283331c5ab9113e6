//! Command handlers -- one module per subcommand

use std::path::Path;

use tracing::debug;

use apkinspect_core::error::{ApkInspectError, ConfigError};
use apkinspect_core::ApkInspectConfig;

use crate::error::CliError;

pub mod config;
pub mod query;
pub mod scan;

/// Load the effective configuration for scan/query commands.
///
/// A missing config file falls back to defaults plus environment
/// overrides; `config validate` still reports it as an error.
pub(crate) async fn load_config(path: &Path) -> Result<ApkInspectConfig, CliError> {
    match ApkInspectConfig::load(path).await {
        Ok(config) => Ok(config),
        Err(ApkInspectError::Config(ConfigError::FileNotFound { .. })) => {
            debug!(path = %path.display(), "config file not found, using defaults");
            let mut config = ApkInspectConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_config_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config(&dir.path().join("missing.toml"))
            .await
            .expect("defaults should load");
        assert_eq!(config.scanner.java_path, "java");
    }

    #[tokio::test]
    async fn test_load_config_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("apkinspect.toml");
        tokio::fs::write(
            &path,
            "[scanner]\njava_path = \"/usr/bin/java\"\n",
        )
        .await
        .expect("write config");

        let config = load_config(&path).await.expect("config should load");
        assert_eq!(config.scanner.java_path, "/usr/bin/java");
    }

    #[tokio::test]
    async fn test_load_config_invalid_toml_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("apkinspect.toml");
        tokio::fs::write(&path, "not [valid toml").await.expect("write config");

        let result = load_config(&path).await;
        assert!(result.is_err(), "parse failure should propagate");
    }
}
