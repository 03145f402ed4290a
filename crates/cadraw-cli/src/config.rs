//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use cadraw::CadrawError;

/// Defaults the command line may leave to the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Path to the rule table (TOML).
    pub rules: Option<String>,
    /// Path to the schema description (JSON).
    pub schema: Option<String>,
    /// Decimal places for coordinate values.
    pub precision: Option<usize>,
    /// Comment written at the beginning of the output file.
    pub comment: Option<String>,
}

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),
}

impl From<ConfigError> for CadrawError {
    fn from(err: ConfigError) -> Self {
        CadrawError::InvalidInput {
            path: "configuration".to_string(),
            message: err.to_string(),
        }
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (cadraw/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, CadrawError> {
    // 1. Try the explicitly provided path first if available
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    // 2. Try the local project directory
    let local_config = Path::new("cadraw/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    // 3. Try the platform-specific config directory
    if let Some(proj_dirs) = ProjectDirs::from("ch", "cadraw", "cadraw") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    // 4. If no config is found, return default config
    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, CadrawError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn explicit_config_is_parsed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "rules = \"rules.toml\"\nschema = \"schema.json\"\nprecision = 2"
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.rules.as_deref(), Some("rules.toml"));
        assert_eq!(config.schema.as_deref(), Some("schema.json"));
        assert_eq!(config.precision, Some(2));
        assert_eq!(config.comment, None);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let result = load_config(Some("does/not/exist.toml"));
        assert!(matches!(
            result,
            Err(CadrawError::InvalidInput { .. })
        ));
    }
}
