//! Configuration file support for Newton Notes.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/newton/config.toml`.

use crate::units::{DistanceUnit, Theme, WeightUnit};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub units: UnitsConfig,

    #[serde(default)]
    pub appearance: AppearanceConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub backup: BackupConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Unit preferences
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct UnitsConfig {
    #[serde(default)]
    pub weight: WeightUnit,

    #[serde(default)]
    pub distance: DistanceUnit,
}

/// Appearance preferences
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AppearanceConfig {
    #[serde(default)]
    pub theme: Theme,
}

/// Rest timer parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Rest time given to newly added exercises
    #[serde(default = "default_rest_seconds")]
    pub default_rest_seconds: u32,

    /// How often a background-execution grant is renewed while resting
    #[serde(default = "default_background_renew_seconds")]
    pub background_renew_seconds: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_rest_seconds: default_rest_seconds(),
            background_renew_seconds: default_background_renew_seconds(),
        }
    }
}

/// Backup file location
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct BackupConfig {
    /// Defaults to `<data_dir>/backups` when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir().join(".local/share"));
    base.join("newton")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_rest_seconds() -> u32 {
    crate::DEFAULT_REST_SECONDS
}

fn default_background_renew_seconds() -> u32 {
    25
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        base.join("newton").join("config.toml")
    }

    /// Reject values the session manager cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.session.background_renew_seconds == 0 {
            return Err(Error::Config(
                "session.background_renew_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Path of the store file inside the data directory
    pub fn store_path(&self) -> PathBuf {
        self.data.data_dir.join("store.json")
    }

    /// Directory backups are written to
    pub fn backup_dir(&self) -> PathBuf {
        self.backup
            .directory
            .clone()
            .unwrap_or_else(|| self.data.data_dir.join("backups"))
    }

    /// Render as the TOML written to the config file
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.units.weight, WeightUnit::Lbs);
        assert_eq!(config.units.distance, DistanceUnit::Mi);
        assert_eq!(config.appearance.theme, Theme::System);
        assert_eq!(config.session.default_rest_seconds, 90);
        assert_eq!(config.session.background_renew_seconds, 25);
        assert!(config.backup_dir().ends_with("backups"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.units.weight = WeightUnit::Kg;
        config.appearance.theme = Theme::Dark;

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.units.weight, WeightUnit::Kg);
        assert_eq!(parsed.appearance.theme, Theme::Dark);
        assert_eq!(parsed.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[units]
weight = "kg"

[session]
default_rest_seconds = 120
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.units.weight, WeightUnit::Kg);
        assert_eq!(config.units.distance, DistanceUnit::Mi); // default
        assert_eq!(config.session.default_rest_seconds, 120);
        assert_eq!(config.session.background_renew_seconds, 25); // default
    }

    #[test]
    fn test_save_and_load_from_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.data.data_dir = temp_dir.path().join("data");
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.data.data_dir, temp_dir.path().join("data"));
        assert_eq!(loaded.store_path(), temp_dir.path().join("data/store.json"));
    }

    #[test]
    fn test_zero_renew_interval_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[session]\nbackground_renew_seconds = 0\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
