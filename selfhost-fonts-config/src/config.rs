//! Top-level `Config` with persistence and validation.
//!
//! Covers:
//! - `load` / `save` (YAML file I/O with atomic write)
//! - XDG-style default path (`config_path`, `config_dir`)
//! - `validate` for values serde cannot check on its own

use crate::error::ConfigError;
use crate::options::Options;
use crate::site::SiteConfig;
use crate::storage::StorageConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete configuration for the font localizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub options: Options,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub site: SiteConfig,
}

impl Config {
    /// Load configuration from `path`, writing out defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            log::info!("Loading config from {:?}", path);
            let contents = fs::read_to_string(path)?;
            let config: Config = serde_yaml_ng::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            log::info!("Config file not found, creating default at {:?}", path);
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Save configuration to `path`
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml_ng::to_string(self)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Check values that deserialize fine but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.upload_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "storage.upload_url must not be empty".to_string(),
            ));
        }

        if let Some(display) = self.options.font_display()
            && !crate::FONT_DISPLAY_VALUES.contains(&display)
        {
            return Err(ConfigError::Validation(format!(
                "options.font_display '{}' is not one of: {}",
                display,
                crate::FONT_DISPLAY_VALUES.join(", ")
            )));
        }

        for entry in &self.options.preload_fonts {
            let family = entry.split(':').next().unwrap_or("").trim();
            if family.is_empty() || entry.split(':').count() > 3 {
                return Err(ConfigError::Validation(format!(
                    "options.preload_fonts entry '{}' must look like family:weight:subset",
                    entry
                )));
            }
        }

        Ok(())
    }

    /// Get the configuration file path (`~/.config/selfhost-fonts/config.yaml`)
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Get the configuration directory path
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join("selfhost-fonts")
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join("selfhost-fonts")
            } else {
                PathBuf::from(".")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DownloadFailurePolicy;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.options.font_display = "swap".to_string();
        config.options.download_failure = DownloadFailurePolicy::SkipFace;
        config.storage.upload_url = "https://example.com/uploads".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(!path.with_extension("yaml.tmp").exists());
    }

    #[test]
    fn test_load_missing_writes_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");

        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_load_rejects_bad_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "options: [not, a, map]").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_font_display() {
        let mut config = Config::default();
        config.options.font_display = "swap".to_string();
        assert!(config.validate().is_ok());

        config.options.font_display = "sometimes".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("font_display"));
    }

    #[test]
    fn test_validate_preload_entries() {
        let mut config = Config::default();
        config.options.preload_fonts = vec!["Lato:700:latin".to_string(), "Roboto".to_string()];
        assert!(config.validate().is_ok());

        config.options.preload_fonts = vec![":400:latin".to_string()];
        assert!(config.validate().is_err());

        config.options.preload_fonts = vec!["Lato:400:latin:extra".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_upload_url() {
        let mut config = Config::default();
        config.storage.upload_url = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }
}
