use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::{Component, Path};

use crate::error::{Error, Result};

pub const DEFAULT_STAGING_DIR: &str = ".sanitized";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name of the directory under the target root holding canonical placeholders.
    pub staging_dir: String,
    pub jpeg_quality: u8,
    /// Gray level of every placeholder pixel.
    pub fill_value: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            staging_dir: DEFAULT_STAGING_DIR.to_string(),
            jpeg_quality: 1,
            fill_value: 0,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        let mut components = Path::new(&self.staging_dir).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal {
            return Err(Error::InvalidConfig(format!(
                "staging_dir must be a single directory name, got {:?}",
                self.staging_dir
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::InvalidConfig(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

/// Load configuration from an optional `Sanitizer.{toml,yaml,json}` in the
/// working directory (or `path` when given), overridden by `SANITIZER_*`
/// environment variables.
pub fn load_configuration(path: Option<&Path>) -> Result<AppConfig> {
    let file_source = match path {
        Some(path) => ConfigFile::from(path).required(true),
        None => ConfigFile::with_name("Sanitizer").required(false),
    };

    let config = Config::builder()
        .add_source(file_source)
        .add_source(Environment::with_prefix("SANITIZER").try_parsing(true))
        .build()?
        .try_deserialize::<AppConfig>()?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.staging_dir, ".sanitized");
        assert_eq!(config.jpeg_quality, 1);
        assert_eq!(config.fill_value, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_staging_dir_must_be_single_component() {
        for bad in ["", ".", "..", "a/b", "/abs"] {
            let config = AppConfig {
                staging_dir: bad.to_string(),
                ..AppConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfig(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_jpeg_quality_range() {
        let config = AppConfig {
            jpeg_quality: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            jpeg_quality: 100,
            ..AppConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sanitizer.toml");
        fs::write(&path, "staging_dir = \"_placeholders\"\nfill_value = 200\n").unwrap();

        let config = load_configuration(Some(&path)).unwrap();
        assert_eq!(config.staging_dir, "_placeholders");
        assert_eq!(config.fill_value, 200);
        assert_eq!(config.jpeg_quality, 1);
    }

    #[test]
    #[serial]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sanitizer.toml");
        fs::write(&path, "staging_dir = \"../escape\"\n").unwrap();

        assert!(matches!(
            load_configuration(Some(&path)),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    #[serial]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            load_configuration(Some(&path)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sanitizer.toml");
        fs::write(&path, "fill_value = 200\njpeg_quality = 10\n").unwrap();

        env::set_var("SANITIZER_FILL_VALUE", "77");
        env::set_var("SANITIZER_JPEG_QUALITY", "55");
        let loaded = load_configuration(Some(&path));
        env::remove_var("SANITIZER_FILL_VALUE");
        env::remove_var("SANITIZER_JPEG_QUALITY");

        let config = loaded.unwrap();
        assert_eq!(config.fill_value, 77);
        assert_eq!(config.jpeg_quality, 55);
        assert_eq!(config.staging_dir, DEFAULT_STAGING_DIR);
    }
}
