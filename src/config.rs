//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub gamepad: GamepadConfig,

    #[serde(default)]
    pub injection: InjectionConfig,

    #[serde(default)]
    pub bindings: BindingsConfig,
}

/// Poll scheduler configuration
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_poll_rate_ms")]
    pub poll_rate_ms: u64,
}

/// Gamepad detection configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GamepadConfig {
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,

    #[serde(default = "default_product_ids")]
    pub product_ids: Vec<u16>,
}

/// Key injection configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InjectionConfig {
    /// Delivery backend: "local" (uinput) or "remote" (key-sender service)
    #[serde(default = "default_transport")]
    pub transport: String,

    #[serde(default = "default_service_url")]
    pub service_url: String,
}

/// Binding persistence configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BindingsConfig {
    #[serde(default = "default_bindings_path")]
    pub path: String,
}

// Default value functions
fn default_poll_rate_ms() -> u64 { 8 }

fn default_vendor_id() -> u16 { 0x045e }
fn default_product_ids() -> Vec<u16> { vec![0x02e3, 0x0b00] }

fn default_transport() -> String { "local".to_string() }
fn default_service_url() -> String { "http://127.0.0.1:8642/keysender".to_string() }

fn default_bindings_path() -> String { "bindings.toml".to_string() }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_rate_ms: default_poll_rate_ms(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            vendor_id: default_vendor_id(),
            product_ids: default_product_ids(),
        }
    }
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            service_url: default_service_url(),
        }
    }
}

impl Default for BindingsConfig {
    fn default() -> Self {
        Self {
            path: default_bindings_path(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use key_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is absent
    ///
    /// A missing file is a normal first-run state; any other failure
    /// (unreadable file, bad TOML, invalid values) still errors.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Config::default());
        }
        Self::load(path)
    }

    /// Validate configuration values
    ///
    /// # Returns
    ///
    /// * `Result<()>` - Ok if valid, Err if invalid
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.engine.poll_rate_ms == 0 || self.engine.poll_rate_ms > 1000 {
            return Err(crate::error::KeyBridgeError::Config(
                toml::de::Error::custom("poll_rate_ms must be between 1 and 1000")
            ));
        }

        if self.gamepad.product_ids.is_empty() {
            return Err(crate::error::KeyBridgeError::Config(
                toml::de::Error::custom("product_ids must list at least one product")
            ));
        }

        if !["local", "remote"].contains(&self.injection.transport.as_str()) {
            return Err(crate::error::KeyBridgeError::Config(
                toml::de::Error::custom("transport must be 'local' or 'remote'")
            ));
        }

        if self.injection.transport == "remote" && self.injection.service_url.is_empty() {
            return Err(crate::error::KeyBridgeError::Config(
                toml::de::Error::custom("service_url cannot be empty when transport is 'remote'")
            ));
        }

        if self.bindings.path.is_empty() {
            return Err(crate::error::KeyBridgeError::Config(
                toml::de::Error::custom("bindings path cannot be empty")
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.engine.poll_rate_ms, 8);
        assert_eq!(config.gamepad.vendor_id, 0x045e);
        assert_eq!(config.gamepad.product_ids, vec![0x02e3, 0x0b00]);
        assert_eq!(config.injection.transport, "local");
        assert_eq!(config.injection.service_url, "http://127.0.0.1:8642/keysender");
        assert_eq!(config.bindings.path, "bindings.toml");
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[engine]
poll_rate_ms = 16

[injection]
transport = "remote"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.engine.poll_rate_ms, 16);
        assert_eq!(config.injection.transport, "remote");
        // Unspecified sections fall back to defaults
        assert_eq!(config.gamepad.vendor_id, 0x045e);
        assert_eq!(config.bindings.path, "bindings.toml");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/key-bridge.toml").unwrap();
        assert_eq!(config.engine.poll_rate_ms, 8);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"this is { not toml").unwrap();
        temp_file.flush().unwrap();

        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_poll_rate_zero() {
        let mut config = Config::default();
        config.engine.poll_rate_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_rate_too_high() {
        let mut config = Config::default();
        config.engine.poll_rate_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_product_ids() {
        let mut config = Config::default();
        config.gamepad.product_ids = vec![];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_transport() {
        let mut config = Config::default();
        config.injection.transport = "pipe".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_remote_transport_requires_service_url() {
        let mut config = Config::default();
        config.injection.transport = "remote".to_string();
        config.injection.service_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_local_transport_tolerates_empty_service_url() {
        let mut config = Config::default();
        config.injection.service_url = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_bindings_path() {
        let mut config = Config::default();
        config.bindings.path = String::new();
        assert!(config.validate().is_err());
    }
}
