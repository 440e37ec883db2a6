//! Configuration file support for the keyprov CLI

use keyprov::ProvisioningConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: default_timeout(),
        }
    }
}

impl HttpConfig {
    /// Get the request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Combined configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Key provisioning options
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
    /// HTTP transport options
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Create example remote license configuration
    pub fn example_remote_license() -> Self {
        Config {
            provisioning: ProvisioningConfig {
                enable_widevine_encryption: true,
                key_server_url: "https://license.uat.widevine.com/cenc/getcontentkey/widevine_test"
                    .to_string(),
                content_id: "3031323334353637".to_string(),
                signer: "widevine_test".to_string(),
                aes_signing_key: "1ae8ccd0e7985cc0b6203a55855a1034afc252980e970ca90e5202689f947ab9"
                    .to_string(),
                aes_signing_iv: "d58ce954203b7c9a9a9d467f59839249".to_string(),
                ..Default::default()
            },
            http: HttpConfig::default(),
        }
    }

    /// Create example static key configuration
    pub fn example_static_key() -> Self {
        Config {
            provisioning: ProvisioningConfig {
                enable_fixed_key_encryption: true,
                key_id: "abba271e8bcf552bbd2e86a434a9a5d9".to_string(),
                key: "69eaa802a6763af979e8d1940fb88392".to_string(),
                ..Default::default()
            },
            http: HttpConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_configs() {
        let remote = Config::example_remote_license();
        assert!(remote.provisioning.enable_widevine_encryption);

        let fixed = Config::example_static_key();
        assert!(fixed.provisioning.enable_fixed_key_encryption);
        assert!(!fixed.provisioning.enable_widevine_encryption);
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = Config::example_remote_license();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file() {
        let parsed: Config = toml::from_str(
            r#"
            [provisioning]
            enable_fixed_key_decryption = true
            key_id = "1234"
            key = "abcd"
            "#,
        )
        .unwrap();

        assert!(parsed.provisioning.enable_fixed_key_decryption);
        assert_eq!(parsed.provisioning.key_id, "1234");
        assert!(parsed.provisioning.pssh.is_empty());
        assert_eq!(parsed.http.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyprov.toml");

        let config = Config::example_static_key();
        config.to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
