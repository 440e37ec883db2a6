//! Provisioning configuration

use serde::{Deserialize, Serialize};

/// Everything the selectors read
///
/// String fields are "not configured" when empty. The value is borrowed
/// for the duration of a selection call and never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Encrypt with keys from a remote license server
    pub enable_widevine_encryption: bool,
    /// Decrypt with keys from a remote license server
    pub enable_widevine_decryption: bool,
    /// Encrypt with the static key in `key_id`/`key`
    pub enable_fixed_key_encryption: bool,
    /// Decrypt with the static key in `key_id`/`key`
    pub enable_fixed_key_decryption: bool,
    /// Encrypt with keys from a managed certificate service
    pub enable_playready_encryption: bool,

    /// License server URL
    pub key_server_url: String,
    /// Also announce keys for the common protection system
    pub include_common_pssh: bool,
    /// Content id, hex
    pub content_id: String,
    /// License server policy name
    pub policy: String,

    /// Signer name known to the license server
    pub signer: String,
    /// AES signing key, hex
    pub aes_signing_key: String,
    /// AES signing IV, hex
    pub aes_signing_iv: String,
    /// DER-encoded RSA signing key file
    pub rsa_signing_key_path: String,

    /// Static key id, hex
    pub key_id: String,
    /// Static key, hex
    pub key: String,
    /// PSSH data, hex
    pub pssh: String,
    /// IV, hex
    pub iv: String,

    /// Managed certificate service URL
    pub playready_server_url: String,
    /// Program identifier sent to the managed certificate service
    pub program_identifier: String,
    /// Managed certificate static key id, hex
    pub playready_key_id: String,
    /// Managed certificate static key, hex
    pub playready_key: String,
    /// PEM client certificate
    pub client_cert_file: String,
    /// PEM client certificate private key
    pub client_cert_private_key_file: String,
    pub client_cert_private_key_password: String,
    /// PEM bundle of extra trusted certificate authorities
    pub ca_file: String,
}

impl ProvisioningConfig {
    /// True if any encryption backend is enabled
    pub fn encryption_requested(&self) -> bool {
        self.enable_widevine_encryption
            || self.enable_fixed_key_encryption
            || self.enable_playready_encryption
    }

    /// True if any decryption backend is enabled
    pub fn decryption_requested(&self) -> bool {
        self.enable_widevine_decryption || self.enable_fixed_key_decryption
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_requests_nothing() {
        let config = ProvisioningConfig::default();
        assert!(!config.encryption_requested());
        assert!(!config.decryption_requested());
    }

    #[test]
    fn test_requested_flags() {
        let config = ProvisioningConfig {
            enable_playready_encryption: true,
            enable_fixed_key_decryption: true,
            ..Default::default()
        };
        assert!(config.encryption_requested());
        assert!(config.decryption_requested());
    }
}
