//! Construction-mode decision tables
//!
//! Each selector first reduces the configuration to one of these values,
//! then builds exactly what it names. The `select` functions read nothing
//! but the configuration.

use crate::config::ProvisioningConfig;

/// Which request signer to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerMode {
    Aes,
    Rsa,
}

impl SignerMode {
    /// AES key wins over an RSA key file; `None` if neither is set
    pub fn select(config: &ProvisioningConfig) -> Option<Self> {
        if !config.aes_signing_key.is_empty() {
            Some(SignerMode::Aes)
        } else if !config.rsa_signing_key_path.is_empty() {
            Some(SignerMode::Rsa)
        } else {
            None
        }
    }
}

/// How a managed certificate source gets its key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedMode {
    /// `playready_key_id` and `playready_key` are both set
    StaticPair,
    /// Ask the service at `playready_server_url` for `program_identifier`
    Service { with_client_certificate: bool },
    /// Enabled, but neither of the above is configured
    Incomplete,
}

impl ManagedMode {
    pub fn select(config: &ProvisioningConfig) -> Self {
        if !config.playready_key_id.is_empty() && !config.playready_key.is_empty() {
            ManagedMode::StaticPair
        } else if !config.playready_server_url.is_empty() && !config.program_identifier.is_empty()
        {
            ManagedMode::Service {
                with_client_certificate: !config.client_cert_file.is_empty()
                    && !config.client_cert_private_key_file.is_empty()
                    && !config.client_cert_private_key_password.is_empty(),
            }
        } else {
            ManagedMode::Incomplete
        }
    }
}

/// Which encryption key source to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionMode {
    RemoteLicense,
    StaticKey,
    ManagedCertificate(ManagedMode),
}

impl EncryptionMode {
    /// First enabled backend in priority order, `None` if none is enabled
    pub fn select(config: &ProvisioningConfig) -> Option<Self> {
        if config.enable_widevine_encryption {
            Some(EncryptionMode::RemoteLicense)
        } else if config.enable_fixed_key_encryption {
            Some(EncryptionMode::StaticKey)
        } else if config.enable_playready_encryption {
            Some(EncryptionMode::ManagedCertificate(ManagedMode::select(config)))
        } else {
            None
        }
    }
}

/// Which decryption key source to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptionMode {
    RemoteLicense,
    StaticKey,
}

impl DecryptionMode {
    /// First enabled backend in priority order, `None` if none is enabled
    pub fn select(config: &ProvisioningConfig) -> Option<Self> {
        if config.enable_widevine_decryption {
            Some(DecryptionMode::RemoteLicense)
        } else if config.enable_fixed_key_decryption {
            Some(DecryptionMode::StaticKey)
        } else {
            None
        }
    }
}
