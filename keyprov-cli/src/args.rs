//! Command-line flags for key provisioning
//!
//! Every flag overrides the matching field of the configuration file.

use clap::Args;
use keyprov::ProvisioningConfig;

/// Key provisioning flags
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct ProvisioningArgs {
    /// Encrypt with keys from a remote license server
    #[arg(long)]
    pub enable_widevine_encryption: bool,

    /// Decrypt with keys from a remote license server
    #[arg(long)]
    pub enable_widevine_decryption: bool,

    /// Encrypt with the key given by --key-id/--key
    #[arg(long)]
    pub enable_fixed_key_encryption: bool,

    /// Decrypt with the key given by --key-id/--key
    #[arg(long)]
    pub enable_fixed_key_decryption: bool,

    /// Encrypt with keys from a managed certificate service
    #[arg(long)]
    pub enable_playready_encryption: bool,

    /// License server URL
    #[arg(long)]
    pub key_server_url: Option<String>,

    /// Also announce keys for the common protection system
    #[arg(long)]
    pub include_common_pssh: bool,

    /// Content id (hex)
    #[arg(long)]
    pub content_id: Option<String>,

    /// License server policy name
    #[arg(long)]
    pub policy: Option<String>,

    /// Signer name
    #[arg(long)]
    pub signer: Option<String>,

    /// AES signing key (hex)
    #[arg(long)]
    pub aes_signing_key: Option<String>,

    /// AES signing IV (hex)
    #[arg(long)]
    pub aes_signing_iv: Option<String>,

    /// DER-encoded RSA signing key file
    #[arg(long)]
    pub rsa_signing_key_path: Option<String>,

    /// Key id (hex)
    #[arg(long)]
    pub key_id: Option<String>,

    /// Key (hex)
    #[arg(long)]
    pub key: Option<String>,

    /// PSSH data (hex)
    #[arg(long)]
    pub pssh: Option<String>,

    /// IV (hex, 8 or 16 bytes)
    #[arg(long)]
    pub iv: Option<String>,

    /// Managed certificate service URL
    #[arg(long)]
    pub playready_server_url: Option<String>,

    /// Program identifier for the managed certificate service
    #[arg(long)]
    pub program_identifier: Option<String>,

    /// Managed certificate key id (hex)
    #[arg(long)]
    pub playready_key_id: Option<String>,

    /// Managed certificate key (hex)
    #[arg(long)]
    pub playready_key: Option<String>,

    /// Client certificate file (PEM)
    #[arg(long)]
    pub client_cert_file: Option<String>,

    /// Client certificate private key file (PEM)
    #[arg(long)]
    pub client_cert_private_key_file: Option<String>,

    /// Client certificate private key password
    #[arg(long)]
    pub client_cert_private_key_password: Option<String>,

    /// Extra certificate authorities (PEM)
    #[arg(long)]
    pub ca_file: Option<String>,
}

impl ProvisioningArgs {
    /// Overlay the flags that were given onto `config`
    pub fn apply(self, config: &mut ProvisioningConfig) {
        config.enable_widevine_encryption |= self.enable_widevine_encryption;
        config.enable_widevine_decryption |= self.enable_widevine_decryption;
        config.enable_fixed_key_encryption |= self.enable_fixed_key_encryption;
        config.enable_fixed_key_decryption |= self.enable_fixed_key_decryption;
        config.enable_playready_encryption |= self.enable_playready_encryption;
        config.include_common_pssh |= self.include_common_pssh;

        let strings = [
            (self.key_server_url, &mut config.key_server_url),
            (self.content_id, &mut config.content_id),
            (self.policy, &mut config.policy),
            (self.signer, &mut config.signer),
            (self.aes_signing_key, &mut config.aes_signing_key),
            (self.aes_signing_iv, &mut config.aes_signing_iv),
            (self.rsa_signing_key_path, &mut config.rsa_signing_key_path),
            (self.key_id, &mut config.key_id),
            (self.key, &mut config.key),
            (self.pssh, &mut config.pssh),
            (self.iv, &mut config.iv),
            (self.playready_server_url, &mut config.playready_server_url),
            (self.program_identifier, &mut config.program_identifier),
            (self.playready_key_id, &mut config.playready_key_id),
            (self.playready_key, &mut config.playready_key),
            (self.client_cert_file, &mut config.client_cert_file),
            (
                self.client_cert_private_key_file,
                &mut config.client_cert_private_key_file,
            ),
            (
                self.client_cert_private_key_password,
                &mut config.client_cert_private_key_password,
            ),
            (self.ca_file, &mut config.ca_file),
        ];

        for (flag, field) in strings {
            if let Some(value) = flag {
                *field = value;
            }
        }
    }
}
