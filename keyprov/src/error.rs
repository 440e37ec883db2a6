//! Provisioning errors

use keyprov_crypto::SignerKind;
use keyprov_source::KeySourceError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why no key source could be provided
///
/// Every variant is terminal for the selection call that produced it.
#[derive(Error, Debug)]
pub enum ProvisioningError {
    #[error("Cannot create a {kind:?} signer object for signer '{signer}'")]
    InvalidSignerCredentials { signer: String, kind: SignerKind },

    #[error("Failed to read signing key from '{}': {source}", path.display())]
    CredentialFileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid content_id hex string '{content_id}': {source}")]
    InvalidContentId {
        content_id: String,
        #[source]
        source: hex::FromHexError,
    },

    #[error("Remote license source failed to fetch keys: {status}")]
    KeyFetchFailed {
        #[source]
        status: KeySourceError,
    },

    #[error(
        "Managed certificate encryption needs playready_key_id and playready_key, \
         or playready_server_url and program_identifier"
    )]
    IncompleteManagedCertificateConfig,

    #[error("Managed certificate service failed to provide keys: {source}")]
    PlayReadyProvisioningFailed {
        #[source]
        source: KeySourceError,
    },

    #[error("Invalid key source configuration: {0}")]
    KeySource(#[from] KeySourceError),
}

impl ProvisioningError {
    /// Short stable name of the variant, for logs
    pub fn code(&self) -> &'static str {
        match self {
            ProvisioningError::InvalidSignerCredentials { .. } => "invalid_signer_credentials",
            ProvisioningError::CredentialFileUnreadable { .. } => "credential_file_unreadable",
            ProvisioningError::InvalidContentId { .. } => "invalid_content_id",
            ProvisioningError::KeyFetchFailed { .. } => "key_fetch_failed",
            ProvisioningError::IncompleteManagedCertificateConfig => {
                "incomplete_managed_certificate_config"
            }
            ProvisioningError::PlayReadyProvisioningFailed { .. } => {
                "playready_provisioning_failed"
            }
            ProvisioningError::KeySource(_) => "key_source",
        }
    }
}
