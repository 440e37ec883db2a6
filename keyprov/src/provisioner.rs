//! Provisioner: the collaborators the selectors run against

use crate::config::ProvisioningConfig;
use crate::error::ProvisioningError;
use keyprov_source::{
    CredentialReader, FsCredentialReader, HttpTransport, KeyServerTransport,
    RemoteLicenseSource, TransportError,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Runs the signer, encryption and decryption selectors
///
/// Holds no state between calls besides its collaborators; each selection
/// is independent.
#[derive(Clone)]
pub struct Provisioner {
    transport: Arc<dyn KeyServerTransport>,
    credentials: Arc<dyn CredentialReader>,
}

impl Provisioner {
    /// Create a provisioner with explicit collaborators
    pub fn new(
        transport: Arc<dyn KeyServerTransport>,
        credentials: Arc<dyn CredentialReader>,
    ) -> Self {
        Provisioner {
            transport,
            credentials,
        }
    }

    /// HTTP transport with the given timeout, credentials from the filesystem
    pub fn with_http_transport(timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self::new(
            Arc::new(HttpTransport::new(timeout)?),
            Arc::new(FsCredentialReader),
        ))
    }

    pub(crate) fn credentials(&self) -> &dyn CredentialReader {
        self.credentials.as_ref()
    }

    /// Remote license source with the configured signer attached, not yet fetched
    pub(crate) fn remote_license_source(
        &self,
        config: &ProvisioningConfig,
    ) -> Result<RemoteLicenseSource, ProvisioningError> {
        let mut source = RemoteLicenseSource::new(
            &config.key_server_url,
            config.include_common_pssh,
            Arc::clone(&self.transport),
        );

        if !config.signer.is_empty() {
            // A signer name without key material leaves requests unsigned
            if let Some(signer) = self.create_signer(config)? {
                debug!(signer = %config.signer, kind = ?signer.kind(), "Attaching request signer");
                source.set_signer(signer);
            }
        }

        Ok(source)
    }

    pub(crate) fn transport(&self) -> Arc<dyn KeyServerTransport> {
        Arc::clone(&self.transport)
    }
}
