//! Encryption key source selection

use crate::config::ProvisioningConfig;
use crate::error::ProvisioningError;
use crate::mode::{EncryptionMode, ManagedMode};
use crate::provisioner::Provisioner;
use keyprov_source::{KeySource, ManagedCertificateSource, RemoteLicenseSource, StaticKeySource};
use tracing::{debug, info, warn};

impl Provisioner {
    /// Build the key source to encrypt with
    ///
    /// Backends are tried in order: remote license server, static key,
    /// managed certificate service. Only the first enabled one is looked
    /// at. Returns `Ok(None)` when encryption is not enabled.
    pub fn create_encryption_key_source(
        &self,
        config: &ProvisioningConfig,
    ) -> Result<Option<KeySource>, ProvisioningError> {
        let Some(mode) = EncryptionMode::select(config) else {
            return Ok(None);
        };
        info!(mode = ?mode, "Selected encryption key source");

        let source: KeySource = match mode {
            EncryptionMode::RemoteLicense => self.fetched_remote_license_source(config)?.into(),
            EncryptionMode::StaticKey => StaticKeySource::from_hex_strings(
                &config.key_id,
                &config.key,
                &config.pssh,
                &config.iv,
            )
            .map_err(|e| {
                warn!(error = %e, "Invalid static encryption key");
                e
            })?
            .into(),
            EncryptionMode::ManagedCertificate(managed) => {
                self.managed_certificate_source(config, managed)?.into()
            }
        };

        Ok(Some(source))
    }

    fn fetched_remote_license_source(
        &self,
        config: &ProvisioningConfig,
    ) -> Result<RemoteLicenseSource, ProvisioningError> {
        let source = self.remote_license_source(config)?;

        let decoded = if config.content_id.is_empty() {
            Err(hex::FromHexError::InvalidStringLength)
        } else {
            hex::decode(&config.content_id)
        };
        let content_id = decoded.map_err(|e| {
            warn!(content_id = %config.content_id, "Invalid content_id hex string");
            ProvisioningError::InvalidContentId {
                content_id: config.content_id.clone(),
                source: e,
            }
        })?;

        source
            .fetch_keys(&content_id, &config.policy)
            .map_err(|status| {
                warn!(
                    url = %config.key_server_url,
                    error = %status,
                    "Remote license source failed to fetch keys"
                );
                ProvisioningError::KeyFetchFailed { status }
            })?;

        Ok(source)
    }

    fn managed_certificate_source(
        &self,
        config: &ProvisioningConfig,
        mode: ManagedMode,
    ) -> Result<ManagedCertificateSource, ProvisioningError> {
        match mode {
            ManagedMode::StaticPair => Ok(ManagedCertificateSource::from_key_and_key_id(
                &config.playready_key_id,
                &config.playready_key,
            )?),
            ManagedMode::Service {
                with_client_certificate,
            } => {
                let mut source = if with_client_certificate {
                    ManagedCertificateSource::with_client_certificate(
                        &config.playready_server_url,
                        &config.client_cert_file,
                        &config.client_cert_private_key_file,
                        &config.client_cert_private_key_password,
                        self.transport(),
                    )
                } else {
                    ManagedCertificateSource::new(&config.playready_server_url, self.transport())
                };

                if !config.ca_file.is_empty() {
                    debug!(ca_file = %config.ca_file, "Using extra certificate authorities");
                    source.set_ca_file(&config.ca_file);
                }

                source
                    .fetch_keys_by_program_identifier(&config.program_identifier)
                    .map_err(|e| {
                        warn!(
                            url = %config.playready_server_url,
                            program_identifier = %config.program_identifier,
                            error = %e,
                            "Managed certificate service failed to provide keys"
                        );
                        ProvisioningError::PlayReadyProvisioningFailed { source: e }
                    })?;

                Ok(source)
            }
            ManagedMode::Incomplete => {
                warn!("Error creating managed certificate key source: incomplete configuration");
                Err(ProvisioningError::IncompleteManagedCertificateConfig)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioner::test_support::*;
    use keyprov_source::KeySourceKind;
    use std::sync::Arc;

    #[test]
    fn test_nothing_enabled() {
        let transport = Arc::new(CountingTransport::default());
        let credentials = Arc::new(MemoryCredentials::default());
        let source = provisioner(&transport, &credentials)
            .create_encryption_key_source(&ProvisioningConfig::default())
            .unwrap();
        assert!(source.is_none());
        assert_eq!(*transport.calls.lock(), 0);
    }

    #[test]
    fn test_invalid_content_id_skips_fetch() {
        let transport = Arc::new(CountingTransport::default());
        let credentials = Arc::new(MemoryCredentials::default());
        let config = ProvisioningConfig {
            enable_widevine_encryption: true,
            key_server_url: "https://license.test/".into(),
            content_id: "not-hex!".into(),
            ..Default::default()
        };

        let err = provisioner(&transport, &credentials)
            .create_encryption_key_source(&config)
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisioningError::InvalidContentId { ref content_id, .. } if content_id == "not-hex!"
        ));
        assert_eq!(*transport.calls.lock(), 0);
    }

    #[test]
    fn test_empty_content_id_skips_fetch() {
        let transport = Arc::new(CountingTransport::default());
        let credentials = Arc::new(MemoryCredentials::default());
        let config = ProvisioningConfig {
            enable_widevine_encryption: true,
            key_server_url: "https://license.test/".into(),
            ..Default::default()
        };

        let err = provisioner(&transport, &credentials)
            .create_encryption_key_source(&config)
            .unwrap_err();
        assert!(matches!(err, ProvisioningError::InvalidContentId { .. }));
        assert_eq!(*transport.calls.lock(), 0);
    }

    #[test]
    fn test_fetch_failure_is_reported() {
        // An empty body is not a valid license response
        let transport = Arc::new(CountingTransport::default());
        let credentials = Arc::new(MemoryCredentials::default());
        let config = ProvisioningConfig {
            enable_widevine_encryption: true,
            key_server_url: "https://license.test/".into(),
            content_id: "abcd".into(),
            ..Default::default()
        };

        let err = provisioner(&transport, &credentials)
            .create_encryption_key_source(&config)
            .unwrap_err();
        assert!(matches!(err, ProvisioningError::KeyFetchFailed { .. }));
        assert_eq!(*transport.calls.lock(), 1);
    }

    #[test]
    fn test_static_key_encryption() {
        let transport = Arc::new(CountingTransport::default());
        let credentials = Arc::new(MemoryCredentials::default());
        let config = ProvisioningConfig {
            enable_fixed_key_encryption: true,
            key_id: "1234".into(),
            key: "abcd".into(),
            pssh: "0a0b".into(),
            iv: "0102030405060708".into(),
            ..Default::default()
        };

        let source = provisioner(&transport, &credentials)
            .create_encryption_key_source(&config)
            .unwrap()
            .unwrap();
        assert_eq!(source.kind(), KeySourceKind::Static);
        let key = source.as_static().unwrap().key();
        assert_eq!(key.pssh, vec![0x0a, 0x0b]);
        assert_eq!(key.iv.len(), 8);
        assert_eq!(*transport.calls.lock(), 0);
    }

    #[test]
    fn test_static_key_decode_error_passes_through() {
        let transport = Arc::new(CountingTransport::default());
        let credentials = Arc::new(MemoryCredentials::default());
        let config = ProvisioningConfig {
            enable_fixed_key_encryption: true,
            key_id: "12345".into(),
            key: "abcd".into(),
            ..Default::default()
        };

        let err = provisioner(&transport, &credentials)
            .create_encryption_key_source(&config)
            .unwrap_err();
        assert!(matches!(err, ProvisioningError::KeySource(_)));
    }

    #[test]
    fn test_managed_incomplete() {
        let transport = Arc::new(CountingTransport::default());
        let credentials = Arc::new(MemoryCredentials::default());
        let config = ProvisioningConfig {
            enable_playready_encryption: true,
            playready_server_url: "https://packaging.test/".into(),
            ..Default::default()
        };

        let err = provisioner(&transport, &credentials)
            .create_encryption_key_source(&config)
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisioningError::IncompleteManagedCertificateConfig
        ));
        assert_eq!(*transport.calls.lock(), 0);
    }

    #[test]
    fn test_managed_static_pair() {
        let transport = Arc::new(CountingTransport::default());
        let credentials = Arc::new(MemoryCredentials::default());
        let config = ProvisioningConfig {
            enable_playready_encryption: true,
            playready_key_id: "0102".into(),
            playready_key: "0304".into(),
            playready_server_url: "https://packaging.test/".into(),
            program_identifier: "show".into(),
            ..Default::default()
        };

        let source = provisioner(&transport, &credentials)
            .create_encryption_key_source(&config)
            .unwrap()
            .unwrap();
        assert_eq!(source.kind(), KeySourceKind::ManagedCertificate);
        assert_eq!(*transport.calls.lock(), 0);
    }

    #[test]
    fn test_managed_service_failure_is_checked() {
        let transport = Arc::new(CountingTransport::default());
        let credentials = Arc::new(MemoryCredentials::default());
        let config = ProvisioningConfig {
            enable_playready_encryption: true,
            playready_server_url: "https://packaging.test/".into(),
            program_identifier: "show".into(),
            ..Default::default()
        };

        let err = provisioner(&transport, &credentials)
            .create_encryption_key_source(&config)
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisioningError::PlayReadyProvisioningFailed { .. }
        ));
        assert_eq!(*transport.calls.lock(), 1);
    }
}
