//! Signer selection

use crate::config::ProvisioningConfig;
use crate::error::ProvisioningError;
use crate::mode::SignerMode;
use crate::provisioner::Provisioner;
use keyprov_crypto::{AesRequestSigner, RsaRequestSigner, Signer, SignerKind};
use std::path::Path;
use tracing::{debug, warn};

impl Provisioner {
    /// Build the request signer named by the configuration
    ///
    /// An AES key takes precedence over an RSA key file, and a bad AES key
    /// fails the call rather than falling back to RSA. Returns `Ok(None)`
    /// when no signing key is configured; at most one file is read.
    pub fn create_signer(
        &self,
        config: &ProvisioningConfig,
    ) -> Result<Option<Signer>, ProvisioningError> {
        let Some(mode) = SignerMode::select(config) else {
            return Ok(None);
        };
        debug!(signer = %config.signer, mode = ?mode, "Creating request signer");

        let signer = match mode {
            SignerMode::Aes => AesRequestSigner::create(
                &config.signer,
                &config.aes_signing_key,
                &config.aes_signing_iv,
            )
            .map(Signer::from)
            .ok_or_else(|| {
                warn!(signer = %config.signer, "Cannot create an AES signer object");
                ProvisioningError::InvalidSignerCredentials {
                    signer: config.signer.clone(),
                    kind: SignerKind::Aes,
                }
            })?,
            SignerMode::Rsa => {
                let path = Path::new(&config.rsa_signing_key_path);
                let private_key = self.credentials().read(path).map_err(|source| {
                    warn!(
                        path = %path.display(),
                        error = %source,
                        "Failed to read RSA signing key"
                    );
                    ProvisioningError::CredentialFileUnreadable {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;

                RsaRequestSigner::create(&config.signer, &private_key)
                    .map(Signer::from)
                    .ok_or_else(|| {
                        warn!(path = %path.display(), "Cannot create an RSA signer object");
                        ProvisioningError::InvalidSignerCredentials {
                            signer: config.signer.clone(),
                            kind: SignerKind::Rsa,
                        }
                    })?
            }
        };

        Ok(Some(signer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioner::test_support::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn aes_config() -> ProvisioningConfig {
        ProvisioningConfig {
            signer: "widevine_test".into(),
            aes_signing_key: "6F".repeat(32),
            aes_signing_iv: "AA".repeat(16),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_signing_key() {
        let transport = Arc::new(CountingTransport::default());
        let credentials = Arc::new(MemoryCredentials::default());
        let config = ProvisioningConfig {
            signer: "widevine_test".into(),
            ..Default::default()
        };

        let signer = provisioner(&transport, &credentials).create_signer(&config).unwrap();
        assert!(signer.is_none());
        assert_eq!(*credentials.reads.lock(), 0);
    }

    #[test]
    fn test_aes_signer_without_file_read() {
        let transport = Arc::new(CountingTransport::default());
        let credentials = Arc::new(MemoryCredentials::default());
        let config = ProvisioningConfig {
            rsa_signing_key_path: "rsa.der".into(),
            ..aes_config()
        };

        let signer = provisioner(&transport, &credentials)
            .create_signer(&config)
            .unwrap()
            .unwrap();
        assert_eq!(signer.kind(), SignerKind::Aes);
        assert_eq!(*credentials.reads.lock(), 0);
    }

    #[test]
    fn test_bad_aes_key_does_not_fall_back() {
        let transport = Arc::new(CountingTransport::default());
        let credentials = Arc::new(MemoryCredentials::default());
        let config = ProvisioningConfig {
            aes_signing_key: "6F".into(),
            rsa_signing_key_path: "rsa.der".into(),
            ..aes_config()
        };

        let err = provisioner(&transport, &credentials)
            .create_signer(&config)
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisioningError::InvalidSignerCredentials {
                kind: SignerKind::Aes,
                ..
            }
        ));
        assert_eq!(*credentials.reads.lock(), 0);
    }

    #[test]
    fn test_missing_rsa_key_file() {
        let transport = Arc::new(CountingTransport::default());
        let credentials = Arc::new(MemoryCredentials::default());
        let config = ProvisioningConfig {
            signer: "widevine_test".into(),
            rsa_signing_key_path: "missing.der".into(),
            ..Default::default()
        };

        let err = provisioner(&transport, &credentials)
            .create_signer(&config)
            .unwrap_err();
        match err {
            ProvisioningError::CredentialFileUnreadable { path, .. } => {
                assert_eq!(path, PathBuf::from("missing.der"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*credentials.reads.lock(), 1);
    }

    #[test]
    fn test_rsa_signer_reads_key_once() {
        let transport = Arc::new(CountingTransport::default());
        let mut credentials = MemoryCredentials::default();
        credentials.files.insert(
            PathBuf::from("rsa.der"),
            include_bytes!("../../keyprov-crypto/testdata/rsa-2048.der").to_vec(),
        );
        let credentials = Arc::new(credentials);
        let config = ProvisioningConfig {
            signer: "widevine_test".into(),
            rsa_signing_key_path: "rsa.der".into(),
            ..Default::default()
        };

        let signer = provisioner(&transport, &credentials)
            .create_signer(&config)
            .unwrap()
            .unwrap();
        assert_eq!(signer.kind(), SignerKind::Rsa);
        assert_eq!(*credentials.reads.lock(), 1);
    }

    #[test]
    fn test_malformed_rsa_key() {
        let transport = Arc::new(CountingTransport::default());
        let mut credentials = MemoryCredentials::default();
        credentials
            .files
            .insert(PathBuf::from("rsa.der"), b"not a der key".to_vec());
        let credentials = Arc::new(credentials);
        let config = ProvisioningConfig {
            signer: "widevine_test".into(),
            rsa_signing_key_path: "rsa.der".into(),
            ..Default::default()
        };

        let err = provisioner(&transport, &credentials)
            .create_signer(&config)
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisioningError::InvalidSignerCredentials {
                kind: SignerKind::Rsa,
                ..
            }
        ));
        assert_eq!(*credentials.reads.lock(), 1);
    }
}
