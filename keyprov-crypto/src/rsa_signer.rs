//! RSA request signer
//!
//! Signs with RSASSA-PSS over SHA-256. The private key is DER-encoded,
//! either PKCS#1 `RSAPrivateKey` or PKCS#8.

use crate::signer::{RequestSigner, SignerError};
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PSS_SHA256};
use tracing::warn;

/// Request signer backed by an RSA private key
#[derive(Debug)]
pub struct RsaRequestSigner {
    name: String,
    key_pair: RsaKeyPair,
    rng: SystemRandom,
}

impl RsaRequestSigner {
    /// Create a signer from DER-encoded private key bytes
    ///
    /// Returns `None` if the bytes are not a usable RSA private key.
    pub fn create(signer_name: &str, private_key: &[u8]) -> Option<Self> {
        let key_pair = match RsaKeyPair::from_der(private_key)
            .or_else(|_| RsaKeyPair::from_pkcs8(private_key))
        {
            Ok(key_pair) => key_pair,
            Err(e) => {
                warn!(signer = signer_name, error = %e, "Rejected RSA signing key");
                return None;
            }
        };

        Some(RsaRequestSigner {
            name: signer_name.to_string(),
            key_pair,
            rng: SystemRandom::new(),
        })
    }

    /// Signature length in bytes (the modulus length)
    pub fn signature_len(&self) -> usize {
        self.key_pair.public().modulus_len()
    }
}

impl RequestSigner for RsaRequestSigner {
    fn signer_name(&self) -> &str {
        &self.name
    }

    fn generate_signature(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        let mut signature = vec![0u8; self.signature_len()];
        self.key_pair
            .sign(&RSA_PSS_SHA256, &self.rng, message, &mut signature)
            .map_err(|_| SignerError::SigningFailed(self.name.clone()))?;
        Ok(signature)
    }
}
