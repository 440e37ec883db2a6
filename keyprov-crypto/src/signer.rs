//! Signer capability shared by all signing schemes

use crate::aes_signer::AesRequestSigner;
use crate::rsa_signer::RsaRequestSigner;
use thiserror::Error;

/// Signing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("Signature generation failed for signer '{0}'")]
    SigningFailed(String),
}

/// Produces an authentication signature over a license request
pub trait RequestSigner: Send + Sync {
    /// Name the license server knows this signer under
    fn signer_name(&self) -> &str;

    /// Sign the given message bytes
    fn generate_signature(&self, message: &[u8]) -> Result<Vec<u8>, SignerError>;
}

/// Signing scheme of a [`Signer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerKind {
    /// Shared AES key and IV
    Aes,
    /// RSA private key
    Rsa,
}

/// A configured request signer
///
/// Owned by exactly one key source. Moving it into the source is the only
/// way to hand it over.
#[derive(Debug)]
pub enum Signer {
    Aes(AesRequestSigner),
    Rsa(RsaRequestSigner),
}

impl Signer {
    /// Signing scheme of this signer
    pub fn kind(&self) -> SignerKind {
        match self {
            Signer::Aes(_) => SignerKind::Aes,
            Signer::Rsa(_) => SignerKind::Rsa,
        }
    }
}

impl RequestSigner for Signer {
    fn signer_name(&self) -> &str {
        match self {
            Signer::Aes(signer) => signer.signer_name(),
            Signer::Rsa(signer) => signer.signer_name(),
        }
    }

    fn generate_signature(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        match self {
            Signer::Aes(signer) => signer.generate_signature(message),
            Signer::Rsa(signer) => signer.generate_signature(message),
        }
    }
}

impl From<AesRequestSigner> for Signer {
    fn from(signer: AesRequestSigner) -> Self {
        Signer::Aes(signer)
    }
}

impl From<RsaRequestSigner> for Signer {
    fn from(signer: RsaRequestSigner) -> Self {
        Signer::Rsa(signer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signer_dispatches_to_aes() {
        let aes = AesRequestSigner::create("widevine_test", &"6F".repeat(32), &"AA".repeat(16))
            .unwrap();
        let direct = aes.generate_signature(b"request").unwrap();

        let signer = Signer::from(aes);
        assert_eq!(signer.kind(), SignerKind::Aes);
        assert_eq!(signer.signer_name(), "widevine_test");
        assert_eq!(signer.generate_signature(b"request").unwrap(), direct);
    }
}
