//! AES request signer
//!
//! The signature is the SHA-1 digest of the message, encrypted with
//! AES-256-CBC and PKCS#7 padding under the provider's key and IV.

use crate::signer::{RequestSigner, SignerError};
use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY};
use std::fmt;
use tracing::warn;

/// Signing key size in bytes
pub const AES_KEY_SIZE: usize = 32;

/// Signing IV size in bytes
pub const AES_IV_SIZE: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;

/// Request signer backed by a shared AES key
pub struct AesRequestSigner {
    name: String,
    key: [u8; AES_KEY_SIZE],
    iv: [u8; AES_IV_SIZE],
}

impl AesRequestSigner {
    /// Create a signer from hex-encoded key and IV
    ///
    /// Returns `None` if either value is not valid hex or has the wrong size.
    pub fn create(signer_name: &str, hex_key: &str, hex_iv: &str) -> Option<Self> {
        let key = decode_fixed::<AES_KEY_SIZE>("key", hex_key)?;
        let iv = decode_fixed::<AES_IV_SIZE>("iv", hex_iv)?;

        Some(AesRequestSigner {
            name: signer_name.to_string(),
            key,
            iv,
        })
    }
}

fn decode_fixed<const N: usize>(what: &str, hex_value: &str) -> Option<[u8; N]> {
    let bytes = match hex::decode(hex_value) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(field = what, error = %e, "AES signing {} is not valid hex", what);
            return None;
        }
    };

    match <[u8; N]>::try_from(bytes) {
        Ok(array) => Some(array),
        Err(bytes) => {
            warn!(
                field = what,
                expected = N,
                actual = bytes.len(),
                "AES signing {} has the wrong size",
                what
            );
            None
        }
    }
}

impl RequestSigner for AesRequestSigner {
    fn signer_name(&self) -> &str {
        &self.name
    }

    fn generate_signature(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        let hash = digest(&SHA1_FOR_LEGACY_USE_ONLY, message);
        let encryptor = Aes256CbcEnc::new((&self.key).into(), (&self.iv).into());
        Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(hash.as_ref()))
    }
}

impl fmt::Debug for AesRequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of logs
        f.debug_struct("AesRequestSigner")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
