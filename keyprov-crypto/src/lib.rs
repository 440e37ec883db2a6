//! Request signing for key provisioning
//!
//! License servers authenticate key requests by a signature over the
//! request body. This crate provides the two signing schemes a provider
//! account can be issued: a shared AES key/IV pair, or an RSA private key.

pub mod aes_signer;
pub mod rsa_signer;
pub mod signer;

pub use aes_signer::{AesRequestSigner, AES_IV_SIZE, AES_KEY_SIZE};
pub use rsa_signer::RsaRequestSigner;
pub use signer::{RequestSigner, Signer, SignerError, SignerKind};
