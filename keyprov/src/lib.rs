//! Content-protection key provisioning
//!
//! Decides which key source a packaging run encrypts or decrypts with,
//! based on a [`ProvisioningConfig`], and performs the one provisioning
//! call the chosen source needs.
//!
//! The backend families are mutually exclusive and tried in a fixed order.
//! For encryption: remote license server, static key, managed certificate
//! service. For decryption: remote license server, static key.

pub mod config;
pub mod decryption;
pub mod encryption;
pub mod error;
pub mod mode;
pub mod provisioner;
pub mod signer;

pub use keyprov_crypto as crypto;
pub use keyprov_source as source;

pub use config::ProvisioningConfig;
pub use error::ProvisioningError;
pub use mode::{DecryptionMode, EncryptionMode, ManagedMode, SignerMode};
pub use provisioner::Provisioner;

// Re-export commonly used types
pub use crypto::{Signer, SignerKind};
pub use source::{EncryptionKey, KeySource, KeySourceKind, TrackType};
