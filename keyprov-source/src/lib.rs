//! Key sources for content protection
//!
//! This crate provides the key sources a packager can encrypt or decrypt
//! with: a remote license server, a static key table, and a managed
//! certificate packaging service. Network access goes through the
//! [`KeyServerTransport`] trait so sources can be driven without a server.

pub mod credentials;
pub mod error;
pub mod key;
pub mod managed;
pub mod remote;
pub mod source;
pub mod static_key;
pub mod transport;

pub use credentials::{CredentialReader, FsCredentialReader};
pub use error::{KeySourceError, TransportError};
pub use key::{EncryptionKey, ProtectionSystem, TrackType};
pub use managed::ManagedCertificateSource;
pub use remote::RemoteLicenseSource;
pub use source::{KeySource, KeySourceKind};
pub use static_key::StaticKeySource;
pub use transport::{ClientIdentity, HttpRequest, HttpTransport, KeyServerTransport};
