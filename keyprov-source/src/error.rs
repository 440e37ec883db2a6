//! Error types for key sources and transports

use crate::key::TrackType;
use keyprov_crypto::SignerError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Cannot read {}: {source}", path.display())]
    Credential {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("TLS setup failed: {0}")]
    Tls(String),
}

/// Key source errors
#[derive(Error, Debug)]
pub enum KeySourceError {
    #[error("Invalid hex in {field}: {source}")]
    InvalidHex {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },

    #[error("Missing {0}")]
    MissingField(&'static str),

    #[error("Invalid IV size {0}, expected 8 or 16 bytes")]
    InvalidIvSize(usize),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Signing error: {0}")]
    Signing(#[from] SignerError),

    #[error("Malformed server response: {0}")]
    MalformedResponse(String),

    #[error("Server returned status {0}")]
    ServerStatus(String),

    #[error("No key for track type {0}")]
    KeyNotFound(TrackType),

    #[error("No key with id {0}")]
    KeyIdNotFound(String),

    #[error("Key source has no server to fetch from")]
    NotFetchable,
}

impl KeySourceError {
    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedResponse(msg.into())
    }
}
