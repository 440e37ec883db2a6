//! HTTP transport for key servers
//!
//! Key sources build request bodies and parse responses; the transport only
//! moves bytes. Requests are blocking and any timeout belongs here.

use crate::error::TransportError;
use bytes::Bytes;
use openssl::error::ErrorStack;
use openssl::pkey::PKey;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Certificate, Identity};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Client certificate presented to a managed-certificate service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// PEM certificate file
    pub cert_file: PathBuf,
    /// PEM private key file
    pub private_key_file: PathBuf,
    /// Password of the private key
    pub private_key_password: String,
}

/// A single POST to a key server
#[derive(Debug, Clone)]
pub struct HttpRequest<'a> {
    pub url: &'a str,
    pub content_type: &'a str,
    pub body: String,
    pub client_identity: Option<&'a ClientIdentity>,
    /// PEM bundle of additional trusted roots
    pub ca_file: Option<&'a Path>,
}

impl<'a> HttpRequest<'a> {
    /// Plain POST without client authentication
    pub fn post(url: &'a str, content_type: &'a str, body: String) -> Self {
        HttpRequest {
            url,
            content_type,
            body,
            client_identity: None,
            ca_file: None,
        }
    }
}

/// Sends requests to key servers
pub trait KeyServerTransport: Send + Sync {
    /// POST the request and return the response body of a 2xx response
    fn post(&self, request: &HttpRequest<'_>) -> Result<Bytes, TransportError>;
}

/// Blocking HTTP(S) transport
pub struct HttpTransport {
    timeout: Duration,
    client: Client,
}

impl HttpTransport {
    /// Default request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a transport with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Tls(e.to_string()))?;

        Ok(HttpTransport { timeout, client })
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn client_for(&self, request: &HttpRequest<'_>) -> Result<Client, TransportError> {
        if request.client_identity.is_none() && request.ca_file.is_none() {
            return Ok(self.client.clone());
        }

        let mut builder = Client::builder().timeout(self.timeout);

        if let Some(ca_file) = request.ca_file {
            let pem = read_credential(ca_file)?;
            let cert =
                Certificate::from_pem(&pem).map_err(|e| TransportError::Tls(e.to_string()))?;
            builder = builder.add_root_certificate(cert);
        }

        if let Some(identity) = request.client_identity {
            builder = builder.identity(load_identity(identity)?);
        }

        builder
            .build()
            .map_err(|e| TransportError::Tls(e.to_string()))
    }
}

impl KeyServerTransport for HttpTransport {
    fn post(&self, request: &HttpRequest<'_>) -> Result<Bytes, TransportError> {
        let client = self.client_for(request)?;
        debug!(url = request.url, bytes = request.body.len(), "POST to key server");

        let response = client
            .post(request.url)
            .header(CONTENT_TYPE, request.content_type)
            .body(request.body.clone())
            .send()
            .map_err(|e| TransportError::Request {
                url: request.url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: request.url.to_string(),
            });
        }

        response.bytes().map_err(|e| TransportError::Request {
            url: request.url.to_string(),
            message: e.to_string(),
        })
    }
}

fn read_credential(path: &Path) -> Result<Vec<u8>, TransportError> {
    fs::read(path).map_err(|source| TransportError::Credential {
        path: path.to_path_buf(),
        source,
    })
}

fn load_identity(identity: &ClientIdentity) -> Result<Identity, TransportError> {
    let cert = read_credential(&identity.cert_file)?;
    let key = read_credential(&identity.private_key_file)?;
    let key = pkcs8_private_key(&key, &identity.private_key_password).map_err(|e| {
        TransportError::Tls(format!(
            "cannot load private key {}: {}",
            identity.private_key_file.display(),
            e
        ))
    })?;

    Identity::from_pkcs8_pem(&cert, &key).map_err(|e| TransportError::Tls(e.to_string()))
}

/// Re-encode a PEM private key as unencrypted PKCS#8 PEM
///
/// Accepts PKCS#8 and traditional PEM, encrypted or not. The TLS backend
/// only takes unencrypted PKCS#8.
fn pkcs8_private_key(pem: &[u8], password: &str) -> Result<Vec<u8>, ErrorStack> {
    let key = if password.is_empty() {
        PKey::private_key_from_pem(pem)?
    } else {
        PKey::private_key_from_pem_passphrase(pem, password.as_bytes())?
    };
    key.private_key_to_pem_pkcs8()
}
