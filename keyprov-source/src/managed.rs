//! Managed certificate key source
//!
//! Keys come either from a static key id/key pair, or from a PlayReady-style
//! packaging service that authenticates the packager with an X.509 client
//! certificate and hands out the key for a program identifier.

use crate::error::KeySourceError;
use crate::key::{EncryptionKey, ProtectionSystem, TrackType};
use crate::static_key::decode_required;
use crate::transport::{ClientIdentity, HttpRequest, KeyServerTransport};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use parking_lot::RwLock;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

enum Backend {
    StaticPair,
    Service {
        server_url: String,
        identity: Option<ClientIdentity>,
        ca_file: Option<PathBuf>,
        transport: Arc<dyn KeyServerTransport>,
    },
}

/// Key source backed by a managed-certificate packaging service
pub struct ManagedCertificateSource {
    backend: Backend,
    key: RwLock<Option<EncryptionKey>>,
}

impl ManagedCertificateSource {
    /// Source with a fixed key; never contacts a server
    pub fn from_key_and_key_id(key_id: &str, key: &str) -> Result<Self, KeySourceError> {
        let key = EncryptionKey {
            key_id: decode_required("playready_key_id", key_id)?,
            key: decode_required("playready_key", key)?,
            iv: Vec::new(),
            pssh: Vec::new(),
            systems: vec![ProtectionSystem::PlayReady],
        };

        Ok(ManagedCertificateSource {
            backend: Backend::StaticPair,
            key: RwLock::new(Some(key)),
        })
    }

    /// Service client without a client certificate
    pub fn new(server_url: &str, transport: Arc<dyn KeyServerTransport>) -> Self {
        Self::with_identity(server_url, None, transport)
    }

    /// Service client authenticating with a client certificate
    pub fn with_client_certificate(
        server_url: &str,
        cert_file: &str,
        private_key_file: &str,
        private_key_password: &str,
        transport: Arc<dyn KeyServerTransport>,
    ) -> Self {
        let identity = ClientIdentity {
            cert_file: PathBuf::from(cert_file),
            private_key_file: PathBuf::from(private_key_file),
            private_key_password: private_key_password.to_string(),
        };
        Self::with_identity(server_url, Some(identity), transport)
    }

    fn with_identity(
        server_url: &str,
        identity: Option<ClientIdentity>,
        transport: Arc<dyn KeyServerTransport>,
    ) -> Self {
        ManagedCertificateSource {
            backend: Backend::Service {
                server_url: server_url.to_string(),
                identity,
                ca_file: None,
                transport,
            },
            key: RwLock::new(None),
        }
    }

    /// Trust the certificate authorities in the given PEM file
    ///
    /// Has no effect on a static-pair source.
    pub fn set_ca_file(&mut self, path: impl AsRef<Path>) {
        if let Backend::Service { ca_file, .. } = &mut self.backend {
            *ca_file = Some(path.as_ref().to_path_buf());
        }
    }

    pub fn server_url(&self) -> Option<&str> {
        match &self.backend {
            Backend::StaticPair => None,
            Backend::Service { server_url, .. } => Some(server_url),
        }
    }

    pub fn client_identity(&self) -> Option<&ClientIdentity> {
        match &self.backend {
            Backend::StaticPair => None,
            Backend::Service { identity, .. } => identity.as_ref(),
        }
    }

    pub fn ca_file(&self) -> Option<&Path> {
        match &self.backend {
            Backend::StaticPair => None,
            Backend::Service { ca_file, .. } => ca_file.as_deref(),
        }
    }

    /// Ask the service for the key of a program
    pub fn fetch_keys_by_program_identifier(
        &self,
        program_identifier: &str,
    ) -> Result<(), KeySourceError> {
        let Backend::Service {
            server_url,
            identity,
            ca_file,
            transport,
        } = &self.backend
        else {
            return Err(KeySourceError::NotFetchable);
        };

        let request = HttpRequest {
            url: server_url,
            content_type: SOAP_CONTENT_TYPE,
            body: soap_request(program_identifier),
            client_identity: identity.as_ref(),
            ca_file: ca_file.as_deref(),
        };
        debug!(
            url = %server_url,
            client_certificate = identity.is_some(),
            "Requesting key for program"
        );

        let response = transport.post(&request)?;
        let key = parse_soap_response(&response)?;
        info!(
            url = %server_url,
            key_id = %key.key_id_hex(),
            "Fetched key from packaging service"
        );
        *self.key.write() = Some(key);
        Ok(())
    }

    /// The provisioned key; the same for every track
    pub fn get_key(&self, track_type: TrackType) -> Result<EncryptionKey, KeySourceError> {
        self.key
            .read()
            .clone()
            .ok_or(KeySourceError::KeyNotFound(track_type))
    }

    /// The provisioned key, if its id matches
    pub fn get_key_by_id(&self, key_id: &[u8]) -> Result<EncryptionKey, KeySourceError> {
        self.key
            .read()
            .as_ref()
            .filter(|key| key.key_id == key_id)
            .cloned()
            .ok_or_else(|| KeySourceError::KeyIdNotFound(hex::encode(key_id)))
    }
}

fn soap_request(program_identifier: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">"#,
            r#"<soap:Body><GetContentKey xmlns="http://tempuri.org/">"#,
            "<ProgramIdentifier>{}</ProgramIdentifier>",
            "</GetContentKey></soap:Body></soap:Envelope>"
        ),
        escape_xml(program_identifier)
    )
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Text of the first element with the given local name
///
/// Namespace prefixes and attributes are ignored.
fn element_text<'a>(document: &'a str, local_name: &str) -> Option<&'a str> {
    let mut rest = 0;
    while let Some(offset) = document[rest..].find('<') {
        let tag_start = rest + offset + 1;
        let tag_end = tag_start + document[tag_start..].find('>')?;
        rest = tag_end + 1;

        let tag = &document[tag_start..tag_end];
        let is_markup = tag.starts_with(|c: char| matches!(c, '/' | '?' | '!'));
        if is_markup || tag_local_name(tag) != local_name {
            continue;
        }
        if tag.ends_with('/') {
            return Some("");
        }

        let content_start = rest;
        let mut search = content_start;
        while let Some(offset) = document[search..].find("</") {
            let close_start = search + offset + 2;
            let close_end = close_start + document[close_start..].find('>')?;
            if tag_local_name(&document[close_start..close_end]) == local_name {
                return Some(document[content_start..search + offset].trim());
            }
            search = close_end + 1;
        }
        return None;
    }
    None
}

fn tag_local_name(tag: &str) -> &str {
    let name = tag
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default();
    name.rsplit(':').next().unwrap_or(name)
}

fn parse_soap_response(body: &[u8]) -> Result<EncryptionKey, KeySourceError> {
    let document = std::str::from_utf8(body)
        .map_err(|e| KeySourceError::malformed(format!("response is not UTF-8: {}", e)))?;

    if let Some(fault) = element_text(document, "faultstring") {
        return Err(KeySourceError::ServerStatus(fault.to_string()));
    }

    let decode = |name: &str| -> Result<Vec<u8>, KeySourceError> {
        let text = element_text(document, name)
            .ok_or_else(|| KeySourceError::malformed(format!("missing <{}>", name)))?;
        BASE64
            .decode(text)
            .map_err(|e| KeySourceError::malformed(format!("{}: {}", name, e)))
    };

    Ok(EncryptionKey {
        key_id: decode("KeyId")?,
        key: decode("Key")?,
        iv: Vec::new(),
        pssh: Vec::new(),
        systems: vec![ProtectionSystem::PlayReady],
    })
}

impl fmt::Debug for ManagedCertificateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedCertificateSource")
            .field("server_url", &self.server_url())
            .field("client_certificate", &self.client_identity().is_some())
            .field("ca_file", &self.ca_file())
            .field("provisioned", &self.key.read().is_some())
            .finish()
    }
}
