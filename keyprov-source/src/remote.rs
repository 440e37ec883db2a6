//! Remote license server key source
//!
//! Speaks the JSON key-request protocol of Widevine-style license servers.
//! A request lists the wanted tracks and either a content id (encryption)
//! or PSSH data read from the media (decryption). When a signer is
//! attached the request is wrapped together with its signature:
//!
//! ```text
//! {"request": base64(json), "signature": base64(sig), "signer": name}
//! ```
//!
//! The response is `{"response": base64(json)}` carrying a status and one
//! key per track.

use crate::error::KeySourceError;
use crate::key::{EncryptionKey, ProtectionSystem, TrackType};
use crate::transport::{HttpRequest, KeyServerTransport};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use keyprov_crypto::{RequestSigner, Signer};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

const JSON_CONTENT_TYPE: &str = "application/json";
const DRM_TYPE: &str = "WIDEVINE";
const STATUS_OK: &str = "OK";

#[derive(Serialize)]
struct LicenseRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pssh_data: Option<String>,
    #[serde(skip_serializing_if = "str::is_empty")]
    policy: &'a str,
    tracks: Vec<TrackRequest>,
    drm_types: [&'static str; 1],
}

#[derive(Serialize)]
struct TrackRequest {
    #[serde(rename = "type")]
    track_type: &'static str,
}

#[derive(Serialize)]
struct SignedMessage<'a> {
    request: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signer: Option<&'a str>,
}

#[derive(Deserialize)]
struct ResponseEnvelope {
    response: String,
}

#[derive(Deserialize)]
struct LicenseResponse {
    status: String,
    #[serde(default)]
    tracks: Vec<TrackKey>,
}

#[derive(Deserialize)]
struct TrackKey {
    #[serde(rename = "type")]
    track_type: String,
    key_id: String,
    key: String,
    #[serde(default)]
    pssh: Vec<PsshEntry>,
}

#[derive(Deserialize)]
struct PsshEntry {
    drm_type: String,
    data: String,
}

/// Key source backed by a remote license server
pub struct RemoteLicenseSource {
    server_url: String,
    include_common_pssh: bool,
    signer: Option<Signer>,
    transport: Arc<dyn KeyServerTransport>,
    keys: RwLock<HashMap<TrackType, EncryptionKey>>,
}

impl RemoteLicenseSource {
    /// Create a source for the given server; no request is made yet
    pub fn new(
        server_url: &str,
        include_common_pssh: bool,
        transport: Arc<dyn KeyServerTransport>,
    ) -> Self {
        RemoteLicenseSource {
            server_url: server_url.to_string(),
            include_common_pssh,
            signer: None,
            transport,
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Attach the signer used to authenticate every request
    pub fn set_signer(&mut self, signer: Signer) {
        self.signer = Some(signer);
    }

    pub fn signer(&self) -> Option<&Signer> {
        self.signer.as_ref()
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn include_common_pssh(&self) -> bool {
        self.include_common_pssh
    }

    /// Fetch keys for all tracks of the given content
    pub fn fetch_keys(&self, content_id: &[u8], policy: &str) -> Result<(), KeySourceError> {
        let request = LicenseRequest {
            content_id: Some(BASE64.encode(content_id)),
            pssh_data: None,
            policy,
            tracks: track_requests(),
            drm_types: [DRM_TYPE],
        };
        self.fetch(&request)
    }

    /// Fetch keys for media carrying the given PSSH data
    pub fn fetch_keys_for_pssh(&self, pssh_data: &[u8]) -> Result<(), KeySourceError> {
        let request = LicenseRequest {
            content_id: None,
            pssh_data: Some(BASE64.encode(pssh_data)),
            policy: "",
            tracks: track_requests(),
            drm_types: [DRM_TYPE],
        };
        self.fetch(&request)
    }

    /// Key for a track type; keys must have been fetched first
    pub fn get_key(&self, track_type: TrackType) -> Result<EncryptionKey, KeySourceError> {
        self.keys
            .read()
            .get(&track_type)
            .cloned()
            .ok_or(KeySourceError::KeyNotFound(track_type))
    }

    /// Key with the given id among the fetched keys
    pub fn get_key_by_id(&self, key_id: &[u8]) -> Result<EncryptionKey, KeySourceError> {
        self.keys
            .read()
            .values()
            .find(|key| key.key_id == key_id)
            .cloned()
            .ok_or_else(|| KeySourceError::KeyIdNotFound(hex::encode(key_id)))
    }

    /// Fetched keys, ordered by track type
    pub fn keys(&self) -> Vec<(TrackType, EncryptionKey)> {
        let mut keys: Vec<_> = self
            .keys
            .read()
            .iter()
            .map(|(track_type, key)| (*track_type, key.clone()))
            .collect();
        keys.sort_by_key(|(track_type, _)| *track_type);
        keys
    }

    fn fetch(&self, request: &LicenseRequest<'_>) -> Result<(), KeySourceError> {
        let body = self.build_message(request)?;
        let response = self.transport.post(&HttpRequest::post(
            &self.server_url,
            JSON_CONTENT_TYPE,
            body,
        ))?;

        let keys = self.parse_response(&response)?;
        info!(
            url = %self.server_url,
            tracks = keys.len(),
            "Fetched keys from license server"
        );
        // Replace only after the whole response was accepted
        *self.keys.write() = keys;
        Ok(())
    }

    fn build_message(&self, request: &LicenseRequest<'_>) -> Result<String, KeySourceError> {
        let request_json = serde_json::to_string(request)
            .map_err(|e| KeySourceError::malformed(e.to_string()))?;

        let (signature, signer) = match &self.signer {
            Some(signer) => {
                let signature = signer.generate_signature(request_json.as_bytes())?;
                debug!(signer = signer.signer_name(), "Signed license request");
                (Some(BASE64.encode(signature)), Some(signer.signer_name()))
            }
            None => (None, None),
        };

        let message = SignedMessage {
            request: BASE64.encode(request_json.as_bytes()),
            signature,
            signer,
        };
        serde_json::to_string(&message).map_err(|e| KeySourceError::malformed(e.to_string()))
    }

    fn parse_response(
        &self,
        body: &[u8],
    ) -> Result<HashMap<TrackType, EncryptionKey>, KeySourceError> {
        let envelope: ResponseEnvelope = serde_json::from_slice(body)
            .map_err(|e| KeySourceError::malformed(format!("envelope: {}", e)))?;
        let inner = decode_base64("response", &envelope.response)?;
        let response: LicenseResponse = serde_json::from_slice(&inner)
            .map_err(|e| KeySourceError::malformed(format!("response: {}", e)))?;

        if response.status != STATUS_OK {
            warn!(status = %response.status, "License server rejected key request");
            return Err(KeySourceError::ServerStatus(response.status));
        }
        if response.tracks.is_empty() {
            return Err(KeySourceError::malformed("no tracks in response"));
        }

        let mut systems = vec![ProtectionSystem::Widevine];
        if self.include_common_pssh {
            systems.push(ProtectionSystem::Common);
        }

        let mut keys = HashMap::new();
        for track in response.tracks {
            let Some(track_type) = TrackType::parse(&track.track_type) else {
                debug!(track_type = %track.track_type, "Ignoring unknown track type");
                continue;
            };

            let pssh = match track.pssh.iter().find(|p| p.drm_type == DRM_TYPE) {
                Some(entry) => decode_base64("pssh", &entry.data)?,
                None => Vec::new(),
            };

            keys.insert(
                track_type,
                EncryptionKey {
                    key_id: decode_base64("key_id", &track.key_id)?,
                    key: decode_base64("key", &track.key)?,
                    iv: Vec::new(),
                    pssh,
                    systems: systems.clone(),
                },
            );
        }

        if keys.is_empty() {
            return Err(KeySourceError::malformed("no known track types in response"));
        }
        Ok(keys)
    }
}

fn track_requests() -> Vec<TrackRequest> {
    TrackType::ALL
        .iter()
        .map(|t| TrackRequest {
            track_type: t.as_str(),
        })
        .collect()
}

fn decode_base64(field: &str, value: &str) -> Result<Vec<u8>, KeySourceError> {
    BASE64
        .decode(value)
        .map_err(|e| KeySourceError::malformed(format!("{}: {}", field, e)))
}

impl fmt::Debug for RemoteLicenseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteLicenseSource")
            .field("server_url", &self.server_url)
            .field("include_common_pssh", &self.include_common_pssh)
            .field("signer", &self.signer.as_ref().map(|s| s.signer_name()))
            .field("keys", &self.keys.read().len())
            .finish()
    }
}
