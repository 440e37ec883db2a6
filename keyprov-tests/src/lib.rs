//! Test doubles shared by the keyprov integration tests
//!
//! `ScriptedTransport` answers license requests (JSON) and packaging
//! service requests (SOAP) with valid responses and counts every call.
//! `MemoryCredentials` serves credential files from memory and counts
//! every read.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use keyprov::source::{
    ClientIdentity, CredentialReader, HttpRequest, KeyServerTransport, TransportError,
};
use keyprov::{Provisioner, ProvisioningConfig};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Key id every scripted SD license key carries
pub const LICENSE_SD_KEY_ID: [u8; 16] = [0x11; 16];

/// Key id the scripted packaging service hands out
pub const PACKAGING_KEY_ID: [u8; 16] = [0x21; 16];

/// 2048-bit RSA signing key, PKCS#1 DER
pub const RSA_SIGNING_KEY: &[u8] = include_bytes!("../../keyprov-crypto/testdata/rsa-2048.der");

/// Path `with_rsa_signer` points the configuration at
pub const RSA_SIGNING_KEY_PATH: &str = "/keys/provider.der";

/// A request as seen by the transport
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub content_type: String,
    pub body: String,
    pub client_identity: Option<ClientIdentity>,
    pub ca_file: Option<PathBuf>,
}

/// How the transport answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Valid keys for every request
    Succeed,
    /// License server reports an error status, packaging service a fault
    Reject,
    /// Connection refused
    Unreachable,
}

/// Transport double that counts calls
pub struct ScriptedTransport {
    script: Script,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(ScriptedTransport {
            script,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    fn license_response(&self) -> Bytes {
        let inner = match self.script {
            Script::Reject => json!({ "status": "ACCESS_DENIED" }),
            _ => json!({
                "status": "OK",
                "tracks": [
                    {
                        "type": "SD",
                        "key_id": BASE64.encode(LICENSE_SD_KEY_ID),
                        "key": BASE64.encode([0x12u8; 16]),
                        "pssh": [{ "drm_type": "WIDEVINE", "data": BASE64.encode(b"sd") }]
                    },
                    {
                        "type": "HD",
                        "key_id": BASE64.encode([0x13u8; 16]),
                        "key": BASE64.encode([0x14u8; 16])
                    },
                    {
                        "type": "AUDIO",
                        "key_id": BASE64.encode([0x15u8; 16]),
                        "key": BASE64.encode([0x16u8; 16])
                    }
                ]
            }),
        };
        let envelope = json!({ "response": BASE64.encode(inner.to_string()) });
        Bytes::from(envelope.to_string())
    }

    fn packaging_response(&self) -> Bytes {
        let body = match self.script {
            Script::Reject => {
                "<soap:Fault><faultstring>Program not found</faultstring></soap:Fault>".to_string()
            }
            _ => format!(
                "<Response><KeyId>{}</KeyId><Key>{}</Key></Response>",
                BASE64.encode(PACKAGING_KEY_ID),
                BASE64.encode([0x22u8; 16])
            ),
        };
        Bytes::from(body)
    }
}

impl KeyServerTransport for ScriptedTransport {
    fn post(&self, request: &HttpRequest<'_>) -> Result<Bytes, TransportError> {
        self.requests.lock().push(RecordedRequest {
            url: request.url.to_string(),
            content_type: request.content_type.to_string(),
            body: request.body.clone(),
            client_identity: request.client_identity.cloned(),
            ca_file: request.ca_file.map(Path::to_path_buf),
        });

        if self.script == Script::Unreachable {
            return Err(TransportError::Request {
                url: request.url.to_string(),
                message: "connection refused".to_string(),
            });
        }

        if request.content_type.starts_with("application/json") {
            Ok(self.license_response())
        } else {
            Ok(self.packaging_response())
        }
    }
}

/// Credential reader double that counts reads
#[derive(Default)]
pub struct MemoryCredentials {
    files: HashMap<PathBuf, Vec<u8>>,
    reads: Mutex<usize>,
}

impl MemoryCredentials {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_file(path: &str, contents: &[u8]) -> Arc<Self> {
        let mut credentials = Self::default();
        credentials
            .files
            .insert(PathBuf::from(path), contents.to_vec());
        Arc::new(credentials)
    }

    pub fn reads(&self) -> usize {
        *self.reads.lock()
    }
}

impl CredentialReader for MemoryCredentials {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        *self.reads.lock() += 1;
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}

/// Provisioner wired to the given doubles
pub fn provisioner(
    transport: &Arc<ScriptedTransport>,
    credentials: &Arc<MemoryCredentials>,
) -> Provisioner {
    Provisioner::new(transport.clone(), credentials.clone())
}

/// Valid AES signing credentials
pub fn with_aes_signer(config: ProvisioningConfig) -> ProvisioningConfig {
    ProvisioningConfig {
        signer: "widevine_test".to_string(),
        aes_signing_key: "6F".repeat(32),
        aes_signing_iv: "AA".repeat(16),
        ..config
    }
}

/// RSA signing key at `RSA_SIGNING_KEY_PATH`; pair with `rsa_credentials`
pub fn with_rsa_signer(config: ProvisioningConfig) -> ProvisioningConfig {
    ProvisioningConfig {
        signer: "widevine_test".to_string(),
        rsa_signing_key_path: RSA_SIGNING_KEY_PATH.to_string(),
        ..config
    }
}

/// Credentials holding the RSA signing key
pub fn rsa_credentials() -> Arc<MemoryCredentials> {
    MemoryCredentials::with_file(RSA_SIGNING_KEY_PATH, RSA_SIGNING_KEY)
}

/// Remote license encryption for content id "0123"
pub fn remote_encryption() -> ProvisioningConfig {
    ProvisioningConfig {
        enable_widevine_encryption: true,
        key_server_url: "https://license.test/getcontentkey".to_string(),
        content_id: "0123".to_string(),
        policy: "default".to_string(),
        ..Default::default()
    }
}

/// Static key encryption
pub fn static_encryption() -> ProvisioningConfig {
    ProvisioningConfig {
        enable_fixed_key_encryption: true,
        key_id: "abba271e8bcf552bbd2e86a434a9a5d9".to_string(),
        key: "69eaa802a6763af979e8d1940fb88392".to_string(),
        ..Default::default()
    }
}

/// Managed certificate encryption through the packaging service
pub fn managed_service_encryption() -> ProvisioningConfig {
    ProvisioningConfig {
        enable_playready_encryption: true,
        playready_server_url: "https://packaging.test/service".to_string(),
        program_identifier: "program-1".to_string(),
        ..Default::default()
    }
}
