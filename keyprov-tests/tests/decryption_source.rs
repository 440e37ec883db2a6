//! Decryption key source selection tests

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use keyprov::{KeySourceKind, ProvisioningConfig, ProvisioningError, TrackType};
use keyprov_tests::*;

fn remote_decryption() -> ProvisioningConfig {
    ProvisioningConfig {
        enable_widevine_decryption: true,
        key_server_url: "https://license.test/getcontentkey".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_static_decryption_key() {
    let transport = ScriptedTransport::new(Script::Succeed);
    let credentials = MemoryCredentials::new();
    let config = ProvisioningConfig {
        enable_fixed_key_decryption: true,
        key_id: "1234".to_string(),
        key: "abcd".to_string(),
        pssh: "0a0b0c".to_string(),
        iv: "0102030405060708".to_string(),
        ..Default::default()
    };

    let source = provisioner(&transport, &credentials)
        .create_decryption_key_source(&config)
        .unwrap()
        .expect("static key source");

    assert_eq!(source.kind(), KeySourceKind::Static);
    for track_type in TrackType::ALL {
        let key = source.get_key(track_type).unwrap();
        assert_eq!(key.key_id, vec![0x12, 0x34]);
        assert_eq!(key.key, vec![0xab, 0xcd]);
        assert!(key.pssh.is_empty());
        assert!(key.iv.is_empty());
    }
    assert_eq!(transport.calls(), 0);
}

#[test]
fn test_remote_decryption_is_lazy() {
    let transport = ScriptedTransport::new(Script::Succeed);
    let credentials = MemoryCredentials::new();

    let source = provisioner(&transport, &credentials)
        .create_decryption_key_source(&remote_decryption())
        .unwrap()
        .unwrap();

    assert_eq!(source.kind(), KeySourceKind::RemoteLicense);
    assert_eq!(transport.calls(), 0);
    assert!(source.available_keys().is_empty());

    let remote = source.as_remote_license().unwrap();
    remote.fetch_keys_for_pssh(b"pssh-from-media").unwrap();
    assert_eq!(transport.calls(), 1);

    let key = source.get_key_by_id(&LICENSE_SD_KEY_ID).unwrap();
    assert_eq!(key.key, vec![0x12; 16]);

    let message: serde_json::Value =
        serde_json::from_str(&transport.requests()[0].body).unwrap();
    let inner: serde_json::Value = serde_json::from_slice(
        &BASE64
            .decode(message["request"].as_str().unwrap())
            .unwrap(),
    )
    .unwrap();
    assert_eq!(inner["pssh_data"], BASE64.encode(b"pssh-from-media"));
    assert!(inner.get("content_id").is_none());
}

#[test]
fn test_remote_decryption_keeps_signer() {
    let transport = ScriptedTransport::new(Script::Succeed);
    let credentials = MemoryCredentials::new();
    let config = with_aes_signer(remote_decryption());

    let source = provisioner(&transport, &credentials)
        .create_decryption_key_source(&config)
        .unwrap()
        .unwrap();

    let remote = source.as_remote_license().unwrap();
    assert!(remote.signer().is_some());
    assert_eq!(transport.calls(), 0);
}

#[test]
fn test_remote_decryption_signer_failure() {
    let transport = ScriptedTransport::new(Script::Succeed);
    let credentials = MemoryCredentials::new();
    let config = ProvisioningConfig {
        signer: "widevine_test".to_string(),
        rsa_signing_key_path: "/keys/missing.der".to_string(),
        ..remote_decryption()
    };

    let err = provisioner(&transport, &credentials)
        .create_decryption_key_source(&config)
        .unwrap_err();
    assert!(matches!(
        err,
        ProvisioningError::CredentialFileUnreadable { .. }
    ));
    assert_eq!(credentials.reads(), 1);
}

#[test]
fn test_failed_fetch_keeps_source_usable() {
    let transport = ScriptedTransport::new(Script::Unreachable);
    let credentials = MemoryCredentials::new();

    let source = provisioner(&transport, &credentials)
        .create_decryption_key_source(&remote_decryption())
        .unwrap()
        .unwrap();

    let remote = source.as_remote_license().unwrap();
    assert!(remote.fetch_keys_for_pssh(b"pssh").is_err());
    assert!(source.available_keys().is_empty());
    assert!(source.get_key(TrackType::Sd).is_err());
}

#[test]
fn test_missing_static_decryption_key() {
    let transport = ScriptedTransport::new(Script::Succeed);
    let credentials = MemoryCredentials::new();
    let config = ProvisioningConfig {
        enable_fixed_key_decryption: true,
        key_id: "1234".to_string(),
        ..Default::default()
    };

    let err = provisioner(&transport, &credentials)
        .create_decryption_key_source(&config)
        .unwrap_err();
    assert_eq!(err.code(), "key_source");
}

#[test]
fn test_decryption_not_requested() {
    let transport = ScriptedTransport::new(Script::Succeed);
    let credentials = MemoryCredentials::new();
    let config = ProvisioningConfig {
        enable_playready_encryption: true,
        key_id: "1234".to_string(),
        key: "abcd".to_string(),
        ..Default::default()
    };

    let source = provisioner(&transport, &credentials)
        .create_decryption_key_source(&config)
        .unwrap();
    assert!(source.is_none());
}
