//! Key source summary display and formatting

use keyprov::crypto::RequestSigner;
use keyprov::source::{KeySource, ProtectionSystem};
use keyprov::{EncryptionKey, KeySourceKind, ProvisioningError, TrackType};

/// Format a key id as dashed hex when it is 16 bytes, plain hex otherwise
pub fn format_key_id(key_id: &[u8]) -> String {
    let hex = hex::encode(key_id);
    if key_id.len() != 16 {
        return hex;
    }
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

fn describe_systems(systems: &[ProtectionSystem]) -> String {
    systems
        .iter()
        .map(|system| format!("{} {}", system.as_str(), format_key_id(&system.system_id())))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Describe a key source for the run log, one line per track
///
/// Never includes key material.
pub fn describe_key_source(purpose: &str, source: &KeySource) -> Vec<String> {
    let mut lines = vec![format!("{} key source: {}", purpose, source.kind())];

    if let Some(remote) = source.as_remote_license() {
        lines.push(format!("  server: {}", remote.server_url()));
        if let Some(signer) = remote.signer() {
            lines.push(format!(
                "  signer: {} ({:?})",
                signer.signer_name(),
                signer.kind()
            ));
        }
    }
    if let Some(managed) = source.as_managed_certificate() {
        if let Some(url) = managed.server_url() {
            lines.push(format!("  server: {}", url));
        }
        if managed.client_identity().is_some() {
            lines.push("  client certificate: yes".to_string());
        }
    }

    let keys = source.available_keys();
    if let Some((_, key)) = keys.first() {
        if !key.systems.is_empty() {
            lines.push(format!("  systems: {}", describe_systems(&key.systems)));
        }
    }

    if keys.is_empty() {
        let note = if source.kind() == KeySourceKind::RemoteLicense {
            "fetched on demand"
        } else {
            "none"
        };
        lines.push(format!("  keys: {}", note));
    } else if single_key(&keys) {
        lines.push(format!("  key id (all tracks): {}", format_key_id(&keys[0].1.key_id)));
    } else {
        for (track_type, key) in &keys {
            lines.push(format!("  {:<5} {}", track_type.as_str(), format_key_id(&key.key_id)));
        }
    }

    lines
}

fn single_key(keys: &[(TrackType, EncryptionKey)]) -> bool {
    keys.len() == TrackType::ALL.len() && keys.windows(2).all(|w| w[0].1 == w[1].1)
}

/// Wrap a selector error for the top-level report, tagged with its code
///
/// The caller logs the result once; nothing is logged here.
pub fn provisioning_failed(purpose: &str, e: ProvisioningError) -> anyhow::Error {
    let code = e.code();
    anyhow::Error::new(e).context(format!("{} key provisioning failed [{}]", purpose, code))
}

/// Print a key source summary to stdout
pub fn display_key_source(purpose: &str, source: &KeySource) {
    for line in describe_key_source(purpose, source) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyprov::source::StaticKeySource;

    #[test]
    fn test_format_key_id() {
        let key_id = [
            0xab, 0xba, 0x27, 0x1e, 0x8b, 0xcf, 0x55, 0x2b, 0xbd, 0x2e, 0x86, 0xa4, 0x34, 0xa9,
            0xa5, 0xd9,
        ];
        assert_eq!(format_key_id(&key_id), "abba271e-8bcf-552b-bd2e-86a434a9a5d9");
        assert_eq!(format_key_id(&[0x12, 0x34]), "1234");
    }

    #[test]
    fn test_describe_static_source() {
        let source = KeySource::from(
            StaticKeySource::from_hex_strings("1234", "abcd", "", "").unwrap(),
        );
        let lines = describe_key_source("Encryption", &source);

        assert_eq!(lines[0], "Encryption key source: static key");
        assert_eq!(
            lines[1],
            "  systems: common 1077efec-c0b2-4d02-ace3-3c1e52e2fb4b"
        );
        assert_eq!(lines[2], "  key id (all tracks): 1234");
        assert!(lines.iter().all(|l| !l.contains("abcd")));
    }

    #[test]
    fn test_provisioning_failed_report() {
        let err = provisioning_failed(
            "Encryption",
            ProvisioningError::IncompleteManagedCertificateConfig,
        );
        let report = format!("{:#}", err);

        assert!(report.starts_with(
            "Encryption key provisioning failed [incomplete_managed_certificate_config]: "
        ));
        assert_eq!(report.matches("Managed certificate encryption needs").count(), 1);
    }
}
