//! The key source handed to the packaging pipeline

use crate::error::KeySourceError;
use crate::key::{EncryptionKey, TrackType};
use crate::managed::ManagedCertificateSource;
use crate::remote::RemoteLicenseSource;
use crate::static_key::StaticKeySource;
use std::fmt;

/// Backend family of a [`KeySource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySourceKind {
    RemoteLicense,
    Static,
    ManagedCertificate,
}

impl fmt::Display for KeySourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeySourceKind::RemoteLicense => "remote license server",
            KeySourceKind::Static => "static key",
            KeySourceKind::ManagedCertificate => "managed certificate service",
        };
        f.write_str(name)
    }
}

/// A provisioned key source
#[derive(Debug)]
pub enum KeySource {
    RemoteLicense(RemoteLicenseSource),
    Static(StaticKeySource),
    ManagedCertificate(ManagedCertificateSource),
}

impl KeySource {
    pub fn kind(&self) -> KeySourceKind {
        match self {
            KeySource::RemoteLicense(_) => KeySourceKind::RemoteLicense,
            KeySource::Static(_) => KeySourceKind::Static,
            KeySource::ManagedCertificate(_) => KeySourceKind::ManagedCertificate,
        }
    }

    /// Key for the given track type
    pub fn get_key(&self, track_type: TrackType) -> Result<EncryptionKey, KeySourceError> {
        match self {
            KeySource::RemoteLicense(source) => source.get_key(track_type),
            KeySource::Static(source) => source.get_key(track_type),
            KeySource::ManagedCertificate(source) => source.get_key(track_type),
        }
    }

    /// Key with the given id
    pub fn get_key_by_id(&self, key_id: &[u8]) -> Result<EncryptionKey, KeySourceError> {
        match self {
            KeySource::RemoteLicense(source) => source.get_key_by_id(key_id),
            KeySource::Static(source) => source.get_key_by_id(key_id),
            KeySource::ManagedCertificate(source) => source.get_key_by_id(key_id),
        }
    }

    /// Keys currently held, per track type
    ///
    /// Sources with a single key report it for every track type.
    pub fn available_keys(&self) -> Vec<(TrackType, EncryptionKey)> {
        match self {
            KeySource::RemoteLicense(source) => source.keys(),
            _ => TrackType::ALL
                .into_iter()
                .filter_map(|t| self.get_key(t).ok().map(|key| (t, key)))
                .collect(),
        }
    }

    pub fn as_remote_license(&self) -> Option<&RemoteLicenseSource> {
        match self {
            KeySource::RemoteLicense(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_static(&self) -> Option<&StaticKeySource> {
        match self {
            KeySource::Static(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_managed_certificate(&self) -> Option<&ManagedCertificateSource> {
        match self {
            KeySource::ManagedCertificate(source) => Some(source),
            _ => None,
        }
    }
}

impl From<RemoteLicenseSource> for KeySource {
    fn from(source: RemoteLicenseSource) -> Self {
        KeySource::RemoteLicense(source)
    }
}

impl From<StaticKeySource> for KeySource {
    fn from(source: StaticKeySource) -> Self {
        KeySource::Static(source)
    }
}

impl From<ManagedCertificateSource> for KeySource {
    fn from(source: ManagedCertificateSource) -> Self {
        KeySource::ManagedCertificate(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_source_dispatch() {
        let source =
            KeySource::from(StaticKeySource::from_hex_strings("1234", "abcd", "", "").unwrap());
        assert_eq!(source.kind(), KeySourceKind::Static);
        assert!(source.as_static().is_some());
        assert!(source.as_remote_license().is_none());
        assert_eq!(source.available_keys().len(), TrackType::ALL.len());
        assert_eq!(source.get_key_by_id(&[0x12, 0x34]).unwrap().key, vec![0xab, 0xcd]);
    }

    #[test]
    fn test_managed_static_pair_dispatch() {
        let source = KeySource::from(
            ManagedCertificateSource::from_key_and_key_id("0102", "0304").unwrap(),
        );
        assert_eq!(source.kind(), KeySourceKind::ManagedCertificate);
        assert_eq!(source.get_key(TrackType::Uhd1).unwrap().key, vec![0x03, 0x04]);
    }
}
