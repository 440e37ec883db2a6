//! Encryption keys and the track slots they are issued for

use std::fmt;

/// Track category a license server issues a key for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackType {
    Sd,
    Hd,
    Uhd1,
    Uhd2,
    Audio,
}

impl TrackType {
    /// All track types, in request order
    pub const ALL: [TrackType; 5] = [
        TrackType::Sd,
        TrackType::Hd,
        TrackType::Uhd1,
        TrackType::Uhd2,
        TrackType::Audio,
    ];

    /// Wire name used by license servers
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackType::Sd => "SD",
            TrackType::Hd => "HD",
            TrackType::Uhd1 => "UHD1",
            TrackType::Uhd2 => "UHD2",
            TrackType::Audio => "AUDIO",
        }
    }

    /// Parse a wire name
    pub fn parse(name: &str) -> Option<Self> {
        TrackType::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protection system a key is announced for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtectionSystem {
    /// Common (W3C clear key) system, carries key ids only
    Common,
    Widevine,
    PlayReady,
}

impl ProtectionSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtectionSystem::Common => "common",
            ProtectionSystem::Widevine => "widevine",
            ProtectionSystem::PlayReady => "playready",
        }
    }

    /// 16-byte system id as written in PSSH boxes
    pub fn system_id(&self) -> [u8; 16] {
        match self {
            ProtectionSystem::Common => [
                0x10, 0x77, 0xef, 0xec, 0xc0, 0xb2, 0x4d, 0x02, 0xac, 0xe3, 0x3c, 0x1e, 0x52,
                0xe2, 0xfb, 0x4b,
            ],
            ProtectionSystem::Widevine => [
                0xed, 0xef, 0x8b, 0xa9, 0x79, 0xd6, 0x4a, 0xce, 0xa3, 0xc8, 0x27, 0xdc, 0xd5,
                0x1d, 0x21, 0xed,
            ],
            ProtectionSystem::PlayReady => [
                0x9a, 0x04, 0xf0, 0x79, 0x98, 0x40, 0x42, 0x86, 0xab, 0x92, 0xe6, 0x5b, 0xe0,
                0x88, 0x5f, 0x95,
            ],
        }
    }
}

/// A content key and the metadata packaged alongside it
#[derive(Clone, PartialEq, Eq, Default)]
pub struct EncryptionKey {
    pub key_id: Vec<u8>,
    pub key: Vec<u8>,
    /// Empty when the muxer should generate one
    pub iv: Vec<u8>,
    /// Protection-system-specific data, empty when none is carried
    pub pssh: Vec<u8>,
    pub systems: Vec<ProtectionSystem>,
}

impl EncryptionKey {
    /// Key id as lowercase hex
    pub fn key_id_hex(&self) -> String {
        hex::encode(&self.key_id)
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("key_id", &self.key_id_hex())
            .field("key", &"<redacted>")
            .field("iv", &hex::encode(&self.iv))
            .field("pssh_len", &self.pssh.len())
            .field("systems", &self.systems)
            .finish()
    }
}
