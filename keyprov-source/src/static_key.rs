//! Static key source
//!
//! A single key supplied up front, used for every track.

use crate::error::KeySourceError;
use crate::key::{EncryptionKey, ProtectionSystem, TrackType};

/// Key source backed by one configured key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticKeySource {
    key: EncryptionKey,
}

impl StaticKeySource {
    /// Build from hex strings
    ///
    /// `key_id` and `key` are required. `pssh` and `iv` may be empty; a
    /// non-empty IV must decode to 8 or 16 bytes.
    pub fn from_hex_strings(
        key_id: &str,
        key: &str,
        pssh: &str,
        iv: &str,
    ) -> Result<Self, KeySourceError> {
        let key_id = decode_required("key_id", key_id)?;
        let key = decode_required("key", key)?;
        let pssh = decode_hex("pssh", pssh)?;
        let iv = decode_hex("iv", iv)?;

        if !iv.is_empty() && iv.len() != 8 && iv.len() != 16 {
            return Err(KeySourceError::InvalidIvSize(iv.len()));
        }

        Ok(StaticKeySource {
            key: EncryptionKey {
                key_id,
                key,
                iv,
                pssh,
                systems: vec![ProtectionSystem::Common],
            },
        })
    }

    /// The configured key
    pub fn key(&self) -> &EncryptionKey {
        &self.key
    }

    /// The configured key; the same for every track
    pub fn get_key(&self, _track_type: TrackType) -> Result<EncryptionKey, KeySourceError> {
        Ok(self.key.clone())
    }

    /// The configured key, if its id matches
    pub fn get_key_by_id(&self, key_id: &[u8]) -> Result<EncryptionKey, KeySourceError> {
        if self.key.key_id == key_id {
            Ok(self.key.clone())
        } else {
            Err(KeySourceError::KeyIdNotFound(hex::encode(key_id)))
        }
    }
}

pub(crate) fn decode_hex(field: &'static str, value: &str) -> Result<Vec<u8>, KeySourceError> {
    hex::decode(value).map_err(|source| KeySourceError::InvalidHex { field, source })
}

pub(crate) fn decode_required(
    field: &'static str,
    value: &str,
) -> Result<Vec<u8>, KeySourceError> {
    if value.is_empty() {
        return Err(KeySourceError::MissingField(field));
    }
    decode_hex(field, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_strings() {
        let source = StaticKeySource::from_hex_strings(
            "00112233445566778899aabbccddeeff",
            "ffeeddccbbaa99887766554433221100",
            "0a0b",
            "0102030405060708",
        )
        .unwrap();

        let key = source.key();
        assert_eq!(key.key_id.len(), 16);
        assert_eq!(key.key[0], 0xff);
        assert_eq!(key.pssh, vec![0x0a, 0x0b]);
        assert_eq!(key.iv.len(), 8);
    }

    #[test]
    fn test_empty_pssh_and_iv() {
        let source = StaticKeySource::from_hex_strings("1234", "abcd", "", "").unwrap();
        assert!(source.key().pssh.is_empty());
        assert!(source.key().iv.is_empty());
    }

    #[test]
    fn test_malformed_hex() {
        let err = StaticKeySource::from_hex_strings("123", "abcd", "", "").unwrap_err();
        assert!(matches!(err, KeySourceError::InvalidHex { field: "key_id", .. }));

        let err = StaticKeySource::from_hex_strings("1234", "abcd", "xyz0", "").unwrap_err();
        assert!(matches!(err, KeySourceError::InvalidHex { field: "pssh", .. }));
    }

    #[test]
    fn test_missing_key() {
        let err = StaticKeySource::from_hex_strings("1234", "", "", "").unwrap_err();
        assert!(matches!(err, KeySourceError::MissingField("key")));
    }

    #[test]
    fn test_iv_size() {
        let err = StaticKeySource::from_hex_strings("1234", "abcd", "", "0102").unwrap_err();
        assert!(matches!(err, KeySourceError::InvalidIvSize(2)));
    }

    #[test]
    fn test_same_key_for_all_tracks() {
        let source = StaticKeySource::from_hex_strings("1234", "abcd", "", "").unwrap();
        let sd = source.get_key(TrackType::Sd).unwrap();
        let audio = source.get_key(TrackType::Audio).unwrap();
        assert_eq!(sd, audio);

        assert!(source.get_key_by_id(&[0x12, 0x34]).is_ok());
        assert!(matches!(
            source.get_key_by_id(&[0x99]),
            Err(KeySourceError::KeyIdNotFound(_))
        ));
    }

    proptest::proptest! {
        #[test]
        fn test_iv_length_rule(iv in proptest::collection::vec(proptest::num::u8::ANY, 0..32)) {
            let result =
                StaticKeySource::from_hex_strings("1234", "abcd", "", &hex::encode(&iv));
            let accepted = matches!(iv.len(), 0 | 8 | 16);
            proptest::prop_assert_eq!(result.is_ok(), accepted);
        }
    }
}
