//! Decryption key source selection

use crate::config::ProvisioningConfig;
use crate::error::ProvisioningError;
use crate::mode::DecryptionMode;
use crate::provisioner::Provisioner;
use keyprov_source::{KeySource, StaticKeySource};
use tracing::info;

// Decryption carries no protection-system metadata
const NO_PSSH: &str = "";
const NO_IV: &str = "";

impl Provisioner {
    /// Build the key source to decrypt with
    ///
    /// The remote license source is returned unfetched; keys are requested
    /// per use from the PSSH data found in the media. Returns `Ok(None)`
    /// when decryption is not enabled.
    pub fn create_decryption_key_source(
        &self,
        config: &ProvisioningConfig,
    ) -> Result<Option<KeySource>, ProvisioningError> {
        let Some(mode) = DecryptionMode::select(config) else {
            return Ok(None);
        };
        info!(mode = ?mode, "Selected decryption key source");

        let source: KeySource = match mode {
            DecryptionMode::RemoteLicense => self.remote_license_source(config)?.into(),
            DecryptionMode::StaticKey => {
                StaticKeySource::from_hex_strings(&config.key_id, &config.key, NO_PSSH, NO_IV)?
                    .into()
            }
        };

        Ok(Some(source))
    }
}
