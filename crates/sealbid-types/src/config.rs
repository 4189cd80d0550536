//! Configuration types for the settlement engine and its KMS verifier.

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Address, Result, SealbidError, constants};

/// Engine configuration, loadable from JSON. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Identity of this engine instance, bound into every fingerprint.
    pub contract_identity: Address,
    /// Minimum seconds between two bid submissions by one provider.
    pub submit_cooldown_secs: u64,
    /// Minimum seconds between two decryption requests by one caller.
    pub decryption_cooldown_secs: u64,
    /// Maximum bids accepted into one batch.
    pub max_bids_per_batch: usize,
    /// Reject a new decryption request while one for the current batch is
    /// still awaiting its callback.
    pub exclusive_decryption: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            contract_identity: Address::repeat_byte(0x5b),
            submit_cooldown_secs: constants::DEFAULT_SUBMIT_COOLDOWN_SECS,
            decryption_cooldown_secs: constants::DEFAULT_DECRYPTION_COOLDOWN_SECS,
            max_bids_per_batch: constants::DEFAULT_MAX_BIDS_PER_BATCH,
            exclusive_decryption: true,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn submit_cooldown(&self) -> Duration {
        Duration::from_secs(self.submit_cooldown_secs)
    }

    #[must_use]
    pub fn decryption_cooldown(&self) -> Duration {
        Duration::from_secs(self.decryption_cooldown_secs)
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.contract_identity.is_zero() {
            return Err(SealbidError::Configuration(
                "contract_identity must not be the zero address".into(),
            ));
        }
        if self.max_bids_per_batch == 0 {
            return Err(SealbidError::Configuration(
                "max_bids_per_batch must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// The KMS signer set trusted to attest decryption results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KmsConfig {
    /// Hex-encoded ed25519 public keys.
    pub signers: Vec<String>,
    /// Distinct valid signatures required per proof.
    pub threshold: usize,
}

impl KmsConfig {
    /// Parse and validate a JSON signer set.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON signer set file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold == 0 || self.threshold > self.signers.len() {
            return Err(SealbidError::Configuration(format!(
                "kms threshold {} out of range for {} signers",
                self.threshold,
                self.signers.len()
            )));
        }
        Ok(())
    }
}
