//! KMS signer-set verification of decryption proofs.
//!
//! A proof is a concatenation of 64-byte ed25519 signatures over the
//! decryption digest:
//!
//! `SHA-256(domain || request_id || count || handle_0..handle_n || cleartexts)`
//!
//! At least `threshold` signatures must verify, each from a distinct
//! configured signer. Extra or unrecognised signatures are ignored.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sealbid_types::{
    CiphertextHandle, KmsConfig, RequestId, Result, SealbidError, VerificationError, constants,
};
use sha2::{Digest, Sha256};

/// Digest the KMS signs for one decryption result.
#[must_use]
pub fn decryption_digest(
    request_id: RequestId,
    handles: &[CiphertextHandle],
    cleartexts: &[u8],
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(constants::DECRYPTION_DIGEST_DOMAIN);
    hasher.update(request_id.0.to_le_bytes());
    hasher.update((handles.len() as u64).to_le_bytes());
    for handle in handles {
        hasher.update(handle.as_bytes());
    }
    hasher.update(cleartexts);
    hasher.finalize().into()
}

/// The trusted KMS signer set and its threshold.
#[derive(Debug, Clone)]
pub struct KmsVerifier {
    signers: Vec<VerifyingKey>,
    threshold: usize,
}

impl KmsVerifier {
    /// # Errors
    /// `Configuration` if `threshold` is zero or exceeds the signer count.
    pub fn new(signers: Vec<VerifyingKey>, threshold: usize) -> Result<Self> {
        if threshold == 0 || threshold > signers.len() {
            return Err(SealbidError::Configuration(format!(
                "kms threshold {threshold} out of range for {} signers",
                signers.len()
            )));
        }
        Ok(Self { signers, threshold })
    }

    /// Build from hex-encoded public keys.
    pub fn from_config(config: &KmsConfig) -> Result<Self> {
        config.validate()?;
        let signers = config
            .signers
            .iter()
            .map(|text| {
                let bytes: [u8; 32] = hex::decode(text)
                    .ok()
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| {
                        SealbidError::Configuration(format!("bad kms signer key {text:?}"))
                    })?;
                VerifyingKey::from_bytes(&bytes)
                    .map_err(|e| SealbidError::Configuration(format!("kms signer {text}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(signers, config.threshold)
    }

    #[must_use]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    #[must_use]
    pub fn signer_count(&self) -> usize {
        self.signers.len()
    }

    /// Verify `proof` over `digest`.
    pub fn verify(&self, digest: &[u8; 32], proof: &[u8]) -> std::result::Result<(), VerificationError> {
        if proof.is_empty() || proof.len() % constants::SIGNATURE_BYTES != 0 {
            return Err(VerificationError::MalformedProof(proof.len()));
        }

        let mut used = vec![false; self.signers.len()];
        let mut valid = 0usize;
        for chunk in proof.chunks_exact(constants::SIGNATURE_BYTES) {
            let Ok(signature) = Signature::from_slice(chunk) else {
                continue;
            };
            let signer = self
                .signers
                .iter()
                .enumerate()
                .find(|(i, key)| !used[*i] && key.verify(digest, &signature).is_ok());
            if let Some((i, _)) = signer {
                used[i] = true;
                valid += 1;
            }
        }

        if valid < self.threshold {
            tracing::warn!(valid, threshold = self.threshold, "KMS proof below threshold");
            return Err(VerificationError::BelowThreshold {
                valid,
                threshold: self.threshold,
            });
        }
        Ok(())
    }
}

/// Local KMS signing keys, standing in for the decryption network.
#[cfg(any(test, feature = "simulation"))]
#[derive(Debug)]
pub struct KmsSigner {
    keys: Vec<ed25519_dalek::SigningKey>,
}

#[cfg(any(test, feature = "simulation"))]
impl KmsSigner {
    /// Generate `count` fresh signing keys.
    #[must_use]
    pub fn generate(count: usize) -> Self {
        let mut rng = rand::rngs::OsRng;
        Self {
            keys: (0..count)
                .map(|_| ed25519_dalek::SigningKey::generate(&mut rng))
                .collect(),
        }
    }

    /// Derive `count` signing keys from `seed`, so the public half can be
    /// pinned in a [`KmsConfig`] across runs.
    #[must_use]
    pub fn from_seed(seed: u64, count: usize) -> Self {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        Self {
            keys: (0..count)
                .map(|_| ed25519_dalek::SigningKey::generate(&mut rng))
                .collect(),
        }
    }

    /// Config trusting every key of this signer set.
    #[must_use]
    pub fn kms_config(&self, threshold: usize) -> KmsConfig {
        KmsConfig {
            signers: self.public_keys_hex(),
            threshold,
        }
    }

    /// Verifier trusting every key of this signer set.
    pub fn verifier(&self, threshold: usize) -> Result<KmsVerifier> {
        KmsVerifier::new(self.keys.iter().map(ed25519_dalek::SigningKey::verifying_key).collect(), threshold)
    }

    /// Hex public keys, as they appear in a [`KmsConfig`].
    #[must_use]
    pub fn public_keys_hex(&self) -> Vec<String> {
        self.keys
            .iter()
            .map(|k| hex::encode(k.verifying_key().to_bytes()))
            .collect()
    }

    /// Proof carrying signatures from the first `count` signers.
    #[must_use]
    pub fn sign(&self, digest: &[u8; 32], count: usize) -> Vec<u8> {
        use ed25519_dalek::Signer;
        self.keys
            .iter()
            .take(count)
            .flat_map(|k| k.sign(digest).to_bytes())
            .collect()
    }
}
