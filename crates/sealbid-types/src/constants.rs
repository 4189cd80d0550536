//! System-wide constants for the SealBid settlement engine.

/// Default per-provider cooldown between bid submissions, in seconds.
pub const DEFAULT_SUBMIT_COOLDOWN_SECS: u64 = 10;

/// Default per-owner cooldown between decryption requests, in seconds.
pub const DEFAULT_DECRYPTION_COOLDOWN_SECS: u64 = 60;

/// Maximum bids accepted into a single batch (default).
pub const DEFAULT_MAX_BIDS_PER_BATCH: usize = 1_024;

/// Default size of the local KMS signer set.
pub const DEFAULT_KMS_SIGNERS: usize = 3;

/// Default KMS signature threshold for decryption proofs.
pub const DEFAULT_KMS_THRESHOLD: usize = 2;

/// Size of one cleartext word in a decryption callback payload.
pub const CLEARTEXT_WORD_BYTES: usize = 32;

/// Number of cleartext words in a settlement callback (amount, winner).
pub const SETTLEMENT_CLEARTEXT_WORDS: usize = 2;

/// Size of one ed25519 signature in a decryption proof.
pub const SIGNATURE_BYTES: usize = 64;

/// Domain separator for result fingerprints.
pub const FINGERPRINT_DOMAIN: &[u8] = b"sealbid:fingerprint:v1:";

/// Domain separator for the digest signed by KMS nodes.
pub const DECRYPTION_DIGEST_DOMAIN: &[u8] = b"sealbid:decryption:v1:";
