//! Error types for the SealBid settlement engine.
//!
//! All errors use the `SB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by taxonomy:
//! - 1xx: Authorization
//! - 2xx: Availability / throttling
//! - 3xx: Batch lifecycle
//! - 4xx: Input validation
//! - 5xx: Integrity (replay, tamper, proof)
//! - 6xx: Decryption oracle
//! - 9xx: General / internal

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{Address, BatchId, Fingerprint, RequestId};

/// Central error enum for all SealBid operations.
#[derive(Debug, Error)]
pub enum SealbidError {
    // =================================================================
    // Authorization (1xx)
    // =================================================================
    /// The caller is not the current owner.
    #[error("SB_ERR_100: Caller {0} is not the owner")]
    NotOwner(Address),

    /// The caller is not a registered bid provider.
    #[error("SB_ERR_101: Caller {0} is not a provider")]
    NotProvider(Address),

    // =================================================================
    // Availability / Throttling (2xx)
    // =================================================================
    /// The engine is paused.
    #[error("SB_ERR_200: Engine is paused")]
    Paused,

    /// `pause` was called while already paused.
    #[error("SB_ERR_201: Engine is already paused")]
    AlreadyPaused,

    /// `unpause` was called while not paused.
    #[error("SB_ERR_202: Engine is not paused")]
    NotPaused,

    /// The caller acted again before its cooldown window elapsed.
    #[error("SB_ERR_203: Cooldown active for {caller} until {ready_at}")]
    CooldownActive {
        caller: Address,
        ready_at: DateTime<Utc>,
    },

    // =================================================================
    // Batch Lifecycle (3xx)
    // =================================================================
    /// The operation needs an open batch.
    #[error("SB_ERR_300: Batch {0} is not open")]
    BatchNotOpen(BatchId),

    /// The tournament needs at least one bid.
    #[error("SB_ERR_301: No bids in {0}")]
    NoBidsInBatch(BatchId),

    /// The batch reached its configured bid capacity.
    #[error("SB_ERR_302: Batch {batch_id} is full ({capacity} bids)")]
    BatchFull { batch_id: BatchId, capacity: usize },

    /// A decryption for the current batch is still awaiting its callback.
    #[error("SB_ERR_303: Decryption {request_id} for {batch_id} still in flight")]
    DecryptionInFlight {
        batch_id: BatchId,
        request_id: RequestId,
    },

    // =================================================================
    // Input Validation (4xx)
    // =================================================================
    /// The submitted bid was rejected (e.g. uninitialized ciphertext).
    #[error("SB_ERR_400: Bid submission failed: {reason}")]
    BidSubmissionFailed { reason: String },

    /// The zero address was supplied where a real account is required.
    #[error("SB_ERR_401: Zero address not allowed")]
    ZeroAddress,

    // =================================================================
    // Integrity (5xx)
    // =================================================================
    /// The callback for this request was already processed.
    #[error("SB_ERR_500: Replay attempt for {0}")]
    ReplayAttempt(RequestId),

    /// The ledger changed between request and callback.
    #[error("SB_ERR_501: State mismatch for {request_id}: {reason}")]
    StateMismatch {
        request_id: RequestId,
        reason: String,
    },

    /// The oracle's proof over the cleartexts did not verify.
    #[error("SB_ERR_502: Invalid decryption proof: {0}")]
    InvalidProof(#[from] VerificationError),

    /// The cleartext payload could not be decoded.
    #[error("SB_ERR_503: Malformed cleartexts: {reason}")]
    MalformedCleartexts { reason: String },

    /// No decryption context exists for this request id.
    #[error("SB_ERR_504: Unknown decryption request {0}")]
    UnknownRequest(RequestId),

    // =================================================================
    // Decryption Oracle (6xx)
    // =================================================================
    /// The oracle refused or failed to accept a decryption request.
    #[error("SB_ERR_600: Decryption oracle unavailable: {reason}")]
    OracleUnavailable { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SB_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("SB_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("SB_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("SB_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Failure verifying an oracle proof over decrypted cleartexts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("proof length {0} is not a multiple of the signature size")]
    MalformedProof(usize),

    #[error("{valid} valid signatures, threshold is {threshold}")]
    BelowThreshold { valid: usize, threshold: usize },

    #[error("oracle has no record of {0}")]
    UnknownRequest(RequestId),
}

impl SealbidError {
    /// Whether this error belongs to the integrity class. Integrity failures
    /// are terminal for the request that raised them.
    #[must_use]
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            Self::StateMismatch { .. } | Self::InvalidProof(_) | Self::MalformedCleartexts { .. }
        )
    }

    /// Build a [`SealbidError::StateMismatch`] for two fingerprints.
    #[must_use]
    pub fn fingerprint_mismatch(
        request_id: RequestId,
        committed: &Fingerprint,
        recomputed: &Fingerprint,
    ) -> Self {
        Self::StateMismatch {
            request_id,
            reason: format!("committed {committed}, recomputed {recomputed}"),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SealbidError>;

impl From<std::io::Error> for SealbidError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SealbidError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
