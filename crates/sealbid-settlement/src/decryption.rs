//! Decryption contexts and the replay guard.
//!
//! Each decryption request gets a [`DecryptionContext`] keyed by the
//! oracle's request id. A context leaves `Requested` exactly once:
//!
//! ```text
//!   ┌───────────┐  verified callback  ┌─────────┐
//!   │ REQUESTED ├────────────────────▶│ SETTLED │
//!   └─────┬─────┘                     └─────────┘
//!         │ integrity failure
//!         ▼
//!   ┌──────────┐
//!   │ REJECTED │
//!   └──────────┘
//! ```
//!
//! Any callback for a context that already left `Requested` is a replay.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use sealbid_types::{BatchId, Fingerprint, RequestId, Result, SealbidError};
use serde::{Deserialize, Serialize};

/// Lifecycle of one decryption request. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecryptionStatus {
    /// Awaiting the oracle's callback.
    Requested,
    /// The callback verified and the settlement was emitted.
    Settled,
    /// The callback failed an integrity check. A fresh request is required.
    Rejected,
}

impl DecryptionStatus {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Requested, Self::Settled | Self::Rejected))
    }
}

impl std::fmt::Display for DecryptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requested => write!(f, "REQUESTED"),
            Self::Settled => write!(f, "SETTLED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// What was committed when decryption was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionContext {
    pub batch_id: BatchId,
    pub fingerprint: Fingerprint,
    pub status: DecryptionStatus,
    pub requested_at: DateTime<Utc>,
}

impl DecryptionContext {
    #[must_use]
    pub fn new(batch_id: BatchId, fingerprint: Fingerprint, requested_at: DateTime<Utc>) -> Self {
        Self {
            batch_id,
            fingerprint,
            status: DecryptionStatus::Requested,
            requested_at,
        }
    }

    /// Whether a callback has already been consumed for this request.
    #[must_use]
    pub fn processed(&self) -> bool {
        self.status != DecryptionStatus::Requested
    }
}

/// A callback payload delivered by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionResponse {
    pub request_id: RequestId,
    pub cleartexts: Vec<u8>,
    pub proof: Vec<u8>,
}

/// All decryption contexts, keyed by request id.
///
/// Contexts are never removed, since the replay guard must remember every
/// id. Unresolved requests are also indexed per batch.
#[derive(Debug, Default)]
pub struct DecryptionRegistry {
    contexts: HashMap<RequestId, DecryptionContext>,
    in_flight: HashMap<BatchId, BTreeSet<RequestId>>,
}

impl DecryptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly issued request.
    ///
    /// # Errors
    /// `Internal` if the oracle reused a request id.
    pub fn register(&mut self, request_id: RequestId, context: DecryptionContext) -> Result<()> {
        if self.contexts.contains_key(&request_id) {
            return Err(SealbidError::Internal(format!(
                "oracle issued duplicate {request_id}"
            )));
        }
        self.in_flight
            .entry(context.batch_id)
            .or_default()
            .insert(request_id);
        self.contexts.insert(request_id, context);
        Ok(())
    }

    /// Look up the context a callback refers to, rejecting replays.
    ///
    /// # Errors
    /// - `UnknownRequest` if no context exists
    /// - `ReplayAttempt` if the context was already processed
    pub fn begin_callback(&self, request_id: RequestId) -> Result<&DecryptionContext> {
        let ctx = self
            .contexts
            .get(&request_id)
            .ok_or(SealbidError::UnknownRequest(request_id))?;
        if ctx.processed() {
            return Err(SealbidError::ReplayAttempt(request_id));
        }
        Ok(ctx)
    }

    pub fn mark_settled(&mut self, request_id: RequestId) -> Result<()> {
        self.transition(request_id, DecryptionStatus::Settled)
    }

    pub fn mark_rejected(&mut self, request_id: RequestId) -> Result<()> {
        self.transition(request_id, DecryptionStatus::Rejected)
    }

    fn transition(&mut self, request_id: RequestId, target: DecryptionStatus) -> Result<()> {
        let ctx = self
            .contexts
            .get_mut(&request_id)
            .ok_or(SealbidError::UnknownRequest(request_id))?;
        if !ctx.status.can_transition_to(target) {
            return Err(SealbidError::ReplayAttempt(request_id));
        }
        ctx.status = target;
        let batch_id = ctx.batch_id;
        if let Some(pending) = self.in_flight.get_mut(&batch_id) {
            pending.remove(&request_id);
            if pending.is_empty() {
                self.in_flight.remove(&batch_id);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, request_id: &RequestId) -> Option<&DecryptionContext> {
        self.contexts.get(request_id)
    }

    /// The oldest request for `batch_id` still awaiting its callback.
    #[must_use]
    pub fn in_flight_for(&self, batch_id: BatchId) -> Option<RequestId> {
        self.in_flight
            .get(&batch_id)
            .and_then(|pending| pending.first().copied())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
