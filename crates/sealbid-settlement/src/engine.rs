//! The settlement engine: one serialized state machine over governance, the
//! current batch and the decryption registry.
//!
//! Every public operation runs to completion against `&mut self`. The only
//! asynchronous edge is the oracle callback, which arrives through
//! [`SettlementEngine::on_decryption`] at an arbitrary later point.
//!
//! ## Request / callback
//!
//! ```text
//! find_highest_bidder:  tournament(ledger) → handles → fingerprint
//!                       → oracle.request_decryption → REQUESTED
//!
//! on_decryption:        replay guard → tournament(ledger now) → fingerprint
//!                       == committed? → oracle.verify_proof → decode
//!                       → SETTLED + AuctionSettled
//! ```
//!
//! Any integrity failure on the callback moves the request to REJECTED; a
//! fresh `find_highest_bidder` is needed to settle that batch.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sealbid_ingress::{BatchManager, GovernanceState, ThrottledAction};
use sealbid_tournament::{compute_fingerprint, run_tournament, verify_fingerprint};
use sealbid_types::{
    Address, AuctionEvent, BatchId, CiphertextHandle, DecryptionOracle, EngineConfig, FheBackend,
    RequestId, Result, SealbidError,
};
use serde::{Deserialize, Serialize};

use crate::{
    cleartext::SettlementCleartexts,
    decryption::{DecryptionContext, DecryptionRegistry, DecryptionStatus},
};

/// The public outcome of a verified callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub request_id: RequestId,
    pub batch_id: BatchId,
    pub winner: Address,
    pub winning_amount: u64,
}

/// Sealed-bid batch auction engine over an FHE backend `B` and a decryption
/// oracle `O`.
pub struct SettlementEngine<B: FheBackend, O: DecryptionOracle> {
    config: EngineConfig,
    backend: B,
    oracle: O,
    governance: GovernanceState,
    batches: BatchManager<B::Uint>,
    registry: DecryptionRegistry,
    events: Vec<AuctionEvent>,
}

impl<B: FheBackend, O: DecryptionOracle> SettlementEngine<B, O> {
    /// Create an engine owned by `owner`.
    ///
    /// # Errors
    /// - `Configuration` if `config` does not validate
    /// - `ZeroAddress` if `owner` is the zero address
    pub fn new(config: EngineConfig, owner: Address, backend: B, oracle: O) -> Result<Self> {
        config.validate()?;
        let governance = GovernanceState::from_config(owner, &config)?;
        let batches = BatchManager::from_config(&config);
        tracing::info!(
            owner = %owner,
            contract = %config.contract_identity,
            max_bids = config.max_bids_per_batch,
            exclusive_decryption = config.exclusive_decryption,
            "Settlement engine created"
        );
        Ok(Self {
            config,
            backend,
            oracle,
            governance,
            batches,
            registry: DecryptionRegistry::new(),
            events: Vec::new(),
        })
    }

    // ── Governance ──────────────────────────────────────────────────

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<()> {
        let event = self.governance.transfer_ownership(caller, new_owner)?;
        self.emit(event);
        Ok(())
    }

    /// Grant the provider role. A no-op for an existing provider.
    pub fn add_provider(&mut self, caller: Address, provider: Address) -> Result<()> {
        if let Some(event) = self.governance.add_provider(caller, provider)? {
            self.emit(event);
        }
        Ok(())
    }

    /// Revoke the provider role. A no-op for a non-provider.
    pub fn remove_provider(&mut self, caller: Address, provider: Address) -> Result<()> {
        if let Some(event) = self.governance.remove_provider(caller, provider)? {
            self.emit(event);
        }
        Ok(())
    }

    pub fn pause(&mut self, caller: Address) -> Result<()> {
        let event = self.governance.pause(caller)?;
        self.emit(event);
        Ok(())
    }

    pub fn unpause(&mut self, caller: Address) -> Result<()> {
        let event = self.governance.unpause(caller)?;
        self.emit(event);
        Ok(())
    }

    pub fn set_cooldowns(&mut self, caller: Address, submit: Duration, decryption: Duration) -> Result<()> {
        let event = self.governance.set_cooldowns(caller, submit, decryption)?;
        self.emit(event);
        Ok(())
    }

    // ── Batch lifecycle ─────────────────────────────────────────────

    pub fn open_batch(&mut self, caller: Address) -> Result<BatchId> {
        let event = self.batches.open_batch(&self.governance, caller)?;
        self.emit(event);
        Ok(self.batches.current_batch())
    }

    pub fn close_batch(&mut self, caller: Address) -> Result<BatchId> {
        let event = self.batches.close_batch(&self.governance, caller)?;
        self.emit(event);
        Ok(self.batches.current_batch())
    }

    /// Append an encrypted bid to the current batch. Returns the stored
    /// ciphertext handle.
    pub fn submit_bid(&mut self, caller: Address, amount: B::Uint, now: DateTime<Utc>) -> Result<CiphertextHandle> {
        let handle = self.backend.uint_handle(&amount);
        let event = self
            .batches
            .submit_bid(&self.backend, &mut self.governance, caller, amount, now)?;
        self.emit(event);
        Ok(handle)
    }

    // ── Decryption protocol ─────────────────────────────────────────

    /// Run the tournament over the current ledger and ask the oracle to
    /// decrypt `[max, winner]`.
    ///
    /// Checks pause, owner, decryption cooldown, a non-empty ledger and
    /// (when `exclusive_decryption` is set) that no request for this batch
    /// is still in flight. The oracle is called before any state is
    /// written, so a refused request leaves no context and no cooldown.
    ///
    /// # Errors
    /// - `Paused`, `NotOwner`, `CooldownActive`
    /// - `NoBidsInBatch` if the current ledger is empty
    /// - `DecryptionInFlight` if an earlier request is unresolved
    /// - `OracleUnavailable` if the oracle refuses the request
    pub fn find_highest_bidder(&mut self, caller: Address, now: DateTime<Utc>) -> Result<RequestId> {
        self.governance.ensure_not_paused()?;
        self.governance.ensure_owner(caller)?;
        self.governance
            .check_cooldown(ThrottledAction::RequestDecryption, caller, now)?;

        let batch_id = self.batches.current_batch();
        if self.batches.bids().is_empty() {
            return Err(SealbidError::NoBidsInBatch(batch_id));
        }
        if self.config.exclusive_decryption {
            if let Some(request_id) = self.registry.in_flight_for(batch_id) {
                return Err(SealbidError::DecryptionInFlight { batch_id, request_id });
            }
        }

        let handles = self.tournament_handles(batch_id)?;
        let fingerprint = compute_fingerprint(&self.config.contract_identity, &handles);
        let request_id = self.oracle.request_decryption(&handles)?;

        self.registry
            .register(request_id, DecryptionContext::new(batch_id, fingerprint, now))?;
        self.governance
            .record_action(ThrottledAction::RequestDecryption, caller, now);

        self.emit(AuctionEvent::DecryptionRequested {
            request_id,
            batch_id,
            fingerprint,
        });
        Ok(request_id)
    }

    /// Oracle callback for `request_id`.
    ///
    /// Re-runs the tournament over the ledger as it is now and compares the
    /// fingerprint with the one committed at request time before trusting
    /// the proof. Not gated by the pause switch: an in-flight request can
    /// still settle while the engine is paused.
    ///
    /// # Errors
    /// - `UnknownRequest` if no such request was issued
    /// - `ReplayAttempt` if the request already settled or was rejected
    /// - `StateMismatch` if the batch or its ledger changed since the request
    /// - `InvalidProof` if the KMS proof does not verify
    /// - `MalformedCleartexts` if the payload does not decode
    ///
    /// The last three reject the request permanently.
    pub fn on_decryption(&mut self, request_id: RequestId, cleartexts: &[u8], proof: &[u8]) -> Result<Settlement> {
        let context = self.registry.begin_callback(request_id)?.clone();

        let decoded = match self.verify_callback(request_id, &context, cleartexts, proof) {
            Ok(decoded) => decoded,
            Err(err) => {
                if err.is_integrity_failure() {
                    self.registry.mark_rejected(request_id)?;
                    tracing::warn!(
                        request = %request_id,
                        batch = context.batch_id.0,
                        error = %err,
                        "Decryption callback rejected"
                    );
                }
                return Err(err);
            }
        };

        self.registry.mark_settled(request_id)?;
        let settlement = Settlement {
            request_id,
            batch_id: context.batch_id,
            winner: decoded.winner,
            winning_amount: decoded.winning_amount,
        };
        self.emit(AuctionEvent::AuctionSettled {
            request_id,
            batch_id: settlement.batch_id,
            winner: settlement.winner,
            winning_amount: settlement.winning_amount,
        });
        Ok(settlement)
    }

    fn verify_callback(
        &self,
        request_id: RequestId,
        context: &DecryptionContext,
        cleartexts: &[u8],
        proof: &[u8],
    ) -> Result<SettlementCleartexts> {
        let current = self.batches.current_batch();
        if context.batch_id != current {
            return Err(SealbidError::StateMismatch {
                request_id,
                reason: format!("requested for {}, current is {current}", context.batch_id),
            });
        }
        if self.batches.bids().is_empty() {
            return Err(SealbidError::StateMismatch {
                request_id,
                reason: format!("ledger of {current} is empty"),
            });
        }

        let handles = self.tournament_handles(current)?;
        let contract = &self.config.contract_identity;
        if !verify_fingerprint(contract, &handles, &context.fingerprint) {
            return Err(SealbidError::fingerprint_mismatch(
                request_id,
                &context.fingerprint,
                &compute_fingerprint(contract, &handles),
            ));
        }

        self.oracle.verify_proof(request_id, cleartexts, proof)?;
        SettlementCleartexts::decode(cleartexts)
    }

    fn tournament_handles(&self, batch_id: BatchId) -> Result<[CiphertextHandle; 2]> {
        let outcome = run_tournament(&self.backend, batch_id, self.batches.bids())?;
        Ok(outcome.handles(&self.backend))
    }

    fn emit(&mut self, event: AuctionEvent) {
        tracing::info!(?event, "{}", event.name());
        self.events.push(event);
    }

    // ── Queries ─────────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    #[must_use]
    pub fn governance(&self) -> &GovernanceState {
        &self.governance
    }

    #[must_use]
    pub fn current_batch(&self) -> BatchId {
        self.batches.current_batch()
    }

    #[must_use]
    pub fn is_batch_open(&self) -> bool {
        self.batches.is_open()
    }

    #[must_use]
    pub fn bid_count(&self) -> usize {
        self.batches.bids().len()
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.governance.owner()
    }

    #[must_use]
    pub fn is_provider(&self, address: &Address) -> bool {
        self.governance.is_provider(address)
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.governance.is_paused()
    }

    #[must_use]
    pub fn decryption_status(&self, request_id: &RequestId) -> Option<DecryptionStatus> {
        self.registry.get(request_id).map(|ctx| ctx.status)
    }

    /// Events emitted since the last drain.
    #[must_use]
    pub fn events(&self) -> &[AuctionEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<AuctionEvent> {
        std::mem::take(&mut self.events)
    }
}
