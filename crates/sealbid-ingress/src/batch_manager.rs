//! Batch lifecycle: Closed → Open → Closed → …
//!
//! The batch id increments only when a batch opens, and opening always
//! clears the ledger. Bids are accepted only while the current batch is
//! open.

use chrono::{DateTime, Utc};
use sealbid_types::{
    Address, AuctionEvent, BatchId, Bid, EngineConfig, FheBackend, Result, SealbidError,
};

use crate::{
    bid_ledger::BidLedger,
    governance::{GovernanceState, ThrottledAction},
};

/// Owns the current batch and its bid ledger.
#[derive(Debug, Clone)]
pub struct BatchManager<C> {
    current: BatchId,
    open: bool,
    ledger: BidLedger<C>,
}

impl<C> BatchManager<C> {
    /// A manager with no batch opened yet (`BatchId(0)`, closed).
    #[must_use]
    pub fn new(max_bids_per_batch: usize) -> Self {
        Self {
            current: BatchId(0),
            open: false,
            ledger: BidLedger::with_capacity(max_bids_per_batch),
        }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.max_bids_per_batch)
    }

    /// Start the next batch, discarding the previous batch's bids.
    ///
    /// Opening while a batch is still open closes it implicitly.
    pub fn open_batch(&mut self, gov: &GovernanceState, caller: Address) -> Result<AuctionEvent> {
        gov.ensure_not_paused()?;
        gov.ensure_owner(caller)?;

        let discarded = self.ledger.len();
        self.current = self.current.next();
        self.open = true;
        self.ledger.reset(self.current);

        tracing::info!(batch = self.current.0, discarded, "Batch opened");
        Ok(AuctionEvent::BatchOpened {
            batch_id: self.current,
        })
    }

    pub fn close_batch(&mut self, gov: &GovernanceState, caller: Address) -> Result<AuctionEvent> {
        gov.ensure_not_paused()?;
        gov.ensure_owner(caller)?;
        if !self.open {
            return Err(SealbidError::BatchNotOpen(self.current));
        }
        self.open = false;

        tracing::info!(batch = self.current.0, bids = self.ledger.len(), "Batch closed");
        Ok(AuctionEvent::BatchClosed {
            batch_id: self.current,
        })
    }

    /// Append an encrypted bid from provider `caller`.
    ///
    /// Checks pause, provider role, open batch, cooldown, ciphertext
    /// initialization and capacity, in that order. Nothing is written unless
    /// every check passes.
    pub fn submit_bid<B>(
        &mut self,
        backend: &B,
        gov: &mut GovernanceState,
        caller: Address,
        amount: C,
        now: DateTime<Utc>,
    ) -> Result<AuctionEvent>
    where
        B: FheBackend<Uint = C>,
    {
        gov.ensure_not_paused()?;
        gov.ensure_provider(caller)?;
        if !self.open {
            return Err(SealbidError::BatchNotOpen(self.current));
        }
        gov.check_cooldown(ThrottledAction::SubmitBid, caller, now)?;
        if !backend.is_initialized(&amount) {
            return Err(SealbidError::BidSubmissionFailed {
                reason: "ciphertext is not initialized".into(),
            });
        }

        let handle = backend.uint_handle(&amount);
        self.ledger.push(Bid::new(caller, amount))?;
        gov.record_action(ThrottledAction::SubmitBid, caller, now);

        tracing::info!(
            batch = self.current.0,
            bidder = %caller.short(),
            handle = %handle,
            position = self.ledger.len(),
            "Bid submitted"
        );
        Ok(AuctionEvent::BidSubmitted {
            bidder: caller,
            batch_id: self.current,
            handle,
        })
    }

    #[must_use]
    pub fn current_batch(&self) -> BatchId {
        self.current
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn bids(&self) -> &[Bid<C>] {
        self.ledger.bids()
    }

    #[must_use]
    pub fn ledger(&self) -> &BidLedger<C> {
        &self.ledger
    }
}
