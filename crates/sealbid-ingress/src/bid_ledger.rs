//! Append-only ledger of encrypted bids for the current batch.
//!
//! Bids are kept in arrival order; the tournament is order-sensitive, so the
//! ledger never reorders. Opening a new batch resets the ledger.

use sealbid_types::{BatchId, Bid, Result, SealbidError, constants};

/// Encrypted bids for one batch, in arrival order.
#[derive(Debug, Clone)]
pub struct BidLedger<C> {
    /// The batch these bids belong to.
    batch_id: BatchId,
    bids: Vec<Bid<C>>,
    /// Maximum number of bids before the ledger is full.
    capacity: usize,
}

impl<C> BidLedger<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(constants::DEFAULT_MAX_BIDS_PER_BATCH)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            batch_id: BatchId(0),
            bids: Vec::new(),
            capacity,
        }
    }

    /// Append a bid.
    ///
    /// # Errors
    /// `BatchFull` if the ledger is at capacity.
    pub fn push(&mut self, bid: Bid<C>) -> Result<()> {
        if self.bids.len() >= self.capacity {
            return Err(SealbidError::BatchFull {
                batch_id: self.batch_id,
                capacity: self.capacity,
            });
        }
        self.bids.push(bid);
        Ok(())
    }

    #[must_use]
    pub fn bids(&self) -> &[Bid<C>] {
        &self.bids
    }

    #[must_use]
    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.bids.len() >= self.capacity
    }

    /// Discard every bid and rebind the ledger to `batch_id`.
    pub fn reset(&mut self, batch_id: BatchId) {
        self.bids.clear();
        self.batch_id = batch_id;
    }
}

impl<C> Default for BidLedger<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use sealbid_types::Address;

    use super::*;

    fn bid(who: u8, amount: u64) -> Bid<u64> {
        Bid::new(Address::repeat_byte(who), amount)
    }

    #[test]
    fn push_keeps_arrival_order() {
        let mut ledger = BidLedger::new();
        ledger.push(bid(1, 30)).unwrap();
        ledger.push(bid(2, 10)).unwrap();
        ledger.push(bid(3, 20)).unwrap();
        let amounts: Vec<u64> = ledger.bids().iter().map(|b| b.amount).collect();
        assert_eq!(amounts, vec![30, 10, 20]);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn ledger_full() {
        let mut ledger = BidLedger::with_capacity(2);
        ledger.reset(BatchId(5));
        ledger.push(bid(1, 1)).unwrap();
        ledger.push(bid(2, 2)).unwrap();
        assert!(ledger.is_full());
        let err = ledger.push(bid(3, 3)).unwrap_err();
        assert!(matches!(
            err,
            SealbidError::BatchFull {
                batch_id: BatchId(5),
                capacity: 2
            }
        ));
    }

    #[test]
    fn reset_clears_and_rebinds() {
        let mut ledger = BidLedger::new();
        ledger.push(bid(1, 1)).unwrap();
        ledger.reset(BatchId(2));
        assert!(ledger.is_empty());
        assert_eq!(ledger.batch_id(), BatchId(2));
        ledger.push(bid(1, 1)).unwrap();
    }
}
