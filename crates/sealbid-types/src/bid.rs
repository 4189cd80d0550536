//! The encrypted bid record stored in the ledger.

use crate::Address;

/// One sealed bid: a public bidder identity and an encrypted amount.
///
/// Immutable once stored. `C` is the backend's encrypted-integer type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bid<C> {
    pub bidder: Address,
    pub amount: C,
}

impl<C> Bid<C> {
    #[must_use]
    pub fn new(bidder: Address, amount: C) -> Self {
        Self { bidder, amount }
    }
}
