//! Public events emitted by the settlement engine.
//!
//! Events are the engine's only observable output. Bid amounts never appear
//! in an event except for the winning amount in [`AuctionEvent::AuctionSettled`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Address, BatchId, CiphertextHandle, Fingerprint, RequestId};

/// Every event the engine can emit, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuctionEvent {
    BatchOpened {
        batch_id: BatchId,
    },
    BatchClosed {
        batch_id: BatchId,
    },
    /// Carries the ciphertext handle only, never the amount.
    BidSubmitted {
        bidder: Address,
        batch_id: BatchId,
        handle: CiphertextHandle,
    },
    DecryptionRequested {
        request_id: RequestId,
        batch_id: BatchId,
        fingerprint: Fingerprint,
    },
    /// The single point at which a bid amount becomes public.
    AuctionSettled {
        request_id: RequestId,
        batch_id: BatchId,
        winner: Address,
        winning_amount: u64,
    },
    OwnershipTransferred {
        previous: Address,
        new_owner: Address,
    },
    ProviderAdded {
        provider: Address,
    },
    ProviderRemoved {
        provider: Address,
    },
    Paused {
        by: Address,
    },
    Unpaused {
        by: Address,
    },
    CooldownsUpdated {
        submit: Duration,
        decryption: Duration,
    },
}

impl AuctionEvent {
    /// Short uppercase name, for log lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BatchOpened { .. } => "BATCH_OPENED",
            Self::BatchClosed { .. } => "BATCH_CLOSED",
            Self::BidSubmitted { .. } => "BID_SUBMITTED",
            Self::DecryptionRequested { .. } => "DECRYPTION_REQUESTED",
            Self::AuctionSettled { .. } => "AUCTION_SETTLED",
            Self::OwnershipTransferred { .. } => "OWNERSHIP_TRANSFERRED",
            Self::ProviderAdded { .. } => "PROVIDER_ADDED",
            Self::ProviderRemoved { .. } => "PROVIDER_REMOVED",
            Self::Paused { .. } => "PAUSED",
            Self::Unpaused { .. } => "UNPAUSED",
            Self::CooldownsUpdated { .. } => "COOLDOWNS_UPDATED",
        }
    }
}

impl std::fmt::Display for AuctionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names() {
        assert_eq!(
            AuctionEvent::BatchOpened { batch_id: BatchId(1) }.to_string(),
            "BATCH_OPENED"
        );
        assert_eq!(
            AuctionEvent::Paused {
                by: Address::repeat_byte(1)
            }
            .name(),
            "PAUSED"
        );
    }

    #[test]
    fn settled_event_json_shape() {
        let event = AuctionEvent::AuctionSettled {
            request_id: RequestId(7),
            batch_id: BatchId(2),
            winner: Address::repeat_byte(0xbb),
            winning_amount: 15,
        };
        let value: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "auction_settled");
        assert_eq!(value["winning_amount"], 15);
        assert_eq!(value["winner"], format!("0x{}", "bb".repeat(20)));

        let back: AuctionEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }
}
