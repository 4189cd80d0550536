//! The homomorphic max-finding tournament.
//!
//! A left-to-right fold over the ledger. Each challenger is compared against
//! the running maximum with an encrypted `>=`, and the same encrypted
//! condition obliviously selects both the new maximum and the new winner
//! identity. No value is decrypted and no branch depends on a ciphertext.
//!
//! Because the challenger wins on `>=`, equal amounts resolve to the bid
//! that appears **last** in the ledger.

use sealbid_types::{BatchId, Bid, CiphertextHandle, FheBackend, Result, SealbidError};

/// Encrypted result of one tournament run.
pub struct TournamentOutcome<B: FheBackend> {
    /// Encrypted maximum amount.
    pub max: B::Uint,
    /// Encrypted identity of the bidder holding `max`.
    pub winner: B::Identity,
    /// Number of bids folded.
    pub entrants: usize,
}

impl<B: FheBackend> TournamentOutcome<B> {
    /// Ordered handles submitted for decryption: `[max, winner]`.
    #[must_use]
    pub fn handles(&self, backend: &B) -> [CiphertextHandle; 2] {
        [
            backend.uint_handle(&self.max),
            backend.identity_handle(&self.winner),
        ]
    }
}

/// Run the tournament over `bids` in ledger order.
///
/// # Errors
/// [`SealbidError::NoBidsInBatch`] if `bids` is empty.
pub fn run_tournament<B: FheBackend>(
    backend: &B,
    batch_id: BatchId,
    bids: &[Bid<B::Uint>],
) -> Result<TournamentOutcome<B>> {
    let (first, rest) = bids
        .split_first()
        .ok_or(SealbidError::NoBidsInBatch(batch_id))?;

    let mut max = first.amount.clone();
    let mut winner = backend.encrypt_identity(first.bidder);

    for (round, bid) in rest.iter().enumerate() {
        let challenger_wins = backend.ge(&bid.amount, &max);
        let challenger = backend.encrypt_identity(bid.bidder);

        max = backend.select(&challenger_wins, &bid.amount, &max);
        winner = backend.select_identity(&challenger_wins, &challenger, &winner);

        tracing::debug!(
            batch = batch_id.0,
            round = round + 1,
            challenger = %bid.bidder.short(),
            max_handle = %backend.uint_handle(&max),
            "Tournament round folded"
        );
    }

    tracing::info!(
        batch = batch_id.0,
        entrants = bids.len(),
        max_handle = %backend.uint_handle(&max),
        winner_handle = %backend.identity_handle(&winner),
        "Tournament complete"
    );

    Ok(TournamentOutcome {
        max,
        winner,
        entrants: bids.len(),
    })
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use sealbid_types::{
        Address,
        mock::{MockBackend, MockUint},
    };

    use super::*;

    fn ledger(fhe: &MockBackend, entries: &[(u8, u64)]) -> Vec<Bid<MockUint>> {
        entries
            .iter()
            .map(|&(who, amount)| Bid::new(Address::repeat_byte(who), fhe.encrypt_u64(amount)))
            .collect()
    }

    fn decrypted(fhe: &MockBackend, outcome: &TournamentOutcome<MockBackend>) -> (u64, Address) {
        (
            fhe.decrypt_u64(&outcome.max).unwrap(),
            fhe.decrypt_identity(&outcome.winner).unwrap(),
        )
    }

    #[test]
    fn empty_ledger_rejected() {
        let fhe = MockBackend::new();
        let err = run_tournament(&fhe, BatchId(4), &[]).err().unwrap();
        assert!(matches!(err, SealbidError::NoBidsInBatch(BatchId(4))));
    }

    #[test]
    fn single_bid_wins() {
        let fhe = MockBackend::new();
        let bids = ledger(&fhe, &[(0xa, 42)]);
        let outcome = run_tournament(&fhe, BatchId(1), &bids).unwrap();
        assert_eq!(decrypted(&fhe, &outcome), (42, Address::repeat_byte(0xa)));
        assert_eq!(outcome.entrants, 1);
        // A lone bid is passed through untouched.
        assert_eq!(outcome.max, bids[0].amount);
    }

    #[test]
    fn finds_maximum_in_the_middle() {
        let fhe = MockBackend::new();
        let bids = ledger(&fhe, &[(0xa, 5), (0xb, 15), (0xc, 9)]);
        let outcome = run_tournament(&fhe, BatchId(1), &bids).unwrap();
        assert_eq!(decrypted(&fhe, &outcome), (15, Address::repeat_byte(0xb)));
    }

    #[test]
    fn ties_go_to_the_last_equal_bid() {
        let fhe = MockBackend::new();
        let bids = ledger(&fhe, &[(0xa, 10), (0xb, 20), (0xc, 20)]);
        let outcome = run_tournament(&fhe, BatchId(1), &bids).unwrap();
        assert_eq!(decrypted(&fhe, &outcome), (20, Address::repeat_byte(0xc)));
    }

    #[test]
    fn all_equal_bids_pick_the_last() {
        let fhe = MockBackend::new();
        let bids = ledger(&fhe, &[(0x1, 7), (0x2, 7), (0x3, 7), (0x4, 7)]);
        let outcome = run_tournament(&fhe, BatchId(1), &bids).unwrap();
        assert_eq!(decrypted(&fhe, &outcome), (7, Address::repeat_byte(0x4)));
    }

    #[test]
    fn earlier_higher_bid_survives_later_lower_ones() {
        let fhe = MockBackend::new();
        let bids = ledger(&fhe, &[(0x1, 99), (0x2, 3), (0x3, 98)]);
        let outcome = run_tournament(&fhe, BatchId(1), &bids).unwrap();
        assert_eq!(decrypted(&fhe, &outcome), (99, Address::repeat_byte(0x1)));
    }

    #[test]
    fn rerun_over_same_ledger_yields_same_handles() {
        let fhe = MockBackend::new();
        let bids = ledger(&fhe, &[(0xa, 5), (0xb, 15), (0xc, 9)]);
        let first = run_tournament(&fhe, BatchId(1), &bids).unwrap();
        let second = run_tournament(&fhe, BatchId(1), &bids).unwrap();
        assert_eq!(first.handles(&fhe), second.handles(&fhe));
    }

    #[test]
    fn matches_plaintext_maximum_on_random_ledgers() {
        let fhe = MockBackend::new();
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let len = rng.gen_range(1..20);
            let entries: Vec<(u8, u64)> = (0..len)
                .map(|i| (u8::try_from(i + 1).unwrap(), rng.gen_range(0..100)))
                .collect();
            let bids = ledger(&fhe, &entries);
            let outcome = run_tournament(&fhe, BatchId(1), &bids).unwrap();

            let true_max = entries.iter().map(|&(_, a)| a).max().unwrap();
            let last_holder = entries.iter().rev().find(|&&(_, a)| a == true_max).unwrap().0;
            assert_eq!(
                decrypted(&fhe, &outcome),
                (true_max, Address::repeat_byte(last_holder)),
                "ledger {entries:?}"
            );
        }
    }
}
