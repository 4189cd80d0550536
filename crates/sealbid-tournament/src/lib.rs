//! # sealbid-tournament
//!
//! **Pure homomorphic tournament for SealBid.**
//!
//! The compute plane: takes a ledger of encrypted bids and produces an
//! encrypted maximum and winner without decrypting anything. It has:
//!
//! - **Zero side effects**: no ledger writes, no guards, no oracle calls
//! - **Deterministic output**: same ledger -> same result handles, which is
//!   what lets the settlement callback detect tampering by recomputation
//! - **Pinned tie-break**: last-seen wins among equal maxima

pub mod fingerprint;
pub mod tournament;

pub use fingerprint::{compute_fingerprint, verify_fingerprint};
pub use tournament::{TournamentOutcome, run_tournament};
