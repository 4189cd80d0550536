//! # sealbid-settlement
//!
//! **Finality plane**: decryption requests, verified oracle callbacks and
//! the public settlement of each batch.
//!
//! ## Architecture
//!
//! [`SettlementEngine`] ties the intake plane (governance, batches, ledger)
//! to the tournament and the decryption oracle:
//! 1. Runs the tournament and commits a fingerprint of its output handles
//! 2. Requests decryption of `[max, winner]` from the oracle
//! 3. On callback, rejects replays, recomputes the fingerprint against the
//!    live ledger, verifies the KMS proof and decodes the cleartexts
//! 4. Emits `AuctionSettled`, the only event that reveals an amount
//!
//! ## Callback delivery
//!
//! Callbacks can be applied directly with
//! [`SettlementEngine::on_decryption`] or streamed through a
//! [`CallbackRelay`] task over a tokio channel.

pub mod cleartext;
pub mod decryption;
pub mod engine;
pub mod kms;
#[cfg(any(test, feature = "simulation"))]
pub mod local_oracle;
pub mod relay;

pub use cleartext::SettlementCleartexts;
pub use decryption::{DecryptionContext, DecryptionRegistry, DecryptionResponse, DecryptionStatus};
pub use engine::{Settlement, SettlementEngine};
pub use kms::{KmsVerifier, decryption_digest};
#[cfg(any(test, feature = "simulation"))]
pub use kms::KmsSigner;
#[cfg(any(test, feature = "simulation"))]
pub use local_oracle::LocalOracle;
pub use relay::{CallbackRelay, RelayReport, SharedEngine};
