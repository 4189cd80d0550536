//! # sealbid-ingress
//!
//! **Intake plane**: access control, throttling, the encrypted bid ledger
//! and the batch lifecycle.
//!
//! ## Architecture
//!
//! 1. **GovernanceState**: owner, providers, pause switch, cooldown windows
//! 2. **BidLedger**: append-only encrypted bids for the current batch
//! 3. **BatchManager**: opens and closes batches, gates submissions
//!
//! ## Bid Flow
//!
//! ```text
//! provider → GovernanceState (pause, role, cooldown) → BatchManager.submit_bid()
//!          → BidLedger.push() → BidSubmitted(handle)
//! ```
//!
//! Amounts enter and stay encrypted; only ciphertext handles are logged.

pub mod batch_manager;
pub mod bid_ledger;
pub mod governance;

pub use batch_manager::BatchManager;
pub use bid_ledger::BidLedger;
pub use governance::{GovernanceState, ThrottledAction};
