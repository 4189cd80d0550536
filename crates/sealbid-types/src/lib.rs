//! # sealbid-types
//!
//! Shared types, errors, and configuration for the **SealBid** confidential
//! batch-auction settlement engine.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`BatchId`], [`RequestId`], [`CiphertextHandle`], [`Fingerprint`]
//! - **Bids**: [`Bid`], a bidder plus an encrypted amount
//! - **Capabilities**: [`FheBackend`] (encrypted compare/select) and [`DecryptionOracle`]
//! - **Events**: [`AuctionEvent`], the engine's observable output
//! - **Configuration**: [`EngineConfig`], [`KmsConfig`]
//! - **Errors**: [`SealbidError`] with `SB_ERR_` prefix codes, [`VerificationError`]
//! - **Constants**: system-wide limits and defaults
//!
//! With the `simulation` feature, [`mock`] provides a deterministic
//! in-process FHE backend.

pub mod bid;
pub mod cipher;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
#[cfg(any(test, feature = "simulation"))]
pub mod mock;
pub mod oracle;

pub use bid::*;
pub use cipher::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use oracle::*;

// Constants are accessed via `sealbid_types::constants::FOO`
// (not re-exported to avoid name collisions).
