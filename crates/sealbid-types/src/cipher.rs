//! The homomorphic-encryption capability consumed by the engine.
//!
//! Ciphertexts are capabilities, not values: the engine can compare, select,
//! check initialization and serialize them to handles, and nothing else.
//! Plaintext only ever leaves the backend through the decryption oracle.

use crate::{Address, CiphertextHandle};

/// An FHE coprocessor exposing the operations the tournament needs.
///
/// Implementations must derive result handles deterministically from the
/// operation and its operand handles. The settlement callback re-runs the
/// tournament and relies on an unchanged ledger producing identical handles.
pub trait FheBackend {
    /// Encrypted unsigned integer (a bid amount).
    type Uint: Clone;
    /// Encrypted boolean. Consumable only through the `select_*` operations.
    type Bool;
    /// Encrypted account identity.
    type Identity: Clone;

    /// Encrypted `a >= b`.
    fn ge(&self, a: &Self::Uint, b: &Self::Uint) -> Self::Bool;

    /// Oblivious `if cond { if_true } else { if_false }` over amounts.
    fn select(&self, cond: &Self::Bool, if_true: &Self::Uint, if_false: &Self::Uint)
    -> Self::Uint;

    /// Oblivious `if cond { if_true } else { if_false }` over identities.
    fn select_identity(
        &self,
        cond: &Self::Bool,
        if_true: &Self::Identity,
        if_false: &Self::Identity,
    ) -> Self::Identity;

    /// Trivially encrypt a public identity so it can take part in selects.
    fn encrypt_identity(&self, address: Address) -> Self::Identity;

    /// Whether `value` refers to a real ciphertext.
    fn is_initialized(&self, value: &Self::Uint) -> bool;

    fn uint_handle(&self, value: &Self::Uint) -> CiphertextHandle;

    fn identity_handle(&self, value: &Self::Identity) -> CiphertextHandle;
}
