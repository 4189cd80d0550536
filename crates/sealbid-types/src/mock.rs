//! Deterministic in-process FHE backend for tests and local simulation.
//!
//! Ciphertexts are bare handles. Plaintexts live in a shared [`MockKeystore`]
//! that stands in for the key holders: only code given the keystore (the
//! simulated oracle, test assertions) can read them.

use std::{
    collections::HashMap,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use sha2::{Digest, Sha256};

use crate::{Address, CiphertextHandle, FheBackend};

/// A decrypted value as held by the keystore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plaintext {
    Uint(u64),
    Bool(bool),
    Identity(Address),
}

/// Handle → plaintext table shared between the backend and the oracle.
#[derive(Debug, Clone, Default)]
pub struct MockKeystore {
    inner: Arc<RwLock<HashMap<CiphertextHandle, Plaintext>>>,
}

impl MockKeystore {
    #[must_use]
    pub fn plaintext(&self, handle: &CiphertextHandle) -> Option<Plaintext> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(handle)
            .copied()
    }

    fn insert(&self, handle: CiphertextHandle, value: Plaintext) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockUint(pub CiphertextHandle);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockBool(pub CiphertextHandle);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockIdentity(pub CiphertextHandle);

/// Mock coprocessor with real comparisons over keystore plaintexts.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    keystore: MockKeystore,
    input_nonce: Arc<AtomicU64>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The keystore backing this backend's ciphertexts.
    #[must_use]
    pub fn keystore(&self) -> MockKeystore {
        self.keystore.clone()
    }

    /// Client-side encryption of a fresh bid amount. Every call yields a new
    /// handle, even for equal amounts.
    #[must_use]
    pub fn encrypt_u64(&self, value: u64) -> MockUint {
        let nonce = self.input_nonce.fetch_add(1, Ordering::Relaxed);
        let handle = derive_handle(b"input", &[&nonce.to_le_bytes(), &value.to_le_bytes()]);
        self.keystore.insert(handle, Plaintext::Uint(value));
        MockUint(handle)
    }

    /// A ciphertext that was never initialized.
    #[must_use]
    pub fn uninitialized() -> MockUint {
        MockUint(CiphertextHandle::UNINITIALIZED)
    }

    #[must_use]
    pub fn decrypt_u64(&self, value: &MockUint) -> Option<u64> {
        match self.keystore.plaintext(&value.0)? {
            Plaintext::Uint(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn decrypt_identity(&self, value: &MockIdentity) -> Option<Address> {
        match self.keystore.plaintext(&value.0)? {
            Plaintext::Identity(a) => Some(a),
            _ => None,
        }
    }

    fn uint(&self, handle: &CiphertextHandle) -> u64 {
        match self.keystore.plaintext(handle) {
            Some(Plaintext::Uint(v)) => v,
            _ => 0,
        }
    }

    fn flag(&self, handle: &CiphertextHandle) -> bool {
        matches!(self.keystore.plaintext(handle), Some(Plaintext::Bool(true)))
    }
}

impl FheBackend for MockBackend {
    type Uint = MockUint;
    type Bool = MockBool;
    type Identity = MockIdentity;

    fn ge(&self, a: &MockUint, b: &MockUint) -> MockBool {
        let handle = derive_handle(b"ge", &[a.0.as_bytes(), b.0.as_bytes()]);
        self.keystore
            .insert(handle, Plaintext::Bool(self.uint(&a.0) >= self.uint(&b.0)));
        MockBool(handle)
    }

    fn select(&self, cond: &MockBool, if_true: &MockUint, if_false: &MockUint) -> MockUint {
        let handle = derive_handle(
            b"select",
            &[cond.0.as_bytes(), if_true.0.as_bytes(), if_false.0.as_bytes()],
        );
        let chosen = if self.flag(&cond.0) { if_true } else { if_false };
        self.keystore.insert(handle, Plaintext::Uint(self.uint(&chosen.0)));
        MockUint(handle)
    }

    fn select_identity(
        &self,
        cond: &MockBool,
        if_true: &MockIdentity,
        if_false: &MockIdentity,
    ) -> MockIdentity {
        let handle = derive_handle(
            b"select_identity",
            &[cond.0.as_bytes(), if_true.0.as_bytes(), if_false.0.as_bytes()],
        );
        let chosen = if self.flag(&cond.0) { if_true } else { if_false };
        if let Some(plain) = self.keystore.plaintext(&chosen.0) {
            self.keystore.insert(handle, plain);
        }
        MockIdentity(handle)
    }

    fn encrypt_identity(&self, address: Address) -> MockIdentity {
        let handle = derive_handle(b"identity", &[address.as_bytes()]);
        self.keystore.insert(handle, Plaintext::Identity(address));
        MockIdentity(handle)
    }

    fn is_initialized(&self, value: &MockUint) -> bool {
        value.0.is_initialized() && self.keystore.plaintext(&value.0).is_some()
    }

    fn uint_handle(&self, value: &MockUint) -> CiphertextHandle {
        value.0
    }

    fn identity_handle(&self, value: &MockIdentity) -> CiphertextHandle {
        value.0
    }
}

fn derive_handle(op: &[u8], operands: &[&[u8]]) -> CiphertextHandle {
    let mut hasher = Sha256::new();
    hasher.update(b"sealbid:mock:");
    hasher.update(op);
    for operand in operands {
        hasher.update(operand);
    }
    CiphertextHandle(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_inputs_get_distinct_handles() {
        let fhe = MockBackend::new();
        let a = fhe.encrypt_u64(5);
        let b = fhe.encrypt_u64(5);
        assert_ne!(a, b);
        assert_eq!(fhe.decrypt_u64(&a), Some(5));
    }

    #[test]
    fn ge_and_select_compute_on_plaintexts() {
        let fhe = MockBackend::new();
        let small = fhe.encrypt_u64(3);
        let big = fhe.encrypt_u64(8);

        let cond = fhe.ge(&big, &small);
        assert_eq!(fhe.keystore().plaintext(&cond.0), Some(Plaintext::Bool(true)));

        let picked = fhe.select(&cond, &big, &small);
        assert_eq!(fhe.decrypt_u64(&picked), Some(8));

        let cond = fhe.ge(&small, &big);
        let picked = fhe.select(&cond, &small, &big);
        assert_eq!(fhe.decrypt_u64(&picked), Some(8));
    }

    #[test]
    fn derived_handles_are_deterministic() {
        let fhe = MockBackend::new();
        let a = fhe.encrypt_u64(1);
        let b = fhe.encrypt_u64(2);
        assert_eq!(fhe.ge(&a, &b), fhe.ge(&a, &b));
        let cond = fhe.ge(&a, &b);
        assert_eq!(fhe.select(&cond, &a, &b), fhe.select(&cond, &a, &b));
        assert_ne!(fhe.ge(&a, &b), fhe.ge(&b, &a));
    }

    #[test]
    fn identity_selection() {
        let fhe = MockBackend::new();
        let alice = fhe.encrypt_identity(Address::repeat_byte(0xa1));
        let bob = fhe.encrypt_identity(Address::repeat_byte(0xb0));
        let cond = fhe.ge(&fhe.encrypt_u64(1), &fhe.encrypt_u64(2));
        let chosen = fhe.select_identity(&cond, &alice, &bob);
        assert_eq!(fhe.decrypt_identity(&chosen), Some(Address::repeat_byte(0xb0)));
    }

    #[test]
    fn uninitialized_is_rejected() {
        let fhe = MockBackend::new();
        assert!(!fhe.is_initialized(&MockBackend::uninitialized()));
        assert!(!fhe.is_initialized(&MockUint(CiphertextHandle([9u8; 32]))));
        assert!(fhe.is_initialized(&fhe.encrypt_u64(0)));
    }
}
