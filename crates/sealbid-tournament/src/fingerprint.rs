//! Result fingerprints for commit-then-verify settlement.
//!
//! The fingerprint is a SHA-256 hash over the contract identity and the
//! ordered ciphertext handles of a tournament result. It is committed when
//! decryption is requested and recomputed when the callback arrives; any
//! change to the ledger in between changes the handles and therefore the
//! fingerprint.

use sealbid_types::{Address, CiphertextHandle, Fingerprint, constants};
use sha2::{Digest, Sha256};

/// Compute the fingerprint of `handles` for this contract.
///
/// `SHA-256(domain || contract || count || handle_0 || ... || handle_n)`
#[must_use]
pub fn compute_fingerprint(contract: &Address, handles: &[CiphertextHandle]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(constants::FINGERPRINT_DOMAIN);
    hasher.update(contract.as_bytes());
    hasher.update((handles.len() as u64).to_le_bytes());
    for handle in handles {
        hasher.update(handle.as_bytes());
    }
    Fingerprint(hasher.finalize().into())
}

/// Recompute and compare against a committed fingerprint.
#[must_use]
pub fn verify_fingerprint(
    contract: &Address,
    handles: &[CiphertextHandle],
    expected: &Fingerprint,
) -> bool {
    compute_fingerprint(contract, handles) == *expected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(b: u8) -> CiphertextHandle {
        CiphertextHandle([b; 32])
    }

    #[test]
    fn same_input_same_fingerprint() {
        let contract = Address::repeat_byte(1);
        let a = compute_fingerprint(&contract, &[handle(1), handle(2)]);
        let b = compute_fingerprint(&contract, &[handle(1), handle(2)]);
        assert_eq!(a, b);
    }

    #[test]
    fn order_matters() {
        let contract = Address::repeat_byte(1);
        let ab = compute_fingerprint(&contract, &[handle(1), handle(2)]);
        let ba = compute_fingerprint(&contract, &[handle(2), handle(1)]);
        assert_ne!(ab, ba, "Order of handles must affect the fingerprint");
    }

    #[test]
    fn contract_identity_is_bound() {
        let handles = [handle(1), handle(2)];
        let a = compute_fingerprint(&Address::repeat_byte(1), &handles);
        let b = compute_fingerprint(&Address::repeat_byte(2), &handles);
        assert_ne!(a, b);
    }

    #[test]
    fn verify_correct_and_wrong() {
        let contract = Address::repeat_byte(9);
        let handles = [handle(3), handle(4)];
        let fp = compute_fingerprint(&contract, &handles);
        assert!(verify_fingerprint(&contract, &handles, &fp));
        assert!(!verify_fingerprint(&contract, &handles, &Fingerprint([0xab; 32])));
        assert!(!verify_fingerprint(&contract, &[handle(3)], &fp));
    }
}
