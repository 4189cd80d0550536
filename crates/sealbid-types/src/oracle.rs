//! The asynchronous decryption oracle consumed by the settlement protocol.

use crate::{CiphertextHandle, RequestId, Result, VerificationError};

/// External threshold-decryption service.
///
/// `request_decryption` returns immediately with a request id. The oracle
/// later delivers `(request_id, cleartexts, proof)` to the engine's callback
/// out of band; the engine then asks the oracle to verify that proof.
pub trait DecryptionOracle {
    /// Queue decryption of `handles`, in order.
    fn request_decryption(&mut self, handles: &[CiphertextHandle]) -> Result<RequestId>;

    /// Check the oracle's proof that `cleartexts` is the decryption of the
    /// handles submitted under `request_id`.
    fn verify_proof(
        &self,
        request_id: RequestId,
        cleartexts: &[u8],
        proof: &[u8],
    ) -> std::result::Result<(), VerificationError>;
}
