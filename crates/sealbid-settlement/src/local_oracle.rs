//! In-process decryption oracle for tests and local simulation.
//!
//! Requests queue up until [`LocalOracle::fulfil`] is called, which reads the
//! plaintexts from the mock keystore, encodes one word per handle and signs
//! the decryption digest with the local KMS keys. Clones share state, so a
//! driver can hold one clone while the engine owns another.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use sealbid_types::{
    CiphertextHandle, DecryptionOracle, RequestId, Result, SealbidError, VerificationError,
    mock::{MockKeystore, Plaintext},
};

use crate::{
    cleartext::{address_word, bool_word, uint_word},
    decryption::DecryptionResponse,
    kms::{KmsSigner, KmsVerifier, decryption_digest},
};

#[derive(Debug, Default)]
struct OracleState {
    next_id: u64,
    requests: HashMap<RequestId, Vec<CiphertextHandle>>,
    queue: VecDeque<RequestId>,
    offline: bool,
}

/// Local stand-in for the threshold decryption network.
#[derive(Debug, Clone)]
pub struct LocalOracle {
    state: Arc<Mutex<OracleState>>,
    keystore: MockKeystore,
    signer: Arc<KmsSigner>,
    verifier: KmsVerifier,
}

impl LocalOracle {
    /// An oracle with `signers` fresh KMS keys and the given threshold.
    pub fn new(keystore: MockKeystore, signers: usize, threshold: usize) -> Result<Self> {
        let signer = KmsSigner::generate(signers);
        let verifier = signer.verifier(threshold)?;
        Ok(Self::with_signer(keystore, signer, verifier))
    }

    /// An oracle signing with `signer` whose proofs are checked against
    /// `verifier`, which need not trust `signer`.
    #[must_use]
    pub fn with_signer(keystore: MockKeystore, signer: KmsSigner, verifier: KmsVerifier) -> Self {
        Self {
            state: Arc::default(),
            keystore,
            signer: Arc::new(signer),
            verifier,
        }
    }

    #[must_use]
    pub fn verifier(&self) -> &KmsVerifier {
        &self.verifier
    }

    /// Refuse new requests with `OracleUnavailable` while offline.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Requests not yet fulfilled, oldest first.
    #[must_use]
    pub fn pending(&self) -> Vec<RequestId> {
        self.lock().queue.iter().copied().collect()
    }

    /// Decrypt and sign the result of `request_id`.
    pub fn fulfil(&self, request_id: RequestId) -> Result<DecryptionResponse> {
        let handles = self.take_request(request_id)?;
        let mut cleartexts = Vec::with_capacity(handles.len() * 32);
        for handle in &handles {
            let word = match self.keystore.plaintext(handle) {
                Some(Plaintext::Uint(v)) => uint_word(v),
                Some(Plaintext::Bool(b)) => bool_word(b),
                Some(Plaintext::Identity(a)) => address_word(&a),
                None => {
                    return Err(SealbidError::OracleUnavailable {
                        reason: format!("no key material for {handle}"),
                    });
                }
            };
            cleartexts.extend_from_slice(&word);
        }
        Ok(self.signed_response(request_id, &handles, cleartexts))
    }

    /// Fulfil every queued request, oldest first.
    pub fn fulfil_all(&self) -> Result<Vec<DecryptionResponse>> {
        self.pending().into_iter().map(|id| self.fulfil(id)).collect()
    }

    /// Sign arbitrary `cleartexts` for `request_id`, as a misbehaving but
    /// quorum-holding network would.
    pub fn respond_with(&self, request_id: RequestId, cleartexts: Vec<u8>) -> Result<DecryptionResponse> {
        let handles = self.take_request(request_id)?;
        Ok(self.signed_response(request_id, &handles, cleartexts))
    }

    fn take_request(&self, request_id: RequestId) -> Result<Vec<CiphertextHandle>> {
        let mut state = self.lock();
        state.queue.retain(|id| *id != request_id);
        state
            .requests
            .get(&request_id)
            .cloned()
            .ok_or(SealbidError::UnknownRequest(request_id))
    }

    fn signed_response(
        &self,
        request_id: RequestId,
        handles: &[CiphertextHandle],
        cleartexts: Vec<u8>,
    ) -> DecryptionResponse {
        let digest = decryption_digest(request_id, handles, &cleartexts);
        let proof = self.signer.sign(&digest, self.verifier.threshold());
        tracing::debug!(request = %request_id, handles = handles.len(), "Oracle response signed");
        DecryptionResponse {
            request_id,
            cleartexts,
            proof,
        }
    }

    fn lock(&self) -> MutexGuard<'_, OracleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DecryptionOracle for LocalOracle {
    fn request_decryption(&mut self, handles: &[CiphertextHandle]) -> Result<RequestId> {
        let mut state = self.lock();
        if state.offline {
            return Err(SealbidError::OracleUnavailable {
                reason: "local oracle offline".into(),
            });
        }
        state.next_id += 1;
        let request_id = RequestId(state.next_id);
        state.requests.insert(request_id, handles.to_vec());
        state.queue.push_back(request_id);
        tracing::debug!(request = %request_id, handles = handles.len(), "Oracle request queued");
        Ok(request_id)
    }

    fn verify_proof(
        &self,
        request_id: RequestId,
        cleartexts: &[u8],
        proof: &[u8],
    ) -> std::result::Result<(), VerificationError> {
        let handles = self
            .lock()
            .requests
            .get(&request_id)
            .cloned()
            .ok_or(VerificationError::UnknownRequest(request_id))?;
        let digest = decryption_digest(request_id, &handles, cleartexts);
        self.verifier.verify(&digest, proof)
    }
}
