//! Async delivery of oracle callbacks into a shared engine.
//!
//! The oracle answers out-of-band. [`CallbackRelay`] drains a channel of
//! [`DecryptionResponse`]s and applies each one under the engine lock, so
//! callbacks serialize with every other engine operation. Rejected
//! callbacks are logged and reported, never retried.

use std::sync::Arc;

use sealbid_types::{DecryptionOracle, FheBackend, RequestId, Result};
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};

use crate::{
    decryption::DecryptionResponse,
    engine::{Settlement, SettlementEngine},
};

/// An engine behind an async lock, shared by callers and the relay.
pub type SharedEngine<B, O> = Arc<Mutex<SettlementEngine<B, O>>>;

/// What a relay run delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub settled: Vec<Settlement>,
    /// Request id and the error message of each rejected callback.
    pub rejected: Vec<(RequestId, String)>,
}

impl RelayReport {
    /// Log and file the outcome of one callback.
    pub fn record(&mut self, request_id: RequestId, outcome: Result<Settlement>) {
        match outcome {
            Ok(settlement) => {
                tracing::info!(
                    request = %request_id,
                    winner = %settlement.winner,
                    amount = settlement.winning_amount,
                    "Callback settled"
                );
                self.settled.push(settlement);
            }
            Err(err) => {
                tracing::warn!(request = %request_id, error = %err, "Callback refused");
                self.rejected.push((request_id, err.to_string()));
            }
        }
    }
}

pub struct CallbackRelay<B: FheBackend, O: DecryptionOracle> {
    engine: SharedEngine<B, O>,
}

impl<B, O> CallbackRelay<B, O>
where
    B: FheBackend + Send + 'static,
    B::Uint: Send,
    O: DecryptionOracle + Send + 'static,
{
    #[must_use]
    pub fn new(engine: SharedEngine<B, O>) -> Self {
        Self { engine }
    }

    /// Apply one callback. Returns once the engine has settled or refused it.
    pub async fn deliver(&self, response: DecryptionResponse) -> Result<Settlement> {
        let mut engine = self.engine.lock().await;
        engine.on_decryption(response.request_id, &response.cleartexts, &response.proof)
    }

    /// Run until every sender of `rx` is dropped.
    pub fn spawn(self, mut rx: mpsc::Receiver<DecryptionResponse>) -> JoinHandle<RelayReport> {
        tokio::spawn(async move {
            let mut report = RelayReport::default();
            while let Some(response) = rx.recv().await {
                let request_id = response.request_id;
                let outcome = self.deliver(response).await;
                report.record(request_id, outcome);
            }
            tracing::debug!(
                settled = report.settled.len(),
                rejected = report.rejected.len(),
                "Callback relay drained"
            );
            report
        })
    }
}
