//! `sealbid-sim`: drive the settlement engine through scripted auction
//! rounds on a simulated clock.
//!
//! Every engine event is printed to stdout as one JSON line. Oracle
//! callbacks go through a [`CallbackRelay`], and each round's callback is
//! applied before the next batch opens. Proofs are checked against a
//! [`KmsConfig`] signer set, either loaded with `--kms-config` or derived
//! from the local keys.

mod cli;
mod logging;
mod scenario;

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use clap::Parser;
use eyre::WrapErr;
use sealbid_settlement::{
    CallbackRelay, KmsSigner, KmsVerifier, LocalOracle, RelayReport, SettlementEngine, SharedEngine,
};
use sealbid_types::{Address, EngineConfig, KmsConfig, mock::MockBackend};
use tokio::sync::Mutex;

use crate::{cli::Cli, scenario::Scenario};

type SimEngine = SettlementEngine<MockBackend, LocalOracle>;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    logging::setup_logger(&cli.log_level, cli.json_logs);

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .wrap_err_with(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::default(),
    };

    let signer = match cli.kms_seed {
        Some(seed) => KmsSigner::from_seed(seed, scenario.kms_signers),
        None => KmsSigner::generate(scenario.kms_signers),
    };
    if cli.emit_kms_config {
        let local = signer.kms_config(scenario.kms_threshold);
        println!("{}", serde_json::to_string_pretty(&local)?);
        return Ok(());
    }
    let trusted = match &cli.kms_config {
        Some(path) => KmsConfig::load(path)
            .wrap_err_with(|| format!("loading kms config {}", path.display()))?,
        None => signer.kms_config(scenario.kms_threshold),
    };

    let report = simulate(config, cli.owner, &scenario, signer, &trusted).await?;
    for settlement in &report.settled {
        tracing::info!(
            batch = %settlement.batch_id,
            winner = %settlement.winner,
            amount = settlement.winning_amount,
            "Batch settled"
        );
    }
    for (request, reason) in &report.rejected {
        tracing::warn!(request = %request, reason = %reason, "Batch not settled");
    }
    Ok(())
}

async fn simulate(
    config: EngineConfig,
    owner: Address,
    scenario: &Scenario,
    signer: KmsSigner,
    trusted: &KmsConfig,
) -> eyre::Result<RelayReport> {
    let fhe = MockBackend::new();
    let verifier = KmsVerifier::from_config(trusted).wrap_err("building kms verifier")?;
    let oracle = LocalOracle::with_signer(fhe.keystore(), signer, verifier);

    // One tick clears every cooldown.
    let tick_secs = config.submit_cooldown_secs.max(config.decryption_cooldown_secs);
    let tick = TimeDelta::try_seconds(i64::try_from(tick_secs)?)
        .ok_or_else(|| eyre::eyre!("cooldown of {tick_secs}s is out of range"))?;

    let mut engine = SimEngine::new(config, owner, fhe, oracle.clone())?;
    for bidder in scenario.bidders() {
        engine.add_provider(owner, bidder)?;
    }
    let engine: SharedEngine<MockBackend, LocalOracle> = Arc::new(Mutex::new(engine));

    let relay = CallbackRelay::new(Arc::clone(&engine));
    let mut report = RelayReport::default();
    let mut clock = Utc::now();

    for (index, round) in scenario.rounds.iter().enumerate() {
        let request = {
            let mut engine = engine.lock().await;
            engine.open_batch(owner)?;
            for bid in &round.bids {
                let amount = engine.backend().encrypt_u64(bid.amount);
                engine
                    .submit_bid(bid.bidder, amount, clock)
                    .wrap_err_with(|| format!("round {}: bid from {}", index + 1, bid.bidder))?;
                clock += tick;
            }
            engine.close_batch(owner)?;
            let request = engine.find_highest_bidder(owner, clock)?;
            clock += tick;
            if round.reopen_before_callback {
                engine.open_batch(owner)?;
            }
            print_events(&mut engine)?;
            request
        };

        tracing::debug!(round = index + 1, request = %request, "Awaiting oracle");
        let response = oracle.fulfil(request)?;
        // Settle before the next round reopens the batch.
        let outcome = relay.deliver(response).await;
        report.record(request, outcome);
        print_events(&mut *engine.lock().await)?;
    }

    Ok(report)
}

fn print_events(engine: &mut SimEngine) -> eyre::Result<()> {
    for event in engine.drain_events() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{Round, ScenarioBid};

    const OWNER: Address = Address([0x0a; 20]);

    fn round(bids: &[(u8, u64)], reopen_before_callback: bool) -> Round {
        Round {
            bids: bids
                .iter()
                .map(|&(byte, amount)| ScenarioBid {
                    bidder: Address::repeat_byte(byte),
                    amount,
                })
                .collect(),
            reopen_before_callback,
        }
    }

    fn scenario(rounds: Vec<Round>) -> Scenario {
        Scenario {
            rounds,
            ..Scenario::default()
        }
    }

    async fn run(scenario: &Scenario, trusted_seed: u64) -> RelayReport {
        let signer = KmsSigner::from_seed(1, scenario.kms_signers);
        let trusted = KmsSigner::from_seed(trusted_seed, scenario.kms_signers)
            .kms_config(scenario.kms_threshold);
        simulate(EngineConfig::default(), OWNER, scenario, signer, &trusted)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn consecutive_rounds_each_settle() {
        let scenario = scenario(vec![
            round(&[(0xa1, 5), (0xb2, 15)], false),
            round(&[(0xa1, 8)], false),
        ]);
        let report = run(&scenario, 1).await;

        assert!(report.rejected.is_empty(), "{:?}", report.rejected);
        assert_eq!(report.settled.len(), 2);
        let first = &report.settled[0];
        assert_eq!((first.winner, first.winning_amount), (Address::repeat_byte(0xb2), 15));
        let second = &report.settled[1];
        assert_eq!((second.winner, second.winning_amount), (Address::repeat_byte(0xa1), 8));
        assert_ne!(first.batch_id, second.batch_id);
    }

    #[tokio::test]
    async fn reopened_round_is_refused_and_next_round_settles() {
        let scenario = scenario(vec![
            round(&[(0xa1, 5), (0xb2, 15)], true),
            round(&[(0xa1, 8)], false),
        ]);
        let report = run(&scenario, 1).await;

        assert_eq!(report.rejected.len(), 1);
        assert!(report.rejected[0].1.starts_with("SB_ERR_501"));
        assert_eq!(report.settled.len(), 1);
        assert_eq!(report.settled[0].winning_amount, 8);
    }

    #[tokio::test]
    async fn untrusted_signers_settle_nothing() {
        let scenario = scenario(vec![round(&[(0xa1, 5)], false), round(&[(0xb2, 6)], false)]);
        let report = run(&scenario, 2).await;

        assert!(report.settled.is_empty());
        assert_eq!(report.rejected.len(), 2);
        assert!(report.rejected.iter().all(|(_, err)| err.starts_with("SB_ERR_502")));
    }
}
