//! Simulation scenarios: who bids what, round by round.

use std::path::Path;

use eyre::WrapErr;
use sealbid_types::{Address, constants};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioBid {
    pub bidder: Address,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub bids: Vec<ScenarioBid>,
    /// Open the next batch before the oracle answers, which invalidates
    /// the pending request.
    #[serde(default)]
    pub reopen_before_callback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Local KMS signer count.
    #[serde(default = "default_signers")]
    pub kms_signers: usize,
    /// Signatures required per proof.
    #[serde(default = "default_threshold")]
    pub kms_threshold: usize,
    pub rounds: Vec<Round>,
}

fn default_signers() -> usize {
    constants::DEFAULT_KMS_SIGNERS
}

fn default_threshold() -> usize {
    constants::DEFAULT_KMS_THRESHOLD
}

impl Scenario {
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&text).wrap_err("parsing scenario")
    }

    /// Every distinct bidder, in first-appearance order.
    #[must_use]
    pub fn bidders(&self) -> Vec<Address> {
        let mut seen = Vec::new();
        for bid in self.rounds.iter().flat_map(|r| &r.bids) {
            if !seen.contains(&bid.bidder) {
                seen.push(bid.bidder);
            }
        }
        seen
    }
}

impl Default for Scenario {
    fn default() -> Self {
        let bid = |byte, amount| ScenarioBid {
            bidder: Address::repeat_byte(byte),
            amount,
        };
        Self {
            kms_signers: default_signers(),
            kms_threshold: default_threshold(),
            rounds: vec![Round {
                bids: vec![bid(0xa1, 5), bid(0xb2, 15), bid(0xc3, 9)],
                reopen_before_callback: false,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_defaults() {
        let json = r#"{
            "rounds": [
                { "bids": [
                    { "bidder": "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1", "amount": 5 },
                    { "bidder": "0xb2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2", "amount": 7 }
                ] },
                { "bids": [
                    { "bidder": "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1", "amount": 1 }
                ], "reopen_before_callback": true }
            ]
        }"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.kms_signers, constants::DEFAULT_KMS_SIGNERS);
        assert_eq!(scenario.kms_threshold, constants::DEFAULT_KMS_THRESHOLD);
        assert!(scenario.rounds[1].reopen_before_callback);
        assert_eq!(
            scenario.bidders(),
            vec![Address::repeat_byte(0xa1), Address::repeat_byte(0xb2)]
        );
    }

    #[test]
    fn default_is_three_bids() {
        let scenario = Scenario::default();
        assert_eq!(scenario.rounds.len(), 1);
        assert_eq!(scenario.bidders().len(), 3);
    }
}
