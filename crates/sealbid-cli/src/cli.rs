//! Command line interface of the auction simulator.

use std::path::PathBuf;

use clap::Parser;
use sealbid_types::Address;

/// Run sealed-bid auction rounds against a mock FHE backend and a local
/// KMS oracle, printing every engine event as a JSON line.
#[derive(Debug, Parser)]
#[command(name = "sealbid-sim", version, about, long_about = None)]
pub struct Cli {
    /// Engine config file (JSON). Defaults apply when unset.
    #[arg(long, env = "SEALBID_CONFIG")]
    pub config: Option<PathBuf>,

    /// Scenario file (JSON). Runs a single three-bid round when unset.
    #[arg(long)]
    pub scenario: Option<PathBuf>,

    /// Engine owner address.
    #[arg(long, default_value = "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a")]
    pub owner: Address,

    /// Derive the local KMS keys from this seed instead of fresh randomness.
    #[arg(long, env = "SEALBID_KMS_SEED")]
    pub kms_seed: Option<u64>,

    /// Trusted KMS signer set (JSON). Trusts the local keys when unset.
    #[arg(long, env = "SEALBID_KMS_CONFIG")]
    pub kms_config: Option<PathBuf>,

    /// Print the KMS config of the local keys and exit.
    #[arg(long, requires = "kms_seed")]
    pub emit_kms_config: bool,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info", env = "SEALBID_LOG")]
    pub log_level: String,

    /// Emit logs as JSON.
    #[arg(long)]
    pub json_logs: bool,
}
