use std::path::PathBuf;

use alloy_primitives::Address;
use clap::{ArgAction, Args, Parser};
use eyre::{eyre, Result};
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::filter::Directive;

use crate::{
    config,
    series::{Anchor, Reference, SeriesConfig},
    types::{Protocol, TokenSide},
};

#[derive(Debug, Parser)]
#[command(name = "pool-prices", about = "Historical pool prices per block, exported to CSV", long_about = None)]
pub struct CliCmd {
    /// Node JSON-RPC endpoint (archive node for historical blocks).
    /// Falls back to INFURA_API_KEY when unset.
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// JSON file describing the series; replaces the series flags below
    #[arg(long, conflicts_with_all = ["target", "start_block", "end_block"])]
    pub config: Option<PathBuf>,

    /// Pool protocol: v2 (reserves) or v3 (tick)
    #[arg(short, long, default_value = "v2")]
    pub protocol: Protocol,

    /// First block of the range (inclusive)
    #[arg(short, long, required_unless_present = "config")]
    pub start_block: Option<u64>,

    /// Last block of the range (inclusive)
    #[arg(short, long, required_unless_present = "config")]
    pub end_block: Option<u64>,

    /// Pool being priced
    #[arg(short, long, required_unless_present = "config")]
    pub target: Option<Address>,

    /// Reference pools for the common unit: none (target is the stable pair),
    /// one (with --anchor), or two (coin0 pool, then coin1 pool)
    #[arg(short, long, num_args = 1, action = ArgAction::Append)]
    pub reference: Vec<Address>,

    /// Coin valued by a single reference pool: coin0 or coin1
    #[arg(long, default_value = "coin1")]
    pub anchor: Anchor,

    /// Side read from each reference pool: token0 or token1
    #[arg(long, default_value = "token1")]
    pub reference_side: TokenSide,

    /// Output CSV path
    #[arg(short, long, default_value = "prices.csv")]
    pub output: PathBuf,

    /// Blocks fetched concurrently (1 = sequential)
    #[arg(short, long, default_value_t = 1)]
    pub concurrency: usize,

    #[clap(flatten)]
    pub verbosity: Verbosity,
}

impl CliCmd {
    /// Series description from `--config` or from the individual flags
    pub fn series_config(&self) -> Result<SeriesConfig> {
        if let Some(path) = &self.config {
            return Ok(config::load_series_config(path)?);
        }

        let reference = match self.reference.as_slice() {
            [] => Reference::Stable,
            [pool] => Reference::Single {
                pool: *pool,
                anchor: self.anchor,
                side: self.reference_side,
            },
            [coin0, coin1] => Reference::Pair {
                coin0: *coin0,
                coin1: *coin1,
                side: self.reference_side,
            },
            more => return Err(eyre!("at most two reference pools, got {}", more.len())),
        };

        let config = SeriesConfig {
            start_block: self.start_block.ok_or_else(|| eyre!("--start-block is required"))?,
            end_block: self.end_block.ok_or_else(|| eyre!("--end-block is required"))?,
            protocol: self.protocol,
            target: self.target.ok_or_else(|| eyre!("--target is required"))?,
            reference,
            output: self.output.clone(),
            concurrency: self.concurrency,
        };
        config.validate()?;

        Ok(config)
    }
}

/// The verbosity settings for the cli.
#[derive(Debug, Copy, Clone, Args)]
#[command(next_help_heading = "Display")]
pub struct Verbosity {
    /// Set the minimum log level.
    ///
    /// -v      Errors
    /// -vv     Warnings
    /// -vvv    Info
    /// -vvvv   Debug
    /// -vvvvv  Traces (warning: very verbose!)
    #[clap(short, long, action = ArgAction::Count, global = true, default_value_t = 3, verbatim_doc_comment, help_heading = "Display")]
    verbosity: u8,

    /// Silence all log output.
    #[clap(long, alias = "silent", short = 'q', global = true, help_heading = "Display")]
    quiet: bool,
}

impl Verbosity {
    /// Get the corresponding [Directive] for the given verbosity, or OFF if
    /// the verbosity corresponds to silent.
    pub fn directive(&self) -> Directive {
        if self.quiet {
            return LevelFilter::OFF.into();
        }

        let level = match self.verbosity.saturating_sub(1) {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            3 => Level::DEBUG,
            _ => Level::TRACE,
        };

        LevelFilter::from_level(level).into()
    }
}
