//! Block-range price series assembly.
//!
//! One procedure covers every pool protocol and reference arity. A
//! [`SeriesConfig`] names the target pool, how its quote is turned into a
//! common unit ([`Reference`]), and the inclusive block range to walk.

use std::path::PathBuf;

use alloy_primitives::Address;
use futures::{stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    decimals::DecimalsResolver,
    error::PriceError,
    readers::quote,
    source::ChainReader,
    tick_math::reciprocal_or_zero,
    types::{PoolInfo, PriceRow, PriceSeries, Protocol, TokenSide},
};

/// Which coin of the target pool a single reference pool values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Coin0,
    Coin1,
}

impl std::str::FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coin0" => Ok(Anchor::Coin0),
            "coin1" => Ok(Anchor::Coin1),
            other => Err(format!("unknown anchor `{other}`, expected coin0 or coin1")),
        }
    }
}

/// How the target pool's quote is expressed in the common unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Reference {
    /// No reference pools: the target quotes the common unit itself, token0 being the unit
    Stable,
    /// One reference pool valuing the anchor coin; the other coin goes through the cross rate
    Single {
        pool: Address,
        anchor: Anchor,
        #[serde(default)]
        side: TokenSide,
    },
    /// Two reference pools valuing coin0 and coin1 directly, assumed to share a quote asset
    Pair {
        coin0: Address,
        coin1: Address,
        #[serde(default)]
        side: TokenSide,
    },
}

impl Reference {
    /// Number of auxiliary pools read per block
    pub fn arity(&self) -> usize {
        match self {
            Reference::Stable => 0,
            Reference::Single { .. } => 1,
            Reference::Pair { .. } => 2,
        }
    }
}

/// Everything needed to build and export one price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub start_block: u64,
    pub end_block: u64,
    pub protocol: Protocol,
    pub target: Address,
    pub reference: Reference,
    pub output: PathBuf,
    /// Blocks fetched concurrently; 1 is strictly sequential
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    1
}

impl SeriesConfig {
    pub fn validate(&self) -> Result<(), PriceError> {
        if self.start_block > self.end_block {
            return Err(PriceError::InvalidRange {
                start: self.start_block,
                end: self.end_block,
            });
        }
        if self.concurrency == 0 {
            return Err(PriceError::InvalidConcurrency);
        }
        Ok(())
    }

    /// Number of rows the series will hold
    pub fn block_count(&self) -> u64 {
        self.end_block.saturating_sub(self.start_block) + 1
    }
}

/// Reference pools with tokens and decimals resolved
#[derive(Debug, Clone, Copy)]
enum ResolvedReference {
    Stable,
    Single {
        pool: PoolInfo,
        anchor: Anchor,
        side: TokenSide,
    },
    Pair {
        coin0: PoolInfo,
        coin1: PoolInfo,
        side: TokenSide,
    },
}

/// Reference-pool readings for one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferenceQuote {
    Stable,
    Single { anchor: Anchor, price: f64 },
    Pair { coin0: f64, coin1: f64 },
}

/// Build a row from the target's rate and the reference readings
///
/// `coin1_in_coin0` is the zero-guarded reciprocal of `coin0_in_coin1`.
pub fn derive_row(block_number: u64, coin0_in_coin1: f64, reference: ReferenceQuote) -> PriceRow {
    let coin1_in_coin0 = reciprocal_or_zero(coin0_in_coin1);

    let (coin0_usd, coin1_usd) = match reference {
        ReferenceQuote::Stable => (1.0, coin1_in_coin0),
        ReferenceQuote::Single {
            anchor: Anchor::Coin0,
            price,
        } => (price, coin1_in_coin0 * price),
        ReferenceQuote::Single {
            anchor: Anchor::Coin1,
            price,
        } => (coin0_in_coin1 * price, price),
        ReferenceQuote::Pair { coin0, coin1 } => (coin0, coin1),
    };

    PriceRow {
        block_number,
        coin0_price_in_coin1: coin0_in_coin1,
        coin1_price_in_coin0: coin1_in_coin0,
        coin0_price_in_usd: coin0_usd,
        coin1_price_in_usd: coin1_usd,
    }
}

/// Walks a block range and produces one [`PriceRow`] per block
pub struct SeriesAssembler<'a, R: ?Sized> {
    reader: &'a R,
    resolver: DecimalsResolver,
}

impl<'a, R> SeriesAssembler<'a, R>
where
    R: ChainReader + ?Sized,
{
    pub fn new(reader: &'a R) -> Self {
        Self {
            reader,
            resolver: DecimalsResolver::new(),
        }
    }

    /// Reuse a resolver that already holds cached decimals
    pub fn with_resolver(reader: &'a R, resolver: DecimalsResolver) -> Self {
        Self { reader, resolver }
    }

    pub fn resolver(&self) -> &DecimalsResolver {
        &self.resolver
    }

    /// Build the series in memory
    pub async fn assemble(&mut self, config: &SeriesConfig) -> Result<PriceSeries, PriceError> {
        config.validate()?;

        info!(
            target_pool = %config.target,
            protocol = ?config.protocol,
            references = config.reference.arity(),
            start = config.start_block,
            end = config.end_block,
            concurrency = config.concurrency,
            "assembling price series"
        );

        // Token pairs never change after pool creation, so resolve them once
        let target = self
            .resolver
            .resolve_pool(self.reader, config.target, config.protocol)
            .await?;
        let reference = self.resolve_reference(&config.reference, config.protocol).await?;

        let reader = self.reader;
        let rows: Vec<PriceRow> = stream::iter(config.start_block..=config.end_block)
            .map(|block| row_at(reader, &target, &reference, block))
            .buffered(config.concurrency)
            .try_collect()
            .await?;

        let series = PriceSeries::try_from(rows)?;

        info!(rows = series.len(), "price series assembled");
        Ok(series)
    }

    async fn resolve_reference(
        &mut self,
        reference: &Reference,
        protocol: Protocol,
    ) -> Result<ResolvedReference, PriceError> {
        Ok(match *reference {
            Reference::Stable => ResolvedReference::Stable,
            Reference::Single { pool, anchor, side } => ResolvedReference::Single {
                pool: self.resolver.resolve_pool(self.reader, pool, protocol).await?,
                anchor,
                side,
            },
            Reference::Pair { coin0, coin1, side } => ResolvedReference::Pair {
                coin0: self.resolver.resolve_pool(self.reader, coin0, protocol).await?,
                coin1: self.resolver.resolve_pool(self.reader, coin1, protocol).await?,
                side,
            },
        })
    }
}

async fn row_at<R>(
    reader: &R,
    target: &PoolInfo,
    reference: &ResolvedReference,
    block: u64,
) -> Result<PriceRow, PriceError>
where
    R: ChainReader + ?Sized,
{
    let coin0_in_coin1 = quote(reader, target, block, TokenSide::Token0).await?;

    let reference = match reference {
        ResolvedReference::Stable => ReferenceQuote::Stable,
        ResolvedReference::Single { pool, anchor, side } => ReferenceQuote::Single {
            anchor: *anchor,
            price: quote(reader, pool, block, *side).await?,
        },
        ResolvedReference::Pair { coin0, coin1, side } => ReferenceQuote::Pair {
            coin0: quote(reader, coin0, block, *side).await?,
            coin1: quote(reader, coin1, block, *side).await?,
        },
    };

    let row = derive_row(block, coin0_in_coin1, reference);
    debug!(
        block,
        coin0_in_coin1 = row.coin0_price_in_coin1,
        coin0_usd = row.coin0_price_in_usd,
        coin1_usd = row.coin1_price_in_usd,
        "priced block"
    );

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn config(start_block: u64, end_block: u64) -> SeriesConfig {
        SeriesConfig {
            start_block,
            end_block,
            protocol: Protocol::V2,
            target: address!("b4e16d0168e52d35cacd2c6185b44281ec28c9dc"),
            reference: Reference::Stable,
            output: PathBuf::from("prices.csv"),
            concurrency: 1,
        }
    }

    #[test]
    fn test_validate_range() {
        assert!(config(10, 10).validate().is_ok());
        assert!(matches!(
            config(11, 10).validate(),
            Err(PriceError::InvalidRange { start: 11, end: 10 })
        ));

        let mut zero = config(1, 2);
        zero.concurrency = 0;
        assert!(matches!(zero.validate(), Err(PriceError::InvalidConcurrency)));
    }

    #[test]
    fn test_block_count() {
        assert_eq!(config(100, 100).block_count(), 1);
        assert_eq!(config(11504323, 11506033).block_count(), 1711);
    }

    #[test]
    fn test_stable_row() {
        // Target pool USDC/WETH: 1 USDC = 0.0005 WETH
        let row = derive_row(7, 0.0005, ReferenceQuote::Stable);

        assert_eq!(row.block_number, 7);
        assert_eq!(row.coin0_price_in_usd, 1.0);
        assert!((row.coin1_price_in_coin0 - 2000.0).abs() < 1e-9);
        assert!((row.coin1_price_in_usd - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_reference_rows() {
        // WETH/DUCK target, reference values WETH (coin0) at 2000
        let row = derive_row(
            1,
            4000.0,
            ReferenceQuote::Single {
                anchor: Anchor::Coin0,
                price: 2000.0,
            },
        );
        assert_eq!(row.coin0_price_in_usd, 2000.0);
        assert!((row.coin1_price_in_usd - 0.5).abs() < 1e-12);

        // WBTC/WETH target, reference values WETH (coin1) at 2000
        let row = derive_row(
            1,
            15.0,
            ReferenceQuote::Single {
                anchor: Anchor::Coin1,
                price: 2000.0,
            },
        );
        assert_eq!(row.coin0_price_in_usd, 30000.0);
        assert_eq!(row.coin1_price_in_usd, 2000.0);
    }

    #[test]
    fn test_pair_reference_row() {
        let row = derive_row(
            3,
            15.0,
            ReferenceQuote::Pair {
                coin0: 30000.0,
                coin1: 2000.0,
            },
        );
        assert_eq!(row.coin0_price_in_usd, 30000.0);
        assert_eq!(row.coin1_price_in_usd, 2000.0);
    }

    #[test]
    fn test_zero_rate_guard() {
        let row = derive_row(
            9,
            0.0,
            ReferenceQuote::Single {
                anchor: Anchor::Coin0,
                price: 2000.0,
            },
        );
        assert_eq!(row.coin0_price_in_coin1, 0.0);
        assert_eq!(row.coin1_price_in_coin0, 0.0);
        assert_eq!(row.coin1_price_in_usd, 0.0);
    }

    #[test]
    fn test_reference_serde() {
        let json = r#"{"kind":"single","pool":"0xb4e16d0168e52d35cacd2c6185b44281ec28c9dc","anchor":"coin1"}"#;
        let reference: Reference = serde_json::from_str(json).unwrap();

        assert_eq!(reference.arity(), 1);
        assert!(matches!(
            reference,
            Reference::Single {
                anchor: Anchor::Coin1,
                side: TokenSide::Token1,
                ..
            }
        ));

        let stable: Reference = serde_json::from_str(r#"{"kind":"stable"}"#).unwrap();
        assert_eq!(stable, Reference::Stable);
    }
}
