pub mod cli;
pub mod config;
pub mod contracts;
pub mod decimals;
pub mod error;
pub mod export;
pub mod logging;
pub mod readers;
pub mod series;
pub mod source;
pub mod tick_math;
pub mod types;

use std::path::{Path, PathBuf};

use alloy::providers::ProviderBuilder;
use alloy_primitives::Address;
use eyre::{Result, WrapErr};

pub use decimals::DecimalsResolver;
pub use error::PriceError;
pub use readers::{v2_price, v3_price};
pub use series::{Anchor, Reference, SeriesAssembler, SeriesConfig};
pub use source::{ChainReader, RpcChainReader};
pub use types::{PoolInfo, PriceRow, PriceSeries, Protocol, Reserves, Token, TokenSide};

/// Connect an HTTP [`RpcChainReader`] to the given endpoint
///
/// # Example
/// ```no_run
/// use pool_price_history::{connect_http, create_stable_series, Protocol};
///
/// # async fn run() -> eyre::Result<()> {
/// let reader = connect_http("http://localhost:8545")?;
/// let series = create_stable_series(
///     &reader,
///     Protocol::V2,
///     12345678,
///     12345878,
///     "0xB4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc".parse()?,
///     "usdc_eth.csv",
/// )
/// .await?;
/// println!("{} rows", series.len());
/// # Ok(())
/// # }
/// ```
pub fn connect_http(rpc_url: &str) -> Result<RpcChainReader<impl alloy::providers::Provider + Clone>> {
    let url = rpc_url.parse().wrap_err_with(|| format!("invalid RPC url {rpc_url}"))?;
    let provider = ProviderBuilder::new().connect_http(url);
    Ok(RpcChainReader::new(provider))
}

/// Build a price series in memory without exporting it
pub async fn build_price_series<R>(reader: &R, config: &SeriesConfig) -> Result<PriceSeries>
where
    R: ChainReader + ?Sized,
{
    let series = SeriesAssembler::new(reader)
        .assemble(config)
        .await
        .wrap_err_with(|| {
            format!(
                "pricing pool {} over blocks {}..={}",
                config.target, config.start_block, config.end_block
            )
        })?;

    Ok(series)
}

/// Build a price series and write it to `config.output`
pub async fn create_price_series<R>(reader: &R, config: &SeriesConfig) -> Result<PriceSeries>
where
    R: ChainReader + ?Sized,
{
    let series = build_price_series(reader, config).await?;

    export::write_csv(&series, &config.output)
        .wrap_err_with(|| format!("writing {}", config.output.display()))?;

    Ok(series)
}

/// Series for a pool that already quotes the common unit (token0 is the unit)
pub async fn create_stable_series<R>(
    reader: &R,
    protocol: Protocol,
    start_block: u64,
    end_block: u64,
    target: Address,
    output: impl AsRef<Path>,
) -> Result<PriceSeries>
where
    R: ChainReader + ?Sized,
{
    let config = series_config(
        protocol,
        start_block,
        end_block,
        target,
        Reference::Stable,
        output,
    );
    create_price_series(reader, &config).await
}

/// Series valued through one reference pool that prices the `anchor` coin
pub async fn create_single_reference_series<R>(
    reader: &R,
    protocol: Protocol,
    start_block: u64,
    end_block: u64,
    target: Address,
    reference: Address,
    anchor: Anchor,
    output: impl AsRef<Path>,
) -> Result<PriceSeries>
where
    R: ChainReader + ?Sized,
{
    let reference = Reference::Single {
        pool: reference,
        anchor,
        side: TokenSide::Token1,
    };
    let config = series_config(protocol, start_block, end_block, target, reference, output);
    create_price_series(reader, &config).await
}

/// Series valued through two reference pools, one per coin
pub async fn create_pair_reference_series<R>(
    reader: &R,
    protocol: Protocol,
    start_block: u64,
    end_block: u64,
    target: Address,
    coin0_reference: Address,
    coin1_reference: Address,
    output: impl AsRef<Path>,
) -> Result<PriceSeries>
where
    R: ChainReader + ?Sized,
{
    let reference = Reference::Pair {
        coin0: coin0_reference,
        coin1: coin1_reference,
        side: TokenSide::Token1,
    };
    let config = series_config(protocol, start_block, end_block, target, reference, output);
    create_price_series(reader, &config).await
}

fn series_config(
    protocol: Protocol,
    start_block: u64,
    end_block: u64,
    target: Address,
    reference: Reference,
    output: impl AsRef<Path>,
) -> SeriesConfig {
    SeriesConfig {
        start_block,
        end_block,
        protocol,
        target,
        reference,
        output: PathBuf::from(output.as_ref()),
        concurrency: 1,
    }
}
