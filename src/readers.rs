/// Pool price readers.
/// Each reader pulls one piece of historical state and turns it into a rate.
use alloy_primitives::Address;

use crate::{
    decimals::DecimalsResolver,
    error::PriceError,
    source::ChainReader,
    tick_math,
    types::{PoolInfo, Protocol, Reserves, TokenSide},
};

/// Scale a raw integer amount by 10^decimals
pub fn scale_amount(raw: u128, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

/// Rate implied by constant-product reserves
///
/// `Token0` gives scaled_reserve1 / scaled_reserve0, `Token1` the inverse.
/// An empty denominator reserve yields 0 instead of a division fault.
pub fn price_from_reserves(
    reserves: &Reserves,
    decimals0: u8,
    decimals1: u8,
    side: TokenSide,
) -> f64 {
    let scaled0 = scale_amount(reserves.reserve0, decimals0);
    let scaled1 = scale_amount(reserves.reserve1, decimals1);

    let (numerator, denominator) = match side {
        TokenSide::Token0 => (scaled1, scaled0),
        TokenSide::Token1 => (scaled0, scaled1),
    };

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Price of `side` in a resolved pool as of `block`
pub async fn quote<R>(
    reader: &R,
    pool: &PoolInfo,
    block: u64,
    side: TokenSide,
) -> Result<f64, PriceError>
where
    R: ChainReader + ?Sized,
{
    let decimals0 = pool.token0.decimals;
    let decimals1 = pool.token1.decimals;

    match pool.protocol {
        Protocol::V2 => {
            let reserves = reader.reserves(pool.address, block).await?;
            Ok(price_from_reserves(&reserves, decimals0, decimals1, side))
        }
        Protocol::V3 => {
            let tick = reader.tick(pool.address, block).await?;
            tick_math::price_from_tick(tick, decimals0, decimals1, side)
        }
    }
}

/// Price of one token of a V2 pair at a historical block
pub async fn v2_price<R>(
    reader: &R,
    resolver: &mut DecimalsResolver,
    token0: Address,
    token1: Address,
    pair: Address,
    block: u64,
    side: TokenSide,
) -> Result<f64, PriceError>
where
    R: ChainReader + ?Sized,
{
    let pool = resolved(resolver, reader, Protocol::V2, token0, token1, pair).await?;
    quote(reader, &pool, block, side).await
}

/// Price of one token of a V3 pool at a historical block
pub async fn v3_price<R>(
    reader: &R,
    resolver: &mut DecimalsResolver,
    token0: Address,
    token1: Address,
    pool: Address,
    block: u64,
    side: TokenSide,
) -> Result<f64, PriceError>
where
    R: ChainReader + ?Sized,
{
    let pool = resolved(resolver, reader, Protocol::V3, token0, token1, pool).await?;
    quote(reader, &pool, block, side).await
}

async fn resolved<R>(
    resolver: &mut DecimalsResolver,
    reader: &R,
    protocol: Protocol,
    token0: Address,
    token1: Address,
    address: Address,
) -> Result<PoolInfo, PriceError>
where
    R: ChainReader + ?Sized,
{
    let (token0, token1) = resolver.resolve_tokens(reader, token0, token1).await?;
    Ok(PoolInfo {
        address,
        protocol,
        token0,
        token1,
    })
}
