//! Remote reads of pool and token state.
//!
//! [`ChainReader`] is the seam between pricing logic and the node. The
//! production implementation talks JSON-RPC through an alloy provider;
//! tests swap in in-memory readers.

use alloy::{eips::BlockId, providers::Provider};
use alloy_primitives::Address;
use async_trait::async_trait;
use tracing::trace;

use crate::{
    contracts::{IUniswapV2Pair, IUniswapV3Pool, IERC20},
    error::PriceError,
    types::{Protocol, Reserves},
};

/// Read access to on-chain pool state
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `token0()` / `token1()` of a pool, read at the chain head
    async fn token_pair(
        &self,
        pool: Address,
        protocol: Protocol,
    ) -> Result<(Address, Address), PriceError>;

    /// `decimals()` of a token, read at the chain head (not at a historical block)
    async fn decimals(&self, token: Address) -> Result<u8, PriceError>;

    /// `getReserves()` of a V2 pair as of `block`
    async fn reserves(&self, pool: Address, block: u64) -> Result<Reserves, PriceError>;

    /// `slot0().tick` of a V3 pool as of `block`
    async fn tick(&self, pool: Address, block: u64) -> Result<i32, PriceError>;
}

/// [`ChainReader`] backed by an alloy JSON-RPC provider
///
/// Historical reads need an archive node.
#[derive(Debug, Clone)]
pub struct RpcChainReader<P> {
    provider: P,
}

impl<P> RpcChainReader<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P> ChainReader for RpcChainReader<P>
where
    P: Provider + Send + Sync,
{
    async fn token_pair(
        &self,
        pool: Address,
        protocol: Protocol,
    ) -> Result<(Address, Address), PriceError> {
        trace!(%pool, ?protocol, "reading token pair");

        let pair = match protocol {
            Protocol::V2 => {
                let pair = IUniswapV2Pair::new(pool, &self.provider);
                (pair.token0().call().await?, pair.token1().call().await?)
            }
            Protocol::V3 => {
                let pool = IUniswapV3Pool::new(pool, &self.provider);
                (pool.token0().call().await?, pool.token1().call().await?)
            }
        };

        Ok(pair)
    }

    async fn decimals(&self, token: Address) -> Result<u8, PriceError> {
        trace!(%token, "reading decimals at latest block");

        let erc20 = IERC20::new(token, &self.provider);
        Ok(erc20.decimals().block(BlockId::latest()).call().await?)
    }

    async fn reserves(&self, pool: Address, block: u64) -> Result<Reserves, PriceError> {
        trace!(%pool, block, "reading reserves");

        let pair = IUniswapV2Pair::new(pool, &self.provider);
        let result = pair.getReserves().block(BlockId::number(block)).call().await?;

        Ok(Reserves {
            reserve0: result.reserve0.to::<u128>(),
            reserve1: result.reserve1.to::<u128>(),
            block_timestamp_last: result.blockTimestampLast,
        })
    }

    async fn tick(&self, pool: Address, block: u64) -> Result<i32, PriceError> {
        trace!(%pool, block, "reading slot0");

        let pool = IUniswapV3Pool::new(pool, &self.provider);
        let slot0 = pool.slot0().block(BlockId::number(block)).call().await?;

        Ok(slot0.tick.as_i32())
    }
}
