use std::collections::HashMap;

use alloy_primitives::Address;
use tracing::debug;

use crate::{
    error::PriceError,
    source::ChainReader,
    types::{PoolInfo, Protocol, Token},
};

/// Resolves and caches token decimals for the duration of a run
///
/// Decimals are read at the latest block, not at the block being priced.
/// They are assumed constant, so each address is fetched at most once.
#[derive(Debug, Default, Clone)]
pub struct DecimalsResolver {
    cache: HashMap<Address, u8>,
}

impl DecimalsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decimals of `token`, hitting the node only on first use
    pub async fn resolve<R>(&mut self, reader: &R, token: Address) -> Result<u8, PriceError>
    where
        R: ChainReader + ?Sized,
    {
        if let Some(decimals) = self.cache.get(&token) {
            return Ok(*decimals);
        }

        let decimals = reader.decimals(token).await?;
        debug!(%token, decimals, "resolved token decimals");

        self.cache.insert(token, decimals);
        Ok(decimals)
    }

    /// Resolve both tokens of a pair into [`Token`]s
    pub async fn resolve_tokens<R>(
        &mut self,
        reader: &R,
        token0: Address,
        token1: Address,
    ) -> Result<(Token, Token), PriceError>
    where
        R: ChainReader + ?Sized,
    {
        let decimals0 = self.resolve(reader, token0).await?;
        let decimals1 = self.resolve(reader, token1).await?;
        Ok((Token::new(token0, decimals0), Token::new(token1, decimals1)))
    }

    /// Read a pool's token pair and both decimals
    pub async fn resolve_pool<R>(
        &mut self,
        reader: &R,
        pool: Address,
        protocol: Protocol,
    ) -> Result<PoolInfo, PriceError>
    where
        R: ChainReader + ?Sized,
    {
        let (token0, token1) = reader.token_pair(pool, protocol).await?;
        let (token0, token1) = self.resolve_tokens(reader, token0, token1).await?;

        debug!(
            %pool,
            ?protocol,
            token0 = %token0.address,
            token1 = %token1.address,
            "resolved pool tokens"
        );

        Ok(PoolInfo {
            address: pool,
            protocol,
            token0,
            token1,
        })
    }

    /// Cached decimals without touching the node
    pub fn cached(&self, token: &Address) -> Option<u8> {
        self.cache.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
