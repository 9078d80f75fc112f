use std::{fmt, str::FromStr};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::PriceError;

/// Pool protocol type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Constant-product pair, priced from reserves
    #[serde(alias = "V2", alias = "uniswapv2")]
    V2,
    /// Concentrated-liquidity pool, priced from the current tick
    #[serde(alias = "V3", alias = "uniswapv3")]
    V3,
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v2" | "uniswapv2" => Ok(Protocol::V2),
            "v3" | "uniswapv3" => Ok(Protocol::V3),
            other => Err(format!("unknown protocol `{other}`, expected v2 or v3")),
        }
    }
}

/// Which token of a pool a price is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSide {
    Token0,
    #[default]
    Token1,
}

impl FromStr for TokenSide {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "token0" => Ok(TokenSide::Token0),
            "token1" => Ok(TokenSide::Token1),
            other => Err(PriceError::InvalidSelector(other.to_string())),
        }
    }
}

impl fmt::Display for TokenSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSide::Token0 => f.write_str("token0"),
            TokenSide::Token1 => f.write_str("token1"),
        }
    }
}

/// ERC20 token with its display decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub address: Address,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: Address, decimals: u8) -> Self {
        Self { address, decimals }
    }
}

/// A pool with both constituent tokens resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolInfo {
    pub address: Address,
    pub protocol: Protocol,
    pub token0: Token,
    pub token1: Token,
}

/// UniswapV2 reserve data at one block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserves {
    pub reserve0: u128,
    pub reserve1: u128,
    pub block_timestamp_last: u32,
}

impl Reserves {
    pub fn new(reserve0: u128, reserve1: u128) -> Self {
        Self {
            reserve0,
            reserve1,
            block_timestamp_last: 0,
        }
    }
}

/// One row of the exported table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub block_number: u64,
    pub coin0_price_in_coin1: f64,
    pub coin1_price_in_coin0: f64,
    pub coin0_price_in_usd: f64,
    pub coin1_price_in_usd: f64,
}

/// Price rows keyed by block number, strictly ascending
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    rows: Vec<PriceRow>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Append a row. Its block number must be greater than the last one.
    pub fn push(&mut self, row: PriceRow) -> Result<(), PriceError> {
        if let Some(last) = self.rows.last() {
            if row.block_number <= last.block_number {
                return Err(PriceError::OutOfOrder {
                    last: last.block_number,
                    block: row.block_number,
                });
            }
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up the row for a block
    pub fn get(&self, block_number: u64) -> Option<&PriceRow> {
        self.rows
            .binary_search_by_key(&block_number, |row| row.block_number)
            .ok()
            .map(|idx| &self.rows[idx])
    }

    pub fn first_block(&self) -> Option<u64> {
        self.rows.first().map(|row| row.block_number)
    }

    pub fn last_block(&self) -> Option<u64> {
        self.rows.last().map(|row| row.block_number)
    }

    pub fn into_rows(self) -> Vec<PriceRow> {
        self.rows
    }
}

impl TryFrom<Vec<PriceRow>> for PriceSeries {
    type Error = PriceError;

    fn try_from(rows: Vec<PriceRow>) -> Result<Self, Self::Error> {
        let mut series = PriceSeries::with_capacity(rows.len());
        for row in rows {
            series.push(row)?;
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(block_number: u64) -> PriceRow {
        PriceRow {
            block_number,
            coin0_price_in_coin1: 1.0,
            coin1_price_in_coin0: 1.0,
            coin0_price_in_usd: 1.0,
            coin1_price_in_usd: 1.0,
        }
    }

    #[test]
    fn test_token_side_parsing() {
        assert_eq!("token0".parse::<TokenSide>().unwrap(), TokenSide::Token0);
        assert_eq!("token1".parse::<TokenSide>().unwrap(), TokenSide::Token1);

        let err = "token2".parse::<TokenSide>().unwrap_err();
        assert!(matches!(err, PriceError::InvalidSelector(ref s) if s == "token2"));

        // Selectors are exact, no case folding
        assert!("Token0".parse::<TokenSide>().is_err());
        assert!("".parse::<TokenSide>().is_err());
    }

    #[test]
    fn test_protocol_serde_aliases() {
        let v2: Protocol = serde_json::from_str("\"uniswapv2\"").unwrap();
        let v3: Protocol = serde_json::from_str("\"V3\"").unwrap();
        assert_eq!(v2, Protocol::V2);
        assert_eq!(v3, Protocol::V3);
        assert_eq!("v3".parse::<Protocol>().unwrap(), Protocol::V3);
        assert!("v4".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_series_rejects_out_of_order_rows() {
        let mut series = PriceSeries::new();
        series.push(row(10)).unwrap();
        series.push(row(11)).unwrap();

        assert!(matches!(
            series.push(row(11)),
            Err(PriceError::OutOfOrder { last: 11, block: 11 })
        ));
        assert!(series.push(row(5)).is_err());
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_series_lookup() {
        let series = PriceSeries::try_from(vec![row(100), row(101), row(105)]).unwrap();

        assert_eq!(series.first_block(), Some(100));
        assert_eq!(series.last_block(), Some(105));
        assert_eq!(series.get(105).map(|r| r.block_number), Some(105));
        assert!(series.get(102).is_none());
    }
}
