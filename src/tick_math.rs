/// Tick math utilities for UniswapV3 pools

use crate::{error::PriceError, types::TokenSide};

/// Minimum and maximum tick values for full range
pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = 887272;

/// Base of the tick price grid: each tick is a 0.01% step
pub const TICK_BASE: f64 = 1.0001;

/// Check a tick lies on the usable grid
pub fn check_tick(tick: i32) -> Result<i32, PriceError> {
    if (MIN_TICK..=MAX_TICK).contains(&tick) {
        Ok(tick)
    } else {
        Err(PriceError::TickOutOfRange(tick))
    }
}

/// Evaluate 1.0001^tick as exp(tick * ln 1.0001)
/// Stays finite across the whole tick range (~1e-39 to ~3e38)
pub fn tick_to_ratio(tick: i32) -> f64 {
    (tick as f64 * TICK_BASE.ln()).exp()
}

/// Price of token1 denominated in token0:
/// 1.0001^tick * 10^(decimals0 - decimals1)
pub fn token1_in_token0(tick: i32, decimals0: u8, decimals1: u8) -> f64 {
    let shift = decimals0 as i32 - decimals1 as i32;
    tick_to_ratio(tick) * 10f64.powi(shift)
}

/// Convert a tick into the requested side's price
///
/// `Token1` returns the token1-in-token0 rate, `Token0` its reciprocal.
/// A zero or non-finite rate has no reciprocal and maps to 0.
pub fn price_from_tick(
    tick: i32,
    decimals0: u8,
    decimals1: u8,
    side: TokenSide,
) -> Result<f64, PriceError> {
    let tick = check_tick(tick)?;
    let p1in0 = token1_in_token0(tick, decimals0, decimals1);

    Ok(match side {
        TokenSide::Token0 => reciprocal_or_zero(p1in0),
        TokenSide::Token1 => p1in0,
    })
}

/// 1 / x, or 0 when x is zero or not a finite number
pub fn reciprocal_or_zero(x: f64) -> f64 {
    if x == 0.0 || !x.is_finite() {
        0.0
    } else {
        1.0 / x
    }
}
