use thiserror::Error;

/// Errors raised while reading pool state and assembling price series
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("invalid token selector `{0}`: must be 'token0' or 'token1'")]
    InvalidSelector(String),

    #[error("invalid block range: start {start} is after end {end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("tick {0} is outside the valid range")]
    TickOutOfRange(i32),

    #[error("rows must have strictly increasing block numbers: got {block} after {last}")]
    OutOfOrder { last: u64, block: u64 },

    #[error("contract call failed: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),
}

pub type PriceResult<T> = std::result::Result<T, PriceError>;
