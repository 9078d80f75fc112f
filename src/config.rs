use std::path::Path;

use crate::{error::PriceError, series::SeriesConfig};

/// Node endpoint, explicit or built from an Infura key
pub const RPC_URL_VAR: &str = "RPC_URL";
pub const INFURA_API_KEY_VAR: &str = "INFURA_API_KEY";

/// Connection settings for the node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub rpc_url: String,
}

impl NodeConfig {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
        }
    }

    /// Read `RPC_URL`, falling back to a mainnet Infura URL from `INFURA_API_KEY`
    pub fn from_env() -> Result<Self, PriceError> {
        Self::from_vars(
            std::env::var(RPC_URL_VAR).ok(),
            std::env::var(INFURA_API_KEY_VAR).ok(),
        )
    }

    fn from_vars(rpc_url: Option<String>, infura_key: Option<String>) -> Result<Self, PriceError> {
        if let Some(url) = rpc_url.filter(|url| !url.trim().is_empty()) {
            return Ok(Self::new(url));
        }

        infura_key
            .filter(|key| !key.trim().is_empty())
            .map(|key| Self::new(infura_url(&key)))
            .ok_or(PriceError::MissingConfig("RPC_URL or INFURA_API_KEY must be set"))
    }
}

pub fn infura_url(api_key: &str) -> String {
    format!("https://mainnet.infura.io/v3/{}", api_key.trim())
}

/// Load a [`SeriesConfig`] from a JSON file
pub fn load_series_config(path: impl AsRef<Path>) -> Result<SeriesConfig, PriceError> {
    let contents = std::fs::read_to_string(path)?;
    let config: SeriesConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{series::Reference, types::Protocol};

    #[test]
    fn test_explicit_url_wins() {
        let config = NodeConfig::from_vars(
            Some("http://localhost:8545".to_string()),
            Some("abc".to_string()),
        )
        .unwrap();
        assert_eq!(config.rpc_url, "http://localhost:8545");
    }

    #[test]
    fn test_infura_fallback() {
        let config = NodeConfig::from_vars(Some("  ".to_string()), Some("abc123".to_string())).unwrap();
        assert_eq!(config.rpc_url, "https://mainnet.infura.io/v3/abc123");
    }

    #[test]
    fn test_missing_endpoint() {
        assert!(matches!(
            NodeConfig::from_vars(None, None),
            Err(PriceError::MissingConfig(_))
        ));
    }

    #[test]
    fn test_load_series_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.json");
        std::fs::write(
            &path,
            r#"{
                "start_block": 11504323,
                "end_block": 11506033,
                "protocol": "v2",
                "target": "0xc5ed7350e0fb3f780c756ba7d5d8539dc242a414",
                "reference": {
                    "kind": "single",
                    "pool": "0xe93dc496dbc669d7ee4f03b0eb0a10bb13a4b2a4",
                    "anchor": "coin0"
                },
                "output": "eth_duck.csv"
            }"#,
        )
        .unwrap();

        let config = load_series_config(&path).unwrap();
        assert_eq!(config.protocol, Protocol::V2);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.reference.arity(), 1);
        assert!(!matches!(config.reference, Reference::Stable));
    }

    #[test]
    fn test_load_rejects_inverted_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.json");
        std::fs::write(
            &path,
            r#"{"start_block": 10, "end_block": 9, "protocol": "v3",
                "target": "0x88e6a0c2ddd26feeb64f039a2c41296fcb3f5640",
                "reference": {"kind": "stable"}, "output": "out.csv"}"#,
        )
        .unwrap();

        assert!(matches!(
            load_series_config(&path),
            Err(PriceError::InvalidRange { start: 10, end: 9 })
        ));
    }
}
