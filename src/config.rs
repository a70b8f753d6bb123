use crate::solidmath::U256;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Knobs a host can set before feeding events. Every field has a default, so a config
/// file only needs the ones it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// a repay leaving less than this owed takes the borrower out of the adjusted count
    pub dust_threshold: U256,
    /// decimals of the vtokens themselves
    pub vtoken_decimals: u32,
    /// refuse events that don't come strictly after the last one applied
    pub strict_ordering: bool,
    /// where `SledHandle::from_config` keeps its database, temporary when unset
    pub sled_path: Option<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        IndexerConfig {
            dust_threshold: U256::from(10),
            vtoken_decimals: 8,
            strict_ordering: false,
            sled_path: None,
        }
    }
}

impl IndexerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("parsing indexer config")
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading indexer config {}", path.display()))?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = IndexerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, IndexerConfig::default());
        assert_eq!(config.dust_threshold, U256::from(10));
    }

    #[test]
    fn partial_override() {
        // primitive-types reads U256 as a hex string
        let config =
            IndexerConfig::from_json_str(r#"{"dust_threshold":"0x3e8","strict_ordering":true}"#)
                .unwrap();
        assert_eq!(config.dust_threshold, U256::from(1000));
        assert!(config.strict_ordering);
        assert_eq!(config.vtoken_decimals, 8);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(IndexerConfig::from_json_str("{\"vtoken_decimals\":\"eight\"}").is_err());
        assert!(IndexerConfig::from_path("/definitely/not/here.json").is_err());
    }
}
