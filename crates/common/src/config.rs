use anyhow::Result;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: General,
    pub polymarket: Polymarket,
    pub enrichment: Enrichment,
    pub analysis: Analysis,
}

#[derive(Debug, Deserialize)]
pub struct General {
    pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Polymarket {
    pub data_api_url: String,
    pub gamma_api_url: String,
    pub profile_url: String,
    pub subgraph_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Enrichment {
    /// Holders fetched concurrently per batch. Kept small: the data API has
    /// no published rate policy and the inter-batch delay is the only
    /// throttle we apply.
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub subgraph_page_limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct Analysis {
    pub holders_per_market: u32,
    pub side_ratio_threshold: f64,
    pub top_holder_share_threshold: f64,
    pub min_holders_for_flag: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        let content = std::fs::read_to_string("config/default.toml")?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_config() {
        let config = Config::from_toml_str(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config.general.log_level, "info");
        assert!(config.enrichment.batch_size >= 1);
        assert!(config.polymarket.request_timeout_secs > 0);
        assert!(config.analysis.side_ratio_threshold > 1.0);
    }

    #[test]
    fn test_rejects_missing_section() {
        let toml = r#"
[general]
log_level = "info"
"#;
        assert!(Config::from_toml_str(toml).is_err());
    }
}
