use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One yield opportunity as reported by the upstream feed. Never mutated after fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolRecord {
    #[serde(default)]
    pub pool: String,
    #[serde(default)]
    pub chain: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(rename = "tvlUsd", default)]
    pub tvl_usd: f64,
    #[serde(default)]
    pub apy: f64,
    #[serde(rename = "apyBase")]
    pub apy_base: Option<f64>,
    #[serde(rename = "apyReward")]
    pub apy_reward: Option<f64>,
    #[serde(default)]
    pub stablecoin: bool,
}

/// PoolRecord plus display attributes derived from it and the resolved site link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedPool {
    #[serde(flatten)]
    pub record: PoolRecord,
    pub chain_icon: String,
    pub apy_color: String,
    pub protocol_url: String,
}

impl EnrichedPool {
    pub fn new(record: PoolRecord, protocol_url: String) -> Self {
        let chain_icon = chain_icon(&record.chain).to_string();
        let apy_color = apy_color(record.apy).to_string();
        Self { record, chain_icon, apy_color, protocol_url }
    }
}

/// The filtered, ranked, enriched pool list served to consumers
#[derive(Debug, Clone, Serialize)]
pub struct PoolSnapshot {
    pub pools: Vec<EnrichedPool>,
    pub fetched_at: DateTime<Utc>,
    /// true when the upstream refresh failed and this is the last known value
    pub stale: bool,
}

pub fn chain_icon(chain: &str) -> &'static str {
    match chain.to_lowercase().as_str() {
        "ethereum" => "Ξ",
        "arbitrum" => "🔷",
        "base" => "🔵",
        "bsc" => "💛",
        "solana" => "⚡",
        "polygon" => "🟣",
        "optimism" => "🔴",
        "avalanche" => "🔺",
        _ => "⛓️",
    }
}

pub fn apy_color(apy: f64) -> &'static str {
    if apy > 10.0 {
        "#22c55e"
    } else if apy > 5.0 {
        "#eab308"
    } else {
        "#9ca3af"
    }
}

pub fn format_tvl(tvl: f64) -> String {
    if tvl >= 1_000_000_000.0 {
        format!("${:.2}B", tvl / 1_000_000_000.0)
    } else if tvl >= 1_000_000.0 {
        format!("${:.0}M", tvl / 1_000_000.0)
    } else {
        format!("${:.0}K", tvl / 1_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apy_color_tiers() {
        assert_eq!(apy_color(12.0), "#22c55e");
        assert_eq!(apy_color(7.5), "#eab308");
        assert_eq!(apy_color(3.0), "#9ca3af");
        assert_eq!(apy_color(5.0), "#9ca3af");
    }

    #[test]
    fn test_chain_icon_case_insensitive() {
        assert_eq!(chain_icon("Ethereum"), "Ξ");
        assert_eq!(chain_icon("BASE"), "🔵");
        assert_eq!(chain_icon("somechain"), "⛓️");
    }

    #[test]
    fn test_format_tvl() {
        assert_eq!(format_tvl(2_500_000_000.0), "$2.50B");
        assert_eq!(format_tvl(42_000_000.0), "$42M");
        assert_eq!(format_tvl(900_000.0), "$900K");
    }

    #[test]
    fn test_record_deserializes_upstream_keys() {
        let raw = r#"{
            "pool": "abc-123",
            "chain": "Ethereum",
            "project": "aave-v3",
            "symbol": "USDC",
            "tvlUsd": 120000000.0,
            "apy": 4.2,
            "apyBase": 4.0,
            "apyReward": 0.2,
            "stablecoin": true
        }"#;
        let record: PoolRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.tvl_usd, 120_000_000.0);
        assert_eq!(record.apy_base, Some(4.0));
        assert!(record.stablecoin);
    }

    #[test]
    fn test_record_tolerates_missing_fields() {
        let record: PoolRecord = serde_json::from_str(r#"{"apy": 2.0}"#).unwrap();
        assert_eq!(record.pool, "");
        assert!(!record.stablecoin);
        assert_eq!(record.apy_base, None);
    }
}
