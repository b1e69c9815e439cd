use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GasStatus {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainGas {
    /// Live gas price in the chain's native unit; None for fixed-cost chains
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gwei: Option<f64>,
    pub usd_per_swap: String,
    pub status: GasStatus,
}

impl ChainGas {
    pub fn live(gwei: f64, usd_per_swap: f64, status: GasStatus) -> Self {
        Self {
            gwei: Some(gwei),
            usd_per_swap: format!("{:.2}", usd_per_swap),
            status,
        }
    }

    pub fn fixed(usd_per_swap: &str) -> Self {
        Self {
            gwei: None,
            usd_per_swap: usd_per_swap.to_string(),
            status: GasStatus::Low,
        }
    }
}

/// Per-chain gas cost snapshot. BTreeMap keeps chain order stable in responses.
#[derive(Debug, Clone, Serialize)]
pub struct GasReport {
    pub timestamp: DateTime<Utc>,
    pub chains: BTreeMap<String, ChainGas>,
}
