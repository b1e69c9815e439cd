use chrono::Utc;
use std::collections::BTreeMap;
use std::time::Duration;
use crate::models::{ChainGas, GasReport, GasStatus};
use crate::sources::rpc::RpcGasFetcher;
use super::cache::TtlCache;

const ETH_PRICE_USD: f64 = 3500.0;
const BNB_PRICE_USD: f64 = 600.0;
/// Gas units for a typical swap transaction
const SWAP_GAS_UNITS: f64 = 150_000.0;

/// Keeps the per-chain gas report warm on its own short refresh cycle.
/// The underlying fetcher degrades to constants, so a report is always available
/// once the first refresh ran.
pub struct GasService {
    fetcher: RpcGasFetcher,
    cache: TtlCache<GasReport>,
}

impl GasService {
    pub fn new(ttl: Duration) -> Self {
        Self {
            fetcher: RpcGasFetcher::new(),
            cache: TtlCache::new(ttl),
        }
    }

    /// Cache-first report access
    pub async fn report(&self) -> GasReport {
        if let Some(report) = self.cache.get() {
            return report;
        }
        self.refresh().await
    }

    pub async fn refresh(&self) -> GasReport {
        let (eth_gwei, bsc_gwei) = tokio::join!(
            self.fetcher.fetch_eth_gas(),
            self.fetcher.fetch_bsc_gas(),
        );
        let report = build_report(eth_gwei, bsc_gwei);
        self.cache.set(report.clone());
        report
    }
}

pub fn usd_per_swap(gwei: f64, token_price_usd: f64) -> f64 {
    gwei * SWAP_GAS_UNITS / 1e9 * token_price_usd
}

pub fn classify_eth(gwei: f64) -> GasStatus {
    if gwei < 20.0 {
        GasStatus::Low
    } else if gwei < 50.0 {
        GasStatus::Medium
    } else {
        GasStatus::High
    }
}

pub fn classify_bsc(gwei: f64) -> GasStatus {
    if gwei < 5.0 {
        GasStatus::Low
    } else if gwei < 10.0 {
        GasStatus::Medium
    } else {
        GasStatus::High
    }
}

/// Live chains get priced from gwei; rollups and solana use fixed per-swap costs
pub fn build_report(eth_gwei: f64, bsc_gwei: f64) -> GasReport {
    let mut chains = BTreeMap::new();

    chains.insert(
        "ethereum".to_string(),
        ChainGas::live(eth_gwei, usd_per_swap(eth_gwei, ETH_PRICE_USD), classify_eth(eth_gwei)),
    );
    chains.insert(
        "bsc".to_string(),
        ChainGas::live(bsc_gwei, usd_per_swap(bsc_gwei, BNB_PRICE_USD), classify_bsc(bsc_gwei)),
    );
    chains.insert("arbitrum".to_string(), ChainGas::fixed("0.10"));
    chains.insert("base".to_string(), ChainGas::fixed("0.05"));
    chains.insert("optimism".to_string(), ChainGas::fixed("0.08"));
    chains.insert("polygon".to_string(), ChainGas::fixed("0.02"));
    chains.insert("solana".to_string(), ChainGas::fixed("0.001"));

    GasReport {
        timestamp: Utc::now(),
        chains,
    }
}
