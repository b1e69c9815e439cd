use async_trait::async_trait;
use lazy_static::lazy_static;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use crate::models::PoolRecord;
use super::{SourceError, YieldFeed};

const POOLS_URL: &str = "https://yields.llama.fi/pools";
const PROTOCOL_URL: &str = "https://api.llama.fi/protocol";

/// DefiLlama yield feed: pool universe + protocol metadata lookups
pub struct LlamaFeed {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct LlamaPoolsResponse {
    data: Vec<PoolRecord>,
}

impl LlamaFeed {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap(),
        }
    }
}

#[async_trait]
impl YieldFeed for LlamaFeed {
    async fn fetch_pools(&self) -> Result<Vec<PoolRecord>, SourceError> {
        let resp = self.client.get(POOLS_URL)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if resp.status() == 429 {
            return Err(SourceError::RateLimit);
        }
        if !resp.status().is_success() {
            return Err(SourceError::Status(resp.status().as_u16()));
        }

        let data: LlamaPoolsResponse = resp.json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(data.data)
    }

    /// Upstream lookup for a protocol's site. Absence of a URL in the response
    /// degrades to the derived fallback, not an error.
    async fn fetch_protocol_url(&self, project: &str) -> Result<String, SourceError> {
        let url = format!("{}/{}", PROTOCOL_URL, project);

        let resp = self.client.get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Ok(fallback_protocol_url(project));
        }

        let data: serde_json::Value = resp.json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(data["url"]
            .as_str()
            .filter(|u| !u.is_empty())
            .map(|u| u.to_string())
            .unwrap_or_else(|| fallback_protocol_url(project)))
    }
}

pub fn fallback_protocol_url(project: &str) -> String {
    format!("https://defillama.com/protocol/{}", project)
}

/// Known protocol front-ends. Exact match first, then substring containment in
/// either direction ("aave-v3" hits "aave", "sky" hits "sky-lending").
pub fn static_protocol_url(project: &str) -> Option<&'static str> {
    let project = project.to_lowercase();

    if let Some(url) = PROTOCOL_URLS.get(project.as_str()) {
        return Some(*url);
    }

    for (key, url) in PROTOCOL_URLS.iter() {
        if project.contains(key) || key.contains(project.as_str()) {
            return Some(*url);
        }
    }

    None
}

lazy_static! {
    static ref PROTOCOL_URLS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("aave", "https://app.aave.com");
        m.insert("aave-v2", "https://app.aave.com");
        m.insert("aave-v3", "https://app.aave.com");
        m.insert("compound", "https://app.compound.finance");
        m.insert("compound-v3", "https://app.compound.finance");
        m.insert("morpho", "https://app.morpho.org");
        m.insert("morpho-blue", "https://app.morpho.org");
        m.insert("spark", "https://app.spark.fi");
        m.insert("maker", "https://app.sky.money");
        m.insert("sky", "https://app.sky.money");
        m.insert("sky-lending", "https://app.sky.money");
        m.insert("ethena", "https://app.ethena.fi");
        m.insert("ethena-usde", "https://app.ethena.fi");
        m.insert("maple", "https://app.maple.finance");
        m.insert("frax", "https://app.frax.finance");
        m.insert("frax-lend", "https://app.frax.finance");
        m.insert("ondo", "https://ondo.finance");
        m.insert("ondo-finance", "https://ondo.finance");
        m.insert("mountain", "https://mountainprotocol.com");
        m.insert("curve", "https://curve.fi");
        m.insert("curve-dex", "https://curve.fi");
        m.insert("convex", "https://www.convexfinance.com");
        m.insert("convex-finance", "https://www.convexfinance.com");
        m.insert("uniswap", "https://app.uniswap.org");
        m.insert("uniswap-v3", "https://app.uniswap.org");
        m.insert("pancakeswap", "https://pancakeswap.finance");
        m.insert("sushiswap", "https://www.sushi.com");
        m.insert("balancer", "https://app.balancer.fi");
        m.insert("velodrome", "https://velodrome.finance");
        m.insert("aerodrome", "https://aerodrome.finance");
        m.insert("yearn", "https://yearn.fi");
        m.insert("yearn-finance", "https://yearn.fi");
        m.insert("beefy", "https://app.beefy.com");
        m.insert("harvest", "https://app.harvest.finance");
        m.insert("sommelier", "https://app.sommelier.finance");
        m.insert("venus", "https://app.venus.io");
        m.insert("alpaca", "https://app.alpacafinance.org");
        m.insert("radiant", "https://app.radiant.capital");
        m.insert("radiant-v2", "https://app.radiant.capital");
        m.insert("gmx", "https://app.gmx.io");
        m.insert("pendle", "https://app.pendle.finance");
        m.insert("camelot", "https://app.camelot.exchange");
        m.insert("jones", "https://app.jonesdao.io");
        m.insert("moonwell", "https://moonwell.fi");
        m.insert("seamless", "https://app.seamlessprotocol.com");
        m.insert("extra", "https://app.extrafi.io");
        m.insert("exactly", "https://app.exact.ly");
        m.insert("sonne", "https://sonne.finance");
        m.insert("benqi", "https://app.benqi.fi");
        m.insert("trader-joe", "https://traderjoexyz.com");
        m.insert("kamino", "https://app.kamino.finance");
        m.insert("marginfi", "https://app.marginfi.com");
        m.insert("drift", "https://app.drift.trade");
        m.insert("solend", "https://solend.fi");
        m.insert("meteora", "https://app.meteora.ag");
        m.insert("raydium", "https://raydium.io");
        m.insert("orca", "https://www.orca.so");
        m.insert("jito", "https://www.jito.network");
        m.insert("hyperion", "https://app.hyperion.xyz");
        m.insert("liquidswap", "https://liquidswap.com");
        m.insert("thala", "https://app.thala.fi");
        m.insert("aptin", "https://aptin.io");
        m.insert("quickswap", "https://quickswap.exchange");
        m.insert("strata", "https://strataprotocol.com");
        m.insert("strata-finance", "https://strataprotocol.com");
        m.insert("fluid", "https://fluid.instadapp.io");
        m.insert("instadapp", "https://instadapp.io");
        m.insert("gearbox", "https://app.gearbox.fi");
        m.insert("euler", "https://app.euler.finance");
        m.insert("notional", "https://notional.finance");
        m.insert("clearpool", "https://clearpool.finance");
        m.insert("goldfinch", "https://app.goldfinch.finance");
        m.insert("centrifuge", "https://app.centrifuge.io");
        m.insert("truefi", "https://app.truefi.io");
        m.insert("hyperliquid", "https://app.hyperliquid.xyz");
        m.insert("justlend", "https://justlend.org");
        m.insert("resolv", "https://app.resolv.xyz");
        m.insert("level", "https://app.level.finance");
        m.insert("ringfi", "https://ring.fi");
        m
    };
}
