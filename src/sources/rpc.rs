use reqwest::Client;
use std::time::Duration;

/// Equivalent public endpoints tried in order until one answers sanely
pub const ETH_RPCS: &[&str] = &[
    "https://eth.llamarpc.com",
    "https://rpc.ankr.com/eth",
    "https://ethereum.publicnode.com",
];

pub const BSC_RPCS: &[&str] = &[
    "https://bsc-dataseed.binance.org/",
    "https://bsc.rpc.blxrbdn.com",
    "https://rpc.ankr.com/bsc",
];

/// Documented last-resort values when every endpoint is down
pub const ETH_FALLBACK_GWEI: f64 = 18.0;
pub const BSC_FALLBACK_GWEI: f64 = 3.0;

/// A gas price outside (0, 10000) gwei is treated as a broken endpoint
pub const MAX_PLAUSIBLE_GWEI: f64 = 10_000.0;

/// Fetches the current gas price over a chain of equivalent JSON-RPC endpoints.
/// Never fails: exhausting the chain degrades to the fallback constant.
pub struct RpcGasFetcher {
    client: Client,
}

impl RpcGasFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
        }
    }

    pub async fn fetch_eth_gas(&self) -> f64 {
        self.gas_price_gwei(ETH_RPCS, ETH_FALLBACK_GWEI).await
    }

    pub async fn fetch_bsc_gas(&self) -> f64 {
        self.gas_price_gwei(BSC_RPCS, BSC_FALLBACK_GWEI).await
    }

    /// First endpoint returning a plausible positive price wins; the rest are skipped
    pub async fn gas_price_gwei(&self, rpcs: &[&str], fallback_gwei: f64) -> f64 {
        for rpc in rpcs {
            match self.try_endpoint(rpc).await {
                Some(gwei) => {
                    tracing::debug!("Got {} gwei from {}", gwei, rpc);
                    return (gwei * 1000.0).round() / 1000.0;
                }
                None => {
                    tracing::debug!("RPC {} failed or implausible, trying next", rpc);
                    continue;
                }
            }
        }

        tracing::warn!("All RPCs failed, using fallback of {} gwei", fallback_gwei);
        fallback_gwei
    }

    async fn try_endpoint(&self, rpc: &str) -> Option<f64> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_gasPrice",
            "params": [],
            "id": 1,
        });

        let resp = self.client.post(rpc)
            .json(&body)
            .send()
            .await
            .ok()?;

        if !resp.status().is_success() {
            return None;
        }

        let data: serde_json::Value = resp.json().await.ok()?;
        let gwei = parse_hex_gwei(data["result"].as_str()?)?;

        plausible(gwei).then_some(gwei)
    }
}

/// "0x3b9aca00" (wei, hex) -> 1.0 gwei
pub fn parse_hex_gwei(result: &str) -> Option<f64> {
    let hex = result.trim_start_matches("0x");
    let wei = u128::from_str_radix(hex, 16).ok()?;
    Some(wei as f64 / 1e9)
}

pub fn plausible(gwei: f64) -> bool {
    gwei > 0.0 && gwei < MAX_PLAUSIBLE_GWEI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_gwei() {
        // 1 gwei = 1e9 wei = 0x3b9aca00
        assert_eq!(parse_hex_gwei("0x3b9aca00"), Some(1.0));
        // 18.5 gwei
        let gwei = parse_hex_gwei("0x44eaf9900").unwrap();
        assert!((gwei - 18.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_hex_gwei_invalid() {
        assert_eq!(parse_hex_gwei("not-hex"), None);
        assert_eq!(parse_hex_gwei("0xzz"), None);
    }

    #[test]
    fn test_plausibility_bounds() {
        assert!(plausible(12.5));
        assert!(plausible(0.001));
        assert!(!plausible(0.0));
        assert!(!plausible(-3.0));
        assert!(!plausible(10_000.0));
        assert!(!plausible(250_000.0));
    }

    #[test]
    fn test_fallback_constants() {
        assert_eq!(ETH_FALLBACK_GWEI, 18.0);
        assert_eq!(BSC_FALLBACK_GWEI, 3.0);
    }

    /// One-shot local endpoint answering with a canned JSON-RPC body
    async fn rpc_stub(result_hex: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let body = format!(r#"{{"jsonrpc":"2.0","id":1,"result":"{}"}}"#, result_hex);
                let resp = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(resp.as_bytes()).await;
            }
        });
        format!("http://{}/", addr)
    }

    /// Bound-then-dropped port: connecting gets refused
    async fn dead_endpoint() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_first_plausible_endpoint_wins() {
        let dead = dead_endpoint().await;
        // 0 gwei: parses but fails the plausibility bound
        let implausible = rpc_stub("0x0").await;
        // 12.5 gwei
        let good = rpc_stub("0x2e90edd00").await;

        let fetcher = RpcGasFetcher::new();
        let rpcs = [dead.as_str(), implausible.as_str(), good.as_str()];
        let gwei = fetcher.gas_price_gwei(&rpcs, 99.0).await;
        assert_eq!(gwei, 12.5);
    }

    #[tokio::test]
    async fn test_exhausted_chain_returns_fallback() {
        let dead_a = dead_endpoint().await;
        let dead_b = dead_endpoint().await;

        let fetcher = RpcGasFetcher::new();
        let rpcs = [dead_a.as_str(), dead_b.as_str()];
        assert_eq!(fetcher.gas_price_gwei(&rpcs, ETH_FALLBACK_GWEI).await, 18.0);
    }
}
