use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use crate::models::{NormalizedQuote, QuoteRequest};
use super::{chain_id, token_address, QuoteSource, SourceError, SANITY_OUTPUT_FACTOR, TOKEN_UNITS};

const QUOTE_URL: &str = "https://api.socket.tech/v2/quote";
const DEEP_LINK: &str = "https://bungee.exchange";
// Socket's public documentation key
const API_KEY: &str = "72a5b4b0-e727-48be-8aa1-5da9d62fe635";

pub struct SocketSource {
    client: Client,
}

impl SocketSource {
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
impl QuoteSource for SocketSource {
    fn name(&self) -> &'static str { "Socket" }

    async fn fetch_quote(&self, req: &QuoteRequest) -> Result<Option<NormalizedQuote>, SourceError> {
        let from_chain = chain_id(&req.from_chain)
            .ok_or_else(|| SourceError::Unsupported(format!("chain {}", req.from_chain)))?;
        let to_chain = chain_id(&req.to_chain)
            .ok_or_else(|| SourceError::Unsupported(format!("chain {}", req.to_chain)))?;
        let from_token = token_address(&req.token, from_chain)
            .ok_or_else(|| SourceError::Unsupported(format!("token {}", req.token)))?;
        let to_token = token_address(&req.token, to_chain)
            .ok_or_else(|| SourceError::Unsupported(format!("token {}", req.token)))?;

        let amount_units = format!("{}", (req.amount * TOKEN_UNITS) as u64);

        let resp = self.client.get(QUOTE_URL)
            .query(&[
                ("fromChainId", from_chain.to_string().as_str()),
                ("toChainId", to_chain.to_string().as_str()),
                ("fromTokenAddress", from_token),
                ("toTokenAddress", to_token),
                ("fromAmount", amount_units.as_str()),
                ("userAddress", "0x0000000000000000000000000000000000000000"),
                ("singleTxOnly", "true"),
                ("sort", "output"),
            ])
            .header("API-KEY", API_KEY)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if resp.status() == 429 {
            return Err(SourceError::RateLimit);
        }
        if !resp.status().is_success() {
            tracing::debug!("Socket quote returned {}", resp.status());
            return Ok(None);
        }

        let data: serde_json::Value = resp.json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(normalize(&data, req.amount))
    }
}

/// Pick the best route out of a raw Socket response and normalize it
pub fn normalize(data: &serde_json::Value, amount_in: f64) -> Option<NormalizedQuote> {
    let route = data["result"]["routes"].get(0)?;

    let raw_output = match &route["toAmount"] {
        serde_json::Value::String(s) => s.parse::<f64>().ok()?,
        serde_json::Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    let amount_out = raw_output / TOKEN_UNITS;

    if amount_out > amount_in * SANITY_OUTPUT_FACTOR {
        tracing::warn!("Socket output {} vs input {} looks like a decimal error, dropping", amount_out, amount_in);
        return None;
    }

    let fee = (amount_in - amount_out).max(0.0);
    let bridge = route["usedBridgeNames"]
        .get(0)
        .and_then(|b| b.as_str())
        .unwrap_or("Socket")
        .to_string();
    let duration_secs = route["serviceTime"].as_f64().unwrap_or(120.0);
    let gas_usd = route["totalGasFeesInUsd"].as_f64().unwrap_or(0.50);

    Some(NormalizedQuote {
        provider: "Socket".to_string(),
        bridge,
        amount_out,
        fee,
        duration_min: (duration_secs / 60.0).round() as u64,
        gas_usd,
        link: DEEP_LINK.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_happy_path() {
        let data = json!({
            "result": {
                "routes": [{
                    "toAmount": "997250000",
                    "usedBridgeNames": ["across"],
                    "serviceTime": 180,
                    "totalGasFeesInUsd": 0.82
                }]
            }
        });
        let quote = normalize(&data, 1000.0).unwrap();
        assert_eq!(quote.provider, "Socket");
        assert_eq!(quote.bridge, "across");
        assert!((quote.amount_out - 997.25).abs() < 1e-9);
        assert!((quote.fee - 2.75).abs() < 1e-9);
        assert_eq!(quote.duration_min, 3);
    }

    #[test]
    fn test_normalize_rejects_implausible_output() {
        let data = json!({
            "result": { "routes": [{ "toAmount": "2000000000000" }] }
        });
        assert!(normalize(&data, 1000.0).is_none());
    }

    #[test]
    fn test_normalize_no_routes() {
        assert!(normalize(&json!({ "result": { "routes": [] } }), 1000.0).is_none());
        assert!(normalize(&json!({}), 1000.0).is_none());
    }

    #[test]
    fn test_normalize_numeric_to_amount() {
        let data = json!({
            "result": { "routes": [{ "toAmount": 995000000.0 }] }
        });
        let quote = normalize(&data, 1000.0).unwrap();
        assert!((quote.amount_out - 995.0).abs() < 1e-9);
        assert_eq!(quote.bridge, "Socket");
        assert_eq!(quote.duration_min, 2);
    }
}
