use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use crate::models::{NormalizedQuote, QuoteRequest};
use super::{chain_id, token_address, QuoteSource, SourceError, SANITY_OUTPUT_FACTOR, TOKEN_UNITS};

const QUOTE_URL: &str = "https://li.quest/v1/quote";
const DEEP_LINK: &str = "https://jumper.exchange";

pub struct LiFiSource {
    client: Client,
}

#[derive(Debug, Deserialize)]
pub struct LiFiQuoteResponse {
    estimate: Option<LiFiEstimate>,
    #[serde(rename = "toolDetails")]
    tool_details: Option<LiFiToolDetails>,
}

#[derive(Debug, Deserialize)]
pub struct LiFiEstimate {
    #[serde(rename = "toAmount")]
    to_amount: Option<String>,
    #[serde(rename = "executionDuration")]
    execution_duration: Option<f64>,
    #[serde(rename = "gasCosts")]
    gas_costs: Option<Vec<LiFiGasCost>>,
}

#[derive(Debug, Deserialize)]
pub struct LiFiGasCost {
    #[serde(rename = "amountUSD")]
    amount_usd: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LiFiToolDetails {
    name: Option<String>,
}

impl LiFiSource {
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
impl QuoteSource for LiFiSource {
    fn name(&self) -> &'static str { "LI.FI" }

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
                ("fromChain", from_chain.to_string().as_str()),
                ("toChain", to_chain.to_string().as_str()),
                ("fromToken", from_token),
                ("toToken", to_token),
                ("fromAmount", amount_units.as_str()),
                ("fromAddress", "0x552008c0f6870c2f77e5cC1d2eb9bdff03e30Ea0"),
                ("slippage", "0.03"),
            ])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if resp.status() == 429 {
            return Err(SourceError::RateLimit);
        }
        if !resp.status().is_success() {
            tracing::debug!("LI.FI quote returned {}", resp.status());
            return Ok(None);
        }

        let data: LiFiQuoteResponse = resp.json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(normalize(data, req.amount))
    }
}

/// Convert a raw LI.FI estimate into the canonical quote shape, or reject it
pub fn normalize(data: LiFiQuoteResponse, amount_in: f64) -> Option<NormalizedQuote> {
    let estimate = data.estimate?;

    let raw_output = estimate.to_amount?.parse::<f64>().ok()?;
    let amount_out = raw_output / TOKEN_UNITS;

    if amount_out > amount_in * SANITY_OUTPUT_FACTOR {
        tracing::warn!("LI.FI output {} vs input {} looks like a decimal error, dropping", amount_out, amount_in);
        return None;
    }

    let fee = (amount_in - amount_out).max(0.0);
    let duration_secs = estimate.execution_duration.unwrap_or(120.0);
    let gas_usd = estimate.gas_costs
        .as_ref()
        .and_then(|costs| costs.first())
        .and_then(|c| c.amount_usd.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.50);

    Some(NormalizedQuote {
        provider: "LI.FI".to_string(),
        bridge: data.tool_details
            .and_then(|t| t.name)
            .unwrap_or_else(|| "LI.FI".to_string()),
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

    fn response(to_amount: &str, duration: Option<f64>, gas_usd: Option<&str>) -> LiFiQuoteResponse {
        LiFiQuoteResponse {
            estimate: Some(LiFiEstimate {
                to_amount: Some(to_amount.to_string()),
                execution_duration: duration,
                gas_costs: gas_usd.map(|g| vec![LiFiGasCost { amount_usd: Some(g.to_string()) }]),
            }),
            tool_details: Some(LiFiToolDetails { name: Some("Stargate".to_string()) }),
        }
    }

    #[test]
    fn test_normalize_happy_path() {
        // 998.50 units out for 1000 in
        let quote = normalize(response("998500000", Some(300.0), Some("1.25")), 1000.0).unwrap();
        assert_eq!(quote.bridge, "Stargate");
        assert!((quote.amount_out - 998.5).abs() < 1e-9);
        assert!((quote.fee - 1.5).abs() < 1e-9);
        assert_eq!(quote.duration_min, 5);
        assert!((quote.gas_usd - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_rejects_implausible_output() {
        // 2,000,000 out for 1000 in: over the 1000x bound, must be dropped
        let quote = normalize(response("2000000000000", None, None), 1000.0);
        assert!(quote.is_none());
    }

    #[test]
    fn test_normalize_defaults() {
        let quote = normalize(response("995000000", None, None), 1000.0).unwrap();
        assert_eq!(quote.duration_min, 2);
        assert!((quote.gas_usd - 0.50).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_fee_never_negative() {
        let quote = normalize(response("1000500000", None, None), 1000.0).unwrap();
        assert_eq!(quote.fee, 0.0);
    }

    #[test]
    fn test_normalize_without_estimate() {
        let data = LiFiQuoteResponse { estimate: None, tool_details: None };
        assert!(normalize(data, 1000.0).is_none());
    }
}
