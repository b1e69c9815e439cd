pub mod llama;
pub mod lifi;
pub mod socket;
pub mod rpc;

use async_trait::async_trait;
use crate::models::{NormalizedQuote, PoolRecord, QuoteRequest};

/// Upstream yield feed: the full pool universe plus per-protocol site lookups
#[async_trait]
pub trait YieldFeed: Send + Sync {
    async fn fetch_pools(&self) -> Result<Vec<PoolRecord>, SourceError>;
    async fn fetch_protocol_url(&self, project: &str) -> Result<String, SourceError>;
}

/// One bridge/swap quote provider. Ok(None) means the provider found no route;
/// Err means the provider itself failed. Neither outcome may affect siblings.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_quote(&self, req: &QuoteRequest) -> Result<Option<NormalizedQuote>, SourceError>;
}

#[derive(Debug)]
pub enum SourceError {
    Network(String),
    Status(u16),
    Parse(String),
    RateLimit,
    Unsupported(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Network(e) => write!(f, "Network error: {}", e),
            SourceError::Status(code) => write!(f, "HTTP status {}", code),
            SourceError::Parse(e) => write!(f, "Parse error: {}", e),
            SourceError::RateLimit => write!(f, "Rate limited"),
            SourceError::Unsupported(what) => write!(f, "Unsupported: {}", what),
        }
    }
}

impl std::error::Error for SourceError {}

/// EVM chain ids for the chains bridge providers understand
pub fn chain_id(chain: &str) -> Option<u64> {
    match chain.to_lowercase().as_str() {
        "ethereum" => Some(1),
        "arbitrum" => Some(42161),
        "base" => Some(8453),
        "optimism" => Some(10),
        "polygon" => Some(137),
        "bsc" => Some(56),
        _ => None,
    }
}

/// Canonical stablecoin contract per chain id
pub fn token_address(token: &str, chain_id: u64) -> Option<&'static str> {
    match (token.to_uppercase().as_str(), chain_id) {
        ("USDC", 1) => Some("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
        ("USDC", 42161) => Some("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"),
        ("USDC", 8453) => Some("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
        ("USDC", 10) => Some("0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"),
        ("USDC", 137) => Some("0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359"),
        ("USDC", 56) => Some("0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d"),
        ("USDT", 1) => Some("0xdAC17F958D2ee523a2206206994597C13D831ec7"),
        ("USDT", 42161) => Some("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"),
        ("USDT", 8453) => Some("0xfde4C96c8593536E31F229EA8f37b2ADa2699bb2"),
        ("USDT", 10) => Some("0x94b008aA00579c1307B0EF2c499aD98a8ce58e58"),
        ("USDT", 137) => Some("0xc2132D05D31c914a87C6611C10748AEb04B58e8F"),
        ("USDT", 56) => Some("0x55d398326f99059fF775485246999027B3197955"),
        _ => None,
    }
}

/// Both supported stablecoins use 6-decimal accounting on the provider side
pub const TOKEN_UNITS: f64 = 1e6;

/// Reject a normalized output this much larger than the input as a decimal error
pub const SANITY_OUTPUT_FACTOR: f64 = 1000.0;
