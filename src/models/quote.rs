use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cross-chain transfer request as the aggregator sees it
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub from_chain: String,
    pub to_chain: String,
    /// Token symbol, e.g. USDC / USDT
    pub token: String,
    /// Amount in human-readable units
    pub amount: f64,
}

/// Canonical quote shape every provider response is normalized into.
/// Lives only for the duration of one aggregation call.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedQuote {
    pub provider: String,
    pub bridge: String,
    pub amount_out: f64,
    pub fee: f64,
    pub duration_min: u64,
    pub gas_usd: f64,
    pub link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuoteReport {
    pub from_chain: String,
    pub to_chain: String,
    pub token: String,
    pub amount_in: f64,
    /// Surviving quotes sorted by output amount descending
    pub quotes: Vec<NormalizedQuote>,
    pub best_price: Option<NormalizedQuote>,
    pub fastest: Option<NormalizedQuote>,
    pub cheapest: Option<NormalizedQuote>,
    pub fetched_at: DateTime<Utc>,
}

impl QuoteReport {
    /// An empty quote list is a valid "no route found" outcome, not an error
    pub fn new(req: &QuoteRequest, mut quotes: Vec<NormalizedQuote>) -> Self {
        quotes.sort_by(|a, b| {
            b.amount_out
                .partial_cmp(&a.amount_out)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let best_price = quotes.first().cloned();
        let fastest = quotes
            .iter()
            .min_by_key(|q| q.duration_min)
            .cloned();
        let cheapest = quotes
            .iter()
            .min_by(|a, b| a.fee.partial_cmp(&b.fee).unwrap_or(std::cmp::Ordering::Equal))
            .cloned();

        Self {
            from_chain: req.from_chain.clone(),
            to_chain: req.to_chain.clone(),
            token: req.token.clone(),
            amount_in: req.amount,
            quotes,
            best_price,
            fastest,
            cheapest,
            fetched_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(provider: &str, out: f64, fee: f64, mins: u64) -> NormalizedQuote {
        NormalizedQuote {
            provider: provider.to_string(),
            bridge: provider.to_string(),
            amount_out: out,
            fee,
            duration_min: mins,
            gas_usd: 0.5,
            link: String::new(),
        }
    }

    fn request() -> QuoteRequest {
        QuoteRequest {
            from_chain: "ethereum".to_string(),
            to_chain: "arbitrum".to_string(),
            token: "USDC".to_string(),
            amount: 1000.0,
        }
    }

    #[test]
    fn test_report_ranks_by_output_descending() {
        let report = QuoteReport::new(
            &request(),
            vec![quote("a", 995.0, 5.0, 3), quote("b", 998.5, 1.5, 10)],
        );
        assert_eq!(report.quotes[0].provider, "b");
        assert_eq!(report.best_price.as_ref().unwrap().provider, "b");
        assert_eq!(report.fastest.as_ref().unwrap().provider, "a");
        assert_eq!(report.cheapest.as_ref().unwrap().provider, "b");
    }

    #[test]
    fn test_empty_report_is_valid() {
        let report = QuoteReport::new(&request(), vec![]);
        assert!(report.quotes.is_empty());
        assert!(report.best_price.is_none());
        assert!(report.fastest.is_none());
    }
}
