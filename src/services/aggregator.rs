use futures::future::join_all;
use std::sync::Arc;
use crate::models::{QuoteReport, QuoteRequest};
use crate::sources::lifi::LiFiSource;
use crate::sources::socket::SocketSource;
use crate::sources::{chain_id, token_address, QuoteSource, SourceError};

/// Fans one transfer request out to every configured provider concurrently.
/// A provider failing, timing out, or answering garbage never affects the
/// others; all of them failing is an empty report, not an error.
pub struct QuoteAggregator {
    sources: Vec<Arc<dyn QuoteSource>>,
}

impl QuoteAggregator {
    pub fn new() -> Self {
        Self {
            sources: vec![
                Arc::new(LiFiSource::new()),
                Arc::new(SocketSource::new()),
            ],
        }
    }

    #[cfg(test)]
    pub fn with_sources(sources: Vec<Arc<dyn QuoteSource>>) -> Self {
        Self { sources }
    }

    pub async fn fetch_quotes(&self, req: &QuoteRequest) -> Result<QuoteReport, SourceError> {
        // reject unroutable requests before bothering any provider
        let from = chain_id(&req.from_chain)
            .ok_or_else(|| SourceError::Unsupported(format!("chain {}", req.from_chain)))?;
        let to = chain_id(&req.to_chain)
            .ok_or_else(|| SourceError::Unsupported(format!("chain {}", req.to_chain)))?;
        if token_address(&req.token, from).is_none() || token_address(&req.token, to).is_none() {
            return Err(SourceError::Unsupported(format!("token {}", req.token)));
        }
        if !(req.amount > 0.0) {
            return Err(SourceError::Unsupported(format!("amount {}", req.amount)));
        }

        let fetches = self.sources.iter().map(|source| async move {
            match source.fetch_quote(req).await {
                Ok(Some(quote)) => Some(quote),
                Ok(None) => {
                    tracing::debug!("{}: no route for {} {} -> {}", source.name(), req.token, req.from_chain, req.to_chain);
                    None
                }
                Err(e) => {
                    tracing::warn!("{} quote error: {}", source.name(), e);
                    None
                }
            }
        });

        let quotes: Vec<_> = join_all(fetches).await.into_iter().flatten().collect();
        tracing::info!("✓ Quote fan-out: {}/{} providers answered", quotes.len(), self.sources.len());

        Ok(QuoteReport::new(req, quotes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizedQuote;
    use async_trait::async_trait;

    struct StubSource {
        name: &'static str,
        result: Result<Option<f64>, ()>,
    }

    #[async_trait]
    impl QuoteSource for StubSource {
        fn name(&self) -> &'static str { self.name }

        async fn fetch_quote(&self, req: &QuoteRequest) -> Result<Option<NormalizedQuote>, SourceError> {
            match self.result {
                Ok(Some(out)) => Ok(Some(NormalizedQuote {
                    provider: self.name.to_string(),
                    bridge: self.name.to_string(),
                    amount_out: out,
                    fee: (req.amount - out).max(0.0),
                    duration_min: 2,
                    gas_usd: 0.5,
                    link: String::new(),
                })),
                Ok(None) => Ok(None),
                Err(()) => Err(SourceError::Network("boom".to_string())),
            }
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

    fn aggregator(results: Vec<(&'static str, Result<Option<f64>, ()>)>) -> QuoteAggregator {
        QuoteAggregator::with_sources(
            results
                .into_iter()
                .map(|(name, result)| Arc::new(StubSource { name, result }) as Arc<dyn QuoteSource>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_one_provider_failing_does_not_drop_the_other() {
        let agg = aggregator(vec![("A", Err(())), ("B", Ok(Some(998.0)))]);
        let report = agg.fetch_quotes(&request()).await.unwrap();
        assert_eq!(report.quotes.len(), 1);
        assert_eq!(report.quotes[0].provider, "B");
    }

    #[tokio::test]
    async fn test_all_providers_failing_is_empty_not_error() {
        let agg = aggregator(vec![("A", Err(())), ("B", Ok(None))]);
        let report = agg.fetch_quotes(&request()).await.unwrap();
        assert!(report.quotes.is_empty());
        assert!(report.best_price.is_none());
    }

    #[tokio::test]
    async fn test_quotes_ranked_best_output_first() {
        let agg = aggregator(vec![("A", Ok(Some(995.0))), ("B", Ok(Some(998.5)))]);
        let report = agg.fetch_quotes(&request()).await.unwrap();
        assert_eq!(report.quotes[0].provider, "B");
        assert_eq!(report.quotes[1].provider, "A");
    }

    #[tokio::test]
    async fn test_unsupported_route_is_a_typed_error() {
        let agg = aggregator(vec![("A", Ok(Some(995.0)))]);
        let mut req = request();
        req.from_chain = "near".to_string();
        assert!(matches!(agg.fetch_quotes(&req).await, Err(SourceError::Unsupported(_))));

        let mut req = request();
        req.token = "DAI".to_string();
        assert!(matches!(agg.fetch_quotes(&req).await, Err(SourceError::Unsupported(_))));
    }
}
