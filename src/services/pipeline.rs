use chrono::Utc;
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use crate::models::{EnrichedPool, PoolRecord, PoolSnapshot};
use crate::sources::llama::{fallback_protocol_url, static_protocol_url};
use crate::sources::{SourceError, YieldFeed};
use super::cache::{KeyedTtlCache, TtlCache};

const MIN_TVL_USD: f64 = 10_000_000.0;
const MIN_APY: f64 = 1.0;
const MAX_APY: f64 = 50.0;
const MAX_POOLS: usize = 25;

#[derive(Debug, Default)]
pub struct FetchStats {
    pub requests: AtomicU64,
    pub cache_hits: AtomicU64,
    pub upstream_fetches: AtomicU64,
    pub failures: AtomicU64,
    pub stale_served: AtomicU64,
}

/// Fetches the pool universe, filters and ranks it, enriches survivors with a
/// resolved protocol link, and guards the result with the snapshot cache.
/// Stateless between refreshes apart from the caches it owns.
pub struct PoolPipeline {
    feed: Arc<dyn YieldFeed>,
    cache: TtlCache<PoolSnapshot>,
    link_cache: KeyedTtlCache<String>,
    stats: FetchStats,
}

impl PoolPipeline {
    pub fn new(feed: Arc<dyn YieldFeed>, snapshot_ttl: Duration, link_ttl: Duration) -> Self {
        Self {
            feed,
            cache: TtlCache::new(snapshot_ttl),
            link_cache: KeyedTtlCache::new(link_ttl),
            stats: FetchStats::default(),
        }
    }

    /// Cache-first snapshot access. A fresh cache never touches upstream.
    /// On upstream failure the previous snapshot is served marked stale;
    /// with nothing cached yet the failure propagates.
    pub async fn fetch_pools(&self) -> Result<PoolSnapshot, SourceError> {
        self.stats.requests.fetch_add(1, Ordering::Relaxed);

        if let Some(snapshot) = self.cache.get() {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Serving cached pool snapshot ({} pools)", snapshot.pools.len());
            return Ok(snapshot);
        }

        self.stats.upstream_fetches.fetch_add(1, Ordering::Relaxed);
        match self.feed.fetch_pools().await {
            Ok(raw) => {
                let total = raw.len();
                let filtered = filter_pools(raw);
                let pools = self.enrich(filtered).await;
                tracing::info!("✓ Pool refresh: {} -> {} pools after filtering", total, pools.len());
                if let Some(top) = pools.first() {
                    tracing::debug!(
                        "Top pool: {} {} at {:.2}% ({})",
                        top.record.project,
                        top.record.symbol,
                        top.record.apy,
                        crate::models::pool::format_tvl(top.record.tvl_usd)
                    );
                }

                let snapshot = PoolSnapshot {
                    pools,
                    fetched_at: Utc::now(),
                    stale: false,
                };
                self.cache.set(snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Pool feed error: {}", e);

                match self.cache.get_or_stale() {
                    Some((snapshot, _)) => {
                        self.stats.stale_served.fetch_add(1, Ordering::Relaxed);
                        tracing::info!("Serving stale pool snapshot after feed error");
                        Ok(PoolSnapshot { stale: true, ..snapshot })
                    }
                    None => Err(e),
                }
            }
        }
    }

    async fn enrich(&self, records: Vec<PoolRecord>) -> Vec<EnrichedPool> {
        // concurrent link resolution; join_all keeps the ranked order
        let futures = records.into_iter().map(|record| async move {
            let url = self.resolve_protocol_url(&record.project).await;
            EnrichedPool::new(record, url)
        });
        join_all(futures).await
    }

    /// Static table first, then the per-protocol cache, then the lookup endpoint
    async fn resolve_protocol_url(&self, project: &str) -> String {
        if let Some(url) = static_protocol_url(project) {
            return url.to_string();
        }

        if let Some(url) = self.link_cache.get(project) {
            return url;
        }

        match self.feed.fetch_protocol_url(project).await {
            Ok(url) => {
                self.link_cache.insert(project.to_string(), url.clone());
                url
            }
            Err(e) => {
                tracing::warn!("Protocol lookup failed for {}: {}", project, e);
                fallback_protocol_url(project)
            }
        }
    }

    pub fn cache_info(&self) -> serde_json::Value {
        match self.cache.last_updated() {
            None => serde_json::json!({
                "is_cached": false,
                "last_updated": null,
                "next_update": null,
            }),
            Some(last) => serde_json::json!({
                "is_cached": true,
                "last_updated": last.to_rfc3339(),
                "next_update": self.cache.next_update().map(|t| t.to_rfc3339()),
                "age_minutes": self.cache.age().map(|a| a.as_secs() / 60),
                "cached_links": self.link_cache.len(),
            }),
        }
    }

    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }
}

/// The filter predicate plus deterministic ranking: stablecoin pools with real
/// TVL, plausible yield, and no outdated/test markers, best APY first, top 25.
pub fn filter_pools(records: Vec<PoolRecord>) -> Vec<PoolRecord> {
    let mut pools: Vec<PoolRecord> = records
        .into_iter()
        .filter(|p| {
            p.stablecoin
                && p.tvl_usd >= MIN_TVL_USD
                && p.apy > MIN_APY
                && p.apy < MAX_APY
                && !p.pool.contains("outdated")
                && !p.project.contains("test")
        })
        .collect();

    pools.sort_by(|a, b| b.apy.partial_cmp(&a.apy).unwrap_or(std::cmp::Ordering::Equal));
    pools.truncate(MAX_POOLS);
    pools
}
