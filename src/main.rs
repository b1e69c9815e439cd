mod config;
mod models;
mod sources;
mod services;

use std::sync::Arc;
use axum::{
    Router,
    routing::get,
    extract::{Query, State, ws::{WebSocket, WebSocketUpgrade, Message}},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::time::{interval, Duration};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use models::{Notification, QuoteRequest};
use services::{AlertEngine, GasService, PoolPipeline, QuoteAggregator, RuleStore, TracingSink};
use sources::llama::LlamaFeed;
use sources::SourceError;

const RECENT_NOTIFICATIONS: usize = 100;

pub struct AppState {
    pub pipeline: Arc<PoolPipeline>,
    pub quotes: Arc<QuoteAggregator>,
    pub gas: Arc<GasService>,
    pub alerts: Arc<AlertEngine>,
    pub rules: Arc<RuleStore>,
    /// Recently fired notifications, newest last
    pub notifications: RwLock<Vec<Notification>>,
}

impl AppState {
    fn remember(&self, fired: &[Notification]) {
        if fired.is_empty() {
            return;
        }
        let mut recent = self.notifications.write();
        recent.extend(fired.iter().cloned());
        let overflow = recent.len().saturating_sub(RECENT_NOTIFICATIONS);
        if overflow > 0 {
            recent.drain(..overflow);
        }
    }
}

#[tokio::main(worker_threads = 4)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,yield_gatherer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n🚀 Yield Gatherer Starting...\n");

    // Load configuration
    let config = Config::load()?;
    tracing::info!("✓ Configuration loaded");

    // Initialize services
    let feed = Arc::new(LlamaFeed::new());
    let pipeline = Arc::new(PoolPipeline::new(
        feed,
        Duration::from_secs(config.pools.ttl_secs),
        Duration::from_secs(config.pools.link_ttl_secs),
    ));
    let quotes = Arc::new(QuoteAggregator::new());
    let gas = Arc::new(GasService::new(Duration::from_secs(config.gas.refresh_secs)));
    let alerts = Arc::new(AlertEngine::new(Duration::from_secs(config.alerts.cooldown_secs)));
    let rules = Arc::new(RuleStore::new(&config.alerts.rules_file));

    let state = Arc::new(AppState {
        pipeline,
        quotes,
        gas,
        alerts,
        rules,
        notifications: RwLock::new(Vec::new()),
    });

    // Background: pool refresh + alert check on each new snapshot
    println!("📥 Starting pool refresh ({}s cycle, {}s TTL)...", config.pools.refresh_secs, config.pools.ttl_secs);
    let pool_state = state.clone();
    let pool_interval = config.pools.refresh_secs;
    tokio::spawn(async move {
        let sink = TracingSink;
        let mut last_snapshot: Option<DateTime<Utc>> = None;
        let mut ticker = interval(Duration::from_secs(pool_interval));
        loop {
            ticker.tick().await;
            match pool_state.pipeline.fetch_pools().await {
                Ok(snapshot) => {
                    // the matcher runs once per new snapshot, never on cache
                    // hits or stale re-serves
                    if !snapshot.stale && last_snapshot != Some(snapshot.fetched_at) {
                        last_snapshot = Some(snapshot.fetched_at);
                        let rules = pool_state.rules.load();
                        let fired = pool_state.alerts.run(&snapshot.pools, &rules, &sink);
                        pool_state.remember(&fired);
                    }
                }
                Err(e) => {
                    tracing::error!("Pool refresh failed with empty cache: {}", e);
                }
            }
        }
    });

    // Background: gas report on its own shorter cycle
    println!("⛽ Starting gas refresh ({}s cycle)...", config.gas.refresh_secs);
    let gas_state = state.clone();
    let gas_interval = config.gas.refresh_secs;
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(gas_interval));
        loop {
            ticker.tick().await;
            let report = gas_state.gas.refresh().await;
            tracing::debug!("Gas report refreshed ({} chains)", report.chains.len());
        }
    });

    // Router
    let app = Router::new()
        .route("/pools", get(get_pools))
        .route("/pools/cache", get(get_cache_info))
        .route("/gas", get(get_gas))
        .route("/quote", get(get_quote))
        .route("/notifications", get(get_notifications))
        .route("/health", get(health))
        .route("/stats", get(get_stats))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    println!("\n✓ Server ready on http://{}\n", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// REST Handlers

async fn get_pools(
    State(state): State<Arc<AppState>>,
) -> Result<axum::Json<models::PoolSnapshot>, (StatusCode, String)> {
    state.pipeline.fetch_pools().await
        .map(axum::Json)
        .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))
}

async fn get_cache_info(State(state): State<Arc<AppState>>) -> axum::Json<serde_json::Value> {
    axum::Json(state.pipeline.cache_info())
}

async fn get_gas(State(state): State<Arc<AppState>>) -> axum::Json<models::GasReport> {
    axum::Json(state.gas.report().await)
}

async fn get_quote(
    State(state): State<Arc<AppState>>,
    Query(req): Query<QuoteRequest>,
) -> Result<axum::Json<models::QuoteReport>, (StatusCode, String)> {
    state.quotes.fetch_quotes(&req).await
        .map(axum::Json)
        .map_err(|e| match e {
            SourceError::Unsupported(_) => (StatusCode::BAD_REQUEST, e.to_string()),
            _ => (StatusCode::BAD_GATEWAY, e.to_string()),
        })
}

async fn get_notifications(State(state): State<Arc<AppState>>) -> axum::Json<Vec<Notification>> {
    axum::Json(state.notifications.read().clone())
}

async fn get_stats(State(state): State<Arc<AppState>>) -> axum::Json<serde_json::Value> {
    use std::sync::atomic::Ordering;
    let stats = state.pipeline.stats();

    axum::Json(serde_json::json!({
        "pool_requests": stats.requests.load(Ordering::Relaxed),
        "pool_cache_hits": stats.cache_hits.load(Ordering::Relaxed),
        "pool_upstream_fetches": stats.upstream_fetches.load(Ordering::Relaxed),
        "pool_fetch_failures": stats.failures.load(Ordering::Relaxed),
        "pool_stale_served": stats.stale_served.load(Ordering::Relaxed),
        "active_dedupe_keys": state.alerts.pending_keys(),
        "recent_notifications": state.notifications.read().len(),
    }))
}

async fn health() -> &'static str {
    "OK"
}

// WebSocket Handler

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut update_ticker = interval(Duration::from_secs(30));
    let mut heartbeat_ticker = interval(Duration::from_secs(10));
    let mut watermark = Utc::now();

    loop {
        tokio::select! {
            _ = update_ticker.tick() => {
                if let Ok(snapshot) = state.pipeline.fetch_pools().await {
                    let msg = serde_json::json!({
                        "type": "pool_update",
                        "data": snapshot,
                    });
                    match tokio::time::timeout(
                        Duration::from_secs(5),
                        sender.send(Message::Text(msg.to_string()))
                    ).await {
                        Ok(Ok(_)) => {},
                        _ => return,
                    }
                }

                // push anything that fired since the last tick
                let fresh: Vec<Notification> = state.notifications.read()
                    .iter()
                    .filter(|n| n.fired_at > watermark)
                    .cloned()
                    .collect();

                if !fresh.is_empty() {
                    watermark = fresh.iter().map(|n| n.fired_at).max().unwrap_or(watermark);
                    let msg = serde_json::json!({
                        "type": "alert",
                        "data": fresh,
                    });
                    let _ = sender.send(Message::Text(msg.to_string())).await;
                }
            }

            _ = heartbeat_ticker.tick() => {
                if sender.send(Message::Ping(vec![])).await.is_err() {
                    return;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Ok(Message::Pong(_))) => {},
                    _ => {}
                }
            }
        }
    }
}
