use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub pools: PoolsConfig,
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PoolsConfig {
    /// Snapshot freshness window in seconds
    #[serde(default = "default_pool_ttl")]
    pub ttl_secs: u64,
    /// Refresh loop interval (cache-first, so this can be shorter than the TTL)
    #[serde(default = "default_pool_refresh")]
    pub refresh_secs: u64,
    /// Resolved protocol link freshness window
    #[serde(default = "default_link_ttl")]
    pub link_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GasConfig {
    #[serde(default = "default_gas_refresh")]
    pub refresh_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertsConfig {
    /// Minimum interval between repeated notifications for the same (rule, pool)
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
    #[serde(default = "default_rules_file")]
    pub rules_file: String,
}

fn default_pool_ttl() -> u64 { 3600 }
fn default_pool_refresh() -> u64 { 300 }
fn default_link_ttl() -> u64 { 86400 }
fn default_gas_refresh() -> u64 { 30 }
fn default_cooldown() -> u64 { 60 }
fn default_rules_file() -> String { "./data/alerts.json".to_string() }

impl Default for PoolsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_pool_ttl(),
            refresh_secs: default_pool_refresh(),
            link_ttl_secs: default_link_ttl(),
        }
    }
}

impl Default for GasConfig {
    fn default() -> Self {
        Self { refresh_secs: default_gas_refresh() }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
            rules_file: default_rules_file(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string("config.toml")?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
