use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::EnrichedPool;

/// User-defined threshold rule. Persisted outside the core; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    /// Case-insensitive substring filter on the pool's project; None/"" matches all
    #[serde(default)]
    pub protocol: Option<String>,
    /// Exact chain filter; None/"" matches all
    #[serde(default)]
    pub chain: Option<String>,
    pub condition: AlertCondition,
    pub target_apy: f64,
    pub active: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCondition {
    Above,
    Below,
}

impl AlertRule {
    /// A filter left empty by the user matches anything
    pub fn protocol_filter(&self) -> Option<&str> {
        self.protocol.as_deref().filter(|s| !s.is_empty())
    }

    pub fn chain_filter(&self) -> Option<&str> {
        self.chain.as_deref().filter(|s| !s.is_empty())
    }

    pub fn matches(&self, pool: &EnrichedPool) -> bool {
        let match_protocol = self
            .protocol_filter()
            .map(|p| pool.record.project.to_lowercase().contains(&p.to_lowercase()))
            .unwrap_or(true);
        let match_chain = self
            .chain_filter()
            .map(|c| pool.record.chain == c)
            .unwrap_or(true);
        match_protocol && match_chain
    }

    pub fn triggered(&self, apy: f64) -> bool {
        match self.condition {
            AlertCondition::Above => apy > self.target_apy,
            AlertCondition::Below => apy < self.target_apy,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub rule_id: String,
    pub pool_id: String,
    pub title: String,
    pub body: String,
    pub apy: f64,
    pub fired_at: DateTime<Utc>,
}

impl Notification {
    pub fn for_match(rule: &AlertRule, pool: &EnrichedPool) -> Self {
        let record = &pool.record;
        let direction = match rule.condition {
            AlertCondition::Above => "above",
            AlertCondition::Below => "below",
        };
        Self {
            rule_id: rule.id.clone(),
            pool_id: record.pool.clone(),
            title: format!("🔔 APY Alert: {}", record.project),
            body: format!(
                "{} on {}: {:.2}% APY (target: {} {}%)",
                record.symbol, record.chain, record.apy, direction, rule.target_apy
            ),
            apy: record.apy,
            fired_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pool::PoolRecord;

    fn pool(project: &str, chain: &str, apy: f64) -> EnrichedPool {
        let record = PoolRecord {
            pool: format!("{}-{}", project, chain),
            chain: chain.to_string(),
            project: project.to_string(),
            symbol: "USDC".to_string(),
            tvl_usd: 50_000_000.0,
            apy,
            apy_base: None,
            apy_reward: None,
            stablecoin: true,
        };
        EnrichedPool::new(record, "https://example.com".to_string())
    }

    fn rule(protocol: Option<&str>, chain: Option<&str>, condition: AlertCondition, target: f64) -> AlertRule {
        AlertRule {
            id: "r1".to_string(),
            protocol: protocol.map(|s| s.to_string()),
            chain: chain.map(|s| s.to_string()),
            condition,
            target_apy: target,
            active: true,
            created_at: 0,
        }
    }

    #[test]
    fn test_protocol_filter_is_substring_case_insensitive() {
        let r = rule(Some("aave"), None, AlertCondition::Above, 8.0);
        assert!(r.matches(&pool("Aave-v3", "Ethereum", 9.0)));
        assert!(!r.matches(&pool("compound", "Ethereum", 9.0)));
    }

    #[test]
    fn test_chain_filter_is_exact() {
        let r = rule(None, Some("Base"), AlertCondition::Above, 8.0);
        assert!(r.matches(&pool("aave", "Base", 9.0)));
        assert!(!r.matches(&pool("aave", "Arbitrum", 9.0)));
    }

    #[test]
    fn test_absent_filters_match_everything() {
        let r = rule(None, None, AlertCondition::Above, 8.0);
        assert!(r.matches(&pool("anything", "anywhere", 1.0)));
        let empty = rule(Some(""), Some(""), AlertCondition::Above, 8.0);
        assert!(empty.matches(&pool("anything", "anywhere", 1.0)));
    }

    #[test]
    fn test_trigger_directions() {
        let above = rule(None, None, AlertCondition::Above, 8.0);
        assert!(above.triggered(9.2));
        assert!(!above.triggered(8.0));
        let below = rule(None, None, AlertCondition::Below, 3.0);
        assert!(below.triggered(2.5));
        assert!(!below.triggered(3.0));
    }
}
