use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use crate::models::{AlertRule, EnrichedPool, Notification};

/// Delivery boundary for fired notifications. Whether the platform allows
/// showing them is the wrapper's problem, never the engine's.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: &Notification);
}

pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn deliver(&self, notification: &Notification) {
        tracing::info!("🔔 {} | {}", notification.title, notification.body);
    }
}

/// Evaluates active rules against each new pool snapshot and suppresses
/// repeat notifications for the same (rule, pool) pair within the cooldown.
pub struct AlertEngine {
    cooldown: Duration,
    notified: Mutex<HashMap<(String, String), Instant>>,
}

impl AlertEngine {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            notified: Mutex::new(HashMap::new()),
        }
    }

    /// One pass over one snapshot. Returns only newly fired notifications.
    pub fn check(&self, pools: &[EnrichedPool], rules: &[AlertRule]) -> Vec<Notification> {
        let mut notified = self.notified.lock();
        let now = Instant::now();

        // lazy eviction: expired keys become eligible again right here
        notified.retain(|_, inserted| now.duration_since(*inserted) < self.cooldown);

        let mut fired = Vec::new();
        for rule in rules.iter().filter(|r| r.active) {
            for pool in pools.iter().filter(|p| rule.matches(p)) {
                if !rule.triggered(pool.record.apy) {
                    continue;
                }

                let key = (rule.id.clone(), pool.record.pool.clone());
                if notified.contains_key(&key) {
                    tracing::trace!("Suppressed repeat alert for rule {} pool {}", key.0, key.1);
                    continue;
                }

                notified.insert(key, now);
                fired.push(Notification::for_match(rule, pool));
            }
        }

        fired
    }

    /// Check and push everything fired into the sink
    pub fn run(&self, pools: &[EnrichedPool], rules: &[AlertRule], sink: &dyn NotificationSink) -> Vec<Notification> {
        let fired = self.check(pools, rules);
        for notification in &fired {
            sink.deliver(notification);
        }
        if !fired.is_empty() {
            tracing::info!("✓ {} alert(s) fired", fired.len());
        }
        fired
    }

    pub fn pending_keys(&self) -> usize {
        self.notified.lock().len()
    }
}
