use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use crate::models::AlertRule;

/// Read side of the externally persisted rule store: a flat JSON list.
/// The core never writes it.
pub struct RuleStore {
    path: PathBuf,
}

impl RuleStore {
    pub fn new(path: &str) -> Self {
        Self { path: PathBuf::from(path) }
    }

    /// Missing or malformed store degrades to an empty rule set
    pub fn load(&self) -> Vec<AlertRule> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(_) => {
                tracing::debug!("No rules file at {}", self.path.display());
                return vec![];
            }
        };

        match serde_json::from_reader(BufReader::new(file)) {
            Ok(rules) => rules,
            Err(e) => {
                tracing::warn!("Malformed rules file {}: {}", self.path.display(), e);
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertCondition;
    use std::io::Write;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("yield-gatherer-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_load_flat_rule_list() {
        let path = temp_path("rules.json");
        let mut file = File::create(&path).unwrap();
        write!(
            file,
            r#"[
                {{"id": "r1", "protocol": "aave", "chain": "Ethereum", "condition": "above", "target_apy": 8.0, "active": true, "created_at": 1700000000}},
                {{"id": "r2", "condition": "below", "target_apy": 3.0, "active": false, "created_at": 1700000001}}
            ]"#
        )
        .unwrap();

        let rules = RuleStore::new(path.to_str().unwrap()).load();
        std::fs::remove_file(&path).ok();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].protocol.as_deref(), Some("aave"));
        assert_eq!(rules[0].condition, AlertCondition::Above);
        assert_eq!(rules[1].protocol, None);
        assert!(!rules[1].active);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let rules = RuleStore::new("/nonexistent/alerts.json").load();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let path = temp_path("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        let rules = RuleStore::new(path.to_str().unwrap()).load();
        std::fs::remove_file(&path).ok();
        assert!(rules.is_empty());
    }
}
