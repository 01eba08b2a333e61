use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{BizError, Result};
use crate::matcher::{KeywordRules, MatchConfig};
use crate::models::{Category, Rule};

/// Ordered vendor rules, at most one per vendor key.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
    config: MatchConfig,
}

impl RuleSet {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            rules: Vec::new(),
            config,
        }
    }

    /// Build a set by upserting each rule in order, so for duplicated vendor
    /// keys the later rule's values win at the earlier rule's position.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>, config: MatchConfig) -> Self {
        let mut set = Self::new(config);
        for rule in rules {
            if set.upsert(rule.clone()).is_some() {
                tracing::warn!(vendor = %rule.vendor, "duplicate vendor key in rules; keeping the later rule");
            }
        }
        set
    }

    pub fn config(&self) -> MatchConfig {
        self.config
    }

    /// Insert or replace by vendor key. Returns the replaced rule, if any.
    pub fn upsert(&mut self, rule: Rule) -> Option<Rule> {
        let rule = rule.normalized();
        let config = self.config;
        let key = config.vendor_key(&rule.vendor);
        match self
            .rules
            .iter_mut()
            .find(|r| config.vendor_key(&r.vendor) == key)
        {
            Some(existing) => Some(std::mem::replace(existing, rule)),
            None => {
                self.rules.push(rule);
                None
            }
        }
    }

    pub fn get(&self, vendor: &str) -> Option<&Rule> {
        crate::matcher::find_rule(vendor, self, self.config)
    }

    pub fn remove(&mut self, vendor: &str) -> Option<Rule> {
        let key = self.config.vendor_key(vendor);
        let idx = self
            .rules
            .iter()
            .position(|r| self.config.vendor_key(&r.vendor) == key)?;
        Some(self.rules.remove(idx))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// On-disk shape of a rule, lenient so one bad field drops one entry.
#[derive(Deserialize)]
struct StoredRule {
    vendor: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    is_business: bool,
    #[serde(default)]
    usage_pct: Option<i64>,
}

impl StoredRule {
    fn into_rule(self) -> Result<Rule> {
        if self.vendor.trim().is_empty() {
            return Err(BizError::Parse("empty vendor".to_string()));
        }
        if !self.is_business {
            return Ok(Rule::personal(self.vendor));
        }
        let category = match self.category {
            Some(c) => c.parse()?,
            None => Category::Uncategorized,
        };
        Ok(Rule::business(self.vendor, category, self.usage_pct.unwrap_or(100)))
    }
}

fn parse_entry(value: Value) -> Result<Rule> {
    let stored: StoredRule = serde_json::from_value(value)?;
    stored.into_rule()
}

/// Load saved rules. Never fails: a missing, unreadable or malformed file
/// yields an empty set and malformed entries are dropped one by one.
pub fn load_rules(path: &Path, config: MatchConfig) -> RuleSet {
    if !path.exists() {
        return RuleSet::new(config);
    }
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), "cannot read rules file: {e}");
            return RuleSet::new(config);
        }
    };
    let entries = match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            tracing::warn!(path = %path.display(), "rules file is not a JSON array; ignoring it");
            return RuleSet::new(config);
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "malformed rules file: {e}");
            return RuleSet::new(config);
        }
    };

    let total = entries.len();
    let rules: Vec<Rule> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match parse_entry(entry) {
            Ok(rule) => Some(rule),
            Err(e) => {
                tracing::warn!(entry = i, "dropping malformed rule: {e}");
                None
            }
        })
        .collect();
    tracing::debug!(loaded = rules.len(), total, "loaded rules from {}", path.display());
    RuleSet::from_rules(rules, config)
}

/// Overwrite the rules file with `rules`. Writes a sibling temp file first
/// and renames it into place so readers never see a partial file.
pub fn save_rules(path: &Path, rules: &RuleSet) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let list: Vec<&Rule> = rules.iter().collect();
    let json = serde_json::to_string_pretty(&list)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::fs::write(&tmp, format!("{json}\n"))?;
    std::fs::rename(&tmp, path)?;
    tracing::debug!(count = rules.len(), "saved rules to {}", path.display());
    Ok(())
}

/// Load a flat `{ "keyword": "Category" }` mapping. Unlike vendor rules this
/// file is explicitly requested, so read and parse failures are errors.
pub fn load_keyword_rules(path: &Path) -> Result<KeywordRules> {
    let content = std::fs::read_to_string(path)?;
    let map: serde_json::Map<String, Value> = serde_json::from_str(&content)?;
    let mut entries = Vec::with_capacity(map.len());
    for (keyword, category) in map {
        match category {
            Value::String(c) => entries.push((keyword, c)),
            other => {
                return Err(BizError::Parse(format!(
                    "category for keyword '{keyword}' must be text, got {other}"
                )))
            }
        }
    }
    Ok(KeywordRules::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MatchConfig {
        MatchConfig::default()
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = load_rules(&dir.path().join("nope.json"), config());
        assert!(set.is_empty());
    }

    #[test]
    fn test_load_garbage_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_rules(&path, config()).is_empty());
        std::fs::write(&path, r#"{"vendor": "X"}"#).unwrap();
        assert!(load_rules(&path, config()).is_empty());
    }

    #[test]
    fn test_load_drops_malformed_entries_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let content = r#"[
            {"vendor": "ADOBE CREATIVE", "category": "Software", "is_business": true, "usage_pct": 80},
            {"category": "Fuel", "is_business": true, "usage_pct": 100},
            "just a string",
            {"vendor": "MYSTERY", "category": "Snacks", "is_business": true, "usage_pct": 10},
            {"vendor": "NETFLIX.COM", "category": "Subscription", "is_business": false, "usage_pct": 50}
        ]"#;
        std::fs::write(&path, content).unwrap();
        let set = load_rules(&path, config());
        assert_eq!(set.len(), 2);
        let adobe = set.get("ADOBE CREATIVE CLOUD").unwrap();
        assert_eq!(adobe.category, Category::Software);
        assert_eq!(adobe.usage_pct, 80);
        let netflix = set.get("NETFLIX.COM 123").unwrap();
        assert!(!netflix.is_business);
        assert_eq!(netflix.category, Category::NotApplicable);
        assert_eq!(netflix.usage_pct, 0);
    }

    #[test]
    fn test_load_defaults_missing_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, r#"[{"vendor": "Z ENERGY", "is_business": true}]"#).unwrap();
        let set = load_rules(&path, config());
        let rule = set.get("Z ENERGY").unwrap();
        assert_eq!(rule.category, Category::Uncategorized);
        assert_eq!(rule.usage_pct, 100);
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rules.json");
        let set = RuleSet::from_rules(
            [
                Rule::business("ADOBE CREATIVE", Category::Software, 100),
                Rule::business("Z ENERGY 2045", Category::Fuel, 60),
                Rule::personal("NETFLIX.COM"),
            ],
            config(),
        );
        save_rules(&path, &set).unwrap();
        let loaded = load_rules(&path, config());
        assert_eq!(loaded, set);
        assert!(!dir.path().join("nested").join("rules.json.tmp").exists());
    }

    #[test]
    fn test_upsert_last_write_wins_in_place() {
        let mut set = RuleSet::new(config());
        set.upsert(Rule::business("SPOTIFY P1", Category::Subscription, 100));
        set.upsert(Rule::business("Z ENERGY", Category::Fuel, 100));
        let replaced = set.upsert(Rule::business("Spotify P2", Category::Software, 50));
        assert_eq!(replaced.unwrap().category, Category::Subscription);
        assert_eq!(set.len(), 2);
        let first = set.iter().next().unwrap();
        assert_eq!(first.vendor, "Spotify P2");
        assert_eq!(first.category, Category::Software);
    }

    #[test]
    fn test_load_collapses_duplicate_keys_last_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let content = r#"[
            {"vendor": "SPOTIFY P1", "category": "Subscription", "is_business": true, "usage_pct": 100},
            {"vendor": "SPOTIFY P2", "category": "Software", "is_business": true, "usage_pct": 30}
        ]"#;
        std::fs::write(&path, content).unwrap();
        let set = load_rules(&path, config());
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("SPOTIFY").map(|r| r.usage_pct), None);
        assert_eq!(set.get("SPOTIFY P9").unwrap().usage_pct, 30);
    }

    #[test]
    fn test_remove_by_vendor_prefix() {
        let mut set = RuleSet::from_rules([Rule::personal("COUNTDOWN AKL")], config());
        assert!(set.remove("countdown wlg").is_some());
        assert!(set.is_empty());
        assert!(set.remove("countdown wlg").is_none());
    }

    #[test]
    fn test_load_keyword_rules_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kw.json");
        std::fs::write(&path, r#"{"uber": "Transport", "cafe": "Meals"}"#).unwrap();
        let kw = load_keyword_rules(&path).unwrap();
        assert_eq!(kw.len(), 2);
        assert_eq!(kw.find("UBER TRIP"), Some("Transport"));
    }

    #[test]
    fn test_load_keyword_rules_rejects_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kw.json");
        std::fs::write(&path, r#"{"uber": 5}"#).unwrap();
        assert!(matches!(load_keyword_rules(&path), Err(BizError::Parse(_))));
        assert!(load_keyword_rules(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_save_rules_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("rules");
        std::fs::write(&blocker, "").unwrap();
        let set = RuleSet::from_rules([Rule::personal("COUNTDOWN AKL")], config());
        assert!(save_rules(&blocker.join("rules.json"), &set).is_err());
        assert_eq!(std::fs::read_to_string(&blocker).unwrap(), "");
    }
}
