use crate::models::Rule;
use crate::rules::RuleSet;

pub const DEFAULT_PREFIX_LEN: usize = 8;

/// How descriptions are reduced to vendor keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    pub prefix_len: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            prefix_len: DEFAULT_PREFIX_LEN,
        }
    }
}

impl MatchConfig {
    pub fn new(prefix_len: usize) -> Self {
        Self {
            prefix_len: prefix_len.max(1),
        }
    }

    /// Lower-cased leading `prefix_len` characters of `text`. Two vendors
    /// sharing the prefix collide into one key.
    pub fn vendor_key(&self, text: &str) -> String {
        text.to_lowercase().chars().take(self.prefix_len).collect()
    }
}

/// First rule (in set order) whose vendor key equals the description's key.
pub fn find_rule<'a>(description: &str, rules: &'a RuleSet, config: MatchConfig) -> Option<&'a Rule> {
    let key = config.vendor_key(description);
    rules
        .iter()
        .find(|rule| config.vendor_key(&rule.vendor) == key)
}

/// Keyword to category mapping used by the batch tagging entry point.
/// Matching is case-insensitive substring containment, applied in file
/// order, with the last matching keyword winning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordRules {
    entries: Vec<(String, String)>,
}

impl KeywordRules {
    pub fn new<K: Into<String>, C: Into<String>>(entries: impl IntoIterator<Item = (K, C)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(k, c)| (k.into(), c.into()))
            .filter(|(k, _)| {
                if k.trim().is_empty() {
                    tracing::warn!("ignoring empty keyword in category rules");
                    false
                } else {
                    true
                }
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, description: &str) -> Option<&str> {
        let desc = description.to_lowercase();
        self.entries
            .iter()
            .rev()
            .find(|(keyword, _)| desc.contains(&keyword.to_lowercase()))
            .map(|(_, category)| category.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn rules(list: &[(&str, Category)]) -> RuleSet {
        RuleSet::from_rules(
            list.iter().map(|(v, c)| Rule::business(*v, *c, 100)),
            MatchConfig::default(),
        )
    }

    #[test]
    fn test_vendor_key_truncates_and_lowercases() {
        let config = MatchConfig::default();
        assert_eq!(config.vendor_key("UBER *TRIP 8812"), "uber *tr");
        assert_eq!(config.vendor_key("Uber"), "uber");
        assert_eq!(config.vendor_key(""), "");
    }

    #[test]
    fn test_vendor_key_counts_characters_not_bytes() {
        let config = MatchConfig::new(4);
        assert_eq!(config.vendor_key("Café Nero"), "café");
    }

    #[test]
    fn test_find_rule_ignores_trailing_reference_noise() {
        let set = rules(&[("ADOBE CREATIVE 0001", Category::Software)]);
        let rule = find_rule("Adobe Creative 99812", &set, MatchConfig::default()).unwrap();
        assert_eq!(rule.category, Category::Software);
    }

    #[test]
    fn test_find_rule_none_when_prefix_differs() {
        let set = rules(&[("SPOTIFY P1234", Category::Subscription)]);
        assert!(find_rule("SPARK NEW ZEALAND", &set, MatchConfig::default()).is_none());
    }

    #[test]
    fn test_same_prefix_descriptions_get_same_rule() {
        let set = rules(&[
            ("COUNTDOWN AUCKLAND", Category::OfficeSupplies),
            ("Z ENERGY 2045", Category::Fuel),
        ]);
        let config = MatchConfig::default();
        let a = find_rule("COUNTDOWN WELLINGTON", &set, config);
        let b = find_rule("countdown metro", &set, config);
        assert_eq!(a, b);
        assert_eq!(a.unwrap().category, Category::OfficeSupplies);
    }

    #[test]
    fn test_short_description_needs_exact_key() {
        let set = rules(&[("Uber ride", Category::Transport)]);
        assert!(find_rule("Uber", &set, MatchConfig::default()).is_none());
    }

    #[test]
    fn test_configurable_prefix_length() {
        let set = rules(&[("AMAZON WEB SERVICES", Category::Software)]);
        assert!(find_rule("AMAZON MARKETPLACE", &set, MatchConfig::default()).is_none());
        assert!(find_rule("AMAZON MARKETPLACE", &set, MatchConfig::new(6)).is_some());
    }

    #[test]
    fn test_keyword_rules_substring_case_insensitive() {
        let kw = KeywordRules::new([("uber", "Transport"), ("cafe", "Meals")]);
        assert_eq!(kw.find("Uber ride"), Some("Transport"));
        assert_eq!(kw.find("Corner CAFE brunch"), Some("Meals"));
        assert_eq!(kw.find("Spotify"), None);
    }

    #[test]
    fn test_keyword_rules_last_match_wins() {
        let kw = KeywordRules::new([("uber", "Transport"), ("eats", "Meals")]);
        assert_eq!(kw.find("UBER EATS"), Some("Meals"));
    }

    #[test]
    fn test_keyword_rules_drop_empty_keywords() {
        let kw = KeywordRules::new([("", "Everything"), ("fuel", "Fuel")]);
        assert_eq!(kw.len(), 1);
        assert_eq!(kw.find("Grocer"), None);
    }
}
