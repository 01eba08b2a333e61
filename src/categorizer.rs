use std::collections::HashMap;

use crate::matcher::{find_rule, KeywordRules, MatchConfig};
use crate::models::{CategorizedTransaction, Rule, Transaction};
use crate::rules::RuleSet;

/// Transactions sharing one vendor key, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorGroup {
    pub key: String,
    /// Description of the first transaction seen with this key.
    pub description: String,
    pub count: usize,
    pub total: f64,
}

pub fn vendor_groups(transactions: &[Transaction], config: MatchConfig) -> Vec<VendorGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<VendorGroup> = Vec::new();
    for txn in transactions {
        let key = config.vendor_key(&txn.description);
        match index.get(&key) {
            Some(&i) => {
                groups[i].count += 1;
                groups[i].total += txn.amount;
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(VendorGroup {
                    key,
                    description: txn.description.clone(),
                    count: 1,
                    total: txn.amount,
                });
            }
        }
    }
    groups
}

/// Stamp every transaction with the rule resolved for its vendor key.
/// Each key is looked up once, so descriptions sharing a key always get
/// the same rule. Unmatched rows stay uncategorized.
pub fn categorize(transactions: &[Transaction], rules: &RuleSet) -> Vec<CategorizedTransaction> {
    let config = rules.config();
    let mut resolved: HashMap<String, Option<&Rule>> = HashMap::new();
    transactions
        .iter()
        .map(|txn| {
            let key = config.vendor_key(&txn.description);
            let rule = *resolved
                .entry(key)
                .or_insert_with(|| find_rule(&txn.description, rules, config));
            match rule {
                Some(rule) => CategorizedTransaction::from_rule(txn, rule),
                None => CategorizedTransaction::uncategorized(txn),
            }
        })
        .collect()
}

/// Tag rows by keyword containment. Matched rows are business at full usage.
pub fn tag_with_keywords(
    transactions: &[Transaction],
    keywords: &KeywordRules,
) -> Vec<CategorizedTransaction> {
    transactions
        .iter()
        .map(|txn| match keywords.find(&txn.description) {
            Some(category) => CategorizedTransaction {
                category: category.to_string(),
                is_business: true,
                business_usage_pct: 100,
                ..CategorizedTransaction::uncategorized(txn)
            },
            None => CategorizedTransaction::uncategorized(txn),
        })
        .collect()
}

pub struct CategorizeResult {
    pub business: usize,
    pub personal: usize,
    pub uncategorized: usize,
}

pub fn summarize(rows: &[CategorizedTransaction], rules: &RuleSet) -> CategorizeResult {
    let mut result = CategorizeResult {
        business: 0,
        personal: 0,
        uncategorized: 0,
    };
    for row in rows {
        if row.is_business {
            result.business += 1;
        } else if rules.get(&row.description).is_some() {
            result.personal += 1;
        } else {
            result.uncategorized += 1;
        }
    }
    result
}
