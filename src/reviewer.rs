use std::path::Path;

use crate::categorizer::{categorize, vendor_groups, VendorGroup};
use crate::error::Result;
use crate::models::{CategorizedTransaction, Category, Rule, Transaction};
use crate::rules::{save_rules, RuleSet};
use crate::settings::BusinessProfile;
use crate::suggest::{suggest_category, SuggestionProvider};

/// One distinct vendor awaiting a decision.
#[derive(Debug, Clone)]
pub struct VendorCandidate {
    pub group: VendorGroup,
    pub existing: Option<Rule>,
    /// Only asked for when there is no existing rule.
    pub suggestion: Option<Category>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Rule(Rule),
    Unchanged,
    Stop,
}

/// Whoever decides vendor rules: a prompt, a form, or a fixed policy.
pub trait RuleResolver {
    fn resolve(&mut self, candidate: &VendorCandidate) -> Result<Resolution>;
}

/// Non-interactive policy. Known vendors keep their rule. New vendors become
/// business rules at 100% when a usable suggestion exists and suggestions are
/// accepted, and personal rules otherwise.
pub struct AutoResolver {
    pub accept_suggestions: bool,
}

impl RuleResolver for AutoResolver {
    fn resolve(&mut self, candidate: &VendorCandidate) -> Result<Resolution> {
        if candidate.existing.is_some() {
            return Ok(Resolution::Unchanged);
        }
        let vendor = candidate.group.description.clone();
        let rule = match candidate.suggestion {
            Some(category) if self.accept_suggestions && category != Category::Uncategorized => {
                Rule::business(vendor, category, 100)
            }
            _ => Rule::personal(vendor),
        };
        Ok(Resolution::Rule(rule))
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct ResolveResult {
    pub reviewed: usize,
    pub created: usize,
    pub updated: usize,
    pub stopped: bool,
}

/// State carried between pipeline stages for one statement.
pub struct Session {
    transactions: Vec<Transaction>,
    rules: RuleSet,
    /// Decisions made since the last successful save.
    pending: RuleSet,
}

impl Session {
    pub fn new(transactions: Vec<Transaction>, rules: RuleSet) -> Self {
        let pending = RuleSet::new(rules.config());
        Self {
            transactions,
            rules,
            pending,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Rules decided in this session that are not on disk yet.
    pub fn pending(&self) -> &RuleSet {
        &self.pending
    }

    pub fn vendor_groups(&self) -> Vec<VendorGroup> {
        vendor_groups(&self.transactions, self.rules.config())
    }

    /// Vendors in this statement with no saved rule.
    pub fn unknown_vendors(&self) -> Vec<VendorGroup> {
        self.vendor_groups()
            .into_iter()
            .filter(|g| self.rules.get(&g.description).is_none())
            .collect()
    }

    fn candidate(
        &self,
        group: VendorGroup,
        provider: &dyn SuggestionProvider,
        profile: &BusinessProfile,
    ) -> VendorCandidate {
        let existing = self.rules.get(&group.description).cloned();
        let suggestion = match existing {
            Some(_) => None,
            None => suggest_category(provider, profile, &group.description),
        };
        VendorCandidate {
            group,
            existing,
            suggestion,
        }
    }

    /// Record a decision; last write for a vendor key wins.
    pub fn apply(&mut self, rule: Rule) -> bool {
        self.pending.upsert(rule.clone());
        self.rules.upsert(rule).is_some()
    }

    /// Run `resolver` over the statement's distinct vendors in first-seen
    /// order. With `include_known` false, vendors that already have a rule
    /// are not offered. Can be re-entered; decisions accumulate in the
    /// session's rule set.
    pub fn resolve(
        &mut self,
        resolver: &mut dyn RuleResolver,
        provider: &dyn SuggestionProvider,
        profile: &BusinessProfile,
        include_known: bool,
    ) -> Result<ResolveResult> {
        let mut result = ResolveResult::default();
        for group in self.vendor_groups() {
            if !include_known && self.rules.get(&group.description).is_some() {
                continue;
            }
            let candidate = self.candidate(group, provider, profile);
            result.reviewed += 1;
            match resolver.resolve(&candidate)? {
                Resolution::Rule(rule) => {
                    if candidate.existing.as_ref() == Some(&rule) {
                        continue;
                    }
                    if self.apply(rule) {
                        result.updated += 1;
                    } else {
                        result.created += 1;
                    }
                }
                Resolution::Unchanged => {}
                Resolution::Stop => {
                    result.stopped = true;
                    break;
                }
            }
        }
        tracing::debug!(?result, "resolved vendor rules");
        Ok(result)
    }

    pub fn categorize(&self) -> Vec<CategorizedTransaction> {
        categorize(&self.transactions, &self.rules)
    }

    /// Persist the working rule set; until this succeeds the decisions only
    /// live in the session and stay pending.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        save_rules(path, &self.rules)?;
        self.pending = RuleSet::new(self.rules.config());
        Ok(())
    }
}
