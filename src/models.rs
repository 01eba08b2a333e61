use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::BizError;

/// Closed set of expense categories a vendor rule can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Advertising,
    Equipment,
    Fuel,
    HomeOfficeEquipment,
    Insurance,
    NotApplicable,
    OfficeSupplies,
    Phone,
    Power,
    Rent,
    Software,
    SubContractors,
    Subscription,
    Transport,
    Uncategorized,
    Water,
}

impl Category {
    pub const ALL: [Category; 16] = [
        Category::Advertising,
        Category::Equipment,
        Category::Fuel,
        Category::HomeOfficeEquipment,
        Category::Insurance,
        Category::NotApplicable,
        Category::OfficeSupplies,
        Category::Phone,
        Category::Power,
        Category::Rent,
        Category::Software,
        Category::SubContractors,
        Category::Subscription,
        Category::Transport,
        Category::Uncategorized,
        Category::Water,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Advertising => "Advertising",
            Self::Equipment => "Equipment",
            Self::Fuel => "Fuel",
            Self::HomeOfficeEquipment => "Home Office Equipment",
            Self::Insurance => "Insurance",
            Self::NotApplicable => "N/A",
            Self::OfficeSupplies => "Office Supplies",
            Self::Phone => "Phone",
            Self::Power => "Power",
            Self::Rent => "Rent",
            Self::Software => "Software",
            Self::SubContractors => "Sub-contractors",
            Self::Subscription => "Subscription",
            Self::Transport => "Transport",
            Self::Uncategorized => "Uncategorized",
            Self::Water => "Water",
        }
    }

    /// Categories a business expense can be filed under (everything but N/A).
    pub fn business_choices() -> impl Iterator<Item = Category> {
        Self::ALL.into_iter().filter(|c| *c != Category::NotApplicable)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = BizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BizError::UnknownCategory(wanted.to_string()))
    }
}

impl TryFrom<String> for Category {
    type Error = BizError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

/// One statement line in canonical form. Negative amounts are money out.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
}

/// A persisted vendor decision. `vendor` is the full description the rule
/// was created from; matching only looks at its lower-cased prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub vendor: String,
    pub category: Category,
    pub is_business: bool,
    pub usage_pct: u8,
}

impl Rule {
    pub fn business(vendor: impl Into<String>, category: Category, usage_pct: i64) -> Self {
        Self {
            vendor: vendor.into(),
            category,
            is_business: true,
            usage_pct: usage_pct.clamp(0, 100) as u8,
        }
    }

    pub fn personal(vendor: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            category: Category::NotApplicable,
            is_business: false,
            usage_pct: 0,
        }
    }

    /// Enforce the personal-rule invariant: N/A category and zero usage.
    pub fn normalized(self) -> Self {
        if self.is_business {
            Self {
                usage_pct: self.usage_pct.min(100),
                ..self
            }
        } else {
            Self::personal(self.vendor)
        }
    }
}

/// A transaction joined with the rule (or keyword) that matched it.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizedTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub is_business: bool,
    pub business_usage_pct: u8,
}

impl CategorizedTransaction {
    pub fn uncategorized(txn: &Transaction) -> Self {
        Self {
            date: txn.date,
            description: txn.description.clone(),
            amount: txn.amount,
            category: Category::Uncategorized.to_string(),
            is_business: false,
            business_usage_pct: 0,
        }
    }

    pub fn from_rule(txn: &Transaction, rule: &Rule) -> Self {
        Self {
            date: txn.date,
            description: txn.description.clone(),
            amount: txn.amount,
            category: rule.category.to_string(),
            is_business: rule.is_business,
            business_usage_pct: rule.usage_pct,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }
}
