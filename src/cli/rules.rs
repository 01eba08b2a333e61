use std::path::PathBuf;

use comfy_table::{Cell, Table};

use crate::cli::rules_path;
use crate::error::{BizError, Result};
use crate::models::{Category, Rule};
use crate::rules::{load_rules, save_rules};
use crate::settings::load_settings;

pub fn list(rules: Option<PathBuf>) -> Result<()> {
    let settings = load_settings();
    let path = rules_path(&settings, rules);
    let set = load_rules(&path, settings.match_config());
    if set.is_empty() {
        println!("No rules saved in {}", path.display());
        return Ok(());
    }

    let config = set.config();
    let mut table = Table::new();
    table.set_header(vec!["Vendor", "Key", "Business", "Category", "Usage"]);
    for rule in set.iter() {
        table.add_row(vec![
            Cell::new(textwrap::fill(&rule.vendor, 40)),
            Cell::new(config.vendor_key(&rule.vendor)),
            Cell::new(if rule.is_business { "yes" } else { "no" }),
            Cell::new(rule.category),
            Cell::new(format!("{}%", rule.usage_pct)),
        ]);
    }
    println!("Rules ({})\n{table}", set.len());
    Ok(())
}

pub fn add(
    vendor: &str,
    category: Option<&str>,
    personal: bool,
    usage: i64,
    rules: Option<PathBuf>,
) -> Result<()> {
    let rule = if personal {
        Rule::personal(vendor)
    } else {
        let name = category.ok_or_else(|| BizError::Other("--category or --personal is required".into()))?;
        let category: Category = name.parse()?;
        if category == Category::NotApplicable {
            return Err(BizError::UnknownCategory(name.to_string()));
        }
        Rule::business(vendor, category, usage)
    };

    let settings = load_settings();
    let path = rules_path(&settings, rules);
    let mut set = load_rules(&path, settings.match_config());
    let replaced = set.upsert(rule.clone());
    save_rules(&path, &set)?;

    let what = if rule.is_business {
        format!("{} at {}%", rule.category, rule.usage_pct)
    } else {
        "personal".to_string()
    };
    let verb = if replaced.is_some() { "Updated" } else { "Added" };
    println!("{verb} rule: '{}' \u{2192} {what}", rule.vendor);
    Ok(())
}

pub fn remove(vendor: &str, rules: Option<PathBuf>) -> Result<()> {
    let settings = load_settings();
    let path = rules_path(&settings, rules);
    let mut set = load_rules(&path, settings.match_config());
    let removed = set
        .remove(vendor)
        .ok_or_else(|| BizError::UnknownRule(vendor.to_string()))?;
    save_rules(&path, &set)?;
    println!("Removed rule for '{}'", removed.vendor);
    Ok(())
}
