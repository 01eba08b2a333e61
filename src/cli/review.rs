use colored::Colorize;
use comfy_table::{Cell, Table};
use dialoguer::{Confirm, Input};

use crate::error::Result;
use crate::fmt::money;
use crate::models::{Category, Rule};
use crate::reviewer::{Resolution, RuleResolver, VendorCandidate};

/// Prompts on the terminal for each vendor.
pub struct InteractiveResolver {
    categories: Vec<Category>,
    shown_categories: bool,
}

impl InteractiveResolver {
    pub fn new() -> Self {
        Self {
            categories: Category::business_choices().collect(),
            shown_categories: false,
        }
    }

    fn print_categories(&mut self) {
        if self.shown_categories {
            return;
        }
        let mut table = Table::new();
        table.set_header(vec!["#", "Category"]);
        for (i, cat) in self.categories.iter().enumerate() {
            table.add_row(vec![Cell::new(i + 1), Cell::new(cat)]);
        }
        println!("Categories\n{table}\n");
        self.shown_categories = true;
    }

    fn print_candidate(&self, candidate: &VendorCandidate) {
        let group = &candidate.group;
        println!("{}", "\u{2500}".repeat(60));
        for (i, line) in textwrap::wrap(&group.description, 46).iter().enumerate() {
            let label = if i == 0 { "Vendor:" } else { "" };
            println!("  {label:<13}{line}");
        }
        let total = if group.total < 0.0 {
            money(group.total.abs()).red().to_string()
        } else {
            money(group.total.abs()).green().to_string()
        };
        println!("  {:<13}{}", "Seen:", group.count);
        println!("  {:<13}{total}", "Total:");
        if let Some(rule) = &candidate.existing {
            let current = if rule.is_business {
                format!("business, {} at {}%", rule.category, rule.usage_pct)
            } else {
                "personal".to_string()
            };
            println!("  {:<13}{current}", "Current:");
        }
        if let Some(suggestion) = candidate.suggestion {
            println!("  {:<13}{}", "Suggested:", suggestion.to_string().cyan());
        }
        println!();
    }

    fn default_category(&self, candidate: &VendorCandidate) -> Option<usize> {
        let wanted = candidate
            .existing
            .as_ref()
            .filter(|r| r.is_business)
            .map(|r| r.category)
            .or(candidate.suggestion)
            .filter(|c| *c != Category::Uncategorized)?;
        self.categories.iter().position(|c| *c == wanted)
    }
}

impl Default for InteractiveResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleResolver for InteractiveResolver {
    fn resolve(&mut self, candidate: &VendorCandidate) -> Result<Resolution> {
        self.print_categories();
        self.print_candidate(candidate);

        let default_business = candidate
            .existing
            .as_ref()
            .map(|r| r.is_business)
            .unwrap_or(false);
        let choice: String = Input::new()
            .with_prompt("Business expense? (y/n, s=skip, q=quit)")
            .default(if default_business { "y" } else { "n" }.to_string())
            .interact_text()
            .unwrap_or_else(|_| "s".to_string());

        let vendor = candidate.group.description.clone();
        match choice.trim().to_lowercase().as_str() {
            "q" => {
                println!("{}", "Review paused.".yellow());
                return Ok(Resolution::Stop);
            }
            "s" => return Ok(Resolution::Unchanged),
            "n" | "no" => {
                println!("{}", "\u{2192} Personal".green());
                return Ok(Resolution::Rule(Rule::personal(vendor)));
            }
            "y" | "yes" => {}
            _ => {
                println!("{}", "Invalid choice, skipping.".red());
                return Ok(Resolution::Unchanged);
            }
        }

        let mut prompt = Input::<String>::new().with_prompt("Category #");
        if let Some(idx) = self.default_category(candidate) {
            prompt = prompt.default((idx + 1).to_string());
        }
        let picked = prompt.interact_text().unwrap_or_default();
        let category = match picked.trim().parse::<usize>() {
            Ok(n) if n >= 1 && n <= self.categories.len() => self.categories[n - 1],
            _ => match picked.trim().parse::<Category>() {
                Ok(c) if c != Category::NotApplicable => c,
                _ => {
                    println!("{}", "Invalid category, skipping.".red());
                    return Ok(Resolution::Unchanged);
                }
            },
        };

        let default_usage = candidate
            .existing
            .as_ref()
            .filter(|r| r.is_business)
            .map(|r| r.usage_pct)
            .unwrap_or(100);
        let usage: u8 = Input::new()
            .with_prompt("Business usage %")
            .default(default_usage)
            .validate_with(|v: &u8| -> std::result::Result<(), &'static str> {
                if *v <= 100 {
                    Ok(())
                } else {
                    Err("enter a number from 0 to 100")
                }
            })
            .interact_text()
            .unwrap_or(default_usage);

        let rule = Rule::business(vendor, category, i64::from(usage));
        if candidate.existing.is_some()
            && !Confirm::new()
                .with_prompt("Replace the saved rule?")
                .default(true)
                .interact()
                .unwrap_or(false)
        {
            return Ok(Resolution::Unchanged);
        }
        println!("{}", format!("\u{2192} {category} at {usage}%").green());
        println!();
        Ok(Resolution::Rule(rule))
    }
}
