use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};
use dialoguer::Confirm;

use crate::categorizer::{summarize, tag_with_keywords};
use crate::cli::review::InteractiveResolver;
use crate::cli::{profile_path, rules_path, ProcessArgs};
use crate::error::{BizError, Result};
use crate::fmt::{money, pct};
use crate::importer::{parse_statement, StatementFormat};
use crate::models::CategorizedTransaction;
use crate::reports::{build_report, category_breakdown, export_report, Report};
use crate::reviewer::{AutoResolver, RuleResolver, Session};
use crate::rules::{load_keyword_rules, load_rules};
use crate::settings::{load_profile, load_settings};
use crate::suggest::default_provider;

pub fn run(args: ProcessArgs) -> Result<()> {
    let settings = load_settings();
    let year = args.year.unwrap_or(settings.statement_year);
    let format = args
        .format
        .as_deref()
        .map(|key| StatementFormat::from_key(key).ok_or_else(|| BizError::UnknownFormat(key.to_string())))
        .transpose()?;

    let txns = parse_statement(&args.input, format, year)?;
    println!("{} transactions read from {}", txns.len(), args.input.display());

    let categorized: Vec<CategorizedTransaction> = match &args.category_rules {
        Some(path) => {
            let keywords = load_keyword_rules(path)?;
            if keywords.is_empty() {
                tracing::warn!(path = %path.display(), "no keyword rules; every row stays uncategorized");
            }
            println!("{} keyword rules loaded", keywords.len());
            tag_with_keywords(&txns, &keywords)
        }
        None => {
            let rules_file = rules_path(&settings, args.rules.clone());
            let rules = load_rules(&rules_file, settings.match_config());
            let profile = load_profile(&profile_path(&settings, args.profile.clone()));
            let provider = default_provider();

            let mut session = Session::new(txns, rules);
            let mut resolver: Box<dyn RuleResolver> = if args.interactive {
                if args.review_all {
                    println!("\n{} vendors to review\n", session.vendor_groups().len());
                } else {
                    println!("\n{} new vendors to review\n", session.unknown_vendors().len());
                }
                Box::new(InteractiveResolver::new())
            } else {
                Box::new(AutoResolver {
                    accept_suggestions: args.accept_suggestions,
                })
            };
            let result = session.resolve(&mut *resolver, &*provider, &profile, args.review_all)?;
            if result.stopped {
                println!("{}", "Review stopped; remaining vendors keep their current state.".yellow());
            }
            if result.created + result.updated > 0 {
                println!(
                    "{} vendors reviewed: {} rules created, {} updated",
                    result.reviewed, result.created, result.updated
                );
            }
            if session.is_dirty() {
                persist_rules(&mut session, &rules_file, args.interactive);
            }

            let rows = session.categorize();
            let counts = summarize(&rows, session.rules());
            println!(
                "{} business, {} personal, {} uncategorized",
                counts.business, counts.personal, counts.uncategorized
            );
            rows
        }
    };

    let report = build_report(&categorized);
    export_report(&args.output, &report)?;
    print_summary(&report, &categorized);
    println!("{}", format!("Report saved to {}", args.output.display()).green());
    Ok(())
}

/// Save the session's rules. A failed save never aborts the run: the
/// report is still written from the in-memory rules and the unsaved
/// decisions are listed so they can be re-entered.
fn persist_rules(session: &mut Session, path: &Path, interactive: bool) {
    loop {
        let Err(e) = session.save(path) else {
            println!("Rules saved to {}", path.display());
            return;
        };
        tracing::warn!(path = %path.display(), "cannot save rules: {e}");
        println!("{}", format!("Could not save rules to {}: {e}", path.display()).red());
        let retry = interactive
            && Confirm::new()
                .with_prompt("Retry saving rules?")
                .default(true)
                .interact()
                .unwrap_or(false);
        if !retry {
            break;
        }
    }

    let pending = session.pending();
    println!(
        "{}",
        format!("{} rules were not saved; this report still uses them:", pending.len()).yellow()
    );
    let mut table = Table::new();
    table.set_header(vec!["Vendor", "Business", "Category", "Usage"]);
    for rule in pending.iter() {
        table.add_row(vec![
            Cell::new(&rule.vendor),
            Cell::new(if rule.is_business { "yes" } else { "no" }),
            Cell::new(rule.category),
            Cell::new(format!("{}%", rule.usage_pct)),
        ]);
    }
    println!("{table}");
}

fn print_summary(report: &Report, rows: &[CategorizedTransaction]) {
    let s = &report.summary;
    let mut table = Table::new();
    table.add_row(vec![Cell::new("Business transactions"), Cell::new(s.count)]);
    table.add_row(vec![
        Cell::new("Business total"),
        Cell::new(money(s.amount)).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Business usage"),
        Cell::new(pct(s.business_usage_pct)).set_alignment(CellAlignment::Right),
    ]);
    println!("\nSummary\n{table}");

    let breakdown = category_breakdown(rows);
    if breakdown.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["Category", "Count", "Spent", "Share"]);
    for item in &breakdown {
        table.add_row(vec![
            Cell::new(&item.category),
            Cell::new(item.count),
            Cell::new(money(item.total)).set_alignment(CellAlignment::Right),
            Cell::new(pct(item.pct)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("Business spending by category\n{table}");
}
