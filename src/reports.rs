use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::models::CategorizedTransaction;

fn round2(val: f64) -> f64 {
    let rounded = (val * 100.0).round() / 100.0;
    // no "-0.00" in output
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

// ---------------------------------------------------------------------------
// Business usage
// ---------------------------------------------------------------------------

/// Share of all spending (negative amounts) that went to business rows, as a
/// percentage rounded to 2 decimals. Zero when there is no spending.
pub fn business_usage_pct(rows: &[CategorizedTransaction]) -> f64 {
    let total_spend: f64 = rows.iter().filter(|r| r.is_expense()).map(|r| r.amount).sum();
    let business_spend: f64 = rows
        .iter()
        .filter(|r| r.is_business && r.is_expense())
        .map(|r| r.amount)
        .sum();
    if total_spend == 0.0 {
        return 0.0;
    }
    round2((business_spend / total_spend * 100.0).clamp(0.0, 100.0))
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

pub struct ReportSummary {
    pub count: usize,
    pub description: String,
    pub amount: f64,
    pub business_usage_pct: f64,
}

pub struct Report {
    /// Business rows only, date ascending.
    pub rows: Vec<CategorizedTransaction>,
    pub summary: ReportSummary,
}

pub fn build_report(categorized: &[CategorizedTransaction]) -> Report {
    let pct = business_usage_pct(categorized);
    let mut rows: Vec<CategorizedTransaction> =
        categorized.iter().filter(|r| r.is_business).cloned().collect();
    rows.sort_by_key(|r| r.date);

    let amount = round2(rows.iter().map(|r| r.amount).sum());
    let summary = ReportSummary {
        count: rows.len(),
        description: format!("{} business transactions", rows.len()),
        amount,
        business_usage_pct: pct,
    };
    Report { rows, summary }
}

const REPORT_HEADER: [&str; 6] = [
    "date",
    "description",
    "amount",
    "is_business",
    "category",
    "business_usage_pct",
];

pub fn write_report_csv<W: Write>(writer: W, report: &Report) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(REPORT_HEADER)?;
    for row in &report.rows {
        wtr.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.description.clone(),
            format!("{:.2}", row.amount),
            row.is_business.to_string(),
            row.category.clone(),
            row.business_usage_pct.to_string(),
        ])?;
    }
    let s = &report.summary;
    wtr.write_record([
        "TOTAL".to_string(),
        s.description.clone(),
        format!("{:.2}", s.amount),
        String::new(),
        String::new(),
        format!("{:.2}", s.business_usage_pct),
    ])?;
    wtr.flush()?;
    Ok(())
}

pub fn export_report(path: &Path, report: &Report) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = std::fs::File::create(path)?;
    write_report_csv(std::io::BufWriter::new(file), report)
}

// ---------------------------------------------------------------------------
// Category breakdown
// ---------------------------------------------------------------------------

pub struct CategoryTotal {
    pub category: String,
    /// Spend as a positive number.
    pub total: f64,
    pub count: usize,
    pub pct: f64,
}

/// Business spending per category, largest first.
pub fn category_breakdown(rows: &[CategorizedTransaction]) -> Vec<CategoryTotal> {
    let mut by_category: HashMap<&str, (f64, usize)> = HashMap::new();
    for row in rows.iter().filter(|r| r.is_business && r.is_expense()) {
        let entry = by_category.entry(row.category.as_str()).or_default();
        entry.0 += -row.amount;
        entry.1 += 1;
    }
    let grand_total: f64 = by_category.values().map(|(t, _)| t).sum();
    let mut items: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.to_string(),
            total: round2(total),
            count,
            pct: if grand_total != 0.0 { total / grand_total * 100.0 } else { 0.0 },
        })
        .collect();
    items.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    items
}
