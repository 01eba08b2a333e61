use std::path::Path;

use colored::Colorize;

use crate::error::Result;
use crate::importer::{parse_pdf_file, write_transactions_csv};
use crate::settings::load_settings;

pub fn run(input: &Path, output: &Path, year: Option<i32>) -> Result<()> {
    let year = year.unwrap_or_else(|| load_settings().statement_year);
    let txns = parse_pdf_file(input, year)?;

    if txns.is_empty() {
        println!("{}", "No transaction lines found; nothing written.".yellow());
        return Ok(());
    }

    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = std::fs::File::create(output)?;
    write_transactions_csv(std::io::BufWriter::new(file), &txns)?;
    println!("{} transactions written to {}", txns.len(), output.display());
    Ok(())
}
