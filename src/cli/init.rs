use std::path::PathBuf;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>, year: Option<i32>, prefix_len: Option<usize>) -> Result<()> {
    let mut settings = load_settings();

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(year) = year {
        settings.statement_year = year;
    }
    if let Some(len) = prefix_len {
        settings.vendor_prefix_len = len.max(1);
    }

    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;

    println!("Initialized bizsplit at {}", resolved.display());
    println!(
        "Statement year {}, vendor prefix {} characters",
        settings.statement_year, settings.vendor_prefix_len
    );
    Ok(())
}
