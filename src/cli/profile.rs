use std::path::PathBuf;

use crate::cli::profile_path;
use crate::error::Result;
use crate::settings::{load_profile, load_settings, save_profile};

pub fn show(profile: Option<PathBuf>) -> Result<()> {
    let path = profile_path(&load_settings(), profile);
    let p = load_profile(&path);
    let or_unset = |s: &str| if s.is_empty() { "(not set)".to_string() } else { s.to_string() };
    println!("Business type: {}", or_unset(&p.business_type));
    println!("Context:       {}", or_unset(&p.additional_context));
    Ok(())
}

pub fn set(
    business_type: Option<String>,
    context: Option<String>,
    profile: Option<PathBuf>,
) -> Result<()> {
    let path = profile_path(&load_settings(), profile);
    let mut p = load_profile(&path);
    if let Some(t) = business_type {
        p.business_type = t;
    }
    if let Some(c) = context {
        p.additional_context = c;
    }
    save_profile(&path, &p)?;
    println!("Profile saved to {}", path.display());
    Ok(())
}
