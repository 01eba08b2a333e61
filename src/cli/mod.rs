pub mod convert;
pub mod init;
pub mod process;
pub mod profile;
pub mod review;
pub mod rules;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::settings::Settings;

/// Resolve a rules file override against the configured data directory.
pub(crate) fn rules_path(settings: &Settings, rules: Option<PathBuf>) -> PathBuf {
    rules.unwrap_or_else(|| settings.rules_path())
}

pub(crate) fn profile_path(settings: &Settings, profile: Option<PathBuf>) -> PathBuf {
    profile.unwrap_or_else(|| settings.profile_path())
}

#[derive(Parser)]
#[command(
    name = "bizsplit",
    version,
    about = "Split bank statements into business and personal spend."
)]
pub struct Cli {
    /// Log debug detail to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and write settings.
    Init {
        /// Path for rules and profile (default: ~/Documents/bizsplit)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Year used to complete day-month dates on PDF statements
        #[arg(long)]
        year: Option<i32>,
        /// Number of leading description characters that identify a vendor
        #[arg(long = "prefix-len")]
        prefix_len: Option<usize>,
    },
    /// Categorize a statement and write the business expense report.
    Process(ProcessArgs),
    /// Extract transactions from a PDF statement into CSV.
    Convert {
        /// PDF statement
        input: PathBuf,
        /// Output CSV path
        output: PathBuf,
        /// Statement year (default from settings)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Manage saved vendor rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Show or edit the business profile used for suggestions.
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Statement file (CSV or PDF)
    #[arg(long)]
    pub input: PathBuf,
    /// Report CSV path
    #[arg(long)]
    pub output: PathBuf,
    /// JSON object of keyword to category; bypasses vendor rules
    #[arg(long = "category-rules")]
    pub category_rules: Option<PathBuf>,
    /// Vendor rules file (default: <data_dir>/rules.json)
    #[arg(long)]
    pub rules: Option<PathBuf>,
    /// Business profile file (default: <data_dir>/profile.json)
    #[arg(long)]
    pub profile: Option<PathBuf>,
    /// Statement format: csv or pdf (default: from file extension)
    #[arg(long)]
    pub format: Option<String>,
    /// Statement year for PDF dates (default from settings)
    #[arg(long)]
    pub year: Option<i32>,
    /// Prompt for each new vendor
    #[arg(long, short)]
    pub interactive: bool,
    /// Also offer vendors that already have a rule (with --interactive)
    #[arg(long = "review-all", requires = "interactive")]
    pub review_all: bool,
    /// Turn accepted category suggestions into business rules without prompting
    #[arg(long = "accept-suggestions")]
    pub accept_suggestions: bool,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// List saved vendor rules.
    List {
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Add or replace the rule for a vendor.
    Add {
        /// Vendor description (its prefix identifies the vendor)
        vendor: String,
        /// Business category, e.g. 'Fuel'
        #[arg(long, required_unless_present = "personal")]
        category: Option<String>,
        /// Mark the vendor as personal spending
        #[arg(long, conflicts_with_all = ["category", "usage"])]
        personal: bool,
        /// Business usage percent (0-100)
        #[arg(long, default_value = "100")]
        usage: i64,
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Remove the rule for a vendor.
    Remove {
        vendor: String,
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Print the business profile.
    Show {
        #[arg(long)]
        profile: Option<PathBuf>,
    },
    /// Update the business profile.
    Set {
        /// Kind of business, e.g. 'plumbing'
        #[arg(long = "business-type")]
        business_type: Option<String>,
        /// Extra context passed along with suggestion requests
        #[arg(long)]
        context: Option<String>,
        #[arg(long)]
        profile: Option<PathBuf>,
    },
}
