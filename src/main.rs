mod categorizer;
mod cli;
mod error;
mod fmt;
mod importer;
mod matcher;
mod models;
mod reports;
mod reviewer;
mod rules;
mod settings;
mod suggest;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ProfileCommands, RulesCommands};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init {
            data_dir,
            year,
            prefix_len,
        } => cli::init::run(data_dir, year, prefix_len),
        Commands::Process(args) => cli::process::run(args),
        Commands::Convert {
            input,
            output,
            year,
        } => cli::convert::run(&input, &output, year),
        Commands::Rules { command } => match command {
            RulesCommands::List { rules } => cli::rules::list(rules),
            RulesCommands::Add {
                vendor,
                category,
                personal,
                usage,
                rules,
            } => cli::rules::add(&vendor, category.as_deref(), personal, usage, rules),
            RulesCommands::Remove { vendor, rules } => cli::rules::remove(&vendor, rules),
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Show { profile } => cli::profile::show(profile),
            ProfileCommands::Set {
                business_type,
                context,
                profile,
            } => cli::profile::set(business_type, context, profile),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
