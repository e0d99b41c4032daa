mod commands;
mod config;
mod output;

use clap::{Parser, Subcommand};
use config::CliConfig;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "fitolab",
    version,
    about = "Interpretation rule engine for phytopathology lab results"
)]
struct Cli {
    /// JSON database file holding samples, rules and interpretations
    #[arg(
        long,
        global = true,
        env = "FITOLAB_DB",
        default_value = config::DEFAULT_DB,
        value_name = "FILE"
    )]
    db: PathBuf,

    /// Log per-rule decisions (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate active rules for a sample and store the interpretations
    Interpret {
        sample_id: Uuid,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Show what `interpret` would store, without storing it
    Preview {
        sample_id: Uuid,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Explain what happened to every rule
        #[arg(long)]
        explain: bool,
    },
    /// List the stored interpretations of a sample
    Interpretations {
        sample_id: Uuid,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Evaluate a sample file against rule files (no database involved)
    Evaluate {
        /// Path to a sample JSON file
        sample_file: PathBuf,

        /// JSON rule file(s), each an array of rules
        #[arg(short, long = "rules", value_name = "FILE", required = true)]
        rules: Vec<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Explain what happened to every rule
        #[arg(long)]
        explain: bool,
    },
    /// Manage samples in the database
    Samples {
        #[command(subcommand)]
        action: SamplesAction,
    },
    /// Manage and inspect interpretation rules
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand)]
enum SamplesAction {
    /// Add or replace a sample from a JSON file
    Add {
        /// Path to a sample JSON file
        file: PathBuf,
    },
    /// List samples
    List,
}

#[derive(Subcommand)]
enum RulesAction {
    /// List rules (active only unless --all)
    List {
        /// Only rules of this area
        #[arg(long)]
        area: Option<String>,

        /// Include inactive rules
        #[arg(long)]
        all: bool,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Create a rule from a JSON file holding one rule object
    Add {
        file: PathBuf,
    },
    /// Deactivate a rule
    Deactivate {
        rule_id: Uuid,
    },
    /// Validate a rule file (an array of rules)
    Validate {
        file: PathBuf,
    },
    /// Print the JSON rule schema with field descriptions and example
    Schema,
}

fn main() {
    let cli = Cli::parse();
    config::init_tracing(cli.verbose);
    let config = CliConfig::new(cli.db);

    let result = match cli.command {
        Commands::Interpret { sample_id, output } => {
            commands::interpret::apply(&config, sample_id, &output)
        }
        Commands::Preview {
            sample_id,
            output,
            explain,
        } => commands::interpret::preview(&config, sample_id, &output, explain),
        Commands::Interpretations { sample_id, output } => {
            commands::interpret::list(&config, sample_id, &output)
        }
        Commands::Evaluate {
            sample_file,
            rules,
            output,
            explain,
        } => commands::evaluate::run(sample_file, rules, &output, explain),
        Commands::Samples { action } => match action {
            SamplesAction::Add { file } => commands::samples::add(&config, &file),
            SamplesAction::List => commands::samples::list(&config),
        },
        Commands::Rules { action } => match action {
            RulesAction::List { area, all, output } => {
                commands::rules::list(&config, area, all, &output)
            }
            RulesAction::Add { file } => commands::rules::add(&config, &file),
            RulesAction::Deactivate { rule_id } => commands::rules::deactivate(&config, rule_id),
            RulesAction::Validate { file } => commands::rules::validate(&file),
            RulesAction::Schema => commands::rules::schema(),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
