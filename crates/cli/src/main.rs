mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use workhist_validate::ValidationMode;

use crate::config::WorkhistConfig;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Work-history record validation and draft storage.
#[derive(Parser)]
#[command(name = "workhist", version, about = "Work-history record validation and draft storage")]
struct Cli {
    /// Configuration file (defaults to ./workhist.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log at debug level (overrides WORKHIST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a record JSON file
    Validate {
        /// Path to the record JSON file
        file: PathBuf,
        /// Validation mode (strict, normal or lenient)
        #[arg(long, value_parser = parse_mode)]
        mode: Option<ValidationMode>,
        /// Furthest wizard step reached; only consulted in lenient mode
        #[arg(long)]
        step: Option<u32>,
        /// Rule set file (TOML, or JSON by extension) replacing the built-in rules
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Print the effective validation rule set
    Rules {
        /// Rule set file to load instead of the built-in rules
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Save, show or clear the local draft
    Draft {
        #[command(subcommand)]
        command: DraftCommands,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum DraftCommands {
    /// Store a record as the local draft
    Save {
        /// Path to the record JSON file
        file: PathBuf,
        #[command(flatten)]
        target: DraftTarget,
        /// Wizard step the draft resumes at
        #[arg(long, default_value = "1")]
        step: u32,
    },
    /// Show the draft that would be offered for restore
    Show {
        #[command(flatten)]
        target: DraftTarget,
    },
    /// Delete the local draft
    Clear {
        #[command(flatten)]
        target: DraftTarget,
    },
}

/// Where the local draft lives. Unset values come from `[storage]`.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct DraftTarget {
    /// Draft store directory
    #[arg(long)]
    pub store: Option<PathBuf>,
    /// User the draft belongs to
    #[arg(long)]
    pub user: Option<String>,
    /// Draft slot name
    #[arg(long)]
    pub slot: Option<String>,
}

fn parse_mode(s: &str) -> Result<ValidationMode, String> {
    s.parse()
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match WorkhistConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Validate {
            file,
            mode,
            step,
            rules,
        } => {
            commands::validate::cmd_validate(
                &file,
                mode,
                step,
                rules.as_deref(),
                &config,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Rules { rules } => {
            commands::rules::cmd_rules(rules.as_deref(), cli.output, cli.quiet);
        }
        Commands::Draft { command } => {
            let (action, target) = match command {
                DraftCommands::Save { file, target, step } => {
                    (commands::draft::DraftAction::Save { file, step }, target)
                }
                DraftCommands::Show { target } => (commands::draft::DraftAction::Show, target),
                DraftCommands::Clear { target } => (commands::draft::DraftAction::Clear, target),
            };
            commands::draft::cmd_draft(action, &target, &config, cli.output, cli.quiet);
        }
        Commands::Config => {
            commands::config::cmd_config(&config, cli.output);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("WORKHIST_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
