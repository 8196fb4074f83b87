//! CLI for parsing store receipts and recording categorized expenses.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{expense, mappings, parse};

/// Receipt OCR and expense tracking for the kassa finance bot
#[derive(Parser)]
#[command(name = "kassa")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a receipt photo (or a saved raw-lines dump)
    Parse(parse::ParseArgs),

    /// Record a manual expense with comment-keyword learning
    Expense(expense::ExpenseArgs),

    /// Inspect or edit learned category mappings
    Mappings(mappings::MappingsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Parse(args) => parse::run(args, cli.config.as_deref()).await,
        Commands::Expense(args) => expense::run(args, cli.config.as_deref()).await,
        Commands::Mappings(args) => mappings::run(args, cli.config.as_deref()).await,
    }
}
