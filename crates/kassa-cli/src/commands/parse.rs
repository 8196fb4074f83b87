//! Parse command - extract items from a receipt photo and optionally run
//! the category dialogue.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Args;
use console::style;

use kassa_core::{
    CategoryLearningStore, ChatId, Database, DialogueOutcome, KassaError, MemoryStore,
    ReceiptDialogue, ReceiptParser, ReceiptResult, SessionStore, TransactionStore, VisionClient,
};
use kassa_core::models::money::format_amount;

use super::{default_db_path, load_config};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Receipt photo (JPEG/PNG bytes are sent to the OCR oracle)
    #[arg(required_unless_present = "lines")]
    input: Option<PathBuf>,

    /// Parse a saved raw-lines dump instead of an image (one receipt
    /// line per text line; skips the OCR oracle)
    #[arg(long)]
    lines: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Ask for categories interactively and record the transactions
    #[arg(short, long)]
    interactive: bool,

    /// Database path (created on first use)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Use an in-memory store instead of the database
    #[arg(long)]
    dry_run: bool,

    /// Chat/user identifier to record transactions under
    #[arg(long, default_value_t = 0)]
    chat_id: ChatId,

    /// Surface unresolved item blocks instead of dropping them
    #[arg(long)]
    strict: bool,

    /// Print the reconstructed raw text alongside the result
    #[arg(long)]
    show_raw: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    config.parser.strict_unresolved |= args.strict;

    let parser = ReceiptParser::new(config.parser.clone());

    let parsed = if let Some(lines_path) = &args.lines {
        let content = fs::read_to_string(lines_path)?;
        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        parser.parse_lines(&lines).map_err(KassaError::from)
    } else {
        let Some(input) = args.input.as_ref() else {
            anyhow::bail!("an image path or --lines is required");
        };
        let image = fs::read(input)?;
        let api_key = std::env::var("KASSA_VISION_API_KEY")
            .ok()
            .or_else(|| config.vision.api_key.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "no Vision API key: set KASSA_VISION_API_KEY or vision.api_key in the config"
                )
            })?;
        let detector = VisionClient::new(config.vision.endpoint.clone(), api_key);
        parser.parse_image(&detector, &image).await
    };

    let receipt = match parsed {
        Ok(receipt) => receipt,
        Err(KassaError::Parse(kassa_core::ParseError::SectionNotFound { raw_text })) => {
            eprintln!(
                "{}",
                style("Не найдена зона покупок (Состав чека / Итого)").yellow()
            );
            if args.show_raw {
                println!("{raw_text}");
            } else {
                eprintln!("(re-run with --show-raw to inspect the reconstructed text)");
            }
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    if args.show_raw {
        println!("--- raw text ---\n{}\n----------------", receipt.raw_text);
    }

    if args.interactive {
        if args.dry_run {
            let store = MemoryStore::new();
            run_dialogue(&receipt, store.clone(), store, &config, args.chat_id).await?;
        } else {
            let db = Database::open(args.db.unwrap_or_else(default_db_path))?;
            run_dialogue(&receipt, db.clone(), db, &config, args.chat_id).await?;
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&receipt)?),
        OutputFormat::Text => print_receipt(&receipt, &config.currency),
    }

    Ok(())
}

fn print_receipt(receipt: &ReceiptResult, currency: &str) {
    println!("{}", style(&receipt.shop_name).bold());
    if !receipt.address.is_empty() {
        println!("{}", receipt.address);
    }
    if let Some(date) = receipt.date {
        println!("{}", date.format("%Y-%m-%d %H:%M"));
    }
    println!();

    for item in &receipt.items {
        println!("  {} - {}", item.name, format_amount(item.price, currency));
    }

    println!();
    println!("Итого (по товарам): {}", format_amount(receipt.computed_total, currency));
    if receipt.declared_total > rust_decimal::Decimal::ZERO {
        println!("Итого (по чеку):    {}", format_amount(receipt.declared_total, currency));
    }
    if let Some(warning) = &receipt.total_mismatch_warning {
        println!("{}", style(warning).yellow());
    }
    for block in &receipt.unresolved_blocks {
        println!("{} {}", style("Не распознано:").yellow(), block);
    }
}

async fn run_dialogue<L, T>(
    receipt: &ReceiptResult,
    learning: L,
    transactions: T,
    config: &kassa_core::KassaConfig,
    chat_id: ChatId,
) -> anyhow::Result<()>
where
    L: CategoryLearningStore,
    T: TransactionStore,
{
    let dialogue = ReceiptDialogue::new(learning, transactions, config.clone());
    let mut sessions = SessionStore::new();
    let stdin = io::stdin();

    let mut outcome = dialogue
        .begin(&mut sessions, chat_id, receipt.clone())
        .await?;

    loop {
        match outcome {
            DialogueOutcome::Prompt { name, price, .. } => {
                println!(
                    "\n{}\nТовар: {}\nЦена: {}",
                    style(&receipt.shop_name).bold(),
                    style(&name).bold(),
                    format_amount(price, &config.currency)
                );
                print_category_rows(config);
                print!("Категория ('Отмена' для выхода): ");
                io::stdout().flush()?;

                let mut reply = String::new();
                stdin.lock().read_line(&mut reply)?;
                let reply = reply.trim();

                if reply.to_lowercase() == "отмена" {
                    outcome = dialogue.cancel(&mut sessions, chat_id);
                } else {
                    outcome = dialogue.handle_reply(&mut sessions, chat_id, reply).await?;
                }
            }
            DialogueOutcome::InvalidCategory { .. } => {
                println!("{}", style("Выберите категорию из списка.").yellow());
                let reply = read_line(&stdin)?;
                if reply.to_lowercase() == "отмена" {
                    outcome = dialogue.cancel(&mut sessions, chat_id);
                } else {
                    outcome = dialogue.handle_reply(&mut sessions, chat_id, &reply).await?;
                }
            }
            DialogueOutcome::Finalized(report) => {
                println!("\n{} ({})", style("Чек записан").green().bold(), report.shop_name);
                if let Some(warning) = &report.total_mismatch_warning {
                    println!("{}", style(warning).yellow());
                }
                for total in &report.categories {
                    println!(
                        "- {}: {}",
                        total.category,
                        format_amount(total.amount, &config.currency)
                    );
                }
                return Ok(());
            }
            DialogueOutcome::Cancelled => {
                println!("Отменено.");
                return Ok(());
            }
        }
    }
}

fn read_line(stdin: &io::Stdin) -> anyhow::Result<String> {
    let mut reply = String::new();
    stdin.lock().read_line(&mut reply)?;
    Ok(reply.trim().to_string())
}

fn print_category_rows(config: &kassa_core::KassaConfig) {
    for row in &config.categories.expense_rows {
        println!("  {}", row.join(" | "));
    }
}
