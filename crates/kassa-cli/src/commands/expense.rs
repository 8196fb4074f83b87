//! Expense command - record a manual expense with keyword learning.

use clap::Args;
use console::style;
use rust_decimal::Decimal;

use kassa_core::models::money::{format_amount, parse_amount};
use kassa_core::{ChatId, Database, MemoryStore, QuickExpense};

use super::{default_db_path, load_config};

/// Arguments for the expense command.
#[derive(Args)]
pub struct ExpenseArgs {
    /// Amount, e.g. "1200" or "1 200 тг"
    amount: String,

    /// Category label; omit to use one learned from the comment
    #[arg(short = 'k', long)]
    category: Option<String>,

    /// Free-text comment
    #[arg(short = 'm', long, default_value = "")]
    comment: String,

    /// Database path
    #[arg(long)]
    db: Option<std::path::PathBuf>,

    /// Use an in-memory store instead of the database
    #[arg(long)]
    dry_run: bool,

    /// Chat/user identifier to record the expense under
    #[arg(long, default_value_t = 0)]
    chat_id: ChatId,
}

pub async fn run(args: ExpenseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let Some(amount) = parse_amount(&args.amount) else {
        anyhow::bail!("cannot parse amount '{}'", args.amount);
    };
    if amount == Decimal::ZERO {
        anyhow::bail!("amount must be non-zero");
    }

    if args.dry_run {
        let store = MemoryStore::new();
        let quick = QuickExpense::new(store.clone(), store, config.clone());
        record(&quick, &args, amount, &config).await
    } else {
        let db = Database::open(args.db.clone().unwrap_or_else(default_db_path))?;
        let quick = QuickExpense::new(db.clone(), db, config.clone());
        record(&quick, &args, amount, &config).await
    }
}

async fn record<L, T>(
    quick: &QuickExpense<L, T>,
    args: &ExpenseArgs,
    amount: Decimal,
    config: &kassa_core::KassaConfig,
) -> anyhow::Result<()>
where
    L: kassa_core::CategoryLearningStore,
    T: kassa_core::TransactionStore,
{
    let category = match &args.category {
        Some(category) => category.clone(),
        None => match quick.suggest_category(&args.comment).await? {
            Some(learned) => {
                println!(
                    "🧠 Узнал \"{}\"! Категория: {}",
                    args.comment.trim(),
                    learned
                );
                learned
            }
            None => anyhow::bail!(
                "no category learned for this comment; pass one with --category"
            ),
        },
    };

    let id = quick
        .record(args.chat_id, amount, &category, &args.comment)
        .await?;

    println!(
        "{} {} — {} (id {})",
        style("Расход записан:").green(),
        format_amount(amount, &config.currency),
        category,
        id.0
    );
    Ok(())
}
