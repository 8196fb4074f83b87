//! Mappings command - inspect and edit the learned category maps.

use clap::{Args, Subcommand};

use kassa_core::{CategoryLearningStore, Database};

use super::{default_db_path, load_config};

/// Arguments for the mappings command.
#[derive(Args)]
pub struct MappingsArgs {
    /// Database path
    #[arg(long)]
    db: Option<std::path::PathBuf>,

    #[command(subcommand)]
    action: MappingsAction,
}

#[derive(Subcommand)]
enum MappingsAction {
    /// List learned product and comment mappings
    List,

    /// Teach a product -> category mapping
    Learn {
        /// Product name as printed on receipts
        name: String,
        /// Category label
        category: String,
        /// Learn a comment keyword instead of a product name
        #[arg(long)]
        comment: bool,
    },
}

pub async fn run(args: MappingsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let db = Database::open(args.db.unwrap_or_else(default_db_path))?;

    match args.action {
        MappingsAction::List => {
            let products = db.product_mappings().await?;
            let keywords = db.comment_keywords().await?;

            println!("Товары ({}):", products.len());
            for (name, category) in &products {
                println!("  {} -> {}", name, category);
            }
            println!("\nКлючевые слова ({}):", keywords.len());
            for (keyword, category) in &keywords {
                println!("  {} -> {}", keyword, category);
            }
            Ok(())
        }
        MappingsAction::Learn {
            name,
            category,
            comment,
        } => {
            if config.categories.match_expense(&category).is_none() {
                anyhow::bail!("'{category}' is not a known expense category");
            }
            if comment {
                db.learn_comment_category(&name, &category).await?;
            } else {
                db.learn_product_category(&name, &category).await?;
            }
            println!("Запомнил: \"{}\" -> {}", name.trim(), category);
            Ok(())
        }
    }
}
