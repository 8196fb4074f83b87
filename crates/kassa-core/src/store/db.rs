//! SQLite-backed store.
//!
//! rusqlite connections are not `Sync`, so a dedicated worker thread owns
//! the connection and executes closures sent over a channel; callers get
//! their results back through a oneshot. WAL mode keeps the dashboard's
//! concurrent reads cheap.

use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use rust_decimal::prelude::ToPrimitive;
use tokio::sync::oneshot;
use tracing::{error, info};

use super::migrations::run_migrations;
use super::{normalize_key, CategoryLearningStore, TransactionStore};
use crate::error::StoreError;
use crate::models::receipt::ReceiptItem;
use crate::models::transaction::{NewTransaction, TransactionId};

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if self.sender.send(DbCommand::Shutdown).is_err() {
                error!("failed to send shutdown to DB thread");
            }
            if handle.join().is_err() {
                error!("failed to join DB thread");
            }
        }
    }
}

/// Handle to the SQLite store. Cheap to clone; all clones share one
/// worker thread.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Open (creating if needed) the database at `db_path`.
    pub fn open(db_path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Worker(format!("cannot create db directory: {e}")))?;
        }
        Self::spawn(move || Connection::open(&db_path))
    }

    /// Open an in-memory database (tests, dry runs).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::spawn(Connection::open_in_memory)
    }

    fn spawn<F>(open: F) -> Result<Self, StoreError>
    where
        F: FnOnce() -> rusqlite::Result<Connection> + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("kassa-db".into())
            .spawn(move || {
                let mut conn = match open() {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(StoreError::Sqlite(err)));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("failed to enable WAL mode: {err}");
                }

                let init_result = run_migrations(&mut conn);
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => task(&mut conn),
                        DbCommand::Shutdown => break,
                    }
                }

                info!("database thread shutting down");
            })
            .map_err(|e| StoreError::Worker(format!("cannot spawn db thread: {e}")))?;

        ready_rx
            .recv()
            .map_err(|_| StoreError::Worker("db worker exited before readiness".to_string()))??;

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    /// Run a closure on the database thread.
    pub async fn execute<F, R>(&self, task: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        self.inner
            .sender
            .send(command)
            .map_err(|e| StoreError::Worker(format!("cannot reach db thread: {e}")))?;

        reply_rx
            .await
            .map_err(|_| StoreError::Worker("database thread terminated unexpectedly".to_string()))?
    }

    /// All learned product mappings, ordered by name.
    pub async fn product_mappings(&self) -> Result<Vec<(String, String)>, StoreError> {
        self.execute(|conn| {
            list_pairs(
                conn,
                "SELECT raw_name, category FROM product_mappings ORDER BY raw_name",
            )
        })
        .await
    }

    /// All learned comment keywords, ordered by keyword.
    pub async fn comment_keywords(&self) -> Result<Vec<(String, String)>, StoreError> {
        self.execute(|conn| {
            list_pairs(
                conn,
                "SELECT keyword, category FROM keywords ORDER BY keyword",
            )
        })
        .await
    }
}

fn list_pairs(conn: &Connection, sql: &str) -> Result<Vec<(String, String)>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push((row.get(0)?, row.get(1)?));
    }
    Ok(out)
}

fn amount_to_f64(amount: rust_decimal::Decimal) -> Result<f64, StoreError> {
    amount
        .to_f64()
        .ok_or_else(|| StoreError::InvalidData(format!("amount {amount} not representable")))
}

#[async_trait]
impl CategoryLearningStore for Database {
    async fn lookup_product_category(&self, name: &str) -> Result<Option<String>, StoreError> {
        let key = normalize_key(name);
        self.execute(move |conn| {
            let mut stmt =
                conn.prepare("SELECT category FROM product_mappings WHERE raw_name = ?1")?;
            let mut rows = stmt.query(params![key])?;
            match rows.next()? {
                Some(row) => Ok(Some(row.get(0)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn learn_product_category(&self, name: &str, category: &str) -> Result<(), StoreError> {
        let key = normalize_key(name);
        let category = category.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO product_mappings (raw_name, category) VALUES (?1, ?2)",
                params![key, category],
            )?;
            Ok(())
        })
        .await
    }

    async fn lookup_comment_category(&self, comment: &str) -> Result<Option<String>, StoreError> {
        let key = normalize_key(comment);
        self.execute(move |conn| {
            let mut stmt = conn.prepare("SELECT category FROM keywords WHERE keyword = ?1")?;
            let mut rows = stmt.query(params![key])?;
            match rows.next()? {
                Some(row) => Ok(Some(row.get(0)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn learn_comment_category(
        &self,
        comment: &str,
        category: &str,
    ) -> Result<(), StoreError> {
        let key = normalize_key(comment);
        let category = category.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO keywords (keyword, category) VALUES (?1, ?2)",
                params![key, category],
            )?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl TransactionStore for Database {
    async fn record_transaction(&self, tx: &NewTransaction) -> Result<TransactionId, StoreError> {
        let record = tx.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO transactions
                    (user_id, type, amount, category, tag, comment, date, source_account, target_account)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.user_id,
                    record.kind.as_str(),
                    amount_to_f64(record.amount)?,
                    record.category,
                    record.tag,
                    record.comment,
                    record.date.to_rfc3339(),
                    record.source_account,
                    record.target_account,
                ],
            )?;
            Ok(TransactionId(conn.last_insert_rowid()))
        })
        .await
    }

    async fn record_receipt_items(
        &self,
        transaction_id: TransactionId,
        shop_name: &str,
        items: &[ReceiptItem],
        date: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let shop_name = shop_name.to_string();
        let items = items.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            for item in &items {
                tx.execute(
                    "INSERT INTO receipt_items
                        (transaction_id, item_name, price, quantity, shop_name, date)
                     VALUES (?1, ?2, ?3, 1, ?4, ?5)",
                    params![
                        transaction_id.0,
                        item.name,
                        amount_to_f64(item.price)?,
                        shop_name,
                        date.to_rfc3339(),
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}
