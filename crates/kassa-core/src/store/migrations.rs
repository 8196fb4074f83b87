//! Schema setup, idempotent.

use rusqlite::Connection;

use crate::error::StoreError;

pub fn run_migrations(conn: &mut Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER,
            type TEXT,
            amount REAL,
            category TEXT,
            tag TEXT,
            comment TEXT,
            date TEXT,
            source_account TEXT,
            target_account TEXT
        );

        CREATE TABLE IF NOT EXISTS receipt_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_id INTEGER,
            item_name TEXT,
            price REAL,
            quantity REAL DEFAULT 1,
            shop_name TEXT,
            date TEXT
        );

        CREATE TABLE IF NOT EXISTS product_mappings (
            raw_name TEXT PRIMARY KEY,
            category TEXT
        );

        CREATE TABLE IF NOT EXISTS keywords (
            keyword TEXT PRIMARY KEY,
            category TEXT
        );",
    )?;

    Ok(())
}
