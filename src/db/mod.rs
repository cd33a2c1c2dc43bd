//! SQLite database module for the point economy ledger
//!
//! ## Architecture
//!
//! - `users` - minimal identity rows holding the current point balance
//! - `ledger_entries` - append-only transaction log with `balance_after`
//! - `economy` - singleton cost/reward configuration row
//! - `likes` - like records backing duplicate checks and like counts
//!
//! The balance column carries a `CHECK (points >= 0)` constraint and is
//! written by exactly one statement (`accounts::apply_balance_delta`), a
//! conditional UPDATE whose WHERE clause re-checks the balance. Two racing
//! debits can therefore never both pass a stale read.

pub mod accounts;
pub mod economy;
pub mod ledger;
pub mod likes;
pub mod models;
pub mod schema;

use std::path::Path;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use tracing::{debug, info};

use crate::error::LedgerError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type PooledConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Per-connection PRAGMAs applied as the pool hands out connections
#[derive(Debug)]
struct ConnectionPragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA journal_mode = WAL; \
             PRAGMA synchronous = NORMAL; \
             PRAGMA foreign_keys = ON; \
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// SQLite database for the point ledger
pub struct LedgerDb {
    pool: DbPool,
}

impl LedgerDb {
    /// Open or create the ledger database at `db_path`
    pub fn open(db_path: &Path, pool_size: u32) -> Result<Self, LedgerError> {
        info!("Opening ledger database at {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let manager = ConnectionManager::<SqliteConnection>::new(db_path.to_string_lossy());
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .connection_customizer(Box::new(ConnectionPragmas))
            .build(manager)
            .map_err(|e| LedgerError::Pool(format!("Failed to build pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    ///
    /// The pool is capped at one connection; every `:memory:` connection is
    /// its own database.
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        debug!("Opening in-memory ledger database");

        let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| LedgerError::Pool(format!("Failed to build pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<PooledConn, LedgerError> {
        self.pool
            .get()
            .map_err(|e| LedgerError::Pool(format!("Failed to get connection: {}", e)))
    }

    /// Create tables and indexes if they do not exist
    fn init_schema(&self) -> Result<(), LedgerError> {
        let mut conn = self.conn()?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY NOT NULL,
                username TEXT NOT NULL UNIQUE,
                points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
                bnb_wallet_address TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&mut conn)
        .map_err(|e| LedgerError::Internal(format!("Failed to create users: {}", e)))?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS ledger_entries (
                id TEXT PRIMARY KEY NOT NULL,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                amount INTEGER NOT NULL,
                entry_type TEXT NOT NULL,
                description TEXT NOT NULL,
                reference_type TEXT,
                reference_id TEXT,
                balance_after INTEGER NOT NULL,
                chain_tx_hash TEXT,
                chain_amount TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&mut conn)
        .map_err(|e| LedgerError::Internal(format!("Failed to create ledger_entries: {}", e)))?;

        diesel::sql_query(
            "CREATE INDEX IF NOT EXISTS idx_ledger_entries_user_created \
             ON ledger_entries(user_id, created_at DESC)",
        )
        .execute(&mut conn)
        .map_err(|e| LedgerError::Internal(format!("Failed to create index: {}", e)))?;

        diesel::sql_query(
            "CREATE INDEX IF NOT EXISTS idx_ledger_entries_type_created \
             ON ledger_entries(entry_type, created_at)",
        )
        .execute(&mut conn)
        .map_err(|e| LedgerError::Internal(format!("Failed to create index: {}", e)))?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS economy (
                id INTEGER PRIMARY KEY NOT NULL,
                create_post_cost INTEGER NOT NULL,
                create_comment_cost INTEGER NOT NULL,
                like_cost INTEGER NOT NULL,
                registration_bonus INTEGER NOT NULL,
                receive_like_tier1 INTEGER NOT NULL,
                receive_like_tier2 INTEGER NOT NULL,
                receive_like_tier3 INTEGER NOT NULL,
                crypto_reward_cost INTEGER NOT NULL,
                crypto_reward_bnb_amount TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&mut conn)
        .map_err(|e| LedgerError::Internal(format!("Failed to create economy: {}", e)))?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS likes (
                id TEXT PRIMARY KEY NOT NULL,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                reference_type TEXT NOT NULL,
                reference_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (user_id, reference_type, reference_id)
            )
            "#,
        )
        .execute(&mut conn)
        .map_err(|e| LedgerError::Internal(format!("Failed to create likes: {}", e)))?;

        diesel::sql_query(
            "CREATE INDEX IF NOT EXISTS idx_likes_reference \
             ON likes(reference_type, reference_id)",
        )
        .execute(&mut conn)
        .map_err(|e| LedgerError::Internal(format!("Failed to create index: {}", e)))?;

        info!("Ledger schema initialized");
        Ok(())
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats, LedgerError> {
        use schema::{ledger_entries, likes, users};

        let mut conn = self.conn()?;

        let user_count: i64 = users::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| LedgerError::Internal(format!("Count query failed: {}", e)))?;

        let entry_count: i64 = ledger_entries::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| LedgerError::Internal(format!("Count query failed: {}", e)))?;

        let like_count: i64 = likes::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| LedgerError::Internal(format!("Count query failed: {}", e)))?;

        Ok(DbStats {
            user_count: user_count as u64,
            entry_count: entry_count as u64,
            like_count: like_count as u64,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub user_count: u64,
    pub entry_count: u64,
    pub like_count: u64,
}

// Re-exports
pub use models::{
    ContentRef, EconomyChanges, EconomyRow, EntryType, LedgerEntry, Like, User,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_on_disk_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        {
            let db = LedgerDb::open(&path, 2).unwrap();
            let stats = db.stats().unwrap();
            assert_eq!(stats.user_count, 0);
        }

        // Second open must tolerate existing tables
        let db = LedgerDb::open(&path, 2).unwrap();
        assert_eq!(db.stats().unwrap().entry_count, 0);
    }

    #[test]
    fn check_constraint_rejects_negative_balance() {
        let db = LedgerDb::open_in_memory().unwrap();
        let mut conn = db.conn().unwrap();

        diesel::sql_query(
            "INSERT INTO users (id, username, points, created_at) \
             VALUES ('u1', 'alice', 0, '2024-01-01T00:00:00Z')",
        )
        .execute(&mut conn)
        .unwrap();

        let result =
            diesel::sql_query("UPDATE users SET points = -1 WHERE id = 'u1'").execute(&mut conn);
        assert!(result.is_err(), "CHECK constraint should reject negative points");
    }
}
