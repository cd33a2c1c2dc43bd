//! Forum Ledger - point economy ledger for a decentralized forum backend
//!
//! Every point a user earns or spends flows through this crate: content
//! charges, like rewards, registration bonuses, admin adjustments, and
//! crypto redemptions. The ledger is the audit trail; the balance is just
//! its cached sum.
//!
//! ## Invariants
//!
//! - A balance is never negative: debits that would cross zero fail with
//!   [`LedgerError::InsufficientBalance`] and change nothing.
//! - Ledger entries are append-only; each carries the balance snapshot
//!   taken in the same transaction that applied its delta, so entries for a
//!   user reconstruct every balance the user ever held.
//! - `db::accounts::apply_balance_delta` is the only statement that writes
//!   a balance, and only `db::ledger::record_entry` calls it.
//!
//! ## Architecture
//!
//! ```text
//! Services (PointService, LikeService)   - orchestration, events
//!     ↓
//! Repositories (db/*.rs)                 - Diesel queries
//!     ↓
//! SQLite (r2d2 pool, WAL)                - CHECK (points >= 0)
//! ```
//!
//! HTTP routing, authentication, content storage, and the actual blockchain
//! transfer are external collaborators; this crate is the internal service
//! boundary they call into.

pub mod config;
pub mod db;
pub mod error;
pub mod rewards;
pub mod services;

// Re-exports
pub use config::{Config, EconomyDefaults};
pub use db::ledger::RecordEntryInput;
pub use db::{ContentRef, DbStats, EconomyChanges, EconomyRow, EntryType, LedgerDb, LedgerEntry, Like, User};
pub use error::LedgerError;
pub use services::{
    EventBus, LeaderboardPage, LedgerEvent, LikeOutcome, LikeService, PointService, PointsSummary,
    Services, TransactionPage,
};
