//! Ledger entry repository and the transaction engine primitive
//!
//! `record_entry` is the only sanctioned path that changes a balance: it
//! applies the delta and appends the audit entry inside one database
//! transaction. Entries are append-only; this module exposes no UPDATE or
//! DELETE for `ledger_entries`.

use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::accounts;
use super::models::{current_timestamp, ContentRef, EntryType, LedgerEntry, NewLedgerEntry};
use super::schema::ledger_entries;
use crate::error::LedgerError;

// ============================================================================
// Query Types
// ============================================================================

/// Input for recording a ledger entry
#[derive(Debug, Clone, Deserialize)]
pub struct RecordEntryInput {
    pub user_id: String,
    /// Signed delta: positive credits, negative debits
    pub amount: i64,
    pub entry_type: EntryType,
    pub description: String,
    #[serde(default)]
    pub reference: Option<ContentRef>,
    #[serde(default)]
    pub chain_tx_hash: Option<String>,
    #[serde(default)]
    pub chain_amount: Option<String>,
}

impl RecordEntryInput {
    pub fn new(
        user_id: impl Into<String>,
        amount: i64,
        entry_type: EntryType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            amount,
            entry_type,
            description: description.into(),
            reference: None,
            chain_tx_hash: None,
            chain_amount: None,
        }
    }

    pub fn with_reference(mut self, reference: ContentRef) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// Query parameters for listing a user's ledger entries
#[derive(Debug, Clone, Deserialize)]
pub struct EntryQuery {
    /// Filter by entry type
    pub entry_type: Option<EntryType>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl Default for EntryQuery {
    fn default() -> Self {
        Self {
            entry_type: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

// ============================================================================
// Engine Primitive
// ============================================================================

/// Apply a balance delta and append the matching ledger entry, atomically.
///
/// Runs in its own transaction; when called inside an outer transaction
/// Diesel nests it as a savepoint, so multi-entry actions stay atomic as a
/// whole. A debit that would drive the balance negative fails with
/// `InsufficientBalance` and leaves both the balance and the ledger
/// untouched.
pub fn record_entry(
    conn: &mut SqliteConnection,
    input: &RecordEntryInput,
) -> Result<LedgerEntry, LedgerError> {
    conn.transaction(|conn| {
        let balance_after = match accounts::apply_balance_delta(conn, &input.user_id, input.amount)?
        {
            Some(balance) => balance,
            None => {
                // No row matched: missing user, or a debit past zero
                return match accounts::get_user(conn, &input.user_id)? {
                    None => Err(LedgerError::UserNotFound(input.user_id.clone())),
                    Some(user) => Err(LedgerError::InsufficientBalance {
                        current: user.points,
                        required: input.amount.abs(),
                    }),
                };
            }
        };

        let id = Uuid::new_v4().to_string();
        let now = current_timestamp();
        let new_entry = NewLedgerEntry {
            id: &id,
            user_id: &input.user_id,
            amount: input.amount,
            entry_type: input.entry_type.as_str(),
            description: &input.description,
            reference_type: input.reference.as_ref().map(|r| r.kind()),
            reference_id: input.reference.as_ref().map(|r| r.id()),
            balance_after,
            chain_tx_hash: input.chain_tx_hash.as_deref(),
            chain_amount: input.chain_amount.as_deref(),
            created_at: &now,
        };

        diesel::insert_into(ledger_entries::table)
            .values(&new_entry)
            .execute(conn)
            .map_err(|e| LedgerError::Internal(format!("Entry insert failed: {}", e)))?;

        debug!(
            user_id = %input.user_id,
            amount = input.amount,
            entry_type = %input.entry_type,
            balance_after,
            "Recorded ledger entry"
        );

        get_entry(conn, &id)?
            .ok_or_else(|| LedgerError::Internal("Failed to retrieve created entry".into()))
    })
}

// ============================================================================
// Read Operations
// ============================================================================

/// Get a ledger entry by ID
pub fn get_entry(conn: &mut SqliteConnection, id: &str) -> Result<Option<LedgerEntry>, LedgerError> {
    ledger_entries::table
        .filter(ledger_entries::id.eq(id))
        .first(conn)
        .optional()
        .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))
}

/// List a user's entries, newest first, with total count for pagination
pub fn list_for_user(
    conn: &mut SqliteConnection,
    user_id: &str,
    query: &EntryQuery,
) -> Result<(Vec<LedgerEntry>, i64), LedgerError> {
    let mut base_query = ledger_entries::table
        .filter(ledger_entries::user_id.eq(user_id))
        .into_boxed();

    let mut count_query = ledger_entries::table
        .filter(ledger_entries::user_id.eq(user_id))
        .into_boxed();

    if let Some(entry_type) = query.entry_type {
        base_query = base_query.filter(ledger_entries::entry_type.eq(entry_type.as_str()));
        count_query = count_query.filter(ledger_entries::entry_type.eq(entry_type.as_str()));
    }

    let total: i64 = count_query
        .count()
        .get_result(conn)
        .map_err(|e| LedgerError::Internal(format!("Count query failed: {}", e)))?;

    let entries = base_query
        .order(ledger_entries::created_at.desc())
        .limit(query.limit)
        .offset(query.offset)
        .load(conn)
        .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;

    Ok((entries, total))
}

/// The most recent entry for a user, if any
pub fn latest_entry_for_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<LedgerEntry>, LedgerError> {
    ledger_entries::table
        .filter(ledger_entries::user_id.eq(user_id))
        .order(ledger_entries::created_at.desc())
        .first(conn)
        .optional()
        .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))
}

/// Sum of all positive amounts for a user (lifetime earned)
pub fn sum_earned(conn: &mut SqliteConnection, user_id: &str) -> Result<i64, LedgerError> {
    let total: Option<i64> = ledger_entries::table
        .filter(ledger_entries::user_id.eq(user_id))
        .filter(ledger_entries::amount.gt(0i64))
        .select(sql::<Nullable<BigInt>>("SUM(amount)"))
        .first(conn)
        .map_err(|e| LedgerError::Internal(format!("Sum query failed: {}", e)))?;
    Ok(total.unwrap_or(0))
}

/// Absolute sum of all negative amounts for a user (lifetime spent)
pub fn sum_spent(conn: &mut SqliteConnection, user_id: &str) -> Result<i64, LedgerError> {
    let total: Option<i64> = ledger_entries::table
        .filter(ledger_entries::user_id.eq(user_id))
        .filter(ledger_entries::amount.lt(0i64))
        .select(sql::<Nullable<BigInt>>("SUM(amount)"))
        .first(conn)
        .map_err(|e| LedgerError::Internal(format!("Sum query failed: {}", e)))?;
    Ok(total.unwrap_or(0).abs())
}

/// Number of entries for a user
pub fn entry_count(conn: &mut SqliteConnection, user_id: &str) -> Result<i64, LedgerError> {
    ledger_entries::table
        .filter(ledger_entries::user_id.eq(user_id))
        .count()
        .get_result(conn)
        .map_err(|e| LedgerError::Internal(format!("Count query failed: {}", e)))
}

/// Balance reconstructed from the ledger alone (conservation checks)
pub fn balance_from_entries(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<i64, LedgerError> {
    let total: Option<i64> = ledger_entries::table
        .filter(ledger_entries::user_id.eq(user_id))
        .select(sql::<Nullable<BigInt>>("SUM(amount)"))
        .first(conn)
        .map_err(|e| LedgerError::Internal(format!("Sum query failed: {}", e)))?;
    Ok(total.unwrap_or(0))
}
