//! User account repository
//!
//! Accounts here are the minimal identity the ledger needs: a row that owns
//! the point balance. Profile data, sessions, and auth live outside this
//! crate. `apply_balance_delta` is the only statement that writes
//! `users.points`; everything else treats the balance as read-only.

use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use super::models::{current_timestamp, NewUser, User};
use super::schema::users;
use crate::error::LedgerError;

/// One row of the points leaderboard
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: String,
    pub username: String,
    pub points: i64,
}

// ============================================================================
// Read Operations
// ============================================================================

/// Get a user by ID
pub fn get_user(conn: &mut SqliteConnection, user_id: &str) -> Result<Option<User>, LedgerError> {
    users::table
        .filter(users::id.eq(user_id))
        .first(conn)
        .optional()
        .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))
}

/// Check whether a user exists
pub fn user_exists(conn: &mut SqliteConnection, user_id: &str) -> Result<bool, LedgerError> {
    let count: i64 = users::table
        .filter(users::id.eq(user_id))
        .count()
        .get_result(conn)
        .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;
    Ok(count > 0)
}

/// Active users ordered by points, highest first
pub fn leaderboard(
    conn: &mut SqliteConnection,
    limit: i64,
    offset: i64,
) -> Result<(Vec<LeaderboardEntry>, i64), LedgerError> {
    let total: i64 = users::table
        .filter(users::is_active.eq(1))
        .count()
        .get_result(conn)
        .map_err(|e| LedgerError::Internal(format!("Count query failed: {}", e)))?;

    let rows: Vec<User> = users::table
        .filter(users::is_active.eq(1))
        .order(users::points.desc())
        .limit(limit)
        .offset(offset)
        .load(conn)
        .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;

    let entries = rows
        .into_iter()
        .enumerate()
        .map(|(idx, user)| LeaderboardEntry {
            rank: offset + idx as i64 + 1,
            user_id: user.id,
            username: user.username,
            points: user.points,
        })
        .collect();

    Ok((entries, total))
}

// ============================================================================
// Write Operations
// ============================================================================

/// Create a user with a zero balance
pub fn create_user(conn: &mut SqliteConnection, username: &str) -> Result<User, LedgerError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(LedgerError::InvalidInput("Username must not be empty".into()));
    }

    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();
    let new_user = NewUser {
        id: &id,
        username,
        points: 0,
        is_active: 1,
        created_at: &now,
    };

    diesel::insert_into(users::table)
        .values(&new_user)
        .execute(conn)
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => LedgerError::InvalidInput(format!("Username already taken: {}", username)),
            other => LedgerError::Internal(format!("Insert failed: {}", other)),
        })?;

    get_user(conn, &id)?
        .ok_or_else(|| LedgerError::Internal("Failed to retrieve created user".into()))
}

/// Apply a signed delta to a user's balance.
///
/// Executes a single conditional UPDATE whose WHERE clause re-checks that
/// the resulting balance stays non-negative, so the check and the write are
/// one atomic statement. Returns the new balance, or `None` when no row
/// matched (user missing, or a debit that would go negative - callers
/// disambiguate with `get_user`).
pub fn apply_balance_delta(
    conn: &mut SqliteConnection,
    user_id: &str,
    amount: i64,
) -> Result<Option<i64>, LedgerError> {
    let updated = diesel::update(
        users::table
            .filter(users::id.eq(user_id))
            .filter((users::points + amount).ge(0i64)),
    )
    .set(users::points.eq(users::points + amount))
    .execute(conn)
    .map_err(|e| LedgerError::Internal(format!("Balance update failed: {}", e)))?;

    if updated == 0 {
        return Ok(None);
    }

    let balance = users::table
        .filter(users::id.eq(user_id))
        .select(users::points)
        .first(conn)
        .map_err(|e| LedgerError::Internal(format!("Balance fetch failed: {}", e)))?;

    Ok(Some(balance))
}

/// Store the user's wallet address if none is set yet
pub fn set_wallet_address_if_absent(
    conn: &mut SqliteConnection,
    user_id: &str,
    wallet_address: &str,
) -> Result<(), LedgerError> {
    diesel::update(
        users::table
            .filter(users::id.eq(user_id))
            .filter(users::bnb_wallet_address.is_null()),
    )
    .set(users::bnb_wallet_address.eq(wallet_address))
    .execute(conn)
    .map_err(|e| LedgerError::Internal(format!("Wallet update failed: {}", e)))?;
    Ok(())
}
