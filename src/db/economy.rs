//! Economy configuration repository
//!
//! A single row (id = 1) holds every cost and reward amount. The row is
//! created lazily on first read from the injected seed values and changes
//! only through `update_economy`.

use diesel::prelude::*;

use super::models::{current_timestamp, EconomyChanges, EconomyRow, NewEconomyRow};
use super::schema::economy;
use crate::config::EconomyDefaults;
use crate::error::LedgerError;

/// Fixed primary key of the singleton row
const ECONOMY_ROW_ID: i32 = 1;

/// Get the economy row, creating it from `defaults` if absent
pub fn get_or_create(
    conn: &mut SqliteConnection,
    defaults: &EconomyDefaults,
) -> Result<EconomyRow, LedgerError> {
    if let Some(row) = fetch(conn)? {
        return Ok(row);
    }

    let now = current_timestamp();
    let seed = NewEconomyRow {
        id: ECONOMY_ROW_ID,
        create_post_cost: defaults.create_post_cost,
        create_comment_cost: defaults.create_comment_cost,
        like_cost: defaults.like_cost,
        registration_bonus: defaults.registration_bonus,
        receive_like_tier1: defaults.receive_like_tier1,
        receive_like_tier2: defaults.receive_like_tier2,
        receive_like_tier3: defaults.receive_like_tier3,
        crypto_reward_cost: defaults.crypto_reward_cost,
        crypto_reward_bnb_amount: &defaults.crypto_reward_bnb_amount,
        updated_at: &now,
    };

    // insert_or_ignore so two first readers cannot both insert
    diesel::insert_or_ignore_into(economy::table)
        .values(&seed)
        .execute(conn)
        .map_err(|e| LedgerError::Internal(format!("Economy seed failed: {}", e)))?;

    fetch(conn)?.ok_or_else(|| LedgerError::Internal("Failed to retrieve economy row".into()))
}

/// Apply a partial update to the economy row (admin path)
pub fn update_economy(
    conn: &mut SqliteConnection,
    defaults: &EconomyDefaults,
    changes: &EconomyChanges,
) -> Result<EconomyRow, LedgerError> {
    // Make sure the row exists before updating it
    get_or_create(conn, defaults)?;

    let now = current_timestamp();
    diesel::update(economy::table.filter(economy::id.eq(ECONOMY_ROW_ID)))
        .set((changes.clone(), economy::updated_at.eq(&now)))
        .execute(conn)
        .map_err(|e| LedgerError::Internal(format!("Economy update failed: {}", e)))?;

    fetch(conn)?.ok_or_else(|| LedgerError::Internal("Failed to retrieve economy row".into()))
}

fn fetch(conn: &mut SqliteConnection) -> Result<Option<EconomyRow>, LedgerError> {
    economy::table
        .filter(economy::id.eq(ECONOMY_ROW_ID))
        .first(conn)
        .optional()
        .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))
}
