//! Like service - economy-driven like and unlike actions
//!
//! Orchestrates the two-sided point flow of a like: debit the liker, credit
//! the content owner at the computed reward tier, and record the like row -
//! all inside one database transaction. The content entities themselves
//! (posts, comments) are managed outside this crate; callers pass the typed
//! content reference together with the owner's user id.

use std::sync::Arc;

use diesel::prelude::*;
use tracing::debug;

use crate::config::EconomyDefaults;
use crate::db::ledger::{self, RecordEntryInput};
use crate::db::models::{ContentRef, EntryType, LedgerEntry, Like};
use crate::db::{accounts, economy, likes, LedgerDb};
use crate::error::LedgerError;
use crate::rewards::compute_like_reward;

use super::events::{EventBus, LedgerEvent};

/// Result of a successful like: the like row plus both ledger entries
#[derive(Debug, Clone)]
pub struct LikeOutcome {
    pub like: Like,
    /// The liker's debit (`like_content`)
    pub debit: LedgerEntry,
    /// The owner's credit (`receive_like`)
    pub credit: LedgerEntry,
    /// Reward amount paid to the owner
    pub reward: i64,
}

/// Like service for like-related business logic
pub struct LikeService {
    db: Arc<LedgerDb>,
    defaults: EconomyDefaults,
    events: Arc<EventBus>,
}

impl LikeService {
    /// Create a new like service
    pub fn new(db: Arc<LedgerDb>, defaults: EconomyDefaults, events: Arc<EventBus>) -> Self {
        Self {
            db,
            defaults,
            events,
        }
    }

    /// Like a piece of content.
    ///
    /// Preconditions checked before any transaction: the actor is not the
    /// owner, and has not already liked this content. If the liker's debit
    /// fails the whole action rolls back: no credit, no like row.
    pub fn like(
        &self,
        liker_id: &str,
        content: &ContentRef,
        owner_id: &str,
    ) -> Result<LikeOutcome, LedgerError> {
        if liker_id == owner_id {
            return Err(LedgerError::SelfLike);
        }

        let mut conn = self.db.conn()?;
        let outcome = conn.transaction(|conn| {
            if likes::like_exists(conn, liker_id, content)? {
                return Err(LedgerError::DuplicateLike);
            }

            let economy = economy::get_or_create(conn, &self.defaults)?;

            // Debit the liker first; its failure aborts everything
            let debit = ledger::record_entry(
                conn,
                &RecordEntryInput::new(
                    liker_id,
                    economy.like_cost,
                    EntryType::LikeContent,
                    format!("Liked {}", content),
                )
                .with_reference(content.clone()),
            )?;

            let owner = accounts::get_user(conn, owner_id)?
                .ok_or_else(|| LedgerError::UserNotFound(owner_id.to_string()))?;
            let like_count_after = likes::count_for_content(conn, content)? + 1;
            let reward = compute_like_reward(&economy, owner.points, like_count_after);

            let credit = ledger::record_entry(
                conn,
                &RecordEntryInput::new(
                    owner_id,
                    reward,
                    EntryType::ReceiveLike,
                    format!("Received like on {}", content),
                )
                .with_reference(content.clone()),
            )?;

            let like = likes::insert_like(conn, liker_id, content)?;

            Ok(LikeOutcome {
                like,
                debit,
                credit,
                reward,
            })
        })?;

        debug!(liker_id, owner_id, content = %content, reward = outcome.reward, "Like recorded");
        self.events.emit(LedgerEvent::LikeRecorded {
            user_id: liker_id.to_string(),
            content: content.clone(),
            reward: outcome.reward,
        });
        Ok(outcome)
    }

    /// Remove a like.
    ///
    /// Only the like row is deleted; the original debit and credit entries
    /// stay in the ledger and no refund entry is created.
    pub fn unlike(&self, user_id: &str, content: &ContentRef) -> Result<(), LedgerError> {
        let mut conn = self.db.conn()?;
        let removed = likes::delete_like(&mut conn, user_id, content)?;
        if !removed {
            return Err(LedgerError::LikeNotFound);
        }

        debug!(user_id, content = %content, "Like removed");
        self.events.emit(LedgerEvent::LikeRemoved {
            user_id: user_id.to_string(),
            content: content.clone(),
        });
        Ok(())
    }

    /// Users who liked a piece of content, newest first
    pub fn likers(
        &self,
        content: &ContentRef,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Like>, i64), LedgerError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        let mut conn = self.db.conn()?;
        likes::list_for_content(&mut conn, content, page_size, (page - 1) * page_size)
    }

    /// Cumulative like count for a piece of content
    pub fn like_count(&self, content: &ContentRef) -> Result<i64, LedgerError> {
        let mut conn = self.db.conn()?;
        likes::count_for_content(&mut conn, content)
    }
}
