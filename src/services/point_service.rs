//! Point service - the transaction engine and its read contracts
//!
//! Wraps the ledger repositories with orchestration and event emission.
//! Every balance change in the system funnels through `create_transaction`;
//! the higher-level methods (registration bonus, content charges, admin
//! adjustments, crypto redemption) only shape the input.

use std::sync::Arc;

use diesel::prelude::*;
use tracing::{debug, info};

use crate::config::EconomyDefaults;
use crate::db::accounts::{self, LeaderboardEntry};
use crate::db::ledger::{self, EntryQuery, RecordEntryInput};
use crate::db::models::{ContentRef, EconomyChanges, EconomyRow, EntryType, LedgerEntry, User};
use crate::db::{economy, LedgerDb};
use crate::error::LedgerError;

use super::events::{EventBus, LedgerEvent};

/// A user's points summary
#[derive(Debug, Clone, serde::Serialize)]
pub struct PointsSummary {
    pub user_id: String,
    pub username: String,
    pub current_points: i64,
    pub total_earned: i64,
    pub total_spent: i64,
    pub transactions_count: i64,
    pub can_claim_crypto: bool,
    pub crypto_reward_cost: i64,
}

/// One page of a user's transaction history, newest first
#[derive(Debug, Clone, serde::Serialize)]
pub struct TransactionPage {
    pub entries: Vec<LedgerEntry>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// One page of the points leaderboard
#[derive(Debug, Clone, serde::Serialize)]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

fn page_window(page: i64, page_size: i64) -> (i64, i64) {
    let page = page.max(1);
    let page_size = page_size.clamp(1, 100);
    (page, page_size)
}

/// Point service for ledger business logic
pub struct PointService {
    db: Arc<LedgerDb>,
    defaults: EconomyDefaults,
    events: Arc<EventBus>,
}

impl PointService {
    /// Create a new point service
    pub fn new(db: Arc<LedgerDb>, defaults: EconomyDefaults, events: Arc<EventBus>) -> Self {
        Self {
            db,
            defaults,
            events,
        }
    }

    // =========================================================================
    // Economy Configuration
    // =========================================================================

    /// Current economy configuration, created from the injected defaults on
    /// first read
    pub fn economy(&self) -> Result<EconomyRow, LedgerError> {
        let mut conn = self.db.conn()?;
        economy::get_or_create(&mut conn, &self.defaults)
    }

    /// Apply an admin update to the economy configuration
    pub fn update_economy(&self, changes: &EconomyChanges) -> Result<EconomyRow, LedgerError> {
        let mut conn = self.db.conn()?;
        let row = economy::update_economy(&mut conn, &self.defaults, changes)?;
        info!("Economy configuration updated");
        self.events.emit(LedgerEvent::EconomyUpdated);
        Ok(row)
    }

    // =========================================================================
    // Transaction Engine
    // =========================================================================

    /// Record a point transaction: apply the delta to the user's balance and
    /// append the audit entry, atomically.
    ///
    /// This is the only sanctioned path that changes a balance. Debits that
    /// would drive the balance negative fail with `InsufficientBalance` and
    /// leave balance and ledger untouched.
    pub fn create_transaction(&self, input: &RecordEntryInput) -> Result<LedgerEntry, LedgerError> {
        let mut conn = self.db.conn()?;
        let entry = ledger::record_entry(&mut conn, input)?;
        self.emit_recorded(&entry);
        Ok(entry)
    }

    /// Create an account and award the registration bonus.
    ///
    /// The account insert and the bonus run as two separate commits, so a
    /// failed bonus leaves the account in place without its credit.
    pub fn register_account(&self, username: &str) -> Result<(User, LedgerEntry), LedgerError> {
        let user = {
            let mut conn = self.db.conn()?;
            accounts::create_user(&mut conn, username)?
        };
        debug!(user_id = %user.id, username = %user.username, "Account created");
        self.events.emit(LedgerEvent::AccountCreated {
            user_id: user.id.clone(),
            username: user.username.clone(),
        });

        let entry = self.award_registration_bonus(&user.id)?;
        Ok((user, entry))
    }

    /// Award the configured registration bonus
    pub fn award_registration_bonus(&self, user_id: &str) -> Result<LedgerEntry, LedgerError> {
        let economy = self.economy()?;
        self.create_transaction(&RecordEntryInput::new(
            user_id,
            economy.registration_bonus,
            EntryType::RegistrationBonus,
            format!("Registration bonus: {} points", economy.registration_bonus),
        ))
    }

    /// Charge the configured cost for creating a post.
    ///
    /// Callers persist the post only after this debit succeeds; an
    /// `InsufficientBalance` error must abort the post creation.
    pub fn charge_post_creation(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        let economy = self.economy()?;
        self.create_transaction(
            &RecordEntryInput::new(
                user_id,
                economy.create_post_cost,
                EntryType::CreatePost,
                format!("Created post {}", post_id),
            )
            .with_reference(ContentRef::Post(post_id.to_string())),
        )
    }

    /// Charge the configured cost for creating a comment.
    ///
    /// Same ordering contract as `charge_post_creation`.
    pub fn charge_comment_creation(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        let economy = self.economy()?;
        self.create_transaction(
            &RecordEntryInput::new(
                user_id,
                economy.create_comment_cost,
                EntryType::CreateComment,
                format!("Created comment {}", comment_id),
            )
            .with_reference(ContentRef::Comment(comment_id.to_string())),
        )
    }

    /// Admin-only: adjust a user's points by an arbitrary signed amount.
    ///
    /// Authorization is the caller's concern. Debits stay bounded by the
    /// non-negativity invariant like every other transaction.
    pub fn admin_adjust(
        &self,
        user_id: &str,
        amount: i64,
        reason: &str,
        admin_id: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        if reason.trim().is_empty() {
            return Err(LedgerError::InvalidInput(
                "Adjustment reason must not be empty".into(),
            ));
        }

        let entry = self.create_transaction(&RecordEntryInput::new(
            user_id,
            amount,
            EntryType::AdminAdjustment,
            format!("Admin adjustment by user {}: {}", admin_id, reason),
        ))?;
        info!(user_id, amount, admin_id, "Admin point adjustment");
        Ok(entry)
    }

    /// Redeem points for the configured BNB reward.
    ///
    /// The debit commits with a placeholder chain hash before any on-chain
    /// transfer happens; the blockchain service fills in the real hash once
    /// transfer support lands. Known ordering gap, kept as-is.
    pub fn claim_crypto_reward(
        &self,
        user_id: &str,
        wallet_address: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        if !wallet_address.starts_with("0x") || wallet_address.len() != 42 {
            return Err(LedgerError::InvalidWalletAddress(
                "BNB wallet address must be 0x-prefixed and 42 characters".into(),
            ));
        }

        let mut conn = self.db.conn()?;
        let entry = conn.transaction(|conn| {
            let economy = economy::get_or_create(conn, &self.defaults)?;
            let placeholder_hash = format!("0x{}", "0".repeat(64));

            // The debit itself enforces points >= crypto_reward_cost
            let entry = ledger::record_entry(
                conn,
                &RecordEntryInput {
                    user_id: user_id.to_string(),
                    amount: -economy.crypto_reward_cost,
                    entry_type: EntryType::CryptoReward,
                    description: format!(
                        "Crypto reward claim: {} BNB sent to {}",
                        economy.crypto_reward_bnb_amount, wallet_address
                    ),
                    reference: None,
                    chain_tx_hash: Some(placeholder_hash),
                    chain_amount: Some(economy.crypto_reward_bnb_amount.clone()),
                },
            )?;

            accounts::set_wallet_address_if_absent(conn, user_id, wallet_address)?;
            Ok::<_, LedgerError>(entry)
        })?;

        info!(user_id, wallet_address, "Crypto reward claimed");
        self.emit_recorded(&entry);
        self.events.emit(LedgerEvent::CryptoRewardClaimed {
            user_id: user_id.to_string(),
            chain_amount: entry.chain_amount.clone().unwrap_or_default(),
            wallet_address: wallet_address.to_string(),
        });
        Ok(entry)
    }

    // =========================================================================
    // Read Contracts
    // =========================================================================

    /// Points summary for a user: current balance, lifetime earned and
    /// spent, entry count, crypto eligibility
    pub fn points_summary(&self, user_id: &str) -> Result<PointsSummary, LedgerError> {
        let mut conn = self.db.conn()?;

        let user = accounts::get_user(&mut conn, user_id)?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))?;

        let total_earned = ledger::sum_earned(&mut conn, user_id)?;
        let total_spent = ledger::sum_spent(&mut conn, user_id)?;
        let transactions_count = ledger::entry_count(&mut conn, user_id)?;
        let economy = economy::get_or_create(&mut conn, &self.defaults)?;

        Ok(PointsSummary {
            user_id: user.id,
            username: user.username,
            current_points: user.points,
            total_earned,
            total_spent,
            transactions_count,
            can_claim_crypto: user.points >= economy.crypto_reward_cost,
            crypto_reward_cost: economy.crypto_reward_cost,
        })
    }

    /// A user's transaction history, newest first, optionally filtered by
    /// entry type
    pub fn transactions(
        &self,
        user_id: &str,
        page: i64,
        page_size: i64,
        entry_type: Option<EntryType>,
    ) -> Result<TransactionPage, LedgerError> {
        let (page, page_size) = page_window(page, page_size);
        let mut conn = self.db.conn()?;

        let query = EntryQuery {
            entry_type,
            limit: page_size,
            offset: (page - 1) * page_size,
        };
        let (entries, total) = ledger::list_for_user(&mut conn, user_id, &query)?;

        Ok(TransactionPage {
            entries,
            total,
            page,
            page_size,
            total_pages: (total + page_size - 1) / page_size,
        })
    }

    /// Points leaderboard over active users
    pub fn leaderboard(&self, page: i64, page_size: i64) -> Result<LeaderboardPage, LedgerError> {
        let (page, page_size) = page_window(page, page_size);
        let mut conn = self.db.conn()?;

        let (entries, total) =
            accounts::leaderboard(&mut conn, page_size, (page - 1) * page_size)?;

        Ok(LeaderboardPage {
            entries,
            total,
            page,
            page_size,
        })
    }

    fn emit_recorded(&self, entry: &LedgerEntry) {
        self.events.emit(LedgerEvent::TransactionRecorded {
            entry_id: entry.id.clone(),
            user_id: entry.user_id.clone(),
            amount: entry.amount,
            entry_type: entry.entry_type().unwrap_or(EntryType::AdminAdjustment),
            balance_after: entry.balance_after,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PointService {
        let db = Arc::new(LedgerDb::open_in_memory().expect("in-memory db"));
        PointService::new(db, EconomyDefaults::default(), Arc::new(EventBus::new()))
    }

    #[test]
    fn registration_awards_exactly_one_bonus_entry() {
        let service = service();

        let (user, entry) = service.register_account("alice").unwrap();
        assert_eq!(entry.amount, 100);
        assert_eq!(entry.entry_type(), Some(EntryType::RegistrationBonus));
        assert_eq!(entry.balance_after, 100);

        let summary = service.points_summary(&user.id).unwrap();
        assert_eq!(summary.current_points, 100);
        assert_eq!(summary.transactions_count, 1);
        assert_eq!(summary.total_earned, 100);
        assert_eq!(summary.total_spent, 0);
    }

    #[test]
    fn post_charge_debits_and_snapshots_balance() {
        let service = service();
        let (user, _) = service.register_account("alice").unwrap();

        let entry = service.charge_post_creation(&user.id, "p-1").unwrap();
        assert_eq!(entry.amount, -5);
        assert_eq!(entry.balance_after, 95);
        assert_eq!(entry.entry_type(), Some(EntryType::CreatePost));
        assert_eq!(entry.reference(), Some(ContentRef::Post("p-1".into())));

        let comment = service.charge_comment_creation(&user.id, "c-1").unwrap();
        assert_eq!(comment.amount, -2);
        assert_eq!(comment.balance_after, 93);
    }

    #[test]
    fn insufficient_balance_rejects_charge_without_side_effects() {
        let service = service();
        let (user, _) = service.register_account("alice").unwrap();
        // Drain to 3 points
        service.admin_adjust(&user.id, -97, "test drain", "admin").unwrap();

        let err = service.charge_post_creation(&user.id, "p-1").unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance {
                current: 3,
                required: 5
            }
        ));

        let summary = service.points_summary(&user.id).unwrap();
        assert_eq!(summary.current_points, 3);
        assert_eq!(summary.transactions_count, 2);
    }

    #[test]
    fn admin_debit_is_bounded_by_non_negativity() {
        let service = service();
        let (user, _) = service.register_account("alice").unwrap();
        service.admin_adjust(&user.id, -70, "drain to 30", "admin").unwrap();

        let err = service
            .admin_adjust(&user.id, -50, "past zero", "admin")
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { current: 30, .. }));
        assert_eq!(service.points_summary(&user.id).unwrap().current_points, 30);
    }

    #[test]
    fn admin_adjust_requires_a_reason() {
        let service = service();
        let (user, _) = service.register_account("alice").unwrap();
        assert!(matches!(
            service.admin_adjust(&user.id, 10, "  ", "admin"),
            Err(LedgerError::InvalidInput(_))
        ));
    }

    #[test]
    fn transactions_paginate_newest_first() {
        let service = service();
        let (user, _) = service.register_account("alice").unwrap();
        service.charge_post_creation(&user.id, "p-1").unwrap();
        service.charge_comment_creation(&user.id, "c-1").unwrap();

        let history = service.transactions(&user.id, 1, 2, None).unwrap();
        assert_eq!(history.total, 3);
        assert_eq!(history.total_pages, 2);
        assert_eq!(history.entries.len(), 2);
        assert_eq!(history.entries[0].entry_type(), Some(EntryType::CreateComment));

        let filtered = service
            .transactions(&user.id, 1, 50, Some(EntryType::CreatePost))
            .unwrap();
        assert_eq!(filtered.total, 1);

        let page2 = service.transactions(&user.id, 2, 2, None).unwrap();
        assert_eq!(page2.entries.len(), 1);
        assert_eq!(
            page2.entries[0].entry_type(),
            Some(EntryType::RegistrationBonus)
        );
    }

    #[test]
    fn crypto_claim_requires_threshold_and_valid_wallet() {
        let service = service();
        let (user, _) = service.register_account("alice").unwrap();
        let wallet = format!("0x{}", "a".repeat(40));

        assert!(matches!(
            service.claim_crypto_reward(&user.id, "not-a-wallet"),
            Err(LedgerError::InvalidWalletAddress(_))
        ));

        // 100 points < 10000 cost
        assert!(matches!(
            service.claim_crypto_reward(&user.id, &wallet),
            Err(LedgerError::InsufficientBalance { .. })
        ));

        service.admin_adjust(&user.id, 9_900, "top up", "admin").unwrap();
        let entry = service.claim_crypto_reward(&user.id, &wallet).unwrap();
        assert_eq!(entry.amount, -10_000);
        assert_eq!(entry.balance_after, 0);
        assert_eq!(entry.entry_type(), Some(EntryType::CryptoReward));
        assert_eq!(entry.chain_amount.as_deref(), Some("0.01"));
        assert!(entry.chain_tx_hash.as_deref().unwrap().starts_with("0x"));

        let summary = service.points_summary(&user.id).unwrap();
        assert!(!summary.can_claim_crypto);
    }

    #[test]
    fn economy_update_changes_subsequent_charges() {
        let service = service();
        let (user, _) = service.register_account("alice").unwrap();

        service
            .update_economy(&EconomyChanges {
                create_post_cost: Some(-10),
                ..Default::default()
            })
            .unwrap();

        let entry = service.charge_post_creation(&user.id, "p-1").unwrap();
        assert_eq!(entry.amount, -10);
        assert_eq!(entry.balance_after, 90);
    }

    #[test]
    fn leaderboard_pages_rank_users() {
        let service = service();
        let (alice, _) = service.register_account("alice").unwrap();
        let (bob, _) = service.register_account("bob").unwrap();
        service.admin_adjust(&bob.id, 50, "bonus points", "admin").unwrap();

        let board = service.leaderboard(1, 10).unwrap();
        assert_eq!(board.total, 2);
        assert_eq!(board.entries[0].user_id, bob.id);
        assert_eq!(board.entries[0].rank, 1);
        assert_eq!(board.entries[1].user_id, alice.id);
    }
}
