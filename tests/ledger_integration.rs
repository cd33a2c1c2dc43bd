//! Integration tests for the point economy ledger
//!
//! Exercises the full service stack against a real SQLite database:
//! registration, content charges, like flows, crypto redemption, and the
//! conservation invariant between balances and the ledger.

use std::sync::Arc;

use forum_ledger::db::ledger;
use forum_ledger::{
    ContentRef, EconomyDefaults, EntryType, LedgerDb, LedgerError, LedgerEvent, Services,
};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn services_in_memory() -> Services {
    init_tracing();
    let db = Arc::new(LedgerDb::open_in_memory().unwrap());
    Services::new(db, EconomyDefaults::default())
}

/// Balance must always equal the sum of the user's ledger entries
fn assert_conserved(services: &Services, db: &LedgerDb, user_id: &str) {
    let summary = services.points.points_summary(user_id).unwrap();
    let mut conn = db.conn().unwrap();
    let from_entries = ledger::balance_from_entries(&mut conn, user_id).unwrap();
    assert_eq!(
        summary.current_points, from_entries,
        "balance diverged from ledger for {}",
        user_id
    );
}

#[test]
fn full_economy_lifecycle() {
    init_tracing();
    let db = Arc::new(LedgerDb::open_in_memory().unwrap());
    let services = Services::new(db.clone(), EconomyDefaults::default());
    let mut events = services.events.subscribe();

    // Registration: one entry, configured bonus
    let (alice, bonus) = services.points.register_account("alice").unwrap();
    assert_eq!(bonus.amount, 100);
    assert_eq!(bonus.balance_after, 100);

    let (bob, _) = services.points.register_account("bob").unwrap();

    // Post charge before the post is persisted by the content layer
    let post_charge = services.points.charge_post_creation(&alice.id, "post-1").unwrap();
    assert_eq!(post_charge.amount, -5);
    assert_eq!(post_charge.balance_after, 95);

    // Bob likes Alice's post: -1 to Bob, tier-1 +3 to Alice
    let post = ContentRef::Post("post-1".to_string());
    let outcome = services.likes.like(&bob.id, &post, &alice.id).unwrap();
    assert_eq!(outcome.debit.amount, -1);
    assert_eq!(outcome.reward, 3);

    assert_eq!(services.points.points_summary(&alice.id).unwrap().current_points, 98);
    assert_eq!(services.points.points_summary(&bob.id).unwrap().current_points, 99);

    // Unlike reverses the like count but not the points
    services.likes.unlike(&bob.id, &post).unwrap();
    assert_eq!(services.likes.like_count(&post).unwrap(), 0);
    assert_eq!(services.points.points_summary(&alice.id).unwrap().current_points, 98);
    assert_eq!(services.points.points_summary(&bob.id).unwrap().current_points, 99);

    // History is newest-first with chained balance snapshots
    let history = services.points.transactions(&alice.id, 1, 50, None).unwrap();
    assert_eq!(history.total, 3);
    let mut running = 0;
    for entry in history.entries.iter().rev() {
        running += entry.amount;
        assert_eq!(entry.balance_after, running);
    }

    assert_conserved(&services, &db, &alice.id);
    assert_conserved(&services, &db, &bob.id);

    // Events arrived in order
    assert!(matches!(events.try_recv().unwrap(), LedgerEvent::AccountCreated { .. }));

    let stats = db.stats().unwrap();
    assert_eq!(stats.user_count, 2);
    assert_eq!(stats.entry_count, 5);
    assert_eq!(stats.like_count, 0);
}

#[test]
fn insufficient_balance_aborts_content_actions() {
    let services = services_in_memory();
    let (user, _) = services.points.register_account("poor").unwrap();
    services.points.admin_adjust(&user.id, -99, "drain to 1", "admin").unwrap();

    // Post costs 5, comment costs 2, both exceed the remaining 1 point
    assert!(matches!(
        services.points.charge_post_creation(&user.id, "p"),
        Err(LedgerError::InsufficientBalance { .. })
    ));
    assert!(matches!(
        services.points.charge_comment_creation(&user.id, "c"),
        Err(LedgerError::InsufficientBalance { .. })
    ));

    // Like still works at cost 1, draining to zero
    let (owner, _) = services.points.register_account("owner").unwrap();
    let post = ContentRef::Post("p-1".to_string());
    services.likes.like(&user.id, &post, &owner.id).unwrap();
    assert_eq!(services.points.points_summary(&user.id).unwrap().current_points, 0);

    // And a second like has nothing left to spend
    let post2 = ContentRef::Post("p-2".to_string());
    assert!(matches!(
        services.likes.like(&user.id, &post2, &owner.id),
        Err(LedgerError::InsufficientBalance { .. })
    ));
}

#[test]
fn crypto_redemption_round_trip() {
    let services = services_in_memory();
    let (user, _) = services.points.register_account("whale").unwrap();
    services.points.admin_adjust(&user.id, 12_000, "seed balance", "admin").unwrap();
    let wallet = format!("0x{}", "b".repeat(40));

    let summary = services.points.points_summary(&user.id).unwrap();
    assert!(summary.can_claim_crypto);

    let entry = services.points.claim_crypto_reward(&user.id, &wallet).unwrap();
    assert_eq!(entry.amount, -10_000);
    assert_eq!(entry.entry_type(), Some(EntryType::CryptoReward));
    assert_eq!(entry.chain_amount.as_deref(), Some("0.01"));
    assert_eq!(entry.balance_after, 2_100);

    let summary = services.points.points_summary(&user.id).unwrap();
    assert_eq!(summary.current_points, 2_100);
    assert!(!summary.can_claim_crypto);
    assert_eq!(summary.total_spent, 10_000);
}

#[test]
fn ledger_survives_reopen() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.db");

    let user_id = {
        let db = Arc::new(LedgerDb::open(&path, 2).unwrap());
        let services = Services::new(db, EconomyDefaults::default());
        let (user, _) = services.points.register_account("alice").unwrap();
        services.points.charge_post_creation(&user.id, "p-1").unwrap();
        user.id
    };

    let db = Arc::new(LedgerDb::open(&path, 2).unwrap());
    let services = Services::new(db.clone(), EconomyDefaults::default());
    let summary = services.points.points_summary(&user_id).unwrap();
    assert_eq!(summary.current_points, 95);
    assert_eq!(summary.transactions_count, 2);
    assert_conserved(&services, &db, &user_id);
}
