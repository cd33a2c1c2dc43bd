//! Event system for ledger operations
//!
//! Provides an event bus for notifying listeners about ledger activity.
//! Useful for:
//! - Audit logging
//! - User notifications
//! - Moderation dashboards

use tokio::sync::broadcast;
use tracing::trace;

use crate::db::models::{ContentRef, EntryType};

/// Events emitted by the ledger services
#[derive(Debug, Clone)]
pub enum LedgerEvent {
    AccountCreated {
        user_id: String,
        username: String,
    },
    TransactionRecorded {
        entry_id: String,
        user_id: String,
        amount: i64,
        entry_type: EntryType,
        balance_after: i64,
    },
    EconomyUpdated,
    LikeRecorded {
        user_id: String,
        content: ContentRef,
        reward: i64,
    },
    LikeRemoved {
        user_id: String,
        content: ContentRef,
    },
    CryptoRewardClaimed {
        user_id: String,
        chain_amount: String,
        wallet_address: String,
    },
}

/// Event bus for broadcasting ledger events
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new event bus with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: LedgerEvent) {
        trace!(event = ?event, "Emitting ledger event");
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
