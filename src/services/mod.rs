//! Service layer for forum-ledger
//!
//! Services encapsulate ledger business logic between the (external) API
//! layer and the repositories. Each service wraps database operations with:
//! - Input validation
//! - Cross-entity orchestration
//! - Transaction boundaries
//! - Event emission for audit/notifications
//!
//! ## Architecture
//!
//! ```text
//! API Handlers (external, thin)
//!     ↓
//! Service Layer (business logic)
//!     ↓
//! Repository Layer (db/*.rs)
//!     ↓
//! SQLite Database
//! ```

pub mod events;
pub mod like_service;
pub mod point_service;

// Re-exports
pub use events::{EventBus, LedgerEvent};
pub use like_service::{LikeOutcome, LikeService};
pub use point_service::{LeaderboardPage, PointService, PointsSummary, TransactionPage};

use std::sync::Arc;

use crate::config::EconomyDefaults;
use crate::db::LedgerDb;

/// Service container for dependency injection
///
/// Holds all services with a shared database pool and event bus. The
/// economy defaults are injected once here; there is no global state.
pub struct Services {
    pub points: Arc<PointService>,
    pub likes: Arc<LikeService>,
    pub events: Arc<EventBus>,
}

impl Services {
    /// Create all services with a shared database
    pub fn new(db: Arc<LedgerDb>, defaults: EconomyDefaults) -> Self {
        let events = Arc::new(EventBus::new());

        Self {
            points: Arc::new(PointService::new(
                db.clone(),
                defaults.clone(),
                events.clone(),
            )),
            likes: Arc::new(LikeService::new(db, defaults, events.clone())),
            events,
        }
    }
}
