//! Diesel model definitions for the ledger tables
//!
//! - Queryable structs: for SELECT queries (reading data)
//! - Insertable structs: for INSERT queries (writing data)
//!
//! SQLite stores timestamps as ISO-8601 TEXT. Ledger ordering relies on
//! timestamp comparisons, so `current_timestamp()` keeps microsecond
//! precision.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::schema::*;

/// Get current UTC timestamp as ISO 8601 string for SQLite TEXT columns
pub fn current_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

// ============================================================================
// Entry Types
// ============================================================================

/// Ledger entry types, stored as TEXT in `ledger_entries.entry_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    RegistrationBonus,
    CreatePost,
    CreateComment,
    LikeContent,
    ReceiveLike,
    CryptoReward,
    AdminAdjustment,
    Refund,
}

impl EntryType {
    pub const ALL: [EntryType; 8] = [
        EntryType::RegistrationBonus,
        EntryType::CreatePost,
        EntryType::CreateComment,
        EntryType::LikeContent,
        EntryType::ReceiveLike,
        EntryType::CryptoReward,
        EntryType::AdminAdjustment,
        EntryType::Refund,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::RegistrationBonus => "registration_bonus",
            EntryType::CreatePost => "create_post",
            EntryType::CreateComment => "create_comment",
            EntryType::LikeContent => "like_content",
            EntryType::ReceiveLike => "receive_like",
            EntryType::CryptoReward => "crypto_reward",
            EntryType::AdminAdjustment => "admin_adjustment",
            EntryType::Refund => "refund",
        }
    }

    pub fn parse(s: &str) -> Option<EntryType> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Content References
// ============================================================================

/// Typed reference to the content that triggered a ledger entry or like.
///
/// Stored as the (`reference_type`, `reference_id`) column pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ContentRef {
    Post(String),
    Comment(String),
}

impl ContentRef {
    pub fn kind(&self) -> &'static str {
        match self {
            ContentRef::Post(_) => "post",
            ContentRef::Comment(_) => "comment",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ContentRef::Post(id) => id,
            ContentRef::Comment(id) => id,
        }
    }

    /// Rebuild a reference from the raw column pair, if both are present
    /// and the kind is recognized
    pub fn from_columns(kind: Option<&str>, id: Option<&str>) -> Option<ContentRef> {
        match (kind, id) {
            (Some("post"), Some(id)) => Some(ContentRef::Post(id.to_string())),
            (Some("comment"), Some(id)) => Some(ContentRef::Comment(id.to_string())),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

// ============================================================================
// User Models
// ============================================================================

/// User row from SELECT query
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: String,
    pub username: String,
    pub points: i64,
    pub bnb_wallet_address: Option<String>,
    pub is_active: i32,
    pub created_at: String,
}

/// New user for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub points: i64,
    pub is_active: i32,
    pub created_at: &'a str,
}

// ============================================================================
// Ledger Entry Models
// ============================================================================

/// Ledger entry row from SELECT query.
///
/// Entries are write-once: no UPDATE or DELETE against this table exists
/// anywhere in the crate. An incorrect charge is corrected by a
/// compensating `refund` or `admin_adjustment` entry.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = ledger_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LedgerEntry {
    pub id: String,
    pub user_id: String,
    pub amount: i64,
    pub entry_type: String,
    pub description: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub balance_after: i64,
    pub chain_tx_hash: Option<String>,
    pub chain_amount: Option<String>,
    pub created_at: String,
}

impl LedgerEntry {
    /// Entry type as the typed enum
    pub fn entry_type(&self) -> Option<EntryType> {
        EntryType::parse(&self.entry_type)
    }

    /// Content reference as the typed union
    pub fn reference(&self) -> Option<ContentRef> {
        ContentRef::from_columns(self.reference_type.as_deref(), self.reference_id.as_deref())
    }
}

/// New ledger entry for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ledger_entries)]
pub struct NewLedgerEntry<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub amount: i64,
    pub entry_type: &'a str,
    pub description: &'a str,
    pub reference_type: Option<&'a str>,
    pub reference_id: Option<&'a str>,
    pub balance_after: i64,
    pub chain_tx_hash: Option<&'a str>,
    pub chain_amount: Option<&'a str>,
    pub created_at: &'a str,
}

// ============================================================================
// Economy Models
// ============================================================================

/// The singleton economy row (id is always 1)
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = economy)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EconomyRow {
    pub id: i32,
    pub create_post_cost: i64,
    pub create_comment_cost: i64,
    pub like_cost: i64,
    pub registration_bonus: i64,
    pub receive_like_tier1: i64,
    pub receive_like_tier2: i64,
    pub receive_like_tier3: i64,
    pub crypto_reward_cost: i64,
    pub crypto_reward_bnb_amount: String,
    pub updated_at: String,
}

/// New economy row for the lazy first-open INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = economy)]
pub struct NewEconomyRow<'a> {
    pub id: i32,
    pub create_post_cost: i64,
    pub create_comment_cost: i64,
    pub like_cost: i64,
    pub registration_bonus: i64,
    pub receive_like_tier1: i64,
    pub receive_like_tier2: i64,
    pub receive_like_tier3: i64,
    pub crypto_reward_cost: i64,
    pub crypto_reward_bnb_amount: &'a str,
    pub updated_at: &'a str,
}

/// Partial update for the economy row (admin path)
#[derive(Debug, Clone, Default, AsChangeset, Deserialize)]
#[diesel(table_name = economy)]
pub struct EconomyChanges {
    #[serde(default)]
    pub create_post_cost: Option<i64>,
    #[serde(default)]
    pub create_comment_cost: Option<i64>,
    #[serde(default)]
    pub like_cost: Option<i64>,
    #[serde(default)]
    pub registration_bonus: Option<i64>,
    #[serde(default)]
    pub receive_like_tier1: Option<i64>,
    #[serde(default)]
    pub receive_like_tier2: Option<i64>,
    #[serde(default)]
    pub receive_like_tier3: Option<i64>,
    #[serde(default)]
    pub crypto_reward_cost: Option<i64>,
    #[serde(default)]
    pub crypto_reward_bnb_amount: Option<String>,
}

// ============================================================================
// Like Models
// ============================================================================

/// Like row from SELECT query
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = likes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Like {
    pub id: String,
    pub user_id: String,
    pub reference_type: String,
    pub reference_id: String,
    pub created_at: String,
}

impl Like {
    pub fn reference(&self) -> Option<ContentRef> {
        ContentRef::from_columns(Some(&self.reference_type), Some(&self.reference_id))
    }
}

/// New like for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub reference_type: &'a str,
    pub reference_id: &'a str,
    pub created_at: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_type_round_trips() {
        for entry_type in EntryType::ALL {
            assert_eq!(EntryType::parse(entry_type.as_str()), Some(entry_type));
        }
        assert_eq!(EntryType::parse("bogus"), None);
    }

    #[test]
    fn content_ref_column_round_trip() {
        let post = ContentRef::Post("p-1".to_string());
        assert_eq!(post.kind(), "post");
        assert_eq!(
            ContentRef::from_columns(Some("post"), Some("p-1")),
            Some(post)
        );

        let comment = ContentRef::Comment("c-9".to_string());
        assert_eq!(
            ContentRef::from_columns(Some(comment.kind()), Some(comment.id())),
            Some(comment)
        );

        assert_eq!(ContentRef::from_columns(Some("post"), None), None);
        assert_eq!(ContentRef::from_columns(Some("channel"), Some("x")), None);
    }

    #[test]
    fn timestamps_preserve_insertion_order() {
        let a = current_timestamp();
        let b = current_timestamp();
        assert!(a <= b);
    }
}
