//! Error types for forum-ledger

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Insufficient points: current {current}, required {required}")]
    InsufficientBalance { current: i64, required: i64 },

    #[error("Cannot like your own content")]
    SelfLike,

    #[error("Content already liked by this user")]
    DuplicateLike,

    #[error("Like not found")]
    LikeNotFound,

    #[error("Invalid wallet address: {0}")]
    InvalidWalletAddress(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
