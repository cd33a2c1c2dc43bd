//! Diesel table declarations for the ledger database
//!
//! The tables are created lazily by `LedgerDb::init_schema`, so these
//! declarations must stay in sync with the DDL in `db/mod.rs`.

diesel::table! {
    users (id) {
        id -> Text,
        username -> Text,
        points -> BigInt,
        bnb_wallet_address -> Nullable<Text>,
        is_active -> Integer,
        created_at -> Text,
    }
}

diesel::table! {
    ledger_entries (id) {
        id -> Text,
        user_id -> Text,
        amount -> BigInt,
        entry_type -> Text,
        description -> Text,
        reference_type -> Nullable<Text>,
        reference_id -> Nullable<Text>,
        balance_after -> BigInt,
        chain_tx_hash -> Nullable<Text>,
        chain_amount -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    economy (id) {
        id -> Integer,
        create_post_cost -> BigInt,
        create_comment_cost -> BigInt,
        like_cost -> BigInt,
        registration_bonus -> BigInt,
        receive_like_tier1 -> BigInt,
        receive_like_tier2 -> BigInt,
        receive_like_tier3 -> BigInt,
        crypto_reward_cost -> BigInt,
        crypto_reward_bnb_amount -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    likes (id) {
        id -> Text,
        user_id -> Text,
        reference_type -> Text,
        reference_id -> Text,
        created_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, ledger_entries, economy, likes);
