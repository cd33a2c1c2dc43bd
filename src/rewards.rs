//! Reward tier calculation for received likes
//!
//! Pure functions only; nothing here touches the database.

use crate::db::models::EconomyRow;

/// Recipients at or above this balance earn the tier-2 reward
pub const HIGH_REPUTATION_THRESHOLD: i64 = 1_000;

/// Content at or above this many likes earns the tier-3 reward
pub const VIRAL_LIKE_COUNT: i64 = 100;

/// Reward paid to a content owner for one received like.
///
/// `like_count_after` is the content's cumulative like count including the
/// like being processed. The reputation check takes precedence over the
/// viral check: a recipient at 1000+ points is paid tier 2 even on the
/// content's 100th like.
pub fn compute_like_reward(
    economy: &EconomyRow,
    recipient_points: i64,
    like_count_after: i64,
) -> i64 {
    let mut reward = economy.receive_like_tier1;
    if recipient_points >= HIGH_REPUTATION_THRESHOLD {
        reward = economy.receive_like_tier2;
    } else if like_count_after >= VIRAL_LIKE_COUNT {
        reward = economy.receive_like_tier3;
    }
    reward
}

#[cfg(test)]
mod tests {
    use super::*;

    fn economy() -> EconomyRow {
        EconomyRow {
            id: 1,
            create_post_cost: -5,
            create_comment_cost: -2,
            like_cost: -1,
            registration_bonus: 100,
            receive_like_tier1: 3,
            receive_like_tier2: 30,
            receive_like_tier3: 350,
            crypto_reward_cost: 10_000,
            crypto_reward_bnb_amount: "0.01".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn defaults_to_tier1() {
        assert_eq!(compute_like_reward(&economy(), 500, 1), 3);
        assert_eq!(compute_like_reward(&economy(), 0, 99), 3);
    }

    #[test]
    fn high_reputation_pays_tier2() {
        assert_eq!(compute_like_reward(&economy(), 1_000, 1), 30);
        assert_eq!(compute_like_reward(&economy(), 2_000, 1), 30);
        assert_eq!(compute_like_reward(&economy(), 999, 1), 3);
    }

    #[test]
    fn viral_content_pays_tier3() {
        assert_eq!(compute_like_reward(&economy(), 200, 100), 350);
        assert_eq!(compute_like_reward(&economy(), 200, 150), 350);
    }

    #[test]
    fn reputation_check_wins_over_viral_check() {
        // The checks are mutually exclusive: 1000+ points pays tier 2 even
        // on the 100th like.
        assert_eq!(compute_like_reward(&economy(), 1_500, 100), 30);
    }

    #[test]
    fn is_pure() {
        let economy = economy();
        let first = compute_like_reward(&economy, 750, 42);
        for _ in 0..10 {
            assert_eq!(compute_like_reward(&economy, 750, 42), first);
        }
    }
}
