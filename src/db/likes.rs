//! Like repository
//!
//! Like rows back two things the economy needs: the duplicate-like guard
//! and the cumulative like count that feeds the reward tier calculation.
//! Content entities themselves (posts, comments) live outside this crate.

use diesel::prelude::*;
use uuid::Uuid;

use super::models::{current_timestamp, ContentRef, Like, NewLike};
use super::schema::likes;
use crate::error::LedgerError;

/// Whether the user already liked this content
pub fn like_exists(
    conn: &mut SqliteConnection,
    user_id: &str,
    content: &ContentRef,
) -> Result<bool, LedgerError> {
    let count: i64 = likes::table
        .filter(likes::user_id.eq(user_id))
        .filter(likes::reference_type.eq(content.kind()))
        .filter(likes::reference_id.eq(content.id()))
        .count()
        .get_result(conn)
        .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;
    Ok(count > 0)
}

/// Cumulative like count for a piece of content
pub fn count_for_content(
    conn: &mut SqliteConnection,
    content: &ContentRef,
) -> Result<i64, LedgerError> {
    likes::table
        .filter(likes::reference_type.eq(content.kind()))
        .filter(likes::reference_id.eq(content.id()))
        .count()
        .get_result(conn)
        .map_err(|e| LedgerError::Internal(format!("Count query failed: {}", e)))
}

/// Likes for a piece of content, newest first, with total count
pub fn list_for_content(
    conn: &mut SqliteConnection,
    content: &ContentRef,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Like>, i64), LedgerError> {
    let total = count_for_content(conn, content)?;

    let rows = likes::table
        .filter(likes::reference_type.eq(content.kind()))
        .filter(likes::reference_id.eq(content.id()))
        .order(likes::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(conn)
        .map_err(|e| LedgerError::Internal(format!("Query failed: {}", e)))?;

    Ok((rows, total))
}

/// Insert a like row
pub fn insert_like(
    conn: &mut SqliteConnection,
    user_id: &str,
    content: &ContentRef,
) -> Result<Like, LedgerError> {
    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();
    let new_like = NewLike {
        id: &id,
        user_id,
        reference_type: content.kind(),
        reference_id: content.id(),
        created_at: &now,
    };

    diesel::insert_into(likes::table)
        .values(&new_like)
        .execute(conn)
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => LedgerError::DuplicateLike,
            other => LedgerError::Internal(format!("Like insert failed: {}", other)),
        })?;

    likes::table
        .filter(likes::id.eq(&id))
        .first(conn)
        .map_err(|e| LedgerError::Internal(format!("Fetch failed: {}", e)))
}

/// Delete a like row; true if one was removed
pub fn delete_like(
    conn: &mut SqliteConnection,
    user_id: &str,
    content: &ContentRef,
) -> Result<bool, LedgerError> {
    let deleted = diesel::delete(
        likes::table
            .filter(likes::user_id.eq(user_id))
            .filter(likes::reference_type.eq(content.kind()))
            .filter(likes::reference_id.eq(content.id())),
    )
    .execute(conn)
    .map_err(|e| LedgerError::Internal(format!("Delete failed: {}", e)))?;

    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{accounts, LedgerDb};

    fn setup() -> (crate::db::PooledConn, String) {
        let db = LedgerDb::open_in_memory().expect("in-memory db");
        let mut conn = db.conn().expect("connection");
        let user = accounts::create_user(&mut conn, "alice").expect("user");
        (conn, user.id)
    }

    #[test]
    fn insert_and_count() {
        let (mut conn, user_id) = setup();
        let post = ContentRef::Post("p-1".to_string());

        assert!(!like_exists(&mut conn, &user_id, &post).unwrap());
        assert_eq!(count_for_content(&mut conn, &post).unwrap(), 0);

        let like = insert_like(&mut conn, &user_id, &post).unwrap();
        assert_eq!(like.reference(), Some(post.clone()));
        assert!(like_exists(&mut conn, &user_id, &post).unwrap());
        assert_eq!(count_for_content(&mut conn, &post).unwrap(), 1);

        // Same id under a different kind is separate content
        let comment = ContentRef::Comment("p-1".to_string());
        assert_eq!(count_for_content(&mut conn, &comment).unwrap(), 0);
    }

    #[test]
    fn duplicate_insert_rejected_by_unique_index() {
        let (mut conn, user_id) = setup();
        let post = ContentRef::Post("p-1".to_string());

        insert_like(&mut conn, &user_id, &post).unwrap();
        let err = insert_like(&mut conn, &user_id, &post).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateLike));
    }

    #[test]
    fn delete_removes_the_row() {
        let (mut conn, user_id) = setup();
        let post = ContentRef::Post("p-1".to_string());

        insert_like(&mut conn, &user_id, &post).unwrap();
        assert!(delete_like(&mut conn, &user_id, &post).unwrap());
        assert!(!delete_like(&mut conn, &user_id, &post).unwrap());
        assert_eq!(count_for_content(&mut conn, &post).unwrap(), 0);
    }

    #[test]
    fn list_is_newest_first_and_paginated() {
        let (mut conn, user_id) = setup();
        let bob = accounts::create_user(&mut conn, "bob").unwrap();
        let post = ContentRef::Post("p-1".to_string());

        insert_like(&mut conn, &user_id, &post).unwrap();
        insert_like(&mut conn, &bob.id, &post).unwrap();

        let (rows, total) = list_for_content(&mut conn, &post, 1, 0).unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, bob.id);
    }
}
