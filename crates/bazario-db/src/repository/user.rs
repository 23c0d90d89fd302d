//! # User Repository
//!
//! Database operations for user accounts. Credential verification itself
//! (argon2) happens in the API layer; this repository only stores and
//! retrieves the records.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use bazario_core::User;

use crate::error::DbResult;

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user. Fails with a unique violation when the
    /// username is taken.
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, username = %user.username, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, password_hash, role,
                store_name, store_location, is_active, refresh_token,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.store_name)
        .bind(&user.store_location)
        .bind(user.is_active)
        .bind(&user.refresh_token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a user by ID.
    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role,
                   store_name, store_location, is_active, refresh_token,
                   created_at, updated_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by username (exact match).
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role,
                   store_name, store_location, is_active, refresh_token,
                   created_at, updated_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets the user holding a given refresh token, if any.
    pub async fn find_by_refresh_token(&self, token: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, role,
                   store_name, store_location, is_active, refresh_token,
                   created_at, updated_at
            FROM users
            WHERE refresh_token = ?1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Stores (or clears, with `None`) a user's refresh token.
    pub async fn set_refresh_token(&self, user_id: &str, token: Option<&str>) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE users SET refresh_token = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use bazario_core::Role;

    fn sample_user(username: &str, role: Role) -> User {
        let now = Utc::now();
        User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            role,
            store_name: None,
            store_location: None,
            is_active: true,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let user = sample_user("asha", Role::Customer);
        repo.insert(&user).await.unwrap();

        let by_id = repo.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "asha");
        assert_eq!(by_id.role, Role::Customer);

        let by_name = repo.find_by_username("asha").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);

        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.insert(&sample_user("dup", Role::Customer)).await.unwrap();
        let err = repo
            .insert(&sample_user("dup", Role::Merchant))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_refresh_token_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let user = sample_user("tokenholder", Role::Customer);
        repo.insert(&user).await.unwrap();

        repo.set_refresh_token(&user.id, Some("tok-123")).await.unwrap();
        let found = repo.find_by_refresh_token("tok-123").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        repo.set_refresh_token(&user.id, None).await.unwrap();
        assert!(repo.find_by_refresh_token("tok-123").await.unwrap().is_none());
    }
}
