//! # User Repository
//!
//! User lookup and creation, as far as the checkout needs them. Password
//! handling and sessions belong to the auth service, not this crate.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbResult;
use tempo_core::User;

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

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, phone, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by email, case-insensitively.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, phone, created_at FROM users WHERE email = ?1 COLLATE NOCASE",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Inserts a new user. Email is stored lowercase.
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, name, phone, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&user.id)
        .bind(user.email.trim().to_lowercase())
        .bind(&user.name)
        .bind(&user.phone)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Builds a user with generated ID, for seeding and signup paths.
    pub fn new_user(email: impl Into<String>, name: impl Into<String>) -> User {
        let email: String = email.into();
        User {
            id: Uuid::new_v4().to_string(),
            email: email.trim().to_lowercase(),
            name: name.into(),
            phone: None,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
