//! Credential store: user records and authentication.
//!
//! A user record is `{id, username, password_hash}`. Records are created
//! on registration, never mutated and never deleted. The store answers
//! exactly two questions: can this username be registered, and do these
//! credentials match an existing record.
//!
//! [`UserStore`] is the seam the HTTP layer is generic over; the
//! production implementation is [`SqliteUserStore`], tests substitute an
//! in-memory store.

pub mod password;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::error::CredentialError;

// =============================================================================
// Types
// =============================================================================

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique auto-assigned identifier
    pub id: i64,

    /// Unique username chosen at registration
    pub username: String,

    /// Argon2 PHC hash of the password
    pub password_hash: String,
}

/// Storage for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user with the given credentials.
    ///
    /// Fails with [`CredentialError::DuplicateUsername`] if the username
    /// is already taken. The password is stored as a salted hash, never
    /// in the clear.
    async fn register(&self, username: &str, password: &str) -> Result<User, CredentialError>;

    /// Look up a user by username and verify the password.
    ///
    /// Fails with [`CredentialError::InvalidCredentials`] if the username
    /// is unknown or the password does not match.
    async fn authenticate(&self, username: &str, password: &str) -> Result<User, CredentialError>;
}

// =============================================================================
// SQLite Implementation
// =============================================================================

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (\
     id INTEGER PRIMARY KEY AUTOINCREMENT, \
     username TEXT NOT NULL UNIQUE, \
     password_hash TEXT NOT NULL)";

/// User store backed by a SQLite database.
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Connect to the database and create the `users` table if missing.
    pub async fn connect(database_url: &str) -> Result<Self, CredentialError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Build a store from an existing pool (the schema must exist).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn register(&self, username: &str, password: &str) -> Result<User, CredentialError> {
        let existing = sqlx::query("SELECT id FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        if existing.is_some() {
            return Err(CredentialError::DuplicateUsername {
                username: username.to_string(),
            });
        }

        let password_hash = password::hash_password(password)?;

        let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?1, ?2)")
            .bind(username)
            .bind(&password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                // Two concurrent registrations can pass the SELECT above;
                // the UNIQUE constraint settles the race.
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    CredentialError::DuplicateUsername {
                        username: username.to_string(),
                    }
                }
                _ => CredentialError::Database(e.to_string()),
            })?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            password_hash,
        })
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<User, CredentialError> {
        let row = sqlx::query("SELECT id, username, password_hash FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Err(CredentialError::InvalidCredentials);
        };

        let password_hash: String = row.get("password_hash");
        if !password::verify_password(password, &password_hash)? {
            return Err(CredentialError::InvalidCredentials);
        }

        Ok(User {
            id: row.get("id"),
            username: row.get("username"),
            password_hash,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
