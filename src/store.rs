//! Persistent user store.

use crate::error::{ProxyError, ProxyResult};
use crate::models::{NewUser, User};
use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> ProxyResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> ProxyResult<Option<User>>;
    /// All users ordered by id.
    async fn list(&self) -> ProxyResult<Vec<User>>;
    async fn insert(&self, user: NewUser) -> ProxyResult<User>;
    async fn update(&self, user: User) -> ProxyResult<User>;
    /// Returns false when no row matched.
    async fn delete(&self, id: i64) -> ProxyResult<bool>;
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email VARCHAR(180) NOT NULL UNIQUE,
    roles TEXT NOT NULL,
    password TEXT NOT NULL,
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    created_at TEXT NOT NULL
)";

const SELECT_COLUMNS: &str =
    "SELECT id, email, roles, password, first_name, last_name, created_at FROM users";

#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `database_url`.
    pub async fn connect(database_url: &str) -> ProxyResult<Self> {
        let pool = pool_options(database_url).connect(database_url).await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> ProxyResult<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

/// An in-memory database lives only as long as its connection, so memory
/// URLs get exactly one connection that is never reaped.
fn pool_options(database_url: &str) -> SqlitePoolOptions {
    if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}

fn encode_roles(roles: &[String]) -> ProxyResult<String> {
    serde_json::to_string(roles).map_err(|e| ProxyError::Internal(format!("encode roles: {e}")))
}

fn user_from_row(row: &SqliteRow) -> ProxyResult<User> {
    let roles: String = row.try_get("roles")?;
    let assigned_roles = serde_json::from_str(&roles)
        .map_err(|e| ProxyError::Internal(format!("corrupt roles column: {e}")))?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        assigned_roles,
        created_at,
    })
}

/// Unique violations on `email` become a 409; everything else stays a database error.
fn map_write_error(e: sqlx::Error) -> ProxyError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ProxyError::http(StatusCode::CONFLICT, "User already exists")
        }
        _ => ProxyError::Database(e),
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_id(&self, id: i64) -> ProxyResult<Option<User>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> ProxyResult<Option<User>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self) -> ProxyResult<Vec<User>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn insert(&self, user: NewUser) -> ProxyResult<User> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (email, roles, password, first_name, last_name, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.email)
        .bind(encode_roles(&user.roles)?)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        let id = result.last_insert_rowid();
        tracing::info!("Created user id={} email={}", id, user.email);
        Ok(User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            assigned_roles: user.roles,
            created_at,
        })
    }

    async fn update(&self, user: User) -> ProxyResult<User> {
        let result = sqlx::query(
            "UPDATE users SET email = ?, roles = ?, password = ?, first_name = ?, last_name = ?
             WHERE id = ?",
        )
        .bind(&user.email)
        .bind(encode_roles(&user.assigned_roles)?)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(ProxyError::not_found("User not found"));
        }
        tracing::info!("Updated user id={}", user.id);
        Ok(user)
    }

    async fn delete(&self, id: i64) -> ProxyResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!("Deleted user id={}", id);
        }
        Ok(deleted)
    }
}
