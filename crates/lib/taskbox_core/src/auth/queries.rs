//! User database queries.
//!
//! Every mutation is a single-row statement; the UNIQUE constraints on
//! `username` and `email` are the authoritative source of conflict errors,
//! surfaced as `sqlx` unique-violations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{Role, User, UserWithPassword};

/// Row shape shared by all user queries.
#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at";

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            // Rows only ever hold recognized tags.
            role: Role::from_tag(Some(&row.role)),
            created_at: row.created_at,
        }
    }
}

impl From<UserRow> for UserWithPassword {
    fn from(row: UserRow) -> Self {
        let password_hash = row.password_hash.clone();
        UserWithPassword {
            user: row.into(),
            password_hash,
        }
    }
}

/// Fetch a user by username, including the password hash.
pub async fn find_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserWithPassword>, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1",
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Into::into))
}

/// Check whether a username or email is already registered.
///
/// A match on either field blocks registration; used for a friendly
/// pre-check before the INSERT (the constraints remain authoritative).
pub async fn user_exists(pool: &PgPool, username: &str, email: &str) -> Result<bool, AuthError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
    )
    .bind(username)
    .bind(email)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Create a new user, returning the stored record.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<User, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (username, email, password_hash, role) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {USER_COLUMNS}",
    ))
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}

/// Fetch a user by ID, without the password hash.
pub async fn get_user_by_id(pool: &PgPool, user_id: &Uuid) -> Result<Option<User>, AuthError> {
    let row =
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(Into::into))
}

/// List all users, newest first.
pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, AuthError> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC",
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Field subset for a partial profile update. Absent fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl UserUpdate {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
    }
}

/// Apply a partial update to a user, returning the updated record.
///
/// Only fields present in `update` appear in the SET clause. With no fields
/// set this degenerates to a plain fetch; callers reject empty updates
/// before reaching storage.
pub async fn update_user(
    pool: &PgPool,
    user_id: &Uuid,
    update: &UserUpdate,
) -> Result<Option<User>, AuthError> {
    if update.is_empty() {
        return get_user_by_id(pool, user_id).await;
    }

    let mut sets = Vec::new();
    let mut binds: Vec<&str> = Vec::new();

    if let Some(username) = &update.username {
        binds.push(username);
        sets.push(format!("username = ${}", binds.len()));
    }
    if let Some(email) = &update.email {
        binds.push(email);
        sets.push(format!("email = ${}", binds.len()));
    }
    if let Some(hash) = &update.password_hash {
        binds.push(hash);
        sets.push(format!("password_hash = ${}", binds.len()));
    }
    if let Some(role) = &update.role {
        binds.push(role.as_str());
        sets.push(format!("role = ${}", binds.len()));
    }

    let query = format!(
        "UPDATE users SET {} WHERE id = ${} RETURNING {USER_COLUMNS}",
        sets.join(", "),
        binds.len() + 1,
    );

    let mut q = sqlx::query_as::<_, UserRow>(&query);
    for bind in binds {
        q = q.bind(bind);
    }
    let row = q.bind(user_id).fetch_optional(pool).await?;
    Ok(row.map(Into::into))
}

/// Delete a user account. Owned tasks are removed by the FK cascade.
pub async fn delete_user(pool: &PgPool, user_id: &Uuid) -> Result<bool, AuthError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
