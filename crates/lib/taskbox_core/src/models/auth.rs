//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! types (which live in `taskbox_api::models`).

use serde::{Deserialize, Serialize};

/// Account role — matches the `role` column on `users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Default, lowest-privilege role.
    #[serde(rename = "USER")]
    User,
    /// May list all registered users.
    #[serde(rename = "ADMIN")]
    Admin,
}

impl Role {
    /// Database text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// Strict parse: `None` for anything outside the recognized set.
    pub fn parse(tag: &str) -> Option<Role> {
        match tag {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Lenient parse used at registration: missing or unrecognized tags
    /// fall back to the lowest-privilege role.
    pub fn from_tag(tag: Option<&str>) -> Role {
        tag.and_then(Role::parse).unwrap_or(Role::User)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain user, without the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: uuid::Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// User with password hash (for internal auth flows; never serialized).
#[derive(Debug, Clone)]
pub struct UserWithPassword {
    pub user: User,
    pub password_hash: String,
}

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — user ID (standard JWT `sub` claim).
    pub sub: String,
    /// Display name, for convenience in clients.
    pub username: String,
    /// Account role. Authorization decisions compare this value only;
    /// it is never re-fetched from storage for a verified token.
    pub role: Role,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}
