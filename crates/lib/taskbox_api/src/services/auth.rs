//! Authentication service — signup/login flows delegating to `taskbox_core::auth`.

use sqlx::PgPool;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::TokenResponse;
use taskbox_core::auth::jwt::TokenCodec;
use taskbox_core::auth::{password, queries};
use taskbox_core::models::auth::{Role, User};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 6;

/// Reject passwords below the minimum length.
pub(crate) fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

/// Shallow email shape check: `local@domain` with a dotted domain.
/// Anything deeper (MX, deliverability) is not this service's business.
pub(crate) fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Register a new user account.
///
/// Uniqueness is checked jointly across username and email: a match on
/// either blocks creation. The check-then-insert pre-check gives a friendly
/// message; the UNIQUE constraints remain the authoritative conflict source
/// (a constraint violation from the INSERT also maps to `Conflict`), so a
/// concurrent duplicate signup cannot slip through.
///
/// The raw password is bcrypt-hashed before storage and discarded; an
/// unrecognized role tag falls back to `USER`.
pub async fn register(
    pool: &PgPool,
    username: &str,
    email: &str,
    password: &str,
    role_tag: Option<&str>,
) -> AppResult<User> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty.".into()));
    }
    if !is_valid_email(email) {
        return Err(AppError::Validation("Email address is not valid.".into()));
    }
    validate_password(password)?;

    if queries::user_exists(pool, username, email).await? {
        return Err(AppError::Conflict(
            "Username or email already exists.".into(),
        ));
    }

    let role = Role::from_tag(role_tag);

    // Hash before any insert: if hashing fails, nothing is persisted.
    let password_hash = password::hash_password(password)?;

    let user = queries::create_user(pool, username, email, &password_hash, role).await?;

    info!(username, role = %user.role, "user registered");
    Ok(user)
}

/// Authenticate with username + password, issuing an access token.
///
/// An unknown username and a wrong password produce the same generic
/// rejection, so callers cannot probe for account existence.
pub async fn login(
    pool: &PgPool,
    codec: &TokenCodec,
    username: &str,
    password: &str,
) -> AppResult<TokenResponse> {
    let record = queries::find_user_by_username(pool, username).await?;

    let record = match record {
        None => return Err(AppError::Unauthorized("Invalid credentials.".into())),
        Some(r) => r,
    };

    if !password::verify_password(password, &record.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials.".into()));
    }

    let user = record.user;
    let token = codec.issue(&user.id.to_string(), &user.username, user.role)?;

    Ok(TokenResponse {
        message: "Login successful.".into(),
        token,
        token_type: "Bearer".into(),
        expires_in: codec.ttl_secs(),
    })
}
