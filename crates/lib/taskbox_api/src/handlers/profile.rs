//! Profile request handlers — the caller's own account.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{MessageResponse, ProfileResponse, UpdateProfileRequest};
use crate::services::auth::{is_valid_email, validate_password};
use taskbox_core::auth::password;
use taskbox_core::auth::queries::{self, UserUpdate};
use taskbox_core::models::auth::Role;

/// `GET /profile` — fetch the caller's account (password hash excluded).
pub async fn get_profile_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<ProfileResponse>> {
    let user_id = user.user_id()?;

    let profile = queries::get_user_by_id(&state.pool, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found.".into()))?;

    Ok(Json(ProfileResponse {
        message: "Profile retrieved successfully.".into(),
        user: profile.into(),
    }))
}

/// `PUT /profile` — partial update: only fields present in the body change.
///
/// A new password is re-hashed before storage; username/email uniqueness is
/// enforced by the store's constraints and surfaces as a conflict.
pub async fn update_profile_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<ProfileResponse>> {
    if let Some(username) = &body.username
        && username.trim().is_empty()
    {
        return Err(AppError::Validation("Username must not be empty.".into()));
    }
    if let Some(email) = &body.email
        && !is_valid_email(email)
    {
        return Err(AppError::Validation("Email address is not valid.".into()));
    }

    let password_hash = match body.password.as_deref() {
        None => None,
        Some(raw) => {
            validate_password(raw)?;
            Some(password::hash_password(raw)?)
        }
    };

    let role = match body.role.as_deref() {
        None => None,
        Some(tag) => Some(
            Role::parse(tag)
                .ok_or_else(|| AppError::Validation("Role must be one of USER, ADMIN.".into()))?,
        ),
    };

    let update = UserUpdate {
        username: body.username,
        email: body.email,
        password_hash,
        role,
    };

    if update.is_empty() {
        return Err(AppError::Validation(
            "No valid fields provided to update.".into(),
        ));
    }

    let user_id = user.user_id()?;
    let updated = queries::update_user(&state.pool, &user_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully.".into(),
        user: updated.into(),
    }))
}

/// `DELETE /profile` — delete the caller's account and (by cascade) its tasks.
pub async fn delete_profile_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<MessageResponse>> {
    let user_id = user.user_id()?;

    let deleted = queries::delete_user(&state.pool, &user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("User not found.".into()));
    }

    Ok(Json(MessageResponse {
        message: "User deleted successfully.".into(),
    }))
}
