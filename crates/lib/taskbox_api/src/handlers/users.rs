//! Admin request handlers.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::UserListResponse;
use taskbox_core::auth::queries;
use taskbox_core::models::auth::Role;

/// `GET /users` — list all registered users. Admin only.
///
/// The role comparison uses the claims from the verified token, never a
/// fresh read of the caller's row.
pub async fn list_users_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<UserListResponse>> {
    if user.0.role != Role::Admin {
        return Err(AppError::Forbidden("Access denied.".into()));
    }

    let users = queries::list_users(&state.pool).await?;

    Ok(Json(UserListResponse {
        message: "Users retrieved successfully.".into(),
        users: users.into_iter().map(Into::into).collect(),
    }))
}
