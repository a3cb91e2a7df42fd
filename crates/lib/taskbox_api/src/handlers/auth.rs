//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{LoginRequest, SignupRequest, SignupResponse, TokenResponse};
use crate::services::auth;

/// `POST /signup` — create a new user account.
pub async fn signup_handler(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let (Some(username), Some(email), Some(password)) = (&body.username, &body.email, &body.password)
    else {
        return Err(AppError::Validation("All fields are required.".into()));
    };

    let user = auth::register(&state.pool, username, email, password, body.role.as_deref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully.".into(),
            user: user.into(),
        }),
    ))
}

/// `POST /login` — authenticate with username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let (Some(username), Some(password)) = (&body.username, &body.password) else {
        return Err(AppError::Validation(
            "Username and password are required.".into(),
        ));
    };

    let resp = auth::login(&state.pool, &state.codec, username, password).await?;
    Ok(Json(resp))
}
