//! Authentication middleware — Bearer token extraction and JWT verification.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use taskbox_core::models::auth::TokenClaims;

/// Key used to store the verified `TokenClaims` in request extensions.
///
/// Handlers take identity and role from this value only, never from the
/// request body or query string.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub TokenClaims);

impl AuthenticatedUser {
    /// The caller's user ID, parsed from the token subject.
    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token subject.".into()))
    }
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies the
/// JWT, and injects `AuthenticatedUser` into request extensions.
///
/// Evaluated fresh per request; there is no session store and no revocation,
/// so a token stays valid until its embedded expiry.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authorization token required.".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme.".into()))?;

    let claims = state
        .codec
        .verify(token)
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token.".into()))?;

    request.extensions_mut().insert(AuthenticatedUser(claims));

    Ok(next.run(request).await)
}
