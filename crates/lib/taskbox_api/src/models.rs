//! API request and response types.
//!
//! Requests use `Option` fields throughout so that missing-field and
//! partial-update semantics are decided by the handlers (with a 400 and a
//! readable message) instead of by serde rejections.

use serde::{Deserialize, Serialize};

use taskbox_core::models::auth::{Role, User};
use taskbox_core::tasks::TaskRow;

/// Error body returned by every failing route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo {
            id: user.id.to_string(),
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Public view of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub created_at: String,
}

impl From<TaskRow> for TaskInfo {
    fn from(row: TaskRow) -> Self {
        TaskInfo {
            id: row.id.to_string(),
            user_id: row.user_id.to_string(),
            title: row.title,
            description: row.description,
            priority: row.priority,
            status: row.status,
            created_at: row.created_at.to_rfc3339(),
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: UserInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub message: String,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
}

/// Body for `PUT /tasks/{id}` — any subset of the editable fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: TaskInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskListResponse {
    pub message: String,
    pub tasks: Vec<TaskInfo>,
}

// ---------------------------------------------------------------------------
// Profile & users
// ---------------------------------------------------------------------------

/// Body for `PUT /profile` — any subset of the editable fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListResponse {
    pub message: String,
    pub users: Vec<UserInfo>,
}

/// Plain acknowledgement body (deletes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body returned by the root health route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
    pub db_connected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn user_info_omits_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "a@x.com".into(),
            role: Role::User,
            created_at: Utc::now(),
        };
        let info: UserInfo = user.into();
        let json = serde_json::to_value(&info).unwrap();

        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"], "USER");
    }

    #[test]
    fn update_requests_accept_partial_bodies() {
        let update: UpdateTaskRequest = serde_json::from_str(r#"{"status":"DONE"}"#).unwrap();
        assert_eq!(update.status.as_deref(), Some("DONE"));
        assert!(update.title.is_none());

        let empty: UpdateProfileRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.username.is_none() && empty.role.is_none());
    }
}
