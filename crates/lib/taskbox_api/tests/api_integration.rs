//! Integration test — start ephemeral PG, run migrations, drive the full
//! signup → login → tasks → admin flow through the router.
//!
//! Skips cleanly when PostgreSQL binaries are not on PATH.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use taskbox_api::config::ApiConfig;
use taskbox_api::{AppState, router};
use taskbox_core::db::EphemeralPostgres;

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON body")
    };
    (status, json)
}

async fn signup_and_login(app: &Router, username: &str, email: &str, role: Option<&str>) -> String {
    let mut signup = json!({"username": username, "email": email, "password": "s3cret1"});
    if let Some(role) = role {
        signup["role"] = json!(role);
    }
    let (status, _) = call(app, "POST", "/signup", None, Some(signup)).await;
    assert_eq!(status, StatusCode::CREATED, "signup for {username}");

    let (status, body) = call(
        app,
        "POST",
        "/login",
        None,
        Some(json!({"username": username, "password": "s3cret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login for {username}");
    body["token"].as_str().expect("token in body").to_string()
}

#[tokio::test]
async fn full_api_flow() {
    if !EphemeralPostgres::available().await {
        eprintln!("skipping: pg_config not found on PATH");
        return;
    }

    // initdb refuses to run in some environments (e.g. as root); skip there too.
    let mut pg = match EphemeralPostgres::start().await {
        Ok(pg) => pg,
        Err(e) => {
            eprintln!("skipping: could not start ephemeral PostgreSQL: {e}");
            return;
        }
    };
    let pool = sqlx::PgPool::connect(&pg.connection_url())
        .await
        .expect("connect");
    taskbox_api::migrate(&pool).await.expect("migrate");

    let state = AppState::new(
        pool,
        ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            database_url: pg.connection_url(),
            jwt_secret: "test-secret".into(),
            token_ttl_secs: 3600,
        },
    );
    let app = router(state);

    // Health route reports a reachable database.
    let (status, body) = call(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["db_connected"], true);

    // --- Registration -----------------------------------------------------

    let (status, body) = call(
        &app,
        "POST",
        "/signup",
        None,
        Some(json!({"username": "alice", "email": "a@x.com", "password": "s3cret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["role"], "USER");
    assert!(body["user"].get("password_hash").is_none());

    // Reusing the username (fresh email) conflicts.
    let (status, body) = call(
        &app,
        "POST",
        "/signup",
        None,
        Some(json!({"username": "alice", "email": "other@x.com", "password": "s3cret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conflict");

    // Reusing the email (fresh username) conflicts too.
    let (status, _) = call(
        &app,
        "POST",
        "/signup",
        None,
        Some(json!({"username": "alice2", "email": "a@x.com", "password": "s3cret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // An unrecognized role tag falls back to USER instead of failing.
    let (status, body) = call(
        &app,
        "POST",
        "/signup",
        None,
        Some(json!({"username": "carol", "email": "c@x.com", "password": "s3cret1", "role": "WIZARD"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "USER");

    // --- Login ------------------------------------------------------------

    let (status, body) = call(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"username": "alice", "password": "s3cret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let alice_token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["token_type"], "Bearer");

    // Wrong password and unknown user collapse to the same rejection.
    let (status, body) = call(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"username": "alice", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let wrong_password_message = body["message"].clone();

    let (status, body) = call(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"username": "nobody", "password": "s3cret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], wrong_password_message);

    // --- Profile ----------------------------------------------------------

    let (status, body) = call(&app, "GET", "/profile", Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("password").is_none());

    // --- Tasks ------------------------------------------------------------

    // Empty listing reports 404.
    let (status, _) = call(&app, "GET", "/tasks", Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        "POST",
        "/tasks",
        Some(&alice_token),
        Some(json!({"title": "Write report", "description": "Quarterly numbers", "priority": "HIGH"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let task = body["task"].clone();
    let task_id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["priority"], "HIGH");
    assert_eq!(task["status"], "TODO"); // default

    let (status, body) = call(&app, "GET", "/tasks", Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks"].as_array().unwrap().len(), 1);

    // --- Cross-tenant isolation --------------------------------------------

    let bob_token = signup_and_login(&app, "bob", "b@x.com", None).await;

    // Bob sees alice's task as missing, never as forbidden.
    let (status, body) = call(
        &app,
        "GET",
        &format!("/tasks/{task_id}"),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = call(
        &app,
        "PUT",
        &format!("/tasks/{task_id}"),
        Some(&bob_token),
        Some(json!({"status": "DONE"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        "DELETE",
        &format!("/tasks/{task_id}"),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Alice's task is untouched by all of that.
    let (status, _) = call(
        &app,
        "GET",
        &format!("/tasks/{task_id}"),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // --- Partial update ----------------------------------------------------

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/tasks/{task_id}"),
        Some(&alice_token),
        Some(json!({"status": "IN_PROGRESS"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = body["task"].clone();
    assert_eq!(updated["status"], "IN_PROGRESS");
    // Untouched fields come back byte-for-byte.
    assert_eq!(updated["title"], task["title"]);
    assert_eq!(updated["description"], task["description"]);
    assert_eq!(updated["priority"], task["priority"]);
    assert_eq!(updated["created_at"], task["created_at"]);

    // --- Admin listing -----------------------------------------------------

    let (status, _) = call(&app, "GET", "/users", Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = signup_and_login(&app, "root", "root@x.com", Some("ADMIN")).await;
    let (status, body) = call(&app, "GET", "/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_array().unwrap();
    assert!(users.len() >= 4);
    for user in users {
        assert!(user.get("password_hash").is_none());
        assert!(user.get("password").is_none());
    }

    // --- Deletion ----------------------------------------------------------

    let (status, _) = call(
        &app,
        "DELETE",
        &format!("/tasks/{task_id}"),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        "DELETE",
        &format!("/tasks/{task_id}"),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Profile update, then account deletion.
    let (status, body) = call(
        &app,
        "PUT",
        "/profile",
        Some(&bob_token),
        Some(json!({"email": "bob@rename.org"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "bob@rename.org");
    assert_eq!(body["user"]["username"], "bob");

    let (status, _) = call(&app, "DELETE", "/profile", Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);

    // The deleted account's token still verifies until expiry; the routes
    // behind it now report the missing row.
    let (status, _) = call(&app, "GET", "/profile", Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    pg.stop().await.expect("stop postgres");
}
