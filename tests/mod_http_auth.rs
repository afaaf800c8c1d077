//! Registration, login, and self-service account routes.

mod common;

use axum::http::{Method, StatusCode};
use common::{app, assert_error_envelope, send, test_state};
use serde_json::json;

#[tokio::test]
async fn register_login_me_round_trip() {
    let state = test_state();
    let register = json!({
        "name": "John Doe",
        "email": "john@example.com",
        "password": "hunter22",
    });

    let (status, body) =
        send(app(&state), Method::POST, "/api/v1/auth/register", None, Some(register.clone()))
            .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) =
        send(app(&state), Method::GET, "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["email"], "john@example.com");
    assert_eq!(body["item"]["role"], "user");
    assert!(body["item"].get("password_hash").is_none());

    // Same email again is a duplicate.
    let (status, body) =
        send(app(&state), Method::POST, "/api/v1/auth/register", None, Some(register)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_envelope(&body);

    // Fresh login issues a working token.
    let login = json!({"email": "john@example.com", "password": "hunter22"});
    let (status, body) =
        send(app(&state), Method::POST, "/api/v1/auth/login", None, Some(login)).await;
    assert_eq!(status, StatusCode::OK);
    let token2 = body["token"].as_str().unwrap().to_string();
    let (status, _) = send(app(&state), Method::GET, "/api/v1/auth/me", Some(&token2), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn bad_credentials_and_roles_are_rejected() {
    let state = test_state();
    let (status, _) = send(
        app(&state),
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"name": "Eve", "email": "eve@example.com", "password": "hunter22", "role": "admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app(&state),
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"name": "Eve", "email": "eve@example.com", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app(&state),
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "eve@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_envelope(&body);

    let (status, _) = send(
        app(&state),
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "nobody@example.com", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Garbage token.
    let (status, _) =
        send(app(&state), Method::GET, "/api/v1/auth/me", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_details_checks_email_uniqueness() {
    let state = test_state();
    for email in ["a@example.com", "b@example.com"] {
        let (status, _) = send(
            app(&state),
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({"name": "X", "email": email, "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let login = json!({"email": "a@example.com", "password": "hunter22"});
    let (_, body) = send(app(&state), Method::POST, "/api/v1/auth/login", None, Some(login)).await;
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(
        app(&state),
        Method::PUT,
        "/api/v1/auth/updatedetails",
        Some(&token),
        Some(json!({"name": "Renamed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["name"], "Renamed");

    let (status, _) = send(
        app(&state),
        Method::PUT,
        "/api/v1/auth/updatedetails",
        Some(&token),
        Some(json!({"email": "b@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_password_requires_the_current_one() {
    let state = test_state();
    let (status, body) = send(
        app(&state),
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"name": "X", "email": "x@example.com", "password": "original1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = send(
        app(&state),
        Method::PUT,
        "/api/v1/auth/updatepassword",
        Some(&token),
        Some(json!({"current_password": "wrong", "new_password": "replaced1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        app(&state),
        Method::PUT,
        "/api/v1/auth/updatepassword",
        Some(&token),
        Some(json!({"current_password": "original1", "new_password": "replaced1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    // Old password no longer logs in; the new one does.
    let (status, _) = send(
        app(&state),
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "x@example.com", "password": "original1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(
        app(&state),
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "x@example.com", "password": "replaced1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
