//! Admin-only user management routes.

mod common;

use axum::http::{Method, StatusCode};
use campdir::auth::Role;
use common::{app, assert_error_envelope, login_as, send, test_state};
use serde_json::json;

#[tokio::test]
async fn every_route_is_admin_only() {
    let state = test_state();
    let (id, user_token) = login_as(&state, "plain", Role::User);
    let (_, publisher) = login_as(&state, "publisher", Role::Publisher);

    for token in [&user_token, &publisher] {
        let (status, body) =
            send(app(&state), Method::GET, "/api/v1/users", Some(token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_error_envelope(&body);
        let (status, _) = send(
            app(&state),
            Method::GET,
            &format!("/api/v1/users/{id}"),
            Some(token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, _) = send(app(&state), Method::GET, "/api/v1/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_never_exposes_password_hashes() {
    let state = test_state();
    let (_, admin) = login_as(&state, "admin", Role::Admin);
    login_as(&state, "other", Role::User);

    let (status, body) = send(app(&state), Method::GET, "/api/v1/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    for item in body["items"].as_array().unwrap() {
        assert!(item.get("password_hash").is_none(), "hash leaked: {item}");
        assert!(item.get("email").is_some());
    }
}

#[tokio::test]
async fn admin_crud_round_trip() {
    let state = test_state();
    let (_, admin) = login_as(&state, "admin", Role::Admin);

    let (status, body) = send(
        app(&state),
        Method::POST,
        "/api/v1/users",
        Some(&admin),
        Some(json!({
            "name": "Created",
            "email": "created@example.com",
            "password": "hunter22",
            "role": "publisher",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["item"]["role"], "publisher");
    assert!(body["item"].get("password_hash").is_none());
    let id = body["item"]["id"].as_str().unwrap().to_string();

    // Duplicate email.
    let (status, _) = send(
        app(&state),
        Method::POST,
        "/api/v1/users",
        Some(&admin),
        Some(json!({
            "name": "Again",
            "email": "created@example.com",
            "password": "hunter22",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A clear-text password in the patch rehashes and logs in.
    let (status, _) = send(
        app(&state),
        Method::PUT,
        &format!("/api/v1/users/{id}"),
        Some(&admin),
        Some(json!({"password": "rotated1", "name": "Updated"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        app(&state),
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "created@example.com", "password": "rotated1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A malformed email is rejected, same as on registration.
    let (status, body) = send(
        app(&state),
        Method::PUT,
        &format!("/api/v1/users/{id}"),
        Some(&admin),
        Some(json!({"email": "not-an-email"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("email:"));

    // Unknown role value is rejected.
    let (status, _) = send(
        app(&state),
        Method::PUT,
        &format!("/api/v1/users/{id}"),
        Some(&admin),
        Some(json!({"role": "overlord"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app(&state),
        Method::DELETE,
        &format!("/api/v1/users/{id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        app(&state),
        Method::GET,
        &format!("/api/v1/users/{id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
