//! Shared harness for the HTTP integration tests: an in-memory app with a
//! canned geocoder, plus request plumbing.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use campdir::auth::{hash_password, Role};
use campdir::config::Config;
use campdir::geo::{GeoPoint, TableGeocoder};
use campdir::http::AppState;
use campdir::models::{BOOTCAMPS, USERS};
use campdir::types::DocumentId;
use campdir::{build_router, Store};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

/// Philadelphia-ish center used by the radius tests.
pub const TEST_ZIP: &str = "19104";
pub const TEST_CENTER: GeoPoint = GeoPoint { longitude: -75.0, latitude: 40.0 };

pub fn test_state() -> AppState {
    test_state_with_config(Config::default())
}

pub fn test_state_with_config(config: Config) -> AppState {
    let mut zips = HashMap::new();
    zips.insert(TEST_ZIP.to_string(), TEST_CENTER);
    AppState::new(Arc::new(Store::new()), Arc::new(TableGeocoder::new(zips)), config)
}

pub fn app(state: &AppState) -> Router {
    build_router(state.clone())
}

/// Inserts a user directly and issues a session token for it.
pub fn login_as(state: &AppState, name: &str, role: Role) -> (DocumentId, String) {
    let id = state.store.collection(USERS).insert(bson::doc! {
        "name": name,
        "email": format!("{name}@example.com"),
        "role": role.as_str(),
        "password_hash": hash_password("hunter22").unwrap(),
    });
    let token = state.sessions.issue(id);
    (id, token)
}

/// Inserts a bootcamp owned by `owner` directly into the store.
pub fn seed_bootcamp(state: &AppState, owner: DocumentId, name: &str, cost: f64) -> DocumentId {
    state.store.collection(BOOTCAMPS).insert(bson::doc! {
        "name": name,
        "description": "training",
        "careers": ["Web Development"],
        "average_cost": cost,
        "user": owner.to_string(),
    })
}

/// Sends one request and returns the status plus the parsed JSON body.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Asserts the uniform error envelope: `{"success": false, "error": ...}`.
pub fn assert_error_envelope(body: &Value) {
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string(), "missing error message: {body}");
}
