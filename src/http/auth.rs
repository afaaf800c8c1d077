use super::shared::{insert_returning, item_value_response};
use super::users::{email_taken, user_to_json};
use super::{AppState, SafeJson};
use crate::auth::{hash_password, verify_password, AuthUser, Role};
use crate::errors::ApiError;
use crate::models::{
    LoginInput, RegisterInput, UpdateDetailsInput, UpdatePasswordInput, Validate, USERS,
};
use crate::query::{find_docs, Filter, FindOptions};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

fn token_response(token: String) -> Json<Value> {
    Json(json!({ "success": true, "token": token }))
}

/// `POST /api/v1/auth/register` — self-registration as user or publisher;
/// admins come from seed data or the admin CRUD.
pub async fn register(
    State(state): State<AppState>,
    SafeJson(input): SafeJson<RegisterInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    input.validate()?;
    if email_taken(&state, &input.email) {
        return Err(ApiError::DuplicateKey("email".to_string()));
    }

    let role = input.role.unwrap_or(Role::User);
    let data = bson::doc! {
        "name": &input.name,
        "email": &input.email,
        "role": role.as_str(),
        "password_hash": hash_password(&input.password)?,
    };
    let doc = insert_returning(&state.store.collection(USERS), data);
    let token = state.sessions.issue(doc.id);
    Ok((StatusCode::CREATED, token_response(token)))
}

pub async fn login(
    State(state): State<AppState>,
    SafeJson(input): SafeJson<LoginInput>,
) -> Result<Json<Value>, ApiError> {
    let col = state.store.collection(USERS);
    let mut found = find_docs(&col, &Filter::eq("email", input.email.as_str()), &FindOptions::default());
    let Some(doc) = found.pop() else {
        return Err(ApiError::Unauthorized);
    };
    let hash = doc.data.get_str("password_hash").unwrap_or_default();
    if !verify_password(&input.password, hash) {
        return Err(ApiError::Unauthorized);
    }
    Ok(token_response(state.sessions.issue(doc.id)))
}

pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<Value>, ApiError> {
    let doc = state
        .store
        .collection(USERS)
        .get(&user.id)
        .ok_or(ApiError::Unauthorized)?;
    Ok(item_value_response(user_to_json(&doc)))
}

pub async fn update_details(
    State(state): State<AppState>,
    user: AuthUser,
    SafeJson(input): SafeJson<UpdateDetailsInput>,
) -> Result<Json<Value>, ApiError> {
    input.validate()?;

    let mut patch = bson::Document::new();
    if let Some(name) = input.name {
        patch.insert("name", name);
    }
    if let Some(email) = input.email {
        if email != user.email && email_taken(&state, &email) {
            return Err(ApiError::DuplicateKey("email".to_string()));
        }
        patch.insert("email", email);
    }

    let col = state.store.collection(USERS);
    let updated = col
        .update(&user.id, patch)
        .ok_or_else(|| ApiError::not_found("user", user.id))?;
    Ok(item_value_response(user_to_json(&updated)))
}

/// `PUT /api/v1/auth/updatepassword` — verifies the current password, then
/// rehashes and issues a fresh token.
pub async fn update_password(
    State(state): State<AppState>,
    user: AuthUser,
    SafeJson(input): SafeJson<UpdatePasswordInput>,
) -> Result<Json<Value>, ApiError> {
    input.validate()?;

    let col = state.store.collection(USERS);
    let doc = col.get(&user.id).ok_or(ApiError::Unauthorized)?;
    let hash = doc.data.get_str("password_hash").unwrap_or_default();
    if !verify_password(&input.current_password, hash) {
        return Err(ApiError::Unauthorized);
    }

    let patch = bson::doc! { "password_hash": hash_password(&input.new_password)? };
    col.update(&user.id, patch).ok_or_else(|| ApiError::not_found("user", user.id))?;
    Ok(token_response(state.sessions.issue(user.id)))
}
