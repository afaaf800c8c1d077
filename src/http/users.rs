use super::shared::{fetch, insert_returning, item_value_response, list_response, sanitize_patch};
use super::{AppState, RawParams, SafeJson};
use crate::auth::{authorize, hash_password, AuthUser, Role};
use crate::document::Document;
use crate::errors::{ApiError, ValidationErrors};
use crate::models::{looks_like_email, UserInput, Validate, USERS};
use crate::query::{count_docs, document_to_json, Filter};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

/// Admin-only user management (`/api/v1/users`).
fn require_admin(user: &AuthUser) -> Result<(), ApiError> {
    authorize(user, &[Role::Admin])
}

/// User documents never leave with their password hash attached.
pub(super) fn user_to_json(doc: &Document) -> Value {
    let mut value = document_to_json(doc, true);
    if let Value::Object(obj) = &mut value {
        obj.remove("password_hash");
    }
    value
}

pub(super) fn email_taken(state: &AppState, email: &str) -> bool {
    count_docs(&state.store.collection(USERS), &Filter::eq("email", email)) > 0
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    params: RawParams,
) -> Result<Json<Value>, ApiError> {
    require_admin(&user)?;
    let spec = params.spec();
    let mut results = crate::query::advanced_results(&state.store, USERS, &spec, None);
    for item in &mut results.items {
        if let Value::Object(obj) = item {
            obj.remove("password_hash");
        }
    }
    Ok(list_response(&results))
}

pub async fn get_one(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&user)?;
    let (_, doc) = fetch(&state.store.collection(USERS), "user", &id)?;
    Ok(item_value_response(user_to_json(&doc)))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    SafeJson(input): SafeJson<UserInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_admin(&user)?;
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
    Ok((StatusCode::CREATED, item_value_response(user_to_json(&doc))))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    SafeJson(patch): SafeJson<Value>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&user)?;
    let col = state.store.collection(USERS);
    let (id, doc) = fetch(&col, "user", &id)?;

    let mut patch = sanitize_patch(patch, &[])?;

    // A clear-text password in the patch becomes a fresh hash.
    if let Ok(password) = patch.get_str("password").map(str::to_string) {
        patch.remove("password");
        patch.insert("password_hash", hash_password(&password)?);
    }

    let mut errors = ValidationErrors::new();
    if let Ok(name) = patch.get_str("name") {
        if name.trim().is_empty() {
            errors.push("name", "can not be empty");
        }
    }
    if let Ok(role) = patch.get_str("role") {
        if Role::parse(role).is_none() {
            errors.push("role", "must be user, publisher, or admin");
        }
    }
    if let Ok(email) = patch.get_str("email") {
        if !looks_like_email(email) {
            errors.push("email", "must be a valid email");
        } else if email != doc.data.get_str("email").unwrap_or_default()
            && email_taken(&state, email)
        {
            return Err(ApiError::DuplicateKey("email".to_string()));
        }
    }
    errors.into_result()?;

    let updated = col.update(&id, patch).ok_or_else(|| ApiError::not_found("user", id))?;
    Ok(item_value_response(user_to_json(&updated)))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&user)?;
    let col = state.store.collection(USERS);
    let (id, _) = fetch(&col, "user", &id)?;
    let removed = col.delete(&id).ok_or_else(|| ApiError::not_found("user", id))?;
    Ok(item_value_response(user_to_json(&removed)))
}
