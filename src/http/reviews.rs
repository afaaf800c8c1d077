use super::bootcamps::require_bootcamp;
use super::shared::{
    fetch, insert_returning, item_response, item_value_response, list_response, merged, owner_of,
    revalidate, sanitize_patch,
};
use super::{AppState, RawParams, SafeJson};
use crate::auth::{authorize, require_ownership, AuthUser, Role};
use crate::errors::ApiError;
use crate::models::{to_document, ReviewInput, Validate, BOOTCAMPS, REVIEWS};
use crate::query::{
    advanced_results, count_docs, document_to_json, populate_document, Filter, PopulateSpec,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

fn bootcamp_populate() -> PopulateSpec {
    PopulateSpec::new("bootcamp", BOOTCAMPS).select(&["name", "description"])
}

pub async fn list(State(state): State<AppState>, params: RawParams) -> Result<Json<Value>, ApiError> {
    let spec = params.spec();
    let results = advanced_results(&state.store, REVIEWS, &spec, Some(&bootcamp_populate()));
    Ok(list_response(&results))
}

pub async fn list_for_bootcamp(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<String>,
    params: RawParams,
) -> Result<Json<Value>, ApiError> {
    let (id, _) = require_bootcamp(&state, &bootcamp_id)?;
    let spec = params.spec().and_eq("bootcamp", id.to_string());
    let results = advanced_results(&state.store, REVIEWS, &spec, Some(&bootcamp_populate()));
    Ok(list_response(&results))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let (_, mut doc) = fetch(&state.store.collection(REVIEWS), "review", &id)?;
    populate_document(&state.store, &mut doc, &bootcamp_populate());
    Ok(item_value_response(document_to_json(&doc, true)))
}

/// `POST /api/v1/bootcamps/:id/reviews` — one review per user per
/// bootcamp; a second attempt is a duplicate-key error.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(bootcamp_id): Path<String>,
    SafeJson(input): SafeJson<ReviewInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::User])?;
    let (id, _) = require_bootcamp(&state, &bootcamp_id)?;
    input.validate()?;

    let col = state.store.collection(REVIEWS);
    let existing = count_docs(
        &col,
        &Filter::all(vec![
            Filter::eq("bootcamp", id.to_string()),
            Filter::eq("user", user.id.to_string()),
        ]),
    );
    if existing > 0 {
        return Err(ApiError::DuplicateKey("review for this bootcamp".to_string()));
    }

    let mut data = to_document(&input)?;
    data.insert("bootcamp", id.to_string());
    data.insert("user", user.id.to_string());
    let doc = insert_returning(&col, data);
    Ok((StatusCode::CREATED, item_response(&doc)))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    SafeJson(patch): SafeJson<Value>,
) -> Result<Json<Value>, ApiError> {
    authorize(&user, &[Role::User, Role::Admin])?;
    let col = state.store.collection(REVIEWS);
    let (id, doc) = fetch(&col, "review", &id)?;
    require_ownership(&user, owner_of(&doc), "review")?;

    let patch = sanitize_patch(patch, &["bootcamp"])?;
    revalidate::<ReviewInput>(&merged(&doc, &patch))?;
    let updated = col.update(&id, patch).ok_or_else(|| ApiError::not_found("review", id))?;
    Ok(item_response(&updated))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    authorize(&user, &[Role::User, Role::Admin])?;
    let col = state.store.collection(REVIEWS);
    let (id, doc) = fetch(&col, "review", &id)?;
    require_ownership(&user, owner_of(&doc), "review")?;

    let removed = col.delete(&id).ok_or_else(|| ApiError::not_found("review", id))?;
    Ok(item_response(&removed))
}
