use super::bootcamps::require_bootcamp;
use super::shared::{
    fetch, insert_returning, item_response, item_value_response, list_response, merged, owner_of,
    revalidate, sanitize_patch,
};
use super::{AppState, RawParams, SafeJson};
use crate::auth::{authorize, require_ownership, AuthUser, Role};
use crate::errors::ApiError;
use crate::models::{to_document, CourseInput, Validate, BOOTCAMPS, COURSES};
use crate::query::{advanced_results, document_to_json, populate_document, PopulateSpec};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

fn bootcamp_populate() -> PopulateSpec {
    PopulateSpec::new("bootcamp", BOOTCAMPS).select(&["name", "description"])
}

pub async fn list(State(state): State<AppState>, params: RawParams) -> Result<Json<Value>, ApiError> {
    let spec = params.spec();
    let results = advanced_results(&state.store, COURSES, &spec, Some(&bootcamp_populate()));
    Ok(list_response(&results))
}

/// `GET /api/v1/bootcamps/:id/courses` — same pipeline, scoped to one
/// bootcamp.
pub async fn list_for_bootcamp(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<String>,
    params: RawParams,
) -> Result<Json<Value>, ApiError> {
    let (id, _) = require_bootcamp(&state, &bootcamp_id)?;
    let spec = params.spec().and_eq("bootcamp", id.to_string());
    let results = advanced_results(&state.store, COURSES, &spec, Some(&bootcamp_populate()));
    Ok(list_response(&results))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let (_, mut doc) = fetch(&state.store.collection(COURSES), "course", &id)?;
    populate_document(&state.store, &mut doc, &bootcamp_populate());
    Ok(item_value_response(document_to_json(&doc, true)))
}

/// `POST /api/v1/bootcamps/:id/courses` — adding a course requires owning
/// the bootcamp (or being admin).
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(bootcamp_id): Path<String>,
    SafeJson(input): SafeJson<CourseInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Publisher, Role::Admin])?;
    let (id, bootcamp) = require_bootcamp(&state, &bootcamp_id)?;
    require_ownership(&user, owner_of(&bootcamp), "bootcamp")?;
    input.validate()?;

    let mut data = to_document(&input)?;
    data.insert("bootcamp", id.to_string());
    data.insert("user", user.id.to_string());
    let doc = insert_returning(&state.store.collection(COURSES), data);
    Ok((StatusCode::CREATED, item_response(&doc)))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    SafeJson(patch): SafeJson<Value>,
) -> Result<Json<Value>, ApiError> {
    let col = state.store.collection(COURSES);
    let (id, doc) = fetch(&col, "course", &id)?;
    require_ownership(&user, owner_of(&doc), "course")?;

    let patch = sanitize_patch(patch, &["bootcamp"])?;
    revalidate::<CourseInput>(&merged(&doc, &patch))?;
    let updated = col.update(&id, patch).ok_or_else(|| ApiError::not_found("course", id))?;
    Ok(item_response(&updated))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let col = state.store.collection(COURSES);
    let (id, doc) = fetch(&col, "course", &id)?;
    require_ownership(&user, owner_of(&doc), "course")?;

    let removed = col.delete(&id).ok_or_else(|| ApiError::not_found("course", id))?;
    Ok(item_response(&removed))
}
