use super::shared::{
    fetch, insert_returning, item_response, list_response, merged, owner_of, revalidate,
    sanitize_patch,
};
use super::{AppState, RawParams, SafeJson};
use crate::auth::{authorize, require_ownership, AuthUser, Role};
use crate::errors::ApiError;
use crate::geo::{point_from_document, within_radius, EARTH_RADIUS_MILES};
use crate::models::{to_document, BootcampInput, Validate, BOOTCAMPS, COURSES, REVIEWS};
use crate::query::{document_to_json, find_docs, Filter, FindOptions};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

pub async fn list(State(state): State<AppState>, params: RawParams) -> Result<Json<Value>, ApiError> {
    let spec = params.spec();
    let results = crate::query::advanced_results(&state.store, BOOTCAMPS, &spec, None);
    Ok(list_response(&results))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let (_, doc) = fetch(&state.store.collection(BOOTCAMPS), "bootcamp", &id)?;
    Ok(item_response(&doc))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    SafeJson(input): SafeJson<BootcampInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&user, &[Role::Publisher, Role::Admin])?;
    input.validate()?;

    let mut data = to_document(&input)?;
    data.insert("user", user.id.to_string());
    let doc = insert_returning(&state.store.collection(BOOTCAMPS), data);
    Ok((StatusCode::CREATED, item_response(&doc)))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    SafeJson(patch): SafeJson<Value>,
) -> Result<Json<Value>, ApiError> {
    let col = state.store.collection(BOOTCAMPS);
    let (id, doc) = fetch(&col, "bootcamp", &id)?;
    require_ownership(&user, owner_of(&doc), "bootcamp")?;

    let patch = sanitize_patch(patch, &["photo"])?;
    revalidate::<BootcampInput>(&merged(&doc, &patch))?;
    let updated =
        col.update(&id, patch).ok_or_else(|| ApiError::not_found("bootcamp", id))?;
    Ok(item_response(&updated))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let col = state.store.collection(BOOTCAMPS);
    let (id, doc) = fetch(&col, "bootcamp", &id)?;
    require_ownership(&user, owner_of(&doc), "bootcamp")?;

    let removed = col.delete(&id).ok_or_else(|| ApiError::not_found("bootcamp", id))?;
    cascade_delete(&state, &id.to_string());
    Ok(item_response(&removed))
}

/// Courses and reviews reference their bootcamp by id; deleting the parent
/// removes them too rather than leaving dangling references.
fn cascade_delete(state: &AppState, bootcamp_id: &str) {
    for name in [COURSES, REVIEWS] {
        let col = state.store.collection(name);
        let orphaned: Vec<_> = col
            .list()
            .into_iter()
            .filter(|d| d.data.get_str("bootcamp").is_ok_and(|v| v == bootcamp_id))
            .map(|d| d.id)
            .collect();
        for id in orphaned {
            col.delete(&id);
        }
    }
}

/// `GET /api/v1/bootcamps/radius/:zipcode/:distance` — spherical-cap
/// search: the postal code resolves to a center (re-resolved on every
/// call), and the angular radius is distance over Earth's radius in miles.
pub async fn in_radius(
    State(state): State<AppState>,
    Path((zipcode, distance)): Path<(String, f64)>,
) -> Result<Json<Value>, ApiError> {
    if !distance.is_finite() || distance < 0.0 {
        return Err(ApiError::BadRequest("distance must be a non-negative number".to_string()));
    }
    let center = state
        .geocoder
        .resolve(&zipcode)
        .map_err(|e| ApiError::ExternalService(e.to_string()))?;
    let radius = distance / EARTH_RADIUS_MILES;

    let col = state.store.collection(BOOTCAMPS);
    let items: Vec<Value> = find_docs(&col, &Filter::True, &FindOptions::default())
        .into_iter()
        .filter(|d| {
            point_from_document(&d.data).is_some_and(|p| within_radius(p, center, radius))
        })
        .map(|d| document_to_json(&d, true))
        .collect();

    Ok(Json(json!({ "success": true, "count": items.len(), "items": items })))
}

/// `PUT /api/v1/bootcamps/:id/photo` — multipart upload of a single
/// `file` field; the stored file name is written back onto the bootcamp.
pub async fn upload_photo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let col = state.store.collection(BOOTCAMPS);
    let (id, doc) = fetch(&col, "bootcamp", &id)?;
    require_ownership(&user, owner_of(&doc), "bootcamp")?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("invalid upload: {e}")))?;
        let file_name = crate::upload::save_photo(
            &state.config.upload_dir,
            id,
            content_type.as_deref(),
            &bytes,
            state.config.max_file_upload,
        )
        .await?;

        let updated = col
            .update(&id, bson::doc! {"photo": &file_name})
            .ok_or_else(|| ApiError::not_found("bootcamp", id))?;
        return Ok(item_response(&updated));
    }
    Err(ApiError::BadRequest("please upload a file".to_string()))
}

/// Bootcamp fetched for the nested course/review routes; 404s before any
/// child work happens.
pub(super) fn require_bootcamp(
    state: &AppState,
    raw_id: &str,
) -> Result<(crate::types::DocumentId, crate::document::Document), ApiError> {
    fetch(&state.store.collection(BOOTCAMPS), "bootcamp", raw_id)
}
