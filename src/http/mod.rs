//! The HTTP surface: router, shared state, and per-resource handlers.

mod auth;
mod bootcamps;
mod courses;
mod extract;
mod reviews;
mod users;

use crate::auth::Sessions;
use crate::config::Config;
use crate::engine::Store;
use crate::geo::Geocoder;
use axum::routing::{get, post, put};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Collaborator handles shared by every handler; constructed once and
/// passed down instead of living in process globals.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub sessions: Arc<Sessions>,
    pub geocoder: Arc<dyn Geocoder>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<Store>, geocoder: Arc<dyn Geocoder>, config: Config) -> Self {
        Self {
            store,
            sessions: Arc::new(Sessions::new()),
            geocoder,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/bootcamps", get(bootcamps::list).post(bootcamps::create))
        .route(
            "/api/v1/bootcamps/:id",
            get(bootcamps::get_one).put(bootcamps::update).delete(bootcamps::remove),
        )
        .route("/api/v1/bootcamps/radius/:zipcode/:distance", get(bootcamps::in_radius))
        .route("/api/v1/bootcamps/:id/photo", put(bootcamps::upload_photo))
        .route(
            "/api/v1/bootcamps/:id/courses",
            get(courses::list_for_bootcamp).post(courses::create),
        )
        .route(
            "/api/v1/bootcamps/:id/reviews",
            get(reviews::list_for_bootcamp).post(reviews::create),
        )
        .route("/api/v1/courses", get(courses::list))
        .route(
            "/api/v1/courses/:id",
            get(courses::get_one).put(courses::update).delete(courses::remove),
        )
        .route("/api/v1/reviews", get(reviews::list))
        .route(
            "/api/v1/reviews/:id",
            get(reviews::get_one).put(reviews::update).delete(reviews::remove),
        )
        .route("/api/v1/users", get(users::list).post(users::create))
        .route(
            "/api/v1/users/:id",
            get(users::get_one).put(users::update).delete(users::remove),
        )
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/updatedetails", put(auth::update_details))
        .route("/api/v1/auth/updatepassword", put(auth::update_password))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds and runs the API until a shutdown signal arrives.
pub async fn serve(state: AppState) -> Result<(), std::io::Error> {
    let addr = SocketAddr::from((state.config.host, state.config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "campdir listening");
    axum::serve(listener, build_router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => tracing::error!(?err, "failed to listen for shutdown signal"),
    }
}

pub(crate) use extract::{RawParams, SafeJson};

/// Shared glue between handlers: envelope builders, id parsing, patch
/// sanitization.
pub(crate) mod shared {
    use crate::collection::Collection;
    use crate::document::Document;
    use crate::errors::ApiError;
    use crate::models::Validate;
    use crate::query::{document_to_json, AdvancedResults};
    use crate::types::DocumentId;
    use axum::Json;
    use bson::{Bson, Document as BsonDocument};
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};

    /// Fields a client may never write directly.
    const PROTECTED_FIELDS: [&str; 5] = ["id", "user", "created_at", "updated_at", "password_hash"];

    pub fn list_response(results: &AdvancedResults) -> Json<Value> {
        Json(json!({
            "success": true,
            "count": results.items.len(),
            "pagination": results.pagination,
            "items": results.items,
        }))
    }

    pub fn item_response(doc: &Document) -> Json<Value> {
        Json(json!({ "success": true, "item": document_to_json(doc, true) }))
    }

    pub fn item_value_response(item: Value) -> Json<Value> {
        Json(json!({ "success": true, "item": item }))
    }

    /// An unparsable id behaves like a missing resource, matching the 404
    /// contract for malformed identifiers.
    pub fn parse_id(resource: &str, raw: &str) -> Result<DocumentId, ApiError> {
        raw.parse::<DocumentId>().map_err(|_| ApiError::not_found(resource, raw))
    }

    pub fn fetch(
        col: &Collection,
        resource: &str,
        raw_id: &str,
    ) -> Result<(DocumentId, Document), ApiError> {
        let id = parse_id(resource, raw_id)?;
        let doc = col.get(&id).ok_or_else(|| ApiError::not_found(resource, raw_id))?;
        Ok((id, doc))
    }

    /// The owning user id recorded on a document, if any.
    pub fn owner_of(doc: &Document) -> Option<&str> {
        doc.data.get_str("user").ok()
    }

    /// Converts a JSON patch body into a BSON document with protected and
    /// relation fields stripped.
    pub fn sanitize_patch(patch: Value, also_protect: &[&str]) -> Result<BsonDocument, ApiError> {
        let bson = Bson::try_from(patch)
            .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))?;
        let Bson::Document(mut doc) = bson else {
            return Err(ApiError::BadRequest("request body must be a JSON object".to_string()));
        };
        for field in PROTECTED_FIELDS.iter().chain(also_protect) {
            doc.remove(field);
        }
        Ok(doc)
    }

    /// Checks that a merged payload still deserializes into the resource's
    /// input type and passes field validation.
    pub fn revalidate<T>(data: &BsonDocument) -> Result<(), ApiError>
    where
        T: DeserializeOwned + Validate,
    {
        let parsed: T = bson::from_document(data.clone())
            .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))?;
        parsed.validate()
    }

    /// Merge without committing, for validate-then-write updates.
    pub fn merged(doc: &Document, patch: &BsonDocument) -> BsonDocument {
        let mut out = doc.data.clone();
        for (k, v) in patch.iter() {
            out.insert(k.clone(), v.clone());
        }
        out
    }

    /// Inserts a prepared payload and returns the stored document.
    pub fn insert_returning(col: &Collection, data: BsonDocument) -> Document {
        let doc = Document::new(data);
        col.insert_document(doc.clone());
        doc
    }
}
