use super::AppState;
use crate::auth::{AuthUser, Role};
use crate::errors::ApiError;
use crate::models::USERS;
use crate::query::QuerySpec;
use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

/// Raw query parameters in arrival order, preserving repeated keys; the
/// query pipeline decides what each one means.
pub(crate) struct RawParams(pub Vec<(String, String)>);

impl RawParams {
    pub fn spec(&self) -> QuerySpec {
        QuerySpec::from_params(self.0.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RawParams {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        Ok(RawParams(params))
    }
}

/// JSON body extractor whose rejection renders the uniform error envelope.
pub(crate) struct SafeJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for SafeJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        Ok(SafeJson(value))
    }
}

/// Resolves `Authorization: Bearer <token>` to a user; any gap in the chain
/// is a 401.
#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
        let user_id = state.sessions.resolve(token).ok_or(ApiError::Unauthorized)?;
        let doc = state.store.collection(USERS).get(&user_id).ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser {
            id: user_id,
            name: doc.data.get_str("name").unwrap_or_default().to_string(),
            email: doc.data.get_str("email").unwrap_or_default().to_string(),
            role: doc.data.get_str("role").ok().and_then(Role::parse).unwrap_or(Role::User),
        })
    }
}
