//! campdir — REST API backend for a directory of coding bootcamps.
//!
//! CRUD over bootcamps, courses, reviews, and users; a generic
//! filter/sort/select/paginate/populate pipeline shared by every listing
//! endpoint; geospatial radius search; photo upload; bearer-token
//! authentication with role- and ownership-based authorization.

pub mod auth;
pub mod collection;
pub mod config;
pub mod document;
pub mod engine;
pub mod errors;
pub mod geo;
pub mod http;
pub mod models;
pub mod query;
pub mod seed;
pub mod types;
pub mod upload;

pub use engine::Store;
pub use errors::{ApiError, StoreError};
pub use http::{build_router, serve, AppState};
pub use types::DocumentId;
