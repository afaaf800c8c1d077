//! The "advanced results" query pipeline: translation of raw URL query
//! parameters into a filter specification, evaluation against BSON
//! documents, and the paginated execution path shared by every listing
//! endpoint.

mod advanced;
mod eval;
mod exec;
mod params;
mod types;

pub use advanced::{
    advanced_results, document_to_json, populate_document, AdvancedResults, PageRef, Pagination,
};
pub use eval::{compare_bson, compare_docs, eval_filter, project_fields};
pub use exec::{count_docs, find_docs};
pub use params::{is_reserved, QuerySpec, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use types::{CmpOp, Filter, FindOptions, Order, PopulateSpec, SortSpec};
