use bson::Bson;
use serde::{Deserialize, Serialize};

// Safety limits to prevent resource abuse
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_SORT_FIELDS: usize = 8;
pub(crate) const MAX_PROJECTION_FIELDS: usize = 64;
pub(crate) const MAX_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

/// Options for [`find_docs`](super::find_docs).
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub projection: Option<Vec<String>>,
    pub sort: Option<Vec<SortSpec>>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A filter condition tree evaluated against document payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    Cmp { path: String, op: CmpOp, value: Bson },
    In { path: String, values: Vec<Bson> },
}

impl Filter {
    /// Equality condition shorthand.
    pub fn eq(path: &str, value: impl Into<Bson>) -> Filter {
        Filter::Cmp { path: path.to_string(), op: CmpOp::Eq, value: value.into() }
    }

    /// Collapses a list of conditions into a single filter.
    #[must_use]
    pub fn all(mut conditions: Vec<Filter>) -> Filter {
        match conditions.len() {
            0 => Filter::True,
            1 => conditions.remove(0),
            _ => Filter::And(conditions),
        }
    }
}

/// Relation-expansion request: replace the foreign-key field at `path` with
/// the referenced document from `collection`, optionally projected.
#[derive(Debug, Clone)]
pub struct PopulateSpec {
    pub path: String,
    pub collection: String,
    pub select: Option<Vec<String>>,
}

impl PopulateSpec {
    pub fn new(path: &str, collection: &str) -> Self {
        Self { path: path.to_string(), collection: collection.to_string(), select: None }
    }

    #[must_use]
    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select = Some(fields.iter().map(|f| (*f).to_string()).collect());
        self
    }
}
