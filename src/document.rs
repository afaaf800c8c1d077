use crate::types::DocumentId;
use bson::Document as BsonDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored document: BSON payload plus bookkeeping timestamps.
///
/// `created_at` drives the default listing order; `id` breaks ties so
/// pagination stays reproducible for documents created in the same instant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub data: BsonDocument,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(data: BsonDocument) -> Self {
        let now = Utc::now();
        Self { id: DocumentId::new(), data, created_at: now, updated_at: now }
    }

    /// Merges `patch` into the payload top level, replacing existing keys.
    pub fn merge(&mut self, patch: BsonDocument) {
        for (k, v) in patch {
            self.data.insert(k, v);
        }
        self.updated_at = Utc::now();
    }
}
