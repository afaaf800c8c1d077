use crate::document::Document;
use crate::types::DocumentId;
use bson::Document as BsonDocument;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory collection of documents keyed by id.
///
/// All access goes through the lock; queries operate on cloned snapshots so
/// a slow scan never holds readers out (count-then-fetch is deliberately not
/// atomic, see the concurrency notes in DESIGN.md).
pub struct Collection {
    name: String,
    docs: RwLock<HashMap<DocumentId, Document>>,
}

impl Collection {
    pub fn new(name: String) -> Self {
        Collection { name, docs: RwLock::new(HashMap::new()) }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts a new document built from `data` and returns its id.
    pub fn insert(&self, data: BsonDocument) -> DocumentId {
        self.insert_document(Document::new(data))
    }

    /// Inserts a fully formed document (snapshot load, seeding).
    pub fn insert_document(&self, document: Document) -> DocumentId {
        let id = document.id;
        self.docs.write().insert(id, document);
        id
    }

    pub fn get(&self, id: &DocumentId) -> Option<Document> {
        self.docs.read().get(id).cloned()
    }

    /// Merges `patch` into an existing document, returning the updated copy.
    pub fn update(&self, id: &DocumentId, patch: BsonDocument) -> Option<Document> {
        let mut docs = self.docs.write();
        let doc = docs.get_mut(id)?;
        doc.merge(patch);
        Some(doc.clone())
    }

    /// Removes a document, returning it if it existed.
    pub fn delete(&self, id: &DocumentId) -> Option<Document> {
        self.docs.write().remove(id)
    }

    /// Clones all documents out of the collection.
    pub fn list(&self) -> Vec<Document> {
        self.docs.read().values().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}
