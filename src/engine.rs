use crate::collection::Collection;
use crate::document::Document;
use crate::errors::StoreError;
use crate::types::CollectionName;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

/// The in-process document store: a set of named collections.
///
/// State lives in memory; an optional JSON snapshot bridges the seeder and
/// the server (runtime mutations are not written back).
#[derive(Default)]
pub struct Store {
    collections: RwLock<HashMap<CollectionName, Arc<Collection>>>,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the named collection, creating it on first use.
    pub fn collection(&self, name: &str) -> Arc<Collection> {
        if let Some(col) = self.collections.read().get(name) {
            return col.clone();
        }
        let mut cols = self.collections.write();
        cols.entry(name.to_string())
            .or_insert_with(|| Arc::new(Collection::new(name.to_string())))
            .clone()
    }

    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    pub fn drop_collection(&self, name: &str) -> bool {
        self.collections.write().remove(name).is_some()
    }

    pub fn collection_names(&self) -> Vec<CollectionName> {
        let mut names: Vec<_> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Serializes every collection to a JSON snapshot file.
    pub fn save_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        let mut out: HashMap<CollectionName, Vec<Document>> = HashMap::new();
        for (name, col) in self.collections.read().iter() {
            out.insert(name.clone(), col.list());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, &out)?;
        Ok(())
    }

    /// Loads a snapshot previously written by [`Store::save_snapshot`].
    pub fn load_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        let file = BufReader::new(File::open(path)?);
        let snapshot: HashMap<CollectionName, Vec<Document>> = serde_json::from_reader(file)?;
        for (name, docs) in snapshot {
            let col = self.collection(&name);
            for doc in docs {
                col.insert_document(doc);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn collection_is_created_on_first_use() {
        let store = Store::new();
        assert!(store.get_collection("bootcamps").is_none());
        store.collection("bootcamps").insert(doc! {"name": "Devworks"});
        assert_eq!(store.get_collection("bootcamps").unwrap().len(), 1);
        assert_eq!(store.collection_names(), vec!["bootcamps".to_string()]);
    }

    #[test]
    fn snapshot_round_trip_preserves_ids_and_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let store = Store::new();
        let col = store.collection("bootcamps");
        let id = col.insert(doc! {"name": "Devworks", "housing": true});
        let original = col.get(&id).unwrap();
        store.save_snapshot(&path).unwrap();

        let restored = Store::new();
        restored.load_snapshot(&path).unwrap();
        let doc = restored.collection("bootcamps").get(&id).unwrap();
        assert_eq!(doc, original);
    }
}
