use crate::auth::hash_password;
use crate::document::Document;
use crate::engine::Store;
use crate::errors::{ApiError, StoreError};
use crate::models::{BOOTCAMPS, COURSES, REVIEWS, USERS};
use crate::types::DocumentId;
use bson::Bson;
use serde_json::Value;
use std::path::Path;

/// Outcome of a seed import: entries inserted vs. skipped (non-objects,
/// unparsable files are an error, bad entries are not).
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: u64,
    pub skipped: u64,
}

/// Collections seeded from `<data_dir>/<name>.json`, in reference order so
/// foreign keys point at documents that already exist.
const SEED_FILES: [&str; 4] = [USERS, BOOTCAMPS, COURSES, REVIEWS];

/// Imports every seed file present in `data_dir` into the store. Files that
/// do not exist are skipped silently; entries are JSON objects, optionally
/// carrying an `id` used verbatim so cross-references survive.
pub fn import(store: &Store, data_dir: &Path) -> Result<SeedReport, ApiError> {
    let mut report = SeedReport::default();
    for name in SEED_FILES {
        let path = data_dir.join(format!("{name}.json"));
        if !path.exists() {
            continue;
        }
        let (inserted, skipped) = import_file(store, name, &path)?;
        tracing::info!(collection = name, inserted, skipped, "seeded");
        report.inserted += inserted;
        report.skipped += skipped;
    }
    Ok(report)
}

fn import_file(store: &Store, collection: &str, path: &Path) -> Result<(u64, u64), ApiError> {
    let raw = std::fs::read_to_string(path).map_err(StoreError::Io)?;
    let entries: Vec<Value> = serde_json::from_str(&raw).map_err(StoreError::Json)?;

    let col = store.collection(collection);
    let mut inserted = 0u64;
    let mut skipped = 0u64;
    for entry in entries {
        let Value::Object(mut obj) = entry else {
            skipped += 1;
            continue;
        };
        let id = obj
            .remove("id")
            .and_then(|v| v.as_str().and_then(|s| s.parse::<DocumentId>().ok()));

        // User passwords arrive in the clear in seed data only.
        if collection == USERS {
            if let Some(Value::String(password)) = obj.remove("password") {
                obj.insert("password_hash".to_string(), Value::String(hash_password(&password)?));
            }
        }

        let Ok(Bson::Document(data)) = Bson::try_from(Value::Object(obj)) else {
            skipped += 1;
            continue;
        };
        let mut doc = Document::new(data);
        if let Some(id) = id {
            doc.id = id;
        }
        col.insert_document(doc);
        inserted += 1;
    }
    Ok((inserted, skipped))
}

/// Deletes the snapshot file if present.
pub fn wipe(snapshot: &Path) -> Result<bool, StoreError> {
    if snapshot.exists() {
        std::fs::remove_file(snapshot)?;
        Ok(true)
    } else {
        Ok(false)
    }
}
