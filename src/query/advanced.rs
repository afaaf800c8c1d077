use crate::document::Document;
use crate::engine::Store;
use crate::types::DocumentId;
use bson::Bson;
use serde::Serialize;
use serde_json::{Map, Value};

use super::eval::project_fields;
use super::params::QuerySpec;
use super::types::PopulateSpec;

/// One step of the pagination window, reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: u64,
    pub limit: u64,
}

/// `next` is present iff another full-or-partial page exists past the
/// current window; `prev` iff the window starts after the first page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    /// Saturating on purpose: page and limit are client-supplied, and a
    /// window past the end of u64 still has to produce a sane answer.
    #[must_use]
    pub fn window(page: u64, limit: u64, total: u64) -> Self {
        let next = (page.saturating_mul(limit) < total)
            .then_some(PageRef { page: page.saturating_add(1), limit });
        let prev = (page > 1).then_some(PageRef { page: page - 1, limit });
        Self { next, prev }
    }
}

/// The outcome of the advanced-results pipeline: the current page of items
/// serialized for the response, pagination metadata, and the total count of
/// the filtered set.
#[derive(Debug, Clone)]
pub struct AdvancedResults {
    pub items: Vec<Value>,
    pub pagination: Pagination,
    pub total: usize,
}

/// Runs the full pipeline against a named collection, in the mandated
/// order: filter, selection, sort (or the default), total count over the
/// filtered set, skip/limit, relation expansion, serialization.
///
/// Count and fetch are two passes over the collection, not one atomic
/// operation; under concurrent writes the total and the page may disagree.
pub fn advanced_results(
    store: &Store,
    collection: &str,
    spec: &QuerySpec,
    populate: Option<&PopulateSpec>,
) -> AdvancedResults {
    let col = store.collection(collection);
    let opts = spec.find_options();

    let total = super::exec::count_docs(&col, &spec.filter);
    let mut docs = super::exec::find_docs(&col, &spec.filter, &opts);

    if let Some(p) = populate {
        populate_docs(store, &mut docs, p);
    }

    let projected = spec.select.is_some();
    let items = docs.iter().map(|d| document_to_json(d, !projected)).collect();

    AdvancedResults {
        items,
        pagination: Pagination::window(spec.page, spec.limit, total as u64),
        total,
    }
}

/// Populate for a single fetched document (detail endpoints).
pub fn populate_document(store: &Store, doc: &mut Document, spec: &PopulateSpec) {
    populate_docs(store, std::slice::from_mut(doc), spec);
}

/// Replaces each document's bare foreign-key reference at `spec.path` with
/// the referenced document, optionally projected. Unresolvable references
/// (absent collection, unparsable or dangling id) leave the bare id alone.
fn populate_docs(store: &Store, docs: &mut [Document], spec: &PopulateSpec) {
    let Some(related) = store.get_collection(&spec.collection) else { return };
    for doc in docs.iter_mut() {
        let Some(Bson::String(raw)) = doc.data.get(&spec.path) else { continue };
        let Ok(id) = raw.parse::<DocumentId>() else { continue };
        let Some(child) = related.get(&id) else { continue };

        let selected = match &spec.select {
            Some(fields) => project_fields(&child.data, fields),
            None => child.data.clone(),
        };
        let mut embedded = bson::Document::new();
        embedded.insert("id", raw.clone());
        embedded.extend(selected);
        doc.data.insert(spec.path.clone(), Bson::Document(embedded));
    }
}

/// Serializes a document for a response body: payload fields plus `id`, and
/// `created_at` unless the caller projected fields explicitly (a `select`
/// must return exactly the requested set plus the identifier).
#[must_use]
pub fn document_to_json(doc: &Document, include_meta: bool) -> Value {
    let mut obj = match Bson::Document(doc.data.clone()).into_relaxed_extjson() {
        Value::Object(m) => m,
        _ => Map::new(),
    };
    obj.insert("id".to_string(), Value::String(doc.id.to_string()));
    if include_meta {
        obj.insert("created_at".to_string(), Value::String(doc.created_at.to_rfc3339()));
    }
    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QuerySpec;
    use bson::doc;

    fn seeded(n: i32) -> Store {
        let store = Store::new();
        let col = store.collection("bootcamps");
        for i in 0..n {
            col.insert(doc! {"name": format!("camp-{i:02}"), "cost": i});
        }
        store
    }

    #[test]
    fn pagination_window_boundaries() {
        // 30 items, limit 10: page 1 has next only, page 2 both, page 3 prev only.
        let p1 = Pagination::window(1, 10, 30);
        assert_eq!(p1.next, Some(PageRef { page: 2, limit: 10 }));
        assert_eq!(p1.prev, None);
        let p2 = Pagination::window(2, 10, 30);
        assert_eq!(p2.next, Some(PageRef { page: 3, limit: 10 }));
        assert_eq!(p2.prev, Some(PageRef { page: 1, limit: 10 }));
        let p3 = Pagination::window(3, 10, 30);
        assert_eq!(p3.next, None);
        assert_eq!(p3.prev, Some(PageRef { page: 2, limit: 10 }));
    }

    #[test]
    fn window_saturates_on_extreme_pages() {
        let p = Pagination::window(u64::MAX, 25, 30);
        assert_eq!(p.next, None);
        assert_eq!(p.prev, Some(PageRef { page: u64::MAX - 1, limit: 25 }));
        let p = Pagination::window(2, u64::MAX, u64::MAX);
        assert_eq!(p.next, None);
    }

    #[test]
    fn total_counts_the_filtered_set_before_pagination() {
        let store = seeded(30);
        let spec = QuerySpec::from_params([("cost[gte]", "10"), ("limit", "5")]);
        let results = advanced_results(&store, "bootcamps", &spec, None);
        assert_eq!(results.total, 20);
        assert_eq!(results.items.len(), 5);
        assert_eq!(results.pagination.next, Some(PageRef { page: 2, limit: 5 }));
    }

    #[test]
    fn select_returns_exactly_id_plus_requested_fields() {
        let store = seeded(3);
        let spec = QuerySpec::from_params([("select", "name")]);
        let results = advanced_results(&store, "bootcamps", &spec, None);
        for item in &results.items {
            let obj = item.as_object().unwrap();
            let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
            keys.sort_unstable();
            assert_eq!(keys, ["id", "name"]);
        }
    }

    #[test]
    fn populate_embeds_the_referenced_document() {
        let store = Store::new();
        let bootcamps = store.collection("bootcamps");
        let camp_id = bootcamps.insert(doc! {
            "name": "Devworks",
            "description": "full stack",
            "phone": "555-0100",
        });
        store.collection("courses").insert(doc! {
            "title": "Rust 101",
            "bootcamp": camp_id.to_string(),
        });

        let populate =
            PopulateSpec::new("bootcamp", "bootcamps").select(&["name", "description"]);
        let spec = QuerySpec::default();
        let results = advanced_results(&store, "courses", &spec, Some(&populate));
        let embedded = &results.items[0]["bootcamp"];
        assert_eq!(embedded["id"], camp_id.to_string());
        assert_eq!(embedded["name"], "Devworks");
        assert_eq!(embedded["description"], "full stack");
        assert!(embedded.get("phone").is_none());
    }

    #[test]
    fn dangling_reference_keeps_the_bare_id() {
        let store = Store::new();
        let ghost = crate::types::DocumentId::new();
        store.collection("courses").insert(doc! {
            "title": "Orphaned",
            "bootcamp": ghost.to_string(),
        });
        store.collection("bootcamps"); // exists but empty
        let populate = PopulateSpec::new("bootcamp", "bootcamps");
        let results =
            advanced_results(&store, "courses", &QuerySpec::default(), Some(&populate));
        assert_eq!(results.items[0]["bootcamp"], ghost.to_string());
    }
}
