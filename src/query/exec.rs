use crate::collection::Collection;
use crate::document::Document;
use std::cmp::Ordering;

use super::eval::{compare_docs, eval_filter, project_fields};
use super::types::{Filter, FindOptions, MAX_LIMIT, MAX_PROJECTION_FIELDS, MAX_SORT_FIELDS};

/// Runs a find over a collection snapshot: filter, sort (explicit keys or
/// the default creation-time-descending order), projection, then skip/limit.
///
/// Ordering is always made deterministic by an id-ascending tie-break, so
/// repeated paginated reads walk the same sequence.
pub fn find_docs(col: &Collection, filter: &Filter, opts: &FindOptions) -> Vec<Document> {
    let mut docs: Vec<Document> =
        col.list().into_iter().filter(|d| eval_filter(&d.data, filter)).collect();

    match &opts.sort {
        Some(sort) => {
            if sort.len() > MAX_SORT_FIELDS {
                tracing::warn!(fields = sort.len(), "sort spec too long, truncating");
            }
            docs.sort_by(|a, b| {
                compare_docs(&a.data, &b.data, sort).then_with(|| a.id.cmp(&b.id))
            });
        }
        None => {
            // Most recently created first; ties broken by id ascending.
            docs.sort_by(|a, b| match b.created_at.cmp(&a.created_at) {
                Ordering::Equal => a.id.cmp(&b.id),
                ord => ord,
            });
        }
    }

    if let Some(fields) = &opts.projection {
        let fields: Vec<String> = fields.iter().take(MAX_PROJECTION_FIELDS).cloned().collect();
        for d in &mut docs {
            d.data = project_fields(&d.data, &fields);
        }
    }

    let skip = opts.skip.unwrap_or(0);
    let limit = opts.limit.unwrap_or(usize::MAX).min(MAX_LIMIT);
    if skip >= docs.len() {
        return Vec::new();
    }
    let end = skip.saturating_add(limit).min(docs.len());
    docs[skip..end].to_vec()
}

/// Counts documents matching `filter`, over the whole collection.
#[must_use]
pub fn count_docs(col: &Collection, filter: &Filter) -> usize {
    col.list().iter().filter(|d| eval_filter(&d.data, filter)).count()
}
