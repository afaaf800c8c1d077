use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::types::{CmpOp, Filter, SortSpec, MAX_IN_SET, MAX_SORT_FIELDS};

const MAX_PATH_DEPTH: usize = 32;

pub fn eval_filter(doc: &BsonDocument, filter: &Filter) -> bool {
    match filter {
        Filter::True => true,
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::In { path, values } => {
            get_path(doc, path).is_some_and(|v| matches_set(v, values))
        }
        Filter::Cmp { path, op, value } => {
            let Some(v) = get_path(doc, path) else { return false };
            match op {
                CmpOp::Eq => matches_eq(v, value),
                CmpOp::Gt => compare_bson(v, value) == Ordering::Greater,
                CmpOp::Gte => compare_bson(v, value) != Ordering::Less,
                CmpOp::Lt => compare_bson(v, value) == Ordering::Less,
                CmpOp::Lte => compare_bson(v, value) != Ordering::Greater,
            }
        }
    }
}

/// Equality matches the value itself, or any element of an array field
/// (document-database semantics: `careers = "Business"` matches a careers
/// array containing it).
fn matches_eq(v: &Bson, value: &Bson) -> bool {
    if v == value {
        return true;
    }
    matches!(v, Bson::Array(items) if items.iter().any(|item| item == value))
}

/// `in` membership: scalar-in-set, or any array element in the set.
fn matches_set(v: &Bson, set: &[Bson]) -> bool {
    let set = &set[..set.len().min(MAX_IN_SET)];
    match v {
        Bson::Array(items) => items.iter().any(|item| set.contains(item)),
        scalar => set.contains(scalar),
    }
}

/// Multi-key document ordering; missing fields sort before present ones.
pub fn compare_docs(a: &BsonDocument, b: &BsonDocument, sort: &[SortSpec]) -> Ordering {
    for s in sort.iter().take(MAX_SORT_FIELDS) {
        let va = get_path(a, &s.field);
        let vb = get_path(b, &s.field);
        let ord = match (va, vb) {
            (Some(x), Some(y)) => compare_bson(x, y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return if matches!(s.order, super::types::Order::Asc) { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}

/// Resolves a dotted path through nested documents.
fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut cur = doc;
    let mut parts = path.split('.').peekable();
    let mut segs = 0usize;
    while let Some(part) = parts.next() {
        segs += 1;
        if segs > MAX_PATH_DEPTH {
            return None;
        }
        let v = cur.get(part)?;
        if parts.peek().is_none() {
            return Some(v);
        }
        match v {
            Bson::Document(d) => cur = d,
            _ => return None,
        }
    }
    None
}

/// Total order over BSON values: numbers compare numerically across integer
/// and floating representations, otherwise values compare within their type
/// and across types by a fixed rank.
pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    fn is_num(x: &Bson) -> bool {
        matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_))
    }
    fn as_f64(x: &Bson) -> f64 {
        match x {
            Bson::Int32(i) => f64::from(*i),
            Bson::Int64(i) => *i as f64,
            Bson::Double(f) => *f,
            _ => f64::NAN,
        }
    }
    if is_num(a) && is_num(b) {
        return as_f64(a).total_cmp(&as_f64(b));
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Bson) -> u8 {
    match v {
        Bson::Null => 0,
        Bson::Boolean(_) => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => 2,
        Bson::String(_) => 3,
        Bson::Array(_) => 4,
        Bson::Document(_) => 5,
        Bson::DateTime(_) => 6,
        _ => 7,
    }
}

/// Restricts a document to the given fields (the identifier lives outside
/// the payload and is re-attached at serialization).
pub fn project_fields(doc: &BsonDocument, fields: &[String]) -> BsonDocument {
    let mut out = BsonDocument::new();
    for f in fields {
        if let Some(v) = doc.get(f) {
            out.insert(f.clone(), v.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn comparison_operators_over_mixed_numerics() {
        let d = doc! {"cost": 10_i32};
        let gt = |v: i64| Filter::Cmp {
            path: "cost".into(),
            op: CmpOp::Gt,
            value: Bson::Int64(v),
        };
        assert!(eval_filter(&d, &gt(5)));
        assert!(!eval_filter(&d, &gt(10)));
        let lte = Filter::Cmp { path: "cost".into(), op: CmpOp::Lte, value: Bson::Double(10.0) };
        assert!(eval_filter(&d, &lte));
    }

    #[test]
    fn missing_field_never_matches_comparison() {
        let d = doc! {"name": "Devworks"};
        let f = Filter::Cmp { path: "cost".into(), op: CmpOp::Gt, value: Bson::Int64(0) };
        assert!(!eval_filter(&d, &f));
    }

    #[test]
    fn in_matches_array_elements() {
        let d = doc! {"careers": ["Web Development", "UI/UX"]};
        let f = Filter::In {
            path: "careers".into(),
            values: vec![Bson::String("Business".into()), Bson::String("UI/UX".into())],
        };
        assert!(eval_filter(&d, &f));
        let none = Filter::In { path: "careers".into(), values: vec![Bson::String("Data Science".into())] };
        assert!(!eval_filter(&d, &none));
    }

    #[test]
    fn eq_matches_scalar_and_array_contains() {
        let d = doc! {"careers": ["Business"], "housing": true};
        let contains =
            Filter::Cmp { path: "careers".into(), op: CmpOp::Eq, value: Bson::String("Business".into()) };
        assert!(eval_filter(&d, &contains));
        let eq = Filter::Cmp { path: "housing".into(), op: CmpOp::Eq, value: Bson::Boolean(true) };
        assert!(eval_filter(&d, &eq));
    }

    #[test]
    fn dotted_paths_reach_nested_documents() {
        let d = doc! {"location": {"city": "Boston"}};
        let f = Filter::Cmp {
            path: "location.city".into(),
            op: CmpOp::Eq,
            value: Bson::String("Boston".into()),
        };
        assert!(eval_filter(&d, &f));
        let miss = Filter::Cmp {
            path: "location.state".into(),
            op: CmpOp::Eq,
            value: Bson::String("MA".into()),
        };
        assert!(!eval_filter(&d, &miss));
    }

    #[test]
    fn projection_keeps_exactly_the_named_fields() {
        let d = doc! {"name": "Devworks", "description": "x", "cost": 9000};
        let p = project_fields(&d, &["name".to_string(), "description".to_string()]);
        assert_eq!(p.len(), 2);
        assert!(p.get("cost").is_none());
    }
}
