use bson::Bson;

use super::types::{CmpOp, Filter, FindOptions, Order, SortSpec, MAX_IN_SET};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 25;

/// Keys consumed by the pipeline itself; everything else becomes a filter
/// condition.
const RESERVED_KEYS: [&str; 4] = ["select", "sort", "page", "limit"];

/// The per-request query specification, built from raw URL query parameters
/// and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub filter: Filter,
    pub select: Option<Vec<String>>,
    pub sort: Option<Vec<SortSpec>>,
    pub page: u64,
    pub limit: u64,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            filter: Filter::True,
            select: None,
            sort: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl QuerySpec {
    /// Translates raw query parameters into a specification.
    ///
    /// Bracket syntax `field[op]=value` with `op` one of `gt`, `gte`, `lt`,
    /// `lte`, `in` (case-sensitive, whole token) is rewritten into the native
    /// comparison filter. Any other bracketed token is NOT rewritten: the raw
    /// key, brackets included, is used as an equality path and will typically
    /// match nothing. That pass-through is documented behavior, not
    /// sanitized.
    pub fn from_params<'a, I>(params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut spec = Self::default();
        let mut conditions = Vec::new();

        for (key, value) in params {
            match key {
                "select" => spec.select = parse_field_list(value),
                "sort" => spec.sort = parse_sort(value),
                "page" => spec.page = parse_positive(value, DEFAULT_PAGE),
                "limit" => spec.limit = parse_positive(value, DEFAULT_LIMIT),
                _ => conditions.push(parse_condition(key, value)),
            }
        }

        spec.filter = Filter::all(conditions);
        spec
    }

    /// Skip offset for the current pagination window: `(page-1) * limit`.
    /// Saturating: page and limit come straight from the URL, and an
    /// absurd window must fall off the end of the data, not overflow.
    #[must_use]
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// The find options this specification resolves to.
    #[must_use]
    pub fn find_options(&self) -> FindOptions {
        FindOptions {
            projection: self.select.clone(),
            sort: self.sort.clone(),
            limit: Some(self.limit as usize),
            skip: Some(self.skip() as usize),
        }
    }

    /// Adds an extra equality condition (nested-route scoping).
    #[must_use]
    pub fn and_eq(mut self, path: &str, value: impl Into<Bson>) -> Self {
        let extra = Filter::Cmp { path: path.to_string(), op: CmpOp::Eq, value: value.into() };
        self.filter = match self.filter {
            Filter::True => extra,
            Filter::And(mut fs) => {
                fs.push(extra);
                Filter::And(fs)
            }
            other => Filter::And(vec![other, extra]),
        };
        self
    }
}

/// Whether `key` is consumed by the pipeline rather than filtered on.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

fn parse_condition(key: &str, value: &str) -> Filter {
    if let Some((field, op)) = split_operator(key) {
        return match op {
            "gt" => cmp(field, CmpOp::Gt, value),
            "gte" => cmp(field, CmpOp::Gte, value),
            "lt" => cmp(field, CmpOp::Lt, value),
            "lte" => cmp(field, CmpOp::Lte, value),
            "in" => Filter::In {
                path: field.to_string(),
                values: value
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .take(MAX_IN_SET)
                    .map(parse_scalar)
                    .collect(),
            },
            // Unrecognized token: the whole raw key passes through literally.
            _ => cmp(key, CmpOp::Eq, value),
        };
    }
    cmp(key, CmpOp::Eq, value)
}

fn cmp(field: &str, op: CmpOp, value: &str) -> Filter {
    Filter::Cmp { path: field.to_string(), op, value: parse_scalar(value) }
}

/// Splits `field[op]` into `(field, op)`; `None` when the key carries no
/// bracket suffix.
fn split_operator(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_suffix(']')?;
    let open = rest.find('[')?;
    if open == 0 {
        return None;
    }
    Some((&rest[..open], &rest[open + 1..]))
}

/// Filter values arrive as strings; compare numerically or as booleans when
/// they parse as such.
fn parse_scalar(value: &str) -> Bson {
    if let Ok(i) = value.parse::<i64>() {
        return Bson::Int64(i);
    }
    if let Ok(f) = value.parse::<f64>() {
        return Bson::Double(f);
    }
    match value {
        "true" => Bson::Boolean(true),
        "false" => Bson::Boolean(false),
        _ => Bson::String(value.to_string()),
    }
}

fn parse_field_list(value: &str) -> Option<Vec<String>> {
    let fields: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    if fields.is_empty() { None } else { Some(fields) }
}

/// `sort=a,-b`: ascending by `a`, then descending by `b`.
fn parse_sort(value: &str) -> Option<Vec<SortSpec>> {
    let specs: Vec<SortSpec> = value
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|field| match field.strip_prefix('-') {
            Some(rest) => SortSpec { field: rest.to_string(), order: Order::Desc },
            None => SortSpec { field: field.to_string(), order: Order::Asc },
        })
        .collect();
    if specs.is_empty() { None } else { Some(specs) }
}

/// Page and limit default when absent, non-numeric, or non-positive.
fn parse_positive(value: &str, default: u64) -> u64 {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => n,
        _ => default,
    }
}
