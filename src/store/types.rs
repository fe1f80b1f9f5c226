//! Documents, paths and queries shared by every backend

use serde_json::{Map, Value};
use std::cmp::Ordering;

use super::error::{StoreError, StoreResult};

/// Field map of one document
pub type Fields = Map<String, Value>;

/// A document read back from a store
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Last path segment
    pub id: String,
    /// Full path relative to the database root, e.g. `users/u1/bookmarks/r3`
    pub path: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(path: impl Into<String>, fields: Fields) -> Self {
        let path = path.into();
        let id = path.rsplit('/').next().unwrap_or_default().to_string();
        Self { id, path, fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// String elements of an array field; missing or non-array reads as empty
    pub fn strings(&self, field: &str) -> Vec<String> {
        self.fields
            .get(field)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Split a document path into `(collection path, id)`
pub fn split_document_path(path: &str) -> StoreResult<(&str, &str)> {
    let segments = path.split('/').count();
    if path.is_empty() || segments % 2 != 0 || path.split('/').any(str::is_empty) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    // An even segment count always contains a separator
    let idx = path.rfind('/').ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
    Ok((&path[..idx], &path[idx + 1..]))
}

/// Check that `path` names a collection (odd segment count)
pub fn validate_collection_path(path: &str) -> StoreResult<()> {
    let segments = path.split('/').count();
    if path.is_empty() || segments % 2 != 1 || path.split('/').any(str::is_empty) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Current time in the string form stored in documents
///
/// Millisecond RFC 3339 in UTC, so lexical order matches time order.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equal(String, Value),
    ArrayContains(String, Value),
    GreaterOrEqual(String, Value),
    LessOrEqual(String, Value),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Equal(field.into(), value.into())
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::ArrayContains(field.into(), value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::GreaterOrEqual(field.into(), value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::LessOrEqual(field.into(), value.into())
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Equal(f, _)
            | Filter::ArrayContains(f, _)
            | Filter::GreaterOrEqual(f, _)
            | Filter::LessOrEqual(f, _) => f,
        }
    }

    /// Evaluate against a field map; a missing field never matches
    pub fn matches(&self, fields: &Fields) -> bool {
        let Some(actual) = fields.get(self.field()) else {
            return false;
        };
        match self {
            Filter::Equal(_, expected) => actual == expected,
            Filter::ArrayContains(_, expected) => actual
                .as_array()
                .map(|values| values.contains(expected))
                .unwrap_or(false),
            Filter::GreaterOrEqual(_, bound) => matches!(
                compare_values(actual, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::LessOrEqual(_, bound) => matches!(
                compare_values(actual, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Structured query against one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters.iter().all(|f| f.matches(fields))
    }
}

/// Order two JSON values of the same kind; mixed kinds are unordered
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Build a [`Fields`] map from a `json!` object literal
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}
