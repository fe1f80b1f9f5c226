//! Cloud Firestore backend
//!
//! Talks to the Firestore REST API (v1). Documents travel as typed values
//! (`{"stringValue": ..}`, `{"arrayValue": {"values": [..]}}`, ...) and are
//! converted to plain JSON at this boundary so the rest of the crate never
//! sees the wire format.
//!
//! Array updates go through `:commit` with an empty update mask plus a
//! field transform, which creates the document when it is missing and
//! leaves its other fields alone.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::error::{StoreError, StoreResult};
use super::types::{split_document_path, validate_collection_path, Direction, Document, Fields, Filter, Query};
use super::DocumentStore;

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

const LIST_PAGE_SIZE: u32 = 300;

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    /// OAuth2 bearer token; requests are unauthenticated without one
    pub access_token: Option<String>,
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: "(default)".to_string(),
            access_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

pub struct FirestoreStore {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(StoreError::Request)?;
        Ok(Self { client, config })
    }

    /// `projects/{p}/databases/{d}/documents`
    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.config.project_id, self.config.database
        )
    }

    fn url(&self, relative: &str) -> String {
        if relative.is_empty() {
            format!("{}/{}", self.config.base_url, self.documents_root())
        } else {
            format!("{}/{}/{}", self.config.base_url, self.documents_root(), relative)
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.config.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> StoreResult<Response> {
        builder.send().await.map_err(StoreError::from_transport)
    }

    async fn check(response: Response) -> StoreResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Backend { status, message })
    }

    /// Strip the database prefix from a full resource name
    fn relative_path<'a>(&self, name: &'a str) -> &'a str {
        let root = self.documents_root();
        name.find(&root)
            .map(|idx| name[idx + root.len()..].trim_start_matches('/'))
            .unwrap_or(name)
    }

    fn to_document(&self, raw: RawDocument) -> StoreResult<Document> {
        let path = self.relative_path(&raw.name).to_string();
        Ok(Document::new(path, decode_fields(&raw.fields)?))
    }

    async fn commit_transform(&self, path: &str, transform: Value) -> StoreResult<()> {
        split_document_path(path)?;
        let url = format!("{}:commit", self.url(""));
        let body = json!({
            "writes": [{
                "update": {
                    "name": format!("{}/{}", self.documents_root(), path),
                    "fields": {}
                },
                "updateMask": { "fieldPaths": [] },
                "updateTransforms": [transform]
            }]
        });

        let response = self.send(self.request(Method::POST, &url).json(&body)).await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct RunQueryItem {
    document: Option<RawDocument>,
}

/// Quote a field path segment unless it is a plain identifier
fn field_path(field: &str) -> String {
    let simple = field
        .chars()
        .enumerate()
        .all(|(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
    if simple && !field.is_empty() {
        field.to_string()
    } else {
        format!("`{}`", field.replace('`', "\\`"))
    }
}

/// Plain JSON to a Firestore typed value
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => {
            json!({ "arrayValue": { "values": values.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

/// Firestore typed value back to plain JSON
///
/// Timestamps and references come back as strings.
pub fn decode_value(value: &Value) -> StoreResult<Value> {
    let obj = value
        .as_object()
        .ok_or_else(|| StoreError::Encoding(format!("expected typed value, got {}", value)))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| StoreError::Encoding("empty typed value".to_string()))?;

    Ok(match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or(false)),
        "integerValue" => {
            let n = match inner {
                Value::String(s) => s
                    .parse::<i64>()
                    .map_err(|e| StoreError::Encoding(e.to_string()))?,
                other => other.as_i64().unwrap_or(0),
            };
            Value::from(n)
        }
        "doubleValue" => inner.as_f64().map(Value::from).unwrap_or(Value::Null),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|vs| vs.iter().map(decode_value).collect::<StoreResult<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            Value::Array(values)
        }
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            Value::Object(decode_fields(&fields)?)
        }
        other => return Err(StoreError::Encoding(format!("unknown value type {}", other))),
    })
}

pub fn decode_fields(fields: &Map<String, Value>) -> StoreResult<Fields> {
    fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
        .collect()
}

fn encode_filter(filter: &Filter) -> Value {
    let (op, value) = match filter {
        Filter::Equal(_, v) => ("EQUAL", v),
        Filter::ArrayContains(_, v) => ("ARRAY_CONTAINS", v),
        Filter::GreaterOrEqual(_, v) => ("GREATER_THAN_OR_EQUAL", v),
        Filter::LessOrEqual(_, v) => ("LESS_THAN_OR_EQUAL", v),
    };
    json!({
        "fieldFilter": {
            "field": { "fieldPath": field_path(filter.field()) },
            "op": op,
            "value": encode_value(value)
        }
    })
}

/// Build a `structuredQuery` body for one collection id
pub fn encode_query(collection_id: &str, query: &Query) -> Value {
    let mut structured = Map::new();
    structured.insert("from".to_string(), json!([{ "collectionId": collection_id }]));

    match query.filters.len() {
        0 => {}
        1 => {
            structured.insert("where".to_string(), encode_filter(&query.filters[0]));
        }
        _ => {
            structured.insert(
                "where".to_string(),
                json!({
                    "compositeFilter": {
                        "op": "AND",
                        "filters": query.filters.iter().map(encode_filter).collect::<Vec<_>>()
                    }
                }),
            );
        }
    }

    if let Some((field, direction)) = &query.order_by {
        let direction = match direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured.insert(
            "orderBy".to_string(),
            json!([{ "field": { "fieldPath": field_path(field) }, "direction": direction }]),
        );
    }

    if let Some(limit) = query.limit {
        structured.insert("limit".to_string(), json!(limit));
    }

    json!({ "structuredQuery": structured })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, path: &str) -> StoreResult<Option<Document>> {
        split_document_path(path)?;
        let response = self.send(self.request(Method::GET, &self.url(path))).await?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let raw: RawDocument = Self::check(response).await?.json().await.map_err(StoreError::Request)?;
        Ok(Some(self.to_document(raw)?))
    }

    async fn set(&self, path: &str, fields: Fields, merge: bool) -> StoreResult<()> {
        split_document_path(path)?;
        let mut builder = self.request(Method::PATCH, &self.url(path));
        if merge {
            let mask: Vec<(&str, String)> = fields
                .keys()
                .map(|k| ("updateMask.fieldPaths", field_path(k)))
                .collect();
            builder = builder.query(&mask);
        }

        let body = json!({ "fields": encode_fields(&fields) });
        let response = self.send(builder.json(&body)).await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        validate_collection_path(collection)?;
        let body = json!({ "fields": encode_fields(&fields) });
        let response = self
            .send(self.request(Method::POST, &self.url(collection)).json(&body))
            .await?;
        let raw: RawDocument = Self::check(response).await?.json().await.map_err(StoreError::Request)?;
        Ok(self.to_document(raw)?.id)
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        split_document_path(path)?;
        let response = self.send(self.request(Method::DELETE, &self.url(path))).await?;
        if response.status().as_u16() == 404 {
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        validate_collection_path(collection)?;
        let url = self.url(collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("pageSize", LIST_PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let response = self.send(self.request(Method::GET, &url).query(&params)).await?;
            let page: ListResponse = Self::check(response).await?.json().await.map_err(StoreError::Request)?;

            for raw in page.documents {
                documents.push(self.to_document(raw)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        validate_collection_path(collection)?;
        let (parent, collection_id) = match collection.rfind('/') {
            Some(idx) => (&collection[..idx], &collection[idx + 1..]),
            None => ("", collection),
        };

        let url = format!("{}:runQuery", self.url(parent));
        let response = self
            .send(self.request(Method::POST, &url).json(&encode_query(collection_id, query)))
            .await?;
        let items: Vec<RunQueryItem> = Self::check(response).await?.json().await.map_err(StoreError::Request)?;

        items
            .into_iter()
            .filter_map(|item| item.document)
            .map(|raw| self.to_document(raw))
            .collect()
    }

    async fn array_union(&self, path: &str, field: &str, values: Vec<Value>) -> StoreResult<()> {
        let transform = json!({
            "fieldPath": field_path(field),
            "appendMissingElements": { "values": values.iter().map(encode_value).collect::<Vec<_>>() }
        });
        self.commit_transform(path, transform).await
    }

    async fn array_remove(&self, path: &str, field: &str, values: Vec<Value>) -> StoreResult<()> {
        let transform = json!({
            "fieldPath": field_path(field),
            "removeAllFromArray": { "values": values.iter().map(encode_value).collect::<Vec<_>>() }
        });
        self.commit_transform(path, transform).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        let url = self.url("publicChannels");
        let response = self
            .send(self.request(Method::GET, &url).query(&[("pageSize", "1")]))
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "firestore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fields;

    #[test]
    fn test_encode_value_kinds() {
        assert_eq!(encode_value(&json!("x")), json!({"stringValue": "x"}));
        assert_eq!(encode_value(&json!(7)), json!({"integerValue": "7"}));
        assert_eq!(encode_value(&json!(4.5)), json!({"doubleValue": 4.5}));
        assert_eq!(encode_value(&json!(true)), json!({"booleanValue": true}));
        assert_eq!(encode_value(&Value::Null), json!({"nullValue": null}));
        assert_eq!(
            encode_value(&json!(["a"])),
            json!({"arrayValue": {"values": [{"stringValue": "a"}]}})
        );
    }

    #[test]
    fn test_decode_document_fields() {
        let wire = json!({
            "username": {"stringValue": "ana"},
            "createdAt": {"timestampValue": "2025-01-01T00:00:00Z"},
            "count": {"integerValue": "12"},
            "friends": {"arrayValue": {"values": [{"stringValue": "u2"}]}},
            "empty": {"arrayValue": {}},
            "meta": {"mapValue": {"fields": {"ok": {"booleanValue": true}}}}
        });

        let decoded = decode_fields(wire.as_object().unwrap()).unwrap();
        assert_eq!(
            Value::Object(decoded),
            json!({
                "username": "ana",
                "createdAt": "2025-01-01T00:00:00Z",
                "count": 12,
                "friends": ["u2"],
                "empty": [],
                "meta": {"ok": true}
            })
        );
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        assert!(decode_value(&json!({"mysteryValue": 1})).is_err());
        assert!(decode_value(&json!("bare")).is_err());
    }

    #[test]
    fn test_encode_query_composite() {
        let query = Query::new()
            .filter(Filter::gte("usernameLower", "an"))
            .filter(Filter::lte("usernameLower", "an\u{f8ff}"))
            .order_by("usernameLower", Direction::Ascending)
            .limit(10);

        let body = encode_query("users", &query);
        let structured = &body["structuredQuery"];
        assert_eq!(structured["from"][0]["collectionId"], "users");
        assert_eq!(structured["where"]["compositeFilter"]["op"], "AND");
        assert_eq!(
            structured["where"]["compositeFilter"]["filters"][0]["fieldFilter"]["op"],
            "GREATER_THAN_OR_EQUAL"
        );
        assert_eq!(structured["orderBy"][0]["direction"], "ASCENDING");
        assert_eq!(structured["limit"], 10);
    }

    #[test]
    fn test_encode_query_single_filter() {
        let query = Query::new().filter(Filter::contains("memberIds", "u1"));
        let body = encode_query("groups", &query);
        assert_eq!(body["structuredQuery"]["where"]["fieldFilter"]["op"], "ARRAY_CONTAINS");
        assert!(body["structuredQuery"].get("limit").is_none());
    }

    #[test]
    fn test_field_path_quoting() {
        assert_eq!(field_path("usernameLower"), "usernameLower");
        assert_eq!(field_path("a-b"), "`a-b`");
        assert_eq!(field_path("1st"), "`1st`");
    }

    #[test]
    fn test_relative_path() {
        let store = FirestoreStore::new(FirestoreConfig::new("demo")).unwrap();
        let name = "projects/demo/databases/(default)/documents/users/u1/bookmarks/r3";
        assert_eq!(store.relative_path(name), "users/u1/bookmarks/r3");

        let doc = store
            .to_document(RawDocument {
                name: name.to_string(),
                fields: Map::new(),
            })
            .unwrap();
        assert_eq!(doc.id, "r3");
        assert_eq!(doc.fields, fields(json!({})));
    }
}
