//! Client for the hosted backend: a PostgREST-style table API under
//! `/rest/v1` and an object storage API under `/storage/v1`.
//!
//! Every request carries the `apikey` and `Authorization: Bearer` headers
//! and the configured timeout.

use super::filter::Condition;
use super::{content_type_for, not_found, stamp_new_row, DataStore, FileStorage, Filter};
use crate::error::{CabinetError, Result};
use crate::model::{into_row, Collection, Row};
use reqwest::blocking::{Client, Response};
use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

pub struct RestStore {
    base_url: String,
    client: Client,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let invalid = |_: header::InvalidHeaderValue| {
                CabinetError::Config("API key contains invalid header characters".into())
            };
            headers.insert("apikey", header::HeaderValue::from_str(key).map_err(invalid)?);
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", key)).map_err(invalid)?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| CabinetError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn table_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.table_name())
    }

    pub fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, encode(bucket), encode_path(path))
    }

    pub fn public_object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            encode(bucket),
            encode_path(path)
        )
    }

    fn fetch(&self, collection: Collection, filter: &Filter) -> Result<Vec<Row>> {
        tracing::debug!(%collection, ?filter, "GET rows");
        let response = self
            .client
            .get(self.table_url(collection))
            .query(&query_pairs(filter))
            .send()?;
        rows_from(handle_response(response)?)
    }
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn encode_path(path: &str) -> String {
    path.split('/').map(encode).collect::<Vec<_>>().join("/")
}

/// Text of a filter operand as PostgREST expects it after `eq.`.
fn operand(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Query parameters for a row selection.
pub fn query_pairs(filter: &Filter) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), "*".to_string())];
    for condition in &filter.conditions {
        let expr = match condition {
            Condition::Eq(_, v) => format!("eq.{}", operand(v)),
            Condition::IsNull(_) => "is.null".to_string(),
            Condition::NotNull(_) => "not.is.null".to_string(),
        };
        pairs.push((condition.column().to_string(), expr));
    }
    if let Some(order) = &filter.order {
        let dir = if order.descending { "desc" } else { "asc" };
        pairs.push(("order".to_string(), format!("{}.{}", order.column, dir)));
    }
    if let Some(n) = filter.limit {
        pairs.push(("limit".to_string(), n.to_string()));
    }
    pairs
}

/// Maps an unsuccessful HTTP status onto the error taxonomy.
pub fn status_error(status: StatusCode, body: &str) -> CabinetError {
    if status == StatusCode::NOT_FOUND {
        return CabinetError::NotFound(if body.is_empty() {
            "Resource not found".to_string()
        } else {
            body.to_string()
        });
    }
    let message = format!("{}: {}", status, body);
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        CabinetError::retryable(message)
    } else {
        CabinetError::persistence(message)
    }
}

fn handle_response(response: Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(status_error(status, &body));
    }
    let text = response.text()?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

fn rows_from(value: Value) -> Result<Vec<Row>> {
    match value {
        Value::Array(items) => items.into_iter().map(into_row).collect(),
        Value::Null => Ok(Vec::new()),
        other => Ok(vec![into_row(other)?]),
    }
}

impl DataStore for RestStore {
    fn list(&self, collection: Collection, filter: &Filter) -> Result<Vec<Row>> {
        self.fetch(collection, filter)
    }

    fn get(&self, collection: Collection, id: &Uuid) -> Result<Row> {
        let filter = Filter::new().eq("id", id.to_string()).limit(1);
        self.fetch(collection, &filter)?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(collection, id))
    }

    fn insert(&mut self, collection: Collection, row: Row) -> Result<Row> {
        tracing::debug!(%collection, "POST row");
        let response = self
            .client
            .post(self.table_url(collection))
            .header("Prefer", "return=representation")
            .json(&Value::Object(stamp_new_row(row)))
            .send()?;
        rows_from(handle_response(response)?)?
            .into_iter()
            .next()
            .ok_or_else(|| CabinetError::persistence(format!("insert into {} returned no row", collection)))
    }

    fn update(&mut self, collection: Collection, id: &Uuid, patch: Row) -> Result<Row> {
        tracing::debug!(%collection, %id, "PATCH row");
        let response = self
            .client
            .patch(self.table_url(collection))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&Value::Object(patch))
            .send()?;
        rows_from(handle_response(response)?)?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(collection, id))
    }
}

impl FileStorage for RestStore {
    fn upload(&mut self, bucket: &str, path: &str, bytes: &[u8]) -> Result<String> {
        tracing::debug!(bucket, path, size = bytes.len(), "uploading object");
        let response = self
            .client
            .post(self.object_url(bucket, path))
            .header(header::CONTENT_TYPE, content_type_for(path))
            .header("x-upsert", "false")
            .body(bytes.to_vec())
            .send()?;
        handle_response(response)?;
        Ok(self.public_object_url(bucket, path))
    }

    fn remove(&mut self, bucket: &str, path: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/storage/v1/object/{}", self.base_url, encode(bucket)))
            .json(&json!({ "prefixes": [path] }))
            .send()?;
        handle_response(response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RestStore {
        RestStore::new("https://abc.supabase.co/", Some("anon-key"), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn builds_table_and_object_urls() {
        let s = store();
        assert_eq!(s.table_url(Collection::PageContents), "https://abc.supabase.co/rest/v1/page_contents");
        assert_eq!(
            s.object_url("property_media", "properties/videos/a b.mp4"),
            "https://abc.supabase.co/storage/v1/object/property_media/properties/videos/a%20b.mp4"
        );
        assert_eq!(
            s.public_object_url("payment_receipts", "x.pdf"),
            "https://abc.supabase.co/storage/v1/object/public/payment_receipts/x.pdf"
        );
    }

    #[test]
    fn filter_becomes_query() {
        let filter = Filter::new()
            .eq("page_name", "home")
            .eq("order_index", 2)
            .active()
            .order_desc("created_at")
            .limit(1);
        let pairs = query_pairs(&filter);
        let as_str: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            as_str,
            [
                ("select", "*"),
                ("page_name", "eq.home"),
                ("order_index", "eq.2"),
                ("deleted_at", "is.null"),
                ("order", "created_at.desc"),
                ("limit", "1"),
            ]
        );
        let deleted = query_pairs(&Filter::new().deleted().order_asc("title"));
        assert_eq!(deleted[1], ("deleted_at".to_string(), "not.is.null".to_string()));
        assert_eq!(deleted[2], ("order".to_string(), "title.asc".to_string()));
    }

    #[test]
    fn statuses_map_to_errors() {
        assert!(matches!(status_error(StatusCode::NOT_FOUND, ""), CabinetError::NotFound(_)));
        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE, "down").is_retryable());
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "").is_retryable());
        let denied = status_error(StatusCode::FORBIDDEN, "row-level security");
        assert!(denied.is_persistence());
        assert!(!denied.is_retryable());
        assert!(denied.to_string().contains("row-level security"));
    }

    #[test]
    fn response_bodies_become_rows() {
        assert!(rows_from(Value::Null).unwrap().is_empty());
        assert_eq!(rows_from(json!([{ "id": 1 }, { "id": 2 }])).unwrap().len(), 2);
        assert_eq!(rows_from(json!({ "id": 1 })).unwrap().len(), 1);
        assert!(rows_from(json!([1])).is_err());
    }

    #[test]
    fn bad_api_key_is_a_config_error() {
        let err = RestStore::new("https://x", Some("bad\nkey"), Duration::from_secs(1)).err().unwrap();
        assert!(matches!(err, CabinetError::Config(_)));
    }
}
