//! Live adapter for the store and storage ports over a PostgREST-style HTTP API.
//!
//! Rows live under `{base}/rest/v1/{table}`; document objects under
//! `{base}/storage/v1/object/{bucket}/{path}`.

use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::poll::{RowVersion, VersionLister};
use crate::error::PortError;
use crate::model::{Client as ClientRow, Task, TaskId, TaskPatch};
use crate::ports::{Entity, ObjectStorage, PortFuture, TaskStore};

const TASKS_TABLE: &str = "taken";
const CLIENTS_TABLE: &str = "clienten";

/// HTTP client for the remote store and its document bucket.
pub struct RestBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    bucket: String,
}

impl RestBackend {
    /// Creates a backend for the given base URL and document bucket.
    #[must_use]
    pub fn new(base_url: &str, api_key: Option<String>, bucket: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            bucket: bucket.to_string(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{path}", self.base_url));
        match &self.api_key {
            Some(key) => builder.header("apikey", key).bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<String, PortError> {
        let response = builder
            .send()
            .await
            .map_err(|e| -> PortError { format!("{what} request failed: {e}").into() })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| -> PortError { format!("Failed to read {what} response: {e}").into() })?;
        if !status.is_success() {
            let msg =
                serde_json::from_str::<ApiError>(&body).map(ApiError::into_message).unwrap_or(body);
            return Err(format!("{what} failed ({}): {msg}", status.as_u16()).into());
        }
        Ok(body)
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        path: &str,
        what: &str,
    ) -> Result<T, PortError> {
        let body = self.send(self.request(Method::GET, path), what).await?;
        serde_json::from_str(&body)
            .map_err(|e| -> PortError { format!("Failed to parse {what} response: {e}").into() })
    }

    fn object_url(&self, path: &str) -> String {
        format!("/storage/v1/object/{}/{path}", self.bucket)
    }
}

/// Error body returned by both the row API and the storage API.
#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
    error: Option<String>,
}

impl ApiError {
    fn into_message(self) -> String {
        self.message.or(self.error).unwrap_or_default()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CopyRequest<'a> {
    bucket_id: &'a str,
    source_key: &'a str,
    destination_key: &'a str,
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: [&'a str; 1],
}

#[derive(Deserialize)]
struct VersionRow {
    id: Uuid,
    updated_at: Option<DateTime<Utc>>,
}

impl TaskStore for RestBackend {
    fn fetch_tasks(&self) -> PortFuture<'_, Vec<Task>> {
        Box::pin(async move {
            let path = format!("/rest/v1/{TASKS_TABLE}?select=*&order=updated_at.desc");
            self.fetch_rows(&path, "task fetch").await
        })
    }

    fn fetch_clients(&self) -> PortFuture<'_, Vec<ClientRow>> {
        Box::pin(async move {
            let path = format!("/rest/v1/{CLIENTS_TABLE}?select=id,naam,updated_at&order=naam.asc");
            self.fetch_rows(&path, "client fetch").await
        })
    }

    fn update_task<'a>(&'a self, id: TaskId, patch: &'a TaskPatch) -> PortFuture<'a, ()> {
        Box::pin(async move {
            let builder = self
                .request(Method::PATCH, &format!("/rest/v1/{TASKS_TABLE}?id=eq.{id}"))
                .header("Prefer", "return=minimal")
                .json(patch);
            self.send(builder, "task update").await.map(|_| ())
        })
    }
}

impl ObjectStorage for RestBackend {
    fn copy<'a>(&'a self, from: &'a str, to: &'a str) -> PortFuture<'a, ()> {
        Box::pin(async move {
            let body =
                CopyRequest { bucket_id: &self.bucket, source_key: from, destination_key: to };
            let builder = self.request(Method::POST, "/storage/v1/object/copy").json(&body);
            self.send(builder, "object copy").await.map(|_| ())
        })
    }

    fn remove<'a>(&'a self, path: &'a str) -> PortFuture<'a, ()> {
        Box::pin(async move {
            // Bulk removal by prefix list answers 200 even when nothing matched.
            let builder = self
                .request(Method::DELETE, &format!("/storage/v1/object/{}", self.bucket))
                .json(&RemoveRequest { prefixes: [path] });
            self.send(builder, "object removal").await.map(|_| ())
        })
    }

    fn exists<'a>(&'a self, path: &'a str) -> PortFuture<'a, bool> {
        Box::pin(async move {
            let response = self
                .request(Method::HEAD, &self.object_url(path))
                .send()
                .await
                .map_err(|e| -> PortError { format!("object lookup failed: {e}").into() })?;
            match response.status() {
                s if s.is_success() => Ok(true),
                StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(false),
                s => Err(format!("object lookup failed ({})", s.as_u16()).into()),
            }
        })
    }
}

impl VersionLister for RestBackend {
    fn list_versions(&self, entity: Entity) -> PortFuture<'_, Vec<RowVersion>> {
        Box::pin(async move {
            let table = match entity {
                Entity::Tasks => TASKS_TABLE,
                Entity::Clients => CLIENTS_TABLE,
            };
            let rows: Vec<VersionRow> = self
                .fetch_rows(&format!("/rest/v1/{table}?select=id,updated_at"), "version poll")
                .await?;
            Ok(rows
                .into_iter()
                .map(|r| RowVersion { id: r.id, updated_at: r.updated_at })
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let backend = RestBackend::new("https://db.example.org/", None, "documenten");
        assert_eq!(backend.base_url, "https://db.example.org");
        assert_eq!(
            backend.object_url("tasks/a/b.pdf"),
            "/storage/v1/object/documenten/tasks/a/b.pdf"
        );
    }

    #[test]
    fn copy_request_uses_storage_field_names() {
        let body = CopyRequest { bucket_id: "documenten", source_key: "a", destination_key: "b" };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"bucketId": "documenten", "sourceKey": "a", "destinationKey": "b"})
        );
    }

    #[test]
    fn api_error_prefers_message_field() {
        let err: ApiError =
            serde_json::from_str(r#"{"message":"JWT expired","error":"x"}"#).unwrap();
        assert_eq!(err.into_message(), "JWT expired");
    }

    #[tokio::test]
    async fn unreachable_server_reports_request_failure() {
        let backend = RestBackend::new("http://127.0.0.1:9", None, "documenten");
        let err = backend.fetch_tasks().await.unwrap_err();
        assert!(err.to_string().contains("task fetch request failed"));
    }
}
