//! HTTP implementation of [`RemoteTransport`].
//!
//! Endpoints, relative to the base URL:
//!
//! | Call          | Request                                  | Success         |
//! |---------------|------------------------------------------|-----------------|
//! | `fetch_ref`   | `GET  /refs/{user}/{repo}/{branch}`      | 200, hex body   |
//! | `upload_batch`| `POST /upload-batch/{user}/{repo}` (raw) | any 2xx         |
//! | `update_ref`  | `POST /update-ref/{user}/{repo}` (JSON)  | any 2xx         |
//!
//! A non-200 answer to `fetch_ref` means the remote has no such branch.

use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use ctrlz_types::ObjectId;

use crate::error::{SyncError, SyncResult};
use crate::transport::RemoteTransport;
use crate::types::RefUpdate;

/// Blocking HTTP client bound to one remote repository.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    user: String,
    repo: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("repo", &self.repo)
            .finish()
    }
}

impl HttpTransport {
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self::with_client(Client::new(), base_url, user, repo)
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        user: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            user: user.into(),
            repo: repo.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}/{}/{}", self.base_url, endpoint, self.user, self.repo)
    }

    fn ensure_success(endpoint: &str, response: Response) -> SyncResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().unwrap_or_default();
        Err(SyncError::RemoteStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

impl RemoteTransport for HttpTransport {
    fn fetch_ref(&self, branch: &str) -> SyncResult<Option<ObjectId>> {
        let url = format!("{}/{}", self.url("refs"), branch);
        let response = self.client.get(&url).send()?;
        if response.status() != reqwest::StatusCode::OK {
            debug!(%url, status = response.status().as_u16(), "remote has no ref");
            return Ok(None);
        }
        let body = response.text()?;
        let hex = body.trim();
        if hex.is_empty() {
            return Ok(None);
        }
        ObjectId::from_hex(hex)
            .map(Some)
            .map_err(|_| SyncError::InvalidRemoteRef(hex.to_string()))
    }

    fn upload_batch(&self, batch: &[u8]) -> SyncResult<()> {
        let url = self.url("upload-batch");
        debug!(%url, bytes = batch.len(), "uploading batch");
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(batch.to_vec())
            .send()?;
        Self::ensure_success("upload-batch", response)
    }

    fn update_ref(&self, branch: &str, head: &ObjectId) -> SyncResult<()> {
        let url = self.url("update-ref");
        let body = RefUpdate {
            branch: branch.to_string(),
            hash: head.to_hex(),
        };
        let response = self.client.post(&url).json(&body).send()?;
        Self::ensure_success("update-ref", response)
    }
}
