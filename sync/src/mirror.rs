//! Remote mirror client over a file-content API.
//!
//! Each file is written with a read-then-conditional-write: fetch the
//! current content hash, then send the new content with that hash as an
//! optimistic-concurrency precondition. A concurrent remote change makes
//! the server reject the write instead of silently overwriting; the error
//! surfaces through the sync status channel and is not retried in-pass.

use crate::{
    config::SyncConfig,
    error::{Result, SyncError},
};
use reqwest::header::ACCEPT;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use turnlog_engine::FileContent;

/// Default content API base.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const ACCEPT_JSON: &str = "application/vnd.github+json";

/// HTTP client for the remote repository's content API.
#[derive(Debug, Clone)]
pub struct MirrorClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for MirrorClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MirrorClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    /// Client against a non-default API base (test servers, enterprise
    /// installs).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn contents_url(&self, config: &SyncConfig, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url, config.owner, config.repo, path
        )
    }

    /// Fetch the current content hash for a path, if the file exists.
    ///
    /// Any failure here (missing file, network error, bad body) simply
    /// means the write proceeds without a precondition.
    async fn fetch_sha(&self, config: &SyncConfig, path: &str) -> Option<String> {
        let response = self
            .http
            .get(self.contents_url(config, path))
            .query(&[("ref", config.branch.as_str())])
            .header(ACCEPT, ACCEPT_JSON)
            .bearer_auth(&config.token)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let body: Value = response.json().await.ok()?;
        body.get("sha")
            .and_then(Value::as_str)
            .filter(|sha| !sha.is_empty())
            .map(str::to_string)
    }

    /// Create or update one remote file.
    pub async fn upsert_file(
        &self,
        config: &SyncConfig,
        path: &str,
        content_base64: &str,
        message: &str,
    ) -> Result<()> {
        let sha = self.fetch_sha(config, path).await;

        let mut body = json!({
            "message": message,
            "content": content_base64,
            "branch": config.branch,
        });
        if let Some(sha) = sha {
            body["sha"] = Value::String(sha);
        }

        let response = self
            .http
            .put(self.contents_url(config, path))
            .header(ACCEPT, ACCEPT_JSON)
            .bearer_auth(&config.token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::RemoteWrite {
                path: path.to_string(),
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }

    /// Mirror a full set of file payloads, sequentially and fail-fast:
    /// the first failed file aborts the remainder of the pass. Returns the
    /// number of files written.
    pub async fn push_all(
        &self,
        config: &SyncConfig,
        files: &BTreeMap<String, FileContent>,
    ) -> Result<usize> {
        if !config.is_complete() {
            return Err(SyncError::MissingConfig);
        }

        let mut count = 0;
        for (path, content) in files {
            tracing::debug!(path = %path, "mirroring file");
            self.upsert_file(config, path, &content.to_base64(), &format!("auto-sync {path}"))
                .await?;
            count += 1;
        }

        tracing::debug!(count, "mirror pass complete");
        Ok(count)
    }
}
