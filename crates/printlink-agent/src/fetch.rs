// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document download into scratch storage.
//
// Each document lands at `<scratch>/<sha256(url)>`, so a re-sent command for
// the same URL overwrites rather than accumulates.

use std::future::Future;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use printlink_core::error::{AgentError, Result};

/// MIME type assumed when the server does not send `Content-Type`.
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A document written to scratch storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub path: PathBuf,
    pub mime_type: String,
}

impl FetchedDocument {
    /// File name used as the IPP `job-name`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Downloads print documents.
pub trait DocumentFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedDocument>> + Send;
}

/// Fetcher over plain HTTP(S) GET.
pub struct HttpFetcher {
    client: reqwest::Client,
    scratch_dir: PathBuf,
}

impl HttpFetcher {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Scratch location for a document URL.
    pub fn scratch_path(&self, url: &str) -> PathBuf {
        self.scratch_dir
            .join(hex::encode(Sha256::digest(url.as_bytes())))
    }
}

impl DocumentFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        let path = self.scratch_path(url);
        info!(path = %path.display(), "downloading document");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AgentError::Transport(format!("failed to download document: {e}")))?;

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_owned();

        let mut file = tokio::fs::File::create(&path).await?;
        let mut written = 0usize;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AgentError::Transport(format!("failed to download document: {e}")))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;

        debug!(bytes = written, mime = %mime_type, "document downloaded");
        Ok(FetchedDocument { path, mime_type })
    }
}

/// Remove a scratch file once it is no longer needed.
pub async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        debug!(path = %path.display(), error = %e, "could not remove scratch file");
    }
}
