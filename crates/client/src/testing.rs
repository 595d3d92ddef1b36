//! In-memory collaborators for service tests.

use crate::models::Media;
use crate::transport::{ApiRequest, Transport, Uploader};
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use cms_types::EntryId;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

type Handler = dyn Fn(&ApiRequest) -> ClientResult<Value> + Send + Sync;

/// Answers every request with `handler` and records what was sent.
pub(crate) struct FakeTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub(crate) fn new<F>(handler: F) -> Self
    where
        F: Fn(&ApiRequest) -> ClientResult<Value> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> ClientResult<Value> {
        let reply = (self.handler)(&request);
        self.requests.lock().unwrap().push(request);
        reply
    }
}

/// Hands out sequential media ids. Names containing `fail_marker` are rejected.
pub(crate) struct FakeUploader {
    next_id: AtomicU64,
    fail_marker: Option<String>,
    uploads: Mutex<Vec<(Option<String>, usize)>>,
    deleted: Mutex<Vec<EntryId>>,
}

impl FakeUploader {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            fail_marker: None,
            uploads: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_on(marker: impl Into<String>) -> Self {
        Self {
            fail_marker: Some(marker.into()),
            ..Self::new()
        }
    }

    /// `(name, byte count)` of every accepted upload.
    pub(crate) fn uploads(&self) -> Vec<(Option<String>, usize)> {
        self.uploads.lock().unwrap().clone()
    }

    pub(crate) fn deleted(&self) -> Vec<EntryId> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Uploader for FakeUploader {
    async fn upload(&self, blob: Vec<u8>, name: Option<String>) -> ClientResult<Media> {
        if let (Some(marker), Some(n)) = (&self.fail_marker, &name) {
            if n.contains(marker.as_str()) {
                return Err(ClientError::UploadFailed(format!("rejected {n}")));
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let file_name = name.clone().unwrap_or_else(|| "upload.bin".into());
        self.uploads.lock().unwrap().push((name, blob.len()));
        Ok(Media {
            id: EntryId(id),
            document_id: None,
            url: format!("/uploads/{file_name}"),
            name: file_name,
            width: None,
            height: None,
            size: Some(blob.len() as f64 / 1024.0),
            mime: None,
            formats: None,
        })
    }

    async fn delete_file(&self, id: EntryId) -> ClientResult<()> {
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}
