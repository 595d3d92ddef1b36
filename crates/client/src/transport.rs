//! Capability interfaces for the two backend collaborators.
//!
//! - [`Transport`] submits one request and returns the decoded JSON envelope.
//! - [`Uploader`] accepts a binary blob with an optional display name and returns the stored
//!   media descriptor.
//!
//! [`crate::HttpTransport`] implements both against the real backend. Services are generic over
//! these traits so they can run against in-memory fakes.

use crate::models::Media;
use crate::ClientResult;
use async_trait::async_trait;
use cms_types::EntryId;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// A request against a resource path relative to the base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    /// Encoded query string, without the leading `?`.
    pub query: Option<String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>, query: Option<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: query.filter(|q| !q.is_empty()),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: None,
            body: Some(body),
        }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Put,
            path: path.into(),
            query: None,
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            query: None,
            body: None,
        }
    }
}

/// Submits requests to the backend.
///
/// Implementations return the response body as JSON (`Value::Null` for an empty body) and map
/// non-success statuses to [`crate::ClientError::from_status`]. No retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ClientResult<Value>;
}

/// Stores binary files.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Uploads `blob`. `name` overrides the file name recorded by the backend.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::UploadFailed`] when the reply cannot be read as a media
    /// descriptor.
    async fn upload(&self, blob: Vec<u8>, name: Option<String>) -> ClientResult<Media>;

    /// Deletes an uploaded file by its numeric entry id.
    async fn delete_file(&self, id: EntryId) -> ClientResult<()>;
}
