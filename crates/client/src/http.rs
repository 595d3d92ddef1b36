//! reqwest-backed [`Transport`] and [`Uploader`].
//!
//! Every request carries the stored bearer token, if any. Non-success statuses become
//! [`ClientError::from_status`] errors carrying the backend's `error.message`; a 401 also clears
//! the stored session so the next command starts logged out.

use crate::auth::TokenStore;
use crate::config::ClientConfig;
use crate::constants::{DEFAULT_UPLOAD_NAME, UPLOAD_FIELD_NAME, UPLOAD_FILES_PATH, UPLOAD_PATH};
use crate::models::Media;
use crate::transport::{ApiRequest, Method, Transport, Uploader};
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use cms_types::EntryId;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use std::sync::Arc;

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl HttpTransport {
    /// Builds the HTTP client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the TLS backend cannot be initialised.
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, query: Option<&str>) -> String {
        join_url(&self.base_url, path, query)
    }

    fn authorize(&self, builder: RequestBuilder) -> ClientResult<RequestBuilder> {
        Ok(match self.tokens.load()? {
            Some(session) => builder.bearer_auth(session.jwt),
            None => builder,
        })
    }

    async fn read_response(&self, response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();
        let text = response.text().await?;
        interpret_reply(status, &text, self.tokens.as_ref())
    }
}

/// Turns a status and body into the decoded reply or a status error. A 401 clears `tokens`.
fn interpret_reply(status: StatusCode, body: &str, tokens: &dyn TokenStore) -> ClientResult<Value> {
    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(body).map_err(ClientError::Deserialization);
    }

    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!("backend rejected the session; clearing stored token");
        if let Err(e) = tokens.clear() {
            tracing::warn!("failed to clear stored token: {}", e);
        }
    }

    let message = error_message(body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
    tracing::debug!("request failed with {}: {}", status, message);
    Err(ClientError::from_status(status.as_u16(), message))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> ClientResult<Value> {
        let url = self.url(&request.path, request.query.as_deref());
        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        tracing::debug!("{}", request_summary(&request));
        let response = self.authorize(builder)?.send().await?;
        self.read_response(response).await
    }
}

#[async_trait]
impl Uploader for HttpTransport {
    async fn upload(&self, blob: Vec<u8>, name: Option<String>) -> ClientResult<Media> {
        let mime = infer::get(&blob)
            .map(|kind| kind.mime_type())
            .unwrap_or("application/octet-stream");
        let file_name = name.unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());
        let size = blob.len();

        let part = Part::bytes(blob).file_name(file_name.clone()).mime_str(mime)?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        tracing::debug!("uploading {} ({} bytes, {})", file_name, size, mime);
        let builder = self.client.post(self.url(UPLOAD_PATH, None)).multipart(form);
        let response = self.authorize(builder)?.send().await?;
        let reply = self.read_response(response).await?;
        Media::from_upload_response(reply)
    }

    async fn delete_file(&self, id: EntryId) -> ClientResult<()> {
        self.send(ApiRequest::delete(format!("{UPLOAD_FILES_PATH}/{id}")))
            .await?;
        Ok(())
    }
}

/// Method, path and query length. Query strings carry search keywords, so they stay out of logs.
fn request_summary(request: &ApiRequest) -> String {
    format!(
        "{:?} {} ({} query bytes)",
        request.method,
        request.path,
        request.query.as_deref().map_or(0, str::len)
    )
}

fn join_url(base: &str, path: &str, query: Option<&str>) -> String {
    let mut url = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Message from a backend error body (`{ "error": { "message": ... } }`), falling back to the
/// raw text.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => value
            .pointer("/error/message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string),
        Err(_) => Some(body.to_string()),
    }
}
