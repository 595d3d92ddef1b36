use cms_query::QueryError;
use cms_types::{IdError, TextError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    Server(String),
    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("not logged in")]
    NotLoggedIn,

    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize request: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize response: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),

    #[error("invalid query: {0}")]
    Query(#[from] QueryError),
    #[error("invalid identifier: {0}")]
    Id(#[from] IdError),
    #[error("invalid text: {0}")]
    Text(#[from] TextError),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Maps a non-success HTTP status to its error category.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => ClientError::Unauthorized(message),
            403 => ClientError::Forbidden(message),
            404 => ClientError::NotFound(message),
            500 => ClientError::Server(message),
            _ => ClientError::Http { status, message },
        }
    }

    /// HTTP status behind this error, when it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Forbidden(_) => Some(403),
            ClientError::NotFound(_) => Some(404),
            ClientError::Server(_) => Some(500),
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Short notification text for an operator.
    ///
    /// 401, 403, 404 and 500 each have a fixed message. Other HTTP and network failures show
    /// the underlying message, or a generic one when there is none.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Unauthorized(_) | ClientError::NotLoggedIn => {
                "Login expired, please log in again".into()
            }
            ClientError::Forbidden(_) => "You do not have permission to perform this action".into(),
            ClientError::NotFound(_) => "The requested resource does not exist".into(),
            ClientError::Server(_) => "Internal server error".into(),
            ClientError::Http { message, .. } if !message.trim().is_empty() => message.clone(),
            ClientError::Http { .. } => "Network request failed".into(),
            ClientError::Transport(e) if e.is_timeout() => "Request timed out".into(),
            ClientError::Transport(_) => "Network request failed".into(),
            other => other.to_string(),
        }
    }

    /// True when the caller should authenticate again before retrying.
    pub fn requires_login(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_) | ClientError::NotLoggedIn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_have_distinct_messages() {
        let messages: Vec<String> = [401, 403, 404, 500]
            .into_iter()
            .map(|s| ClientError::from_status(s, "x").user_message())
            .collect();
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(messages[0], "Login expired, please log in again");
    }

    #[test]
    fn other_statuses_use_backend_message_or_generic_text() {
        let err = ClientError::from_status(400, "Name must be defined");
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.user_message(), "Name must be defined");

        let err = ClientError::from_status(502, "");
        assert_eq!(err.user_message(), "Network request failed");
    }

    #[test]
    fn only_auth_failures_require_login() {
        assert!(ClientError::from_status(401, "").requires_login());
        assert!(ClientError::NotLoggedIn.requires_login());
        assert!(!ClientError::from_status(403, "").requires_login());
    }
}
