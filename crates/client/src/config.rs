//! Client runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the transport and
//! services. Nothing in this crate reads process environment variables while handling a request.
//!
//! Values come in layers. Each [`ConfigLayer`] carries optional settings; layers are merged with
//! later layers winning, and the result is validated into a [`ClientConfig`]:
//!
//! ```text
//! defaults  <  YAML file  <  environment  <  command-line flags
//! ```

use crate::constants::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_FILE};
use crate::{ClientError, ClientResult};
use cms_query::DEFAULT_PAGE_SIZE;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Client configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: String,
    timeout: Duration,
    token_file: PathBuf,
    page_size: u32,
}

impl ClientConfig {
    /// Create a new `ClientConfig`.
    ///
    /// The base URL must be absolute `http` or `https`; a trailing `/` is removed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for a malformed base URL, a zero timeout, or a zero
    /// page size.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        token_file: PathBuf,
        page_size: u32,
    ) -> ClientResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        let has_scheme = base_url.starts_with("http://") || base_url.starts_with("https://");
        let host = base_url.split_once("://").map(|(_, rest)| rest).unwrap_or("");
        if !has_scheme || host.is_empty() {
            return Err(ClientError::Config(format!(
                "base URL must start with http:// or https://, got '{base_url}'"
            )));
        }
        if timeout.is_zero() {
            return Err(ClientError::Config("timeout must be greater than zero".into()));
        }
        if page_size == 0 {
            return Err(ClientError::Config("page size must be at least 1".into()));
        }

        Ok(Self {
            base_url,
            timeout,
            token_file,
            page_size,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn token_file(&self) -> &Path {
        &self.token_file
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One layer of optional settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub token_file: Option<PathBuf>,
    pub page_size: Option<u32>,
}

impl ConfigLayer {
    /// Reads a YAML configuration file.
    ///
    /// This uses `serde_path_to_error` so that an unknown or mistyped key is reported with its
    /// path.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::FileRead`] if the file cannot be read and
    /// [`ClientError::Config`] if it does not match the expected schema.
    pub fn from_yaml_file(path: &Path) -> ClientResult<Self> {
        let text = std::fs::read_to_string(path).map_err(ClientError::FileRead)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> ClientResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let deserializer = serde_yaml::Deserializer::from_str(text);
        serde_path_to_error::deserialize::<_, Self>(deserializer).map_err(|err| {
            let path = err.path().to_string();
            let path = if path.is_empty() { "<root>" } else { path.as_str() };
            ClientError::Config(format!(
                "configuration mismatch at {path}: {}",
                err.into_inner()
            ))
        })
    }

    /// Builds a layer from raw environment values, treating blank values as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the timeout is not a whole number of seconds.
    pub fn from_env_values(
        base_url: Option<String>,
        timeout_secs: Option<String>,
        token_file: Option<String>,
    ) -> ClientResult<Self> {
        fn non_blank(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let timeout_secs = non_blank(timeout_secs)
            .map(|v| {
                v.parse::<u64>().map_err(|_| {
                    ClientError::Config(format!("timeout must be whole seconds, got '{v}'"))
                })
            })
            .transpose()?;

        Ok(Self {
            base_url: non_blank(base_url),
            timeout_secs,
            token_file: non_blank(token_file).map(PathBuf::from),
            page_size: None,
        })
    }

    /// Overlays `other` on `self`; settings present in `other` win.
    pub fn merge(self, other: ConfigLayer) -> Self {
        Self {
            base_url: other.base_url.or(self.base_url),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            token_file: other.token_file.or(self.token_file),
            page_size: other.page_size.or(self.page_size),
        }
    }

    /// Fills unset values with defaults and validates the result.
    pub fn resolve(self) -> ClientResult<ClientConfig> {
        ClientConfig::new(
            self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            self.token_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE)),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_resolve_to_local_backend() {
        let cfg = ConfigLayer::default().resolve().expect("defaults are valid");
        assert_eq!(cfg.base_url(), "http://localhost:1337/api");
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.page_size(), 12);
    }

    #[test]
    fn later_layers_win() {
        let file = ConfigLayer {
            base_url: Some("http://cms.internal/api".into()),
            timeout_secs: Some(30),
            ..Default::default()
        };
        let env = ConfigLayer::from_env_values(None, Some(" 5 ".into()), Some("".into())).unwrap();
        let cfg = file.merge(env).resolve().unwrap();
        assert_eq!(cfg.base_url(), "http://cms.internal/api");
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.token_file(), Path::new(DEFAULT_TOKEN_FILE));
    }

    #[test]
    fn trailing_slash_is_trimmed_and_scheme_required() {
        let cfg = ClientConfig::new(
            "https://cms.example.org/api/",
            Duration::from_secs(1),
            PathBuf::from("s.json"),
            10,
        )
        .unwrap();
        assert_eq!(cfg.base_url(), "https://cms.example.org/api");

        let err = ClientConfig::new("cms.example.org", Duration::from_secs(1), "s".into(), 10)
            .expect_err("scheme required");
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let err = ConfigLayer::from_env_values(None, Some("ten".into()), None).unwrap_err();
        assert!(err.to_string().contains("ten"));
    }

    #[test]
    fn yaml_file_is_strict() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "base_url: http://10.0.0.5:1337/api\npage_size: 20").unwrap();
        let layer = ConfigLayer::from_yaml_file(file.path()).unwrap();
        assert_eq!(layer.page_size, Some(20));

        let err = ConfigLayer::from_yaml_str("base_url: x\nretries: 3\n").unwrap_err();
        match err {
            ClientError::Config(msg) => assert!(msg.contains("retries")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }
}
