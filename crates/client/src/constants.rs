//! Constants used throughout the CMS client crate.
//!
//! Resource paths are relative to the configured base URL.

/// Base URL of the CMS REST API when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:1337/api";

/// Request timeout in seconds when nothing else is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Session file location, relative to the working directory, when nothing else is configured.
pub const DEFAULT_TOKEN_FILE: &str = ".hcms/session.json";

/// Patient collection.
pub const PATIENTS_PATH: &str = "patients";

/// Treatment record collection.
pub const TREATMENTS_PATH: &str = "treatments";

/// Upload endpoint (multipart).
pub const UPLOAD_PATH: &str = "upload";

/// Uploaded file resources, addressed by numeric entry id.
pub const UPLOAD_FILES_PATH: &str = "upload/files";

/// Local identifier/password login.
pub const AUTH_LOCAL_PATH: &str = "auth/local";

/// Multipart field name the upload endpoint reads.
pub const UPLOAD_FIELD_NAME: &str = "files";

/// File name sent for uploads that carry no name of their own.
pub const DEFAULT_UPLOAD_NAME: &str = "upload.bin";

/// Environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "HCMS_BASE_URL";

/// Environment variable overriding the request timeout (seconds).
pub const ENV_TIMEOUT_SECS: &str = "HCMS_TIMEOUT_SECS";

/// Environment variable overriding the session file location.
pub const ENV_TOKEN_FILE: &str = "HCMS_TOKEN_FILE";

/// Environment variable naming a YAML configuration file.
pub const ENV_CONFIG_FILE: &str = "HCMS_CONFIG";
