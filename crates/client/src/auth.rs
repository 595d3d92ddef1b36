//! Session persistence and login.
//!
//! A [`Session`] is the bearer token issued by the backend plus the user profile it returned.
//! The transport reads the token from a [`TokenStore`] before every request and clears the
//! store when the backend answers 401.

use crate::constants::AUTH_LOCAL_PATH;
use crate::transport::{ApiRequest, Transport};
use crate::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Bearer token and the user profile returned at login.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub jwt: String,
    #[serde(default)]
    pub user: Option<Value>,
}

impl Session {
    /// Display name of the logged-in user, if the profile carries one.
    pub fn username(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|u| u.get("username").or_else(|| u.get("email")))
            .and_then(Value::as_str)
    }
}

/// Persistent storage for the current session.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> ClientResult<Option<Session>>;
    fn save(&self, session: &Session) -> ClientResult<()>;
    fn clear(&self) -> ClientResult<()>;
}

/// Stores the session as JSON in a single file.
#[derive(Clone, Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> ClientResult<Option<Session>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ClientError::FileRead(e)),
        };

        match serde_json::from_str::<Session>(&text) {
            Ok(session) if !session.jwt.trim().is_empty() => Ok(Some(session)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!(
                    "ignoring unreadable session file {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> ClientResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(ClientError::FileWrite)?;
        }
        let text = serde_json::to_string_pretty(session).map_err(ClientError::Serialization)?;
        write_private(&self.path, text.as_bytes()).map_err(ClientError::FileWrite)
    }

    fn clear(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::FileWrite(e)),
        }
    }
}

/// Writes `contents` readable by the owner only. An existing file is narrowed to 0600 as well.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write as _;
    use std::os::unix::fs::{OpenOptionsExt as _, PermissionsExt as _};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

/// In-process session storage.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    session: Mutex<Option<Session>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        // A poisoned lock still holds a usable Option.
        self.session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> ClientResult<Option<Session>> {
        Ok(self.lock().clone())
    }

    fn save(&self, session: &Session) -> ClientResult<()> {
        *self.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.lock() = None;
        Ok(())
    }
}

/// Logs in with an identifier (username or email) and password and stores the session.
///
/// # Errors
///
/// Returns [`ClientError::InvalidInput`] for blank credentials, the transport's error for a
/// rejected login, and [`ClientError::InvalidResponse`] if the reply carries no token.
pub async fn login<T>(
    transport: &T,
    store: &dyn TokenStore,
    identifier: &str,
    password: &str,
) -> ClientResult<Session>
where
    T: Transport + ?Sized,
{
    if identifier.trim().is_empty() || password.is_empty() {
        return Err(ClientError::InvalidInput(
            "identifier and password are required".into(),
        ));
    }

    let body = json!({ "identifier": identifier.trim(), "password": password });
    let reply = transport
        .send(ApiRequest::post(AUTH_LOCAL_PATH, body))
        .await?;

    let session: Session = serde_json::from_value(reply)
        .map_err(|e| ClientError::InvalidResponse(format!("login reply: {e}")))?;
    if session.jwt.trim().is_empty() {
        return Err(ClientError::InvalidResponse("login reply has an empty token".into()));
    }

    store.save(&session)?;
    tracing::info!(
        "logged in as {}",
        session.username().unwrap_or(identifier.trim())
    );
    Ok(session)
}

/// Forgets the stored session.
pub fn logout(store: &dyn TokenStore) -> ClientResult<()> {
    store.clear()
}

/// Returns the stored session or [`ClientError::NotLoggedIn`].
pub fn require_session(store: &dyn TokenStore) -> ClientResult<Session> {
    store.load()?.ok_or(ClientError::NotLoggedIn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use crate::transport::Method;
    use tempfile::TempDir;

    fn session() -> Session {
        Session {
            jwt: "eyJhbGciOi.test.token".into(),
            user: Some(json!({ "id": 1, "username": "lisi" })),
        }
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileTokenStore::new(dir.path().join("nested/session.json"));

        assert_eq!(store.load().unwrap(), None);
        store.save(&session()).unwrap();
        assert_eq!(store.load().unwrap(), Some(session()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().expect("clearing twice is fine");
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private_to_the_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        FileTokenStore::new(&path).save(&session()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(FileTokenStore::new(&path).load().unwrap(), Some(session()));
    }

    #[test]
    fn corrupt_session_file_reads_as_logged_out() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(FileTokenStore::new(path).load().unwrap(), None);
    }

    #[tokio::test]
    async fn login_posts_credentials_and_saves_session() {
        let transport = FakeTransport::new(|req| {
            assert_eq!(req.method, Method::Post);
            assert_eq!(req.path, "auth/local");
            assert_eq!(
                req.body,
                Some(json!({ "identifier": "lisi", "password": "secret" }))
            );
            Ok(json!({ "jwt": "tok", "user": { "username": "lisi" } }))
        });
        let store = MemoryTokenStore::new();

        let session = login(&transport, &store, " lisi ", "secret").await.unwrap();
        assert_eq!(session.username(), Some("lisi"));
        assert_eq!(require_session(&store).unwrap().jwt, "tok");

        logout(&store).unwrap();
        assert!(matches!(
            require_session(&store),
            Err(ClientError::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn login_without_token_in_reply_fails() {
        let transport = FakeTransport::new(|_| Ok(json!({ "user": {} })));
        let store = MemoryTokenStore::new();
        let err = login(&transport, &store, "lisi", "pw").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
        assert_eq!(store.load().unwrap(), None);
    }
}
