//! API key storage and validation.
//!
//! The key and its SHA-256 digest are written to two scopes: a session scope
//! that decides whether the user is logged in, and a persistent scope that
//! survives the session. Both hold the same two names.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use aoiwatch_client::MonitoringClient;
use sha2::{Digest, Sha256};

use crate::error::DashboardError;

pub const API_KEY_NAME: &str = "apiKey";
pub const API_KEY_HASH_NAME: &str = "apiKeyHash";

/// Lowercase hex SHA-256 digest of `key`.
#[must_use]
pub fn hash_api_key(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

/// A key/value storage scope for credentials.
pub trait CredentialScope: Send + Sync {
    /// # Errors
    ///
    /// Returns a storage error if the scope cannot be read.
    fn get(&self, name: &str) -> Result<Option<String>, DashboardError>;

    /// # Errors
    ///
    /// Returns a storage error if the scope cannot be written.
    fn set(&self, name: &str, value: &str) -> Result<(), DashboardError>;

    /// # Errors
    ///
    /// Returns a storage error if the scope cannot be written.
    fn remove(&self, name: &str) -> Result<(), DashboardError>;
}

/// Scope that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryScope {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialScope for MemoryScope {
    fn get(&self, name: &str) -> Result<Option<String>, DashboardError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<(), DashboardError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), DashboardError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(name);
        Ok(())
    }
}

/// Scope backed by a flat JSON object on disk.
///
/// The file is re-read on every access so separate processes sharing it see
/// each other's writes. A missing file is an empty scope.
#[derive(Debug, Clone)]
pub struct FileScope {
    path: PathBuf,
}

impl FileScope {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, DashboardError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.storage_error(e)),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| DashboardError::StorageFormat {
            path: self.path.display().to_string(),
            source: e,
        })
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), DashboardError> {
        if values.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(self.storage_error(e)),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent).map_err(|e| self.storage_error(e))?;
        }
        let body = serde_json::to_string_pretty(values).map_err(|e| {
            DashboardError::StorageFormat {
                path: self.path.display().to_string(),
                source: e,
            }
        })?;
        write_private(&self.path, body.as_bytes()).map_err(|e| self.storage_error(e))
    }

    fn storage_error(&self, source: std::io::Error) -> DashboardError {
        DashboardError::Storage {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// Creates `dir` (owner-only on unix) and refuses a directory other users
/// could write into, since they could replace the credential file.
#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)?;
    let mode = std::fs::metadata(dir)?.permissions().mode();
    let shared_writable = mode & 0o022 != 0;
    let sticky = mode & 0o1000 != 0;
    if shared_writable && !sticky {
        return Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("{} is writable by other users", dir.display()),
        ));
    }
    Ok(())
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

/// Writes `body` readable by the owner only on unix, tightening files left
/// by older versions too.
#[cfg(unix)]
fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    use std::io::Write as _;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(body)
}

#[cfg(not(unix))]
fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, body)
}

impl CredentialScope for FileScope {
    fn get(&self, name: &str) -> Result<Option<String>, DashboardError> {
        Ok(self.read_all()?.remove(name))
    }

    fn set(&self, name: &str, value: &str) -> Result<(), DashboardError> {
        let mut values = self.read_all()?;
        values.insert(name.to_owned(), value.to_owned());
        self.write_all(&values)
    }

    fn remove(&self, name: &str) -> Result<(), DashboardError> {
        let mut values = self.read_all()?;
        if values.remove(name).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

/// An API key and its digest.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub api_key: String,
    pub api_key_hash: String,
}

impl Credential {
    #[must_use]
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_owned(),
            api_key_hash: hash_api_key(api_key),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &"[redacted]")
            .field("api_key_hash", &self.api_key_hash)
            .finish()
    }
}

pub struct CredentialStore {
    session: Box<dyn CredentialScope>,
    persistent: Box<dyn CredentialScope>,
    current: Option<Credential>,
    login_required: bool,
}

impl CredentialStore {
    /// Opens the store, taking the current credential from the session scope
    /// and falling back to the persistent one.
    ///
    /// # Errors
    ///
    /// Returns a storage error if either scope cannot be read.
    pub fn load(
        session: Box<dyn CredentialScope>,
        persistent: Box<dyn CredentialScope>,
    ) -> Result<Self, DashboardError> {
        let current = match session.get(API_KEY_NAME)? {
            Some(key) => Some(key),
            None => persistent.get(API_KEY_NAME)?,
        }
        .map(|api_key| Credential::new(&api_key));
        Ok(Self {
            session,
            persistent,
            current,
            login_required: false,
        })
    }

    /// In-memory store for tests and throwaway sessions.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            session: Box::new(MemoryScope::new()),
            persistent: Box::new(MemoryScope::new()),
            current: None,
            login_required: false,
        }
    }

    /// Checks `api_key` against the provider and stores it on success.
    ///
    /// # Errors
    ///
    /// - [`DashboardError::Authentication`] if the provider rejects the key
    ///   or cannot be reached.
    /// - A storage error if the validated key cannot be saved.
    pub async fn validate(
        &mut self,
        client: &MonitoringClient,
        api_key: &str,
    ) -> Result<(), DashboardError> {
        if let Err(e) = client.probe_api_key(api_key).await {
            tracing::warn!(error = %e, "API key rejected");
            return Err(DashboardError::Authentication(e));
        }
        self.save_api_key(api_key)
    }

    /// Stores `api_key` and its digest in both scopes.
    ///
    /// The session scope is cleared again if the persistent write fails, so
    /// a failed save never leaves the store logged in.
    ///
    /// # Errors
    ///
    /// Returns a storage error if either scope cannot be written.
    pub fn save_api_key(&mut self, api_key: &str) -> Result<(), DashboardError> {
        let credential = Credential::new(api_key);
        let saved = write_credential(self.session.as_ref(), &credential)
            .and_then(|()| write_credential(self.persistent.as_ref(), &credential));
        if let Err(e) = saved {
            for name in [API_KEY_NAME, API_KEY_HASH_NAME] {
                if let Err(cleanup) = self.session.remove(name) {
                    tracing::warn!(error = %cleanup, "could not clear session after failed save");
                }
            }
            return Err(e);
        }
        self.current = Some(credential);
        self.login_required = false;
        Ok(())
    }

    /// Removes the credential from both scopes and flags that a new login is needed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if either scope cannot be written.
    pub fn logout(&mut self) -> Result<(), DashboardError> {
        for scope in [&self.session, &self.persistent] {
            scope.remove(API_KEY_NAME)?;
            scope.remove(API_KEY_HASH_NAME)?;
        }
        self.current = None;
        self.login_required = true;
        Ok(())
    }

    /// True iff the session scope holds an API key.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the session scope cannot be read.
    pub fn is_valid(&self) -> Result<bool, DashboardError> {
        Ok(self.session.get(API_KEY_NAME)?.is_some())
    }

    /// Raises the login-required flag when the session has no key, and returns it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the session scope cannot be read.
    pub fn check_auth(&mut self) -> Result<bool, DashboardError> {
        if !self.is_valid()? {
            self.login_required = true;
        }
        Ok(self.login_required)
    }

    #[must_use]
    pub fn login_required(&self) -> bool {
        self.login_required
    }

    /// The credential loaded at startup or saved since, from either scope.
    #[must_use]
    pub fn current(&self) -> Option<&Credential> {
        self.current.as_ref()
    }

    /// The credential API calls authenticate with, read from the session scope.
    ///
    /// # Errors
    ///
    /// - [`DashboardError::NotAuthenticated`] if the session holds no key.
    /// - A storage error if the session scope cannot be read.
    pub fn session_credential(&self) -> Result<Credential, DashboardError> {
        let api_key = self
            .session
            .get(API_KEY_NAME)?
            .ok_or(DashboardError::NotAuthenticated)?;
        let api_key_hash = self
            .session
            .get(API_KEY_HASH_NAME)?
            .unwrap_or_else(|| hash_api_key(&api_key));
        Ok(Credential {
            api_key,
            api_key_hash,
        })
    }
}

fn write_credential(
    scope: &dyn CredentialScope,
    credential: &Credential,
) -> Result<(), DashboardError> {
    scope.set(API_KEY_NAME, &credential.api_key)?;
    scope.set(API_KEY_HASH_NAME, &credential.api_key_hash)
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("current", &self.current)
            .field("login_required", &self.login_required)
            .finish_non_exhaustive()
    }
}
