use std::fmt::{self, Display};
use std::path::PathBuf;

/// What went wrong while touching the settings file.
#[derive(Debug)]
pub enum PersistenceErrorKind {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

/// Read, write or parse failure on the settings file.
#[derive(Debug)]
pub struct PersistenceError {
    pub path: PathBuf,
    pub kind: PersistenceErrorKind,
}

impl PersistenceError {
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        PersistenceError {
            path: path.into(),
            kind: PersistenceErrorKind::Io(err),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, err: serde_json::Error) -> Self {
        PersistenceError {
            path: path.into(),
            kind: PersistenceErrorKind::Parse(err),
        }
    }
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PersistenceErrorKind::Io(e) => {
                write!(f, "IO error on {}: {}", self.path.display(), e)
            }
            PersistenceErrorKind::Parse(e) => {
                write!(f, "Malformed settings in {}: {}", self.path.display(), e)
            }
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            PersistenceErrorKind::Io(e) => Some(e),
            PersistenceErrorKind::Parse(e) => Some(e),
        }
    }
}

/// An update or lookup named something that is not in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    pub what: String,
}

impl NotFound {
    pub fn new(what: impl Into<String>) -> Self {
        NotFound { what: what.into() }
    }
}

impl Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Not found: {}", self.what)
    }
}

impl std::error::Error for NotFound {}

/// Failure to acquire or store a secret.
#[derive(Debug)]
pub enum SecretError {
    Backend(String),
    Missing { profile: String },
}

impl Display for SecretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretError::Backend(msg) => write!(f, "Secret backend error: {}", msg),
            SecretError::Missing { profile } => {
                write!(f, "No stored password for profile '{}'", profile)
            }
        }
    }
}

impl std::error::Error for SecretError {}

impl From<keyring::Error> for SecretError {
    fn from(err: keyring::Error) -> Self {
        SecretError::Backend(err.to_string())
    }
}

/// Everything the settings manager can report back to the shell.
#[derive(Debug)]
pub enum StoreError {
    Persistence(PersistenceError),
    NotFound(NotFound),
    InvalidValue { key: String, reason: String },
    Secret(SecretError),
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        StoreError::Persistence(err)
    }
}

impl From<NotFound> for StoreError {
    fn from(err: NotFound) -> Self {
        StoreError::NotFound(err)
    }
}

impl From<SecretError> for StoreError {
    fn from(err: SecretError) -> Self {
        StoreError::Secret(err)
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Persistence(e) => write!(f, "{}", e),
            StoreError::NotFound(e) => write!(f, "{}", e),
            StoreError::InvalidValue { key, reason } => {
                write!(f, "Invalid value for '{}': {}", key, reason)
            }
            StoreError::Secret(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Persistence(e) => Some(e),
            StoreError::NotFound(e) => Some(e),
            StoreError::Secret(e) => Some(e),
            StoreError::InvalidValue { .. } => None,
        }
    }
}
