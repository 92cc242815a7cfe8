use std::fmt::{self, Display};

use conman_storage::SecretError;

/// Why a profile could not be launched.
///
/// Only the spawn itself is observed; failures inside the external client
/// (bad host, refused login) never show up here.
#[derive(Debug)]
pub enum LaunchError {
    SpawnFailed {
        program: String,
        source: std::io::Error,
    },
    Credential(SecretError),
}

impl From<SecretError> for LaunchError {
    fn from(err: SecretError) -> Self {
        LaunchError::Credential(err)
    }
}

impl Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchError::SpawnFailed { program, source } => {
                write!(f, "Failed to spawn '{}': {}", program, source)
            }
            LaunchError::Credential(e) => write!(f, "Credential error: {}", e),
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaunchError::SpawnFailed { source, .. } => Some(source),
            LaunchError::Credential(e) => Some(e),
        }
    }
}
