use log::debug;

use crate::errors::SecretError;
use crate::profile::{PasswordSource, Profile};
use crate::tree::NodeId;

/// Keyring service name all profile passwords are filed under.
pub const KEYRING_SERVICE: &str = "conman";

/// Somewhere passwords live outside the settings file.
pub trait SecretBackend {
    fn get(&self, id: &NodeId) -> Result<Option<String>, SecretError>;
    fn set(&self, id: &NodeId, secret: &str) -> Result<(), SecretError>;
    /// `Ok(true)` if a secret was removed, `Ok(false)` if none was stored.
    fn delete(&self, id: &NodeId) -> Result<bool, SecretError>;
}

/// The platform credential store (Keychain, Credential Manager, keyutils).
#[derive(Debug, Clone, Default)]
pub struct KeyringBackend;

impl KeyringBackend {
    fn entry(id: &NodeId) -> Result<keyring::Entry, SecretError> {
        Ok(keyring::Entry::new(KEYRING_SERVICE, &id.to_string())?)
    }
}

impl SecretBackend for KeyringBackend {
    fn get(&self, id: &NodeId) -> Result<Option<String>, SecretError> {
        match Self::entry(id)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, id: &NodeId, secret: &str) -> Result<(), SecretError> {
        Self::entry(id)?.set_password(secret)?;
        debug!("Stored keyring secret for {}", id);
        Ok(())
    }

    fn delete(&self, id: &NodeId) -> Result<bool, SecretError> {
        match Self::entry(id)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Fetch the password a profile should connect with. Only called at launch time.
pub fn resolve_password(
    profile: &Profile,
    backend: &dyn SecretBackend,
) -> Result<String, SecretError> {
    match profile.password_source {
        PasswordSource::Inline => Ok(profile.password.clone()),
        PasswordSource::Keyring => backend
            .get(&profile.id)?
            .ok_or_else(|| SecretError::Missing {
                profile: profile.name.clone(),
            }),
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemoryBackend;
    use super::*;
    use crate::profile::Protocol;

    #[test]
    fn inline_password_is_used_verbatim() {
        let profile = Profile::new("p", "h", Protocol::Rdp).with_password("s3cret");
        let backend = MemoryBackend::default();
        assert_eq!(resolve_password(&profile, &backend).unwrap(), "s3cret");
    }

    #[test]
    fn keyring_password_is_looked_up_by_id() {
        let mut profile = Profile::new("p", "h", Protocol::Rdp);
        profile.password_source = PasswordSource::Keyring;
        let backend = MemoryBackend::default();

        let err = resolve_password(&profile, &backend).unwrap_err();
        assert!(matches!(err, SecretError::Missing { .. }));

        backend.set(&profile.id, "from-keyring").unwrap();
        assert_eq!(resolve_password(&profile, &backend).unwrap(), "from-keyring");
        assert!(backend.delete(&profile.id).unwrap());
        assert!(!backend.delete(&profile.id).unwrap());
    }
}
