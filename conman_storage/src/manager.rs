use log::{error, info};
use serde_json::Value;

use crate::document::{parse_hex_color, SettingsDocument};
use crate::errors::{NotFound, StoreError};
use crate::profile::{PasswordSource, Profile};
use crate::secrets::SecretBackend;
use crate::store::SettingsStore;
use crate::tree::{Node, NodeId, ProfileTree};

/// The loaded settings document plus the store it persists to.
///
/// Loaded once; every mutation rewrites the whole file before returning.
/// Passed explicitly to whatever needs settings, there is no global instance.
#[derive(Debug)]
pub struct SettingsManager {
    store: SettingsStore,
    doc: SettingsDocument,
}

impl SettingsManager {
    pub fn open(store: SettingsStore) -> Result<Self, StoreError> {
        let doc = store.load()?;
        info!("Settings loaded from {}", store.path().display());
        Ok(Self { store, doc })
    }

    pub fn tree(&self) -> &ProfileTree {
        &self.doc.folders_and_profiles
    }

    /// The tree for rendering.
    pub fn list_all(&self) -> &[Node] {
        self.doc.folders_and_profiles.list_all()
    }

    pub fn save(&self) -> Result<(), StoreError> {
        self.persist(&self.doc)
    }

    fn persist(&self, doc: &SettingsDocument) -> Result<(), StoreError> {
        self.store.save(doc).map_err(|e| {
            error!("Failed to save settings: {}", e);
            StoreError::from(e)
        })
    }

    /// Apply `change` to a copy, save the copy, then adopt it.
    /// On any error the in-memory document is left as it was.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut SettingsDocument) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut next = self.doc.clone();
        let out = change(&mut next)?;
        self.persist(&next)?;
        self.doc = next;
        Ok(out)
    }

    // ── preferences ────────────────────────────────────────────────────────

    /// Any top-level key, known or not.
    pub fn get(&self, key: &str) -> Option<Value> {
        match serde_json::to_value(&self.doc) {
            Ok(Value::Object(mut map)) => map.remove(key),
            _ => None,
        }
    }

    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Write one top-level key through the document and persist.
    /// A value of the wrong shape for a known key leaves the document untouched.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        let invalid = |reason: String| StoreError::InvalidValue {
            key: key.to_string(),
            reason,
        };
        let mut map = match serde_json::to_value(&self.doc) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(invalid("document is not an object".into())),
            Err(e) => return Err(invalid(e.to_string())),
        };
        map.insert(key.to_string(), value);
        let updated: SettingsDocument =
            serde_json::from_value(Value::Object(map)).map_err(|e| invalid(e.to_string()))?;
        for (name, color) in [
            ("background_color", &updated.background_color),
            ("font_color", &updated.font_color),
        ] {
            if name == key && parse_hex_color(color).is_none() {
                return Err(invalid(format!("'{color}' is not a #RRGGBB color")));
            }
        }
        self.persist(&updated)?;
        self.doc = updated;
        info!("Setting '{}' updated", key);
        Ok(())
    }

    pub fn background_color(&self) -> &str {
        &self.doc.background_color
    }

    pub fn set_background_color(&mut self, color: &str) -> Result<(), StoreError> {
        self.set("background_color", Value::from(color))
    }

    pub fn font_color(&self) -> &str {
        &self.doc.font_color
    }

    pub fn set_font_color(&mut self, color: &str) -> Result<(), StoreError> {
        self.set("font_color", Value::from(color))
    }

    pub fn license_accepted(&self) -> bool {
        self.doc.license_accepted
    }

    pub fn accept_license(&mut self) -> Result<(), StoreError> {
        self.set("license_accepted", Value::Bool(true))
    }

    // ── profile tree ───────────────────────────────────────────────────────

    pub fn add_folder(
        &mut self,
        parent: Option<&NodeId>,
        name: impl Into<String>,
    ) -> Result<NodeId, StoreError> {
        let name = name.into();
        let id = self.commit(|doc| {
            Ok(doc.folders_and_profiles.add_folder(parent, name.clone())?)
        })?;
        info!("Folder added: {}", name);
        Ok(id)
    }

    pub fn add_profile(
        &mut self,
        parent: Option<&NodeId>,
        profile: Profile,
    ) -> Result<NodeId, StoreError> {
        let name = profile.name.clone();
        let id = self.commit(|doc| Ok(doc.folders_and_profiles.add_profile(parent, profile)?))?;
        info!("Connection added: {}", name);
        Ok(id)
    }

    /// First profile named `old_name` wins; see [`ProfileTree::update_profile`].
    pub fn update_profile(&mut self, old_name: &str, new_profile: Profile) -> Result<(), StoreError> {
        let name = new_profile.name.clone();
        self.commit(|doc| {
            Ok(doc
                .folders_and_profiles
                .update_profile(old_name, new_profile)?)
        })?;
        info!("Connection edited: {}", name);
        Ok(())
    }

    pub fn update_folder(&mut self, old_name: &str, new_name: &str) -> Result<(), StoreError> {
        self.commit(|doc| {
            Ok(doc
                .folders_and_profiles
                .update_folder(old_name, new_name)?)
        })?;
        info!("Folder renamed to: {}", new_name);
        Ok(())
    }

    pub fn update_profile_by_id(&mut self, id: &NodeId, new_profile: Profile) -> Result<(), StoreError> {
        let name = new_profile.name.clone();
        self.commit(|doc| {
            Ok(doc
                .folders_and_profiles
                .update_profile_by_id(id, new_profile)?)
        })?;
        info!("Connection edited: {}", name);
        Ok(())
    }

    pub fn rename_folder(&mut self, id: &NodeId, new_name: &str) -> Result<(), StoreError> {
        self.commit(|doc| Ok(doc.folders_and_profiles.rename_folder(id, new_name)?))?;
        info!("Folder renamed to: {}", new_name);
        Ok(())
    }

    /// Delete a node. Keyring secrets of removed profiles are cleaned up
    /// when a backend is given; failures there are logged, not returned.
    pub fn remove(
        &mut self,
        id: &NodeId,
        secrets: Option<&dyn SecretBackend>,
    ) -> Result<Node, StoreError> {
        let removed = self.commit(|doc| Ok(doc.folders_and_profiles.remove(id)?))?;
        info!("Removed: {}", removed.name());
        if let Some(backend) = secrets {
            for profile in removed_profiles(&removed) {
                if profile.password_source == PasswordSource::Keyring {
                    if let Err(e) = backend.delete(&profile.id) {
                        error!("Could not drop keyring entry for '{}': {}", profile.name, e);
                    }
                }
            }
        }
        Ok(removed)
    }

    /// Move a profile's password into the secret backend and blank it in the file.
    pub fn store_password(
        &mut self,
        id: &NodeId,
        password: &str,
        backend: &dyn SecretBackend,
    ) -> Result<(), StoreError> {
        let mut profile = self
            .doc
            .folders_and_profiles
            .find_profile(id)
            .cloned()
            .ok_or_else(|| NotFound::new(format!("profile {id}")))?;
        backend.set(id, password)?;
        profile.password.clear();
        profile.password_source = PasswordSource::Keyring;
        self.update_profile_by_id(id, profile)
    }
}

fn removed_profiles(node: &Node) -> Vec<&Profile> {
    match node {
        Node::Profile(profile) => vec![profile],
        Node::Folder(folder) => folder
            .children
            .iter()
            .flat_map(removed_profiles)
            .collect(),
    }
}
