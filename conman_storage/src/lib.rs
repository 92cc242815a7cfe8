pub mod document;
pub mod errors;
pub mod manager;
pub mod profile;
pub mod secrets;
pub mod store;
pub mod tree;

// re‑export ergonomic entry points
pub use document::SettingsDocument;
pub use errors::{NotFound, PersistenceError, SecretError, StoreError};
pub use manager::SettingsManager;
pub use profile::{parse_ssh_options, PasswordSource, Profile, Protocol};
pub use secrets::{KeyringBackend, SecretBackend};
pub use store::SettingsStore;
pub use tree::{Folder, Node, NodeId, ProfileTree};
