pub mod clients;
pub mod core;
pub mod errors;
pub mod utils;

// re‑export ergonomic entry points
pub use crate::core::launcher::{LaunchConfig, Launcher};
pub use crate::core::process::{ProcessHandle, SessionState, Spawner, TokioSpawner};
pub use crate::errors::LaunchError;
pub use conman_storage as storage;
