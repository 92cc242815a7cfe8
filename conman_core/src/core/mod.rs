pub mod launcher;
pub mod process;

// Re-export the modules here for easy import elsewhere.
pub use launcher::*;
pub use process::*;
