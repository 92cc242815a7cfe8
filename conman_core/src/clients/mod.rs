pub mod opener;
pub mod rdp;
pub mod ssh;

// Re-export the modules here for easy import elsewhere.
pub use opener::UrlOpener;
pub use rdp::rdp_url;
pub use ssh::ssh_args;
