use conman_storage::Profile;

/// `rdp://<user>:<password>@<host>`.
///
/// SECURITY: the password travels in plaintext on the opener's command line,
/// where other local users can read it from the process table. Kept because
/// existing RDP URL handlers expect this form.
pub fn rdp_url(profile: &Profile, password: &str) -> String {
    format!("rdp://{}:{}@{}", profile.username, password, profile.host)
}

/// Same URL with the password masked, for logs.
pub fn redacted_rdp_url(profile: &Profile) -> String {
    format!("rdp://{}:***@{}", profile.username, profile.host)
}
