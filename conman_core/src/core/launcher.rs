use log::{error, info, warn};

use conman_storage::secrets::{resolve_password, KeyringBackend, SecretBackend};
use conman_storage::{Profile, Protocol};

use crate::clients::rdp::redacted_rdp_url;
use crate::clients::{rdp_url, ssh_args, UrlOpener};
use crate::core::process::{ProcessHandle, Spawner, TokioSpawner};
use crate::errors::LaunchError;

/// Page opened after an SSH launch when a profile asks for it.
/// Not derived from the profile's host; set `browser_url` to `None` to turn it off.
pub const DEFAULT_BROWSER_URL: &str = "http://localhost";

/// External programs the launcher hands connections to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub ssh_client: String,
    pub url_opener: UrlOpener,
    pub browser_url: Option<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        LaunchConfig {
            ssh_client: "ssh".to_string(),
            url_opener: UrlOpener::platform_default(),
            browser_url: Some(DEFAULT_BROWSER_URL.to_string()),
        }
    }
}

/// Turns a profile into one external client process.
///
/// Stateless: nothing about launched processes is kept beyond the returned handle.
pub struct Launcher<S: Spawner = TokioSpawner> {
    config: LaunchConfig,
    spawner: S,
    secrets: Box<dyn SecretBackend>,
}

impl Launcher<TokioSpawner> {
    /// Real processes, passwords from the OS keyring when a profile asks for it.
    pub fn new(config: LaunchConfig) -> Self {
        Launcher::with_parts(config, TokioSpawner, Box::new(KeyringBackend))
    }
}

impl<S: Spawner> Launcher<S> {
    pub fn with_parts(config: LaunchConfig, spawner: S, secrets: Box<dyn SecretBackend>) -> Self {
        Launcher {
            config,
            spawner,
            secrets,
        }
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    /// Spawn the client for `profile`. Success only means the OS started the
    /// process; whether a session comes up is up to the client.
    pub fn launch(&self, profile: &Profile) -> Result<ProcessHandle, LaunchError> {
        info!(
            "Launching {} connection '{}' to {}:{}",
            profile.protocol, profile.name, profile.host, profile.port
        );
        match profile.protocol {
            Protocol::Ssh => {
                let handle = self.spawn(&self.config.ssh_client, &ssh_args(profile))?;
                info!("Connected to {}", profile.host);
                if profile.open_browser_after_connect {
                    self.open_browser();
                }
                Ok(handle)
            }
            Protocol::Rdp => {
                let password = resolve_password(profile, self.secrets.as_ref()).map_err(|e| {
                    error!("No password for '{}': {}", profile.name, e);
                    LaunchError::from(e)
                })?;
                info!("Opening {}", redacted_rdp_url(profile));
                let url = rdp_url(profile, &password);
                self.spawn(
                    &self.config.url_opener.program,
                    &self.config.url_opener.argv(&url),
                )
            }
        }
    }

    /// Hand a URL to the platform opener.
    pub fn open_url(&self, url: &str) -> Result<ProcessHandle, LaunchError> {
        self.spawn(
            &self.config.url_opener.program,
            &self.config.url_opener.argv(url),
        )
    }

    fn open_browser(&self) {
        let Some(url) = self.config.browser_url.as_deref() else {
            return;
        };
        match self.open_url(url) {
            Ok(_) => info!("Opened browser at {}", url),
            Err(e) => warn!("Could not open browser at {}: {}", url, e),
        }
    }

    fn spawn(&self, program: &str, args: &[String]) -> Result<ProcessHandle, LaunchError> {
        self.spawner.spawn(program, args).map_err(|source| {
            error!("Failed to spawn '{}': {}", program, source);
            LaunchError::SpawnFailed {
                program: program.to_string(),
                source,
            }
        })
    }
}
