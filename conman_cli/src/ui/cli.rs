use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use conman_core::clients::UrlOpener;
use conman_core::core::launcher::DEFAULT_BROWSER_URL;
use conman_core::storage::store::DEFAULT_SETTINGS_FILE;
use conman_core::storage::{
    parse_ssh_options, KeyringBackend, Node, NodeId, Profile, Protocol, SettingsManager,
    SettingsStore,
};
use conman_core::{LaunchConfig, Launcher};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use log::info;
use serde_json::Value;

use crate::ui::render::render_tree;

pub const LICENSE_TEXT: &str = "\
End-User License Agreement (EULA)

This software is licensed for personal, non-commercial use only. By using this software,
you agree not to use it for any commercial purposes. Unauthorized commercial use of this
software is strictly prohibited.
";

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "conman",
    version,
    about = "Keep SSH/RDP connection profiles in a folder tree and launch them",
    subcommand_required = true
)]
pub struct Args {
    /// Settings file holding profiles and preferences
    #[arg(long, env = "CONMAN_SETTINGS", default_value = DEFAULT_SETTINGS_FILE, global = true)]
    pub settings: PathBuf,

    /// Use the per-user settings file instead of --settings
    #[arg(long, global = true)]
    pub user_config: bool,

    /// Append log records to this file instead of stderr
    #[arg(long, env = "CONMAN_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Log to the per-user default log file
    #[arg(long, global = true, conflicts_with = "log_file")]
    pub log_to_file: bool,

    /// Record acceptance of the license terms before running the command
    #[arg(long, global = true)]
    pub accept_license: bool,

    /// SSH client binary
    #[arg(long, env = "CONMAN_SSH_CLIENT", default_value = "ssh", global = true)]
    pub ssh_client: String,

    /// Page opened after an SSH launch for profiles with --open-browser
    #[arg(long, env = "CONMAN_BROWSER_URL", default_value = DEFAULT_BROWSER_URL, global = true)]
    pub browser_url: String,

    /// Never open the browser after an SSH launch
    #[arg(long, global = true)]
    pub no_browser: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the folder/profile tree
    List {
        /// Include host details and ids
        #[arg(long)]
        details: bool,
    },
    /// Append a folder
    AddFolder {
        name: String,
        /// Parent folder (id or name); the root when omitted
        #[arg(long)]
        parent: Option<String>,
    },
    /// Append a connection profile
    Add {
        name: String,
        /// Parent folder (id or name); the root when omitted
        #[arg(long)]
        parent: Option<String>,
        #[command(flatten)]
        fields: ProfileFields,
    },
    /// Replace a profile's fields; unspecified fields keep their value
    Edit {
        /// Profile id, or name (first match)
        reference: String,
        /// New display name
        #[arg(long)]
        name: Option<String>,
        /// Drop all stored SSH options before applying --ssh-option
        #[arg(long)]
        clear_ssh_options: bool,
        #[command(flatten)]
        fields: ProfileFields,
    },
    /// Rename a folder
    RenameFolder {
        /// Folder id, or name (first match)
        reference: String,
        new_name: String,
    },
    /// Delete a profile, or a folder with everything in it
    Remove {
        /// Node id, or name (first match)
        reference: String,
    },
    /// Launch the external client for a profile
    Connect {
        /// Profile id, or name (first match)
        reference: String,
        /// Wait for the client to exit and report its status
        #[arg(long)]
        wait: bool,
    },
    /// Move a profile's password into the OS keyring (read from stdin)
    SetPassword {
        /// Profile id, or name (first match)
        reference: String,
    },
    /// Show or change the display colours
    Colors {
        #[arg(long)]
        background: Option<String>,
        #[arg(long)]
        font: Option<String>,
    },
    /// Read or write raw preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Show the license terms
    License {
        /// Accept the terms
        #[arg(long)]
        accept: bool,
    },
    /// Version and licensing information
    About,
}

#[derive(Subcommand, Debug)]
pub enum PrefsAction {
    Get { key: String },
    /// VALUE is parsed as JSON, falling back to a plain string
    Set { key: String, value: String },
}

/// Profile fields shared by `add` and `edit`.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ProfileFields {
    #[arg(long)]
    pub host: Option<String>,
    /// Port as text; anything that is not a valid port becomes 22
    #[arg(long)]
    pub port: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    /// Stored in plaintext; see `set-password` for the keyring
    #[arg(long)]
    pub password: Option<String>,
    /// SSH or RDP
    #[arg(long)]
    pub protocol: Option<Protocol>,
    /// Extra ssh argument, repeatable; blank lines are dropped
    #[arg(long = "ssh-option", allow_hyphen_values = true)]
    pub ssh_options: Vec<String>,
    /// Open the browser after an SSH launch
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub open_browser: Option<bool>,
}

impl ProfileFields {
    /// Overlay the given fields on `base`.
    pub fn apply(self, mut base: Profile) -> Profile {
        if let Some(host) = self.host {
            base.host = host;
        }
        if let Some(port) = self.port {
            base.port = Profile::port_from_text(&port);
        }
        if let Some(username) = self.username {
            base.username = username;
        }
        if let Some(password) = self.password {
            base.password = password;
        }
        if let Some(protocol) = self.protocol {
            base.protocol = protocol;
        }
        // Pasted multi-line text becomes one option per line.
        base.ssh_options
            .extend(self.ssh_options.iter().flat_map(|text| parse_ssh_options(text)));
        if let Some(open) = self.open_browser {
            base.open_browser_after_connect = open;
        }
        base
    }
}

pub async fn run_cli(args: Args) -> anyhow::Result<()> {
    let store = if args.user_config {
        SettingsStore::user_config().context("no per-user config directory")?
    } else {
        SettingsStore::new(&args.settings)
    };
    let location = store.path().display().to_string();
    let mut settings =
        SettingsManager::open(store).with_context(|| format!("could not load {location}"))?;

    if args.accept_license && !settings.license_accepted() {
        settings.accept_license()?;
        info!("License accepted");
    }
    let ungated = matches!(args.command, Command::License { .. } | Command::About);
    if !ungated && !settings.license_accepted() {
        eprintln!("{LICENSE_TEXT}");
        bail!("the license terms have not been accepted; run `conman license --accept`");
    }

    let launch_config = LaunchConfig {
        ssh_client: args.ssh_client.clone(),
        url_opener: UrlOpener::platform_default(),
        browser_url: (!args.no_browser).then(|| args.browser_url.clone()),
    };

    match args.command {
        Command::List { details } => {
            let mut stdout = io::stdout();
            let color = stdout
                .is_terminal()
                .then(|| settings.font_color().to_string());
            render_tree(&mut stdout, settings.list_all(), color.as_deref(), details)?;
        }
        Command::AddFolder { name, parent } => {
            let parent = resolve_folder(&settings, parent.as_deref())?;
            let id = settings.add_folder(parent.as_ref(), name)?;
            println!("{id}");
        }
        Command::Add {
            name,
            parent,
            fields,
        } => {
            let parent = resolve_folder(&settings, parent.as_deref())?;
            let host = fields
                .host
                .clone()
                .ok_or_else(|| anyhow!("--host is required"))?;
            let protocol = fields.protocol.unwrap_or(Protocol::Ssh);
            let profile = fields.apply(Profile::new(name, host, protocol));
            let id = settings.add_profile(parent.as_ref(), profile)?;
            println!("{id}");
        }
        Command::Edit {
            reference,
            name,
            clear_ssh_options,
            fields,
        } => {
            let mut profile = resolve_profile(&settings, &reference)?.clone();
            if let Some(name) = name {
                profile.name = name;
            }
            if clear_ssh_options {
                profile.ssh_options.clear();
            }
            let profile = fields.apply(profile);
            match reference.parse::<NodeId>() {
                Ok(id) => settings.update_profile_by_id(&id, profile)?,
                Err(_) => settings.update_profile(&reference, profile)?,
            }
        }
        Command::RenameFolder {
            reference,
            new_name,
        } => match reference.parse::<NodeId>() {
            Ok(id) => settings.rename_folder(&id, &new_name)?,
            Err(_) => settings.update_folder(&reference, &new_name)?,
        },
        Command::Remove { reference } => {
            let id = settings
                .tree()
                .resolve(&reference)
                .map(|node| node.id().clone())
                .ok_or_else(|| anyhow!("nothing named '{reference}'"))?;
            let removed = settings.remove(&id, Some(&KeyringBackend))?;
            println!("Removed {}", removed.name());
        }
        Command::Connect { reference, wait } => {
            let profile = resolve_profile(&settings, &reference)?.clone();
            let launcher = Launcher::new(launch_config);
            match launcher.launch(&profile) {
                Ok(mut handle) => {
                    println!("Connected to {}", profile.host);
                    if wait {
                        let state = handle.wait().await;
                        println!("{} {}", handle.program(), state);
                    }
                }
                Err(e) => {
                    println!("Failed to connect to {}", profile.host);
                    return Err(e.into());
                }
            }
        }
        Command::SetPassword { reference } => {
            let id = resolve_profile(&settings, &reference)?.id.clone();
            let password = read_password("Password: ")?;
            settings.store_password(&id, &password, &KeyringBackend)?;
            println!("Password stored in the keyring");
        }
        Command::Colors { background, font } => {
            if background.is_none() && font.is_none() {
                println!("background_color: {}", settings.background_color());
                println!("font_color: {}", settings.font_color());
            }
            if let Some(color) = background {
                settings.set_background_color(&color)?;
            }
            if let Some(color) = font {
                settings.set_font_color(&color)?;
            }
        }
        Command::Prefs { action } => match action {
            PrefsAction::Get { key } => match settings.get(&key) {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => bail!("no preference named '{key}'"),
            },
            PrefsAction::Set { key, value } => {
                let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
                settings.set(&key, value)?;
            }
        },
        Command::License { accept } => {
            println!("{LICENSE_TEXT}");
            if accept && !settings.license_accepted() {
                settings.accept_license()?;
                info!("License accepted");
            }
            if settings.license_accepted() {
                println!("Accepted.");
            }
        }
        Command::About => {
            println!("Connection Manager (conman) {}", env!("CARGO_PKG_VERSION"));
            println!("This software is licensed for personal, non-commercial use only.");
        }
    }
    Ok(())
}

fn resolve_folder(settings: &SettingsManager, reference: Option<&str>) -> anyhow::Result<Option<NodeId>> {
    let Some(reference) = reference else {
        return Ok(None);
    };
    if let Some(folder) = settings.tree().find_folder_by_name(reference) {
        return Ok(Some(folder.id.clone()));
    }
    match settings.tree().resolve(reference) {
        Some(Node::Profile(_)) => bail!("'{reference}' is a connection, not a folder"),
        _ => bail!("no folder named '{reference}'"),
    }
}

fn resolve_profile<'a>(settings: &'a SettingsManager, reference: &str) -> anyhow::Result<&'a Profile> {
    if let Some(profile) = settings.tree().find_profile_by_name(reference) {
        return Ok(profile);
    }
    match settings.tree().resolve(reference) {
        Some(Node::Folder(_)) => bail!("'{reference}' is a folder, not a connection"),
        _ => bail!("no connection named '{reference}'"),
    }
}

/// Read one line without echo when stdin is a terminal.
fn read_password(prompt: &str) -> anyhow::Result<String> {
    eprint!("{prompt}");
    io::stderr().flush().ok();

    let stdin = io::stdin();
    if !stdin.is_terminal() {
        let mut line = String::new();
        stdin.read_line(&mut line)?;
        return Ok(line.trim_end_matches(['\r', '\n']).to_string());
    }

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut bytes = Vec::new();
    let mut buf = [0u8; 1];
    let mut cancelled = false;
    while stdin.lock().read(&mut buf).is_ok_and(|n| n == 1) {
        match buf[0] {
            b'\r' | b'\n' => break,
            // Ctrl+C
            0x03 => {
                cancelled = true;
                break;
            }
            // Backspace / DEL
            0x08 | 0x7f => {
                bytes.pop();
            }
            byte => bytes.push(byte),
        }
    }
    let _ = disable_raw_mode();
    eprintln!();

    if cancelled {
        bail!("cancelled");
    }
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn add_parses_repeated_hyphenated_ssh_options() {
        let args = Args::try_parse_from([
            "conman", "add", "srv1", "--host", "10.0.0.1", "--port", "22x", "--ssh-option", "-v",
            "--ssh-option", "-A", "--open-browser",
        ])
        .unwrap();
        let Command::Add { name, fields, .. } = args.command else {
            panic!("expected add");
        };
        assert_eq!(name, "srv1");
        let profile = fields.apply(Profile::new("srv1", "10.0.0.1", Protocol::Ssh));
        assert_eq!(profile.port, 22);
        assert_eq!(profile.ssh_options, vec!["-v", "-A"]);
        assert!(profile.open_browser_after_connect);
    }

    #[test]
    fn edit_keeps_unspecified_fields() {
        let base = Profile::new("db", "old", Protocol::Ssh)
            .with_username("bob")
            .with_port(2200);
        let fields = ProfileFields {
            host: Some("new".into()),
            open_browser: Some(false),
            ..Default::default()
        };
        let edited = fields.apply(base.clone());
        assert_eq!(edited.host, "new");
        assert_eq!(edited.username, "bob");
        assert_eq!(edited.port, 2200);
        assert_eq!(edited.id, base.id);
    }

    #[test]
    fn pasted_ssh_options_split_per_line() {
        let fields = ProfileFields {
            ssh_options: vec!["-v\n\n  -o ServerAliveInterval=30 \n".into()],
            ..Default::default()
        };
        let profile = fields.apply(Profile::new("db", "h", Protocol::Ssh));
        assert_eq!(profile.ssh_options, vec!["-v", "-o ServerAliveInterval=30"]);
    }

    #[test]
    fn protocol_is_case_insensitive() {
        let args = Args::try_parse_from([
            "conman", "add", "desk", "--host", "h", "--protocol", "rdp",
        ])
        .unwrap();
        let Command::Add { fields, .. } = args.command else {
            panic!("expected add");
        };
        assert_eq!(fields.protocol, Some(Protocol::Rdp));
    }

    #[tokio::test]
    async fn commands_are_refused_until_license_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("app_settings.json");
        let path = settings.to_str().unwrap();

        let refused = run_cli(Args::parse_from(["conman", "--settings", path, "list"])).await;
        assert!(refused.is_err());

        run_cli(Args::parse_from(["conman", "--settings", path, "license", "--accept"]))
            .await
            .unwrap();
        run_cli(Args::parse_from(["conman", "--settings", path, "add-folder", "Work"]))
            .await
            .unwrap();
        run_cli(Args::parse_from([
            "conman", "--settings", path, "add", "srv1", "--parent", "Work", "--host", "10.0.0.1",
            "--username", "bob",
        ]))
        .await
        .unwrap();

        let reopened = SettingsManager::open(SettingsStore::new(&settings)).unwrap();
        let folder = reopened.list_all()[0].as_folder().unwrap();
        assert_eq!(folder.name, "Work");
        let profile = folder.children[0].as_profile().unwrap();
        assert_eq!(profile.host, "10.0.0.1");
        assert_eq!(profile.username, "bob");
        assert_eq!(profile.port, 22);
    }

    #[tokio::test]
    async fn names_shared_by_a_folder_and_a_connection_resolve_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("app_settings.json");
        let path = settings.to_str().unwrap();
        let run = |extra: &[&str]| {
            let mut argv: Vec<String> = ["conman", "--settings", path, "--accept-license"]
                .iter()
                .map(|arg| arg.to_string())
                .collect();
            argv.extend(extra.iter().map(|arg| arg.to_string()));
            run_cli(Args::parse_from(argv))
        };

        run(&["add-folder", "web"]).await.unwrap();
        run(&["add", "web", "--parent", "web", "--host", "h"]).await.unwrap();
        run(&["edit", "web", "--host", "h2"]).await.unwrap();
        // A connection named like the target folder must not shadow it.
        run(&["add", "db", "--host", "d"]).await.unwrap();
        run(&["add-folder", "db"]).await.unwrap();
        run(&["add", "replica", "--parent", "db", "--host", "r"]).await.unwrap();

        let reopened = SettingsManager::open(SettingsStore::new(&settings)).unwrap();
        let web = reopened.list_all()[0].as_folder().unwrap();
        assert_eq!(web.children[0].as_profile().unwrap().host, "h2");
        let db = reopened.list_all()[2].as_folder().unwrap();
        assert_eq!(db.children[0].name(), "replica");
    }

    #[tokio::test]
    async fn connect_reports_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("app_settings.json");
        let path = settings.to_str().unwrap();
        run_cli(Args::parse_from([
            "conman", "--settings", path, "--accept-license", "add", "srv", "--host", "h",
        ]))
        .await
        .unwrap();

        let result = run_cli(Args::parse_from([
            "conman", "--settings", path, "--ssh-client", "/nonexistent/ssh", "connect", "srv",
        ]))
        .await;

        let err = result.expect_err("missing client cannot be spawned");
        assert!(err.to_string().contains("/nonexistent/ssh"));
    }
}
