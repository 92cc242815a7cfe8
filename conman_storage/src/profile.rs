use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::tree::NodeId;

pub const DEFAULT_PORT: u16 = 22;

/// Which external client a profile is launched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "SSH", alias = "ssh")]
    Ssh,
    #[serde(rename = "RDP", alias = "rdp")]
    Rdp,
}

impl Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Ssh => write!(f, "SSH"),
            Protocol::Rdp => write!(f, "RDP"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SSH" => Ok(Protocol::Ssh),
            "RDP" => Ok(Protocol::Rdp),
            other => Err(format!("unknown protocol '{other}', expected SSH or RDP")),
        }
    }
}

/// Where the launcher finds the password at connect time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordSource {
    /// The plaintext `password` field of the profile.
    #[default]
    Inline,
    /// The OS keyring, keyed by the profile id.
    Keyring,
}

/// A user-named connection preset.
///
/// Stored inside the settings tree as
/// `{ "type":"connection", "name":"srv1", "host":"10.0.0.1", "port":22, "protocol":"SSH", ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "NodeId::new")]
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port", deserialize_with = "lenient_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    /// Plaintext; empty when `password_source` is `Keyring`.
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_source: PasswordSource,
    #[serde(alias = "connection_type")]
    pub protocol: Protocol,
    /// Extra arguments appended to the SSH command line. Ignored for RDP.
    #[serde(default)]
    pub ssh_options: Vec<String>,
    #[serde(default, alias = "open_browser")]
    pub open_browser_after_connect: bool,
}

impl Profile {
    /// A fresh profile with a new id and default port.
    pub fn new(name: impl Into<String>, host: impl Into<String>, protocol: Protocol) -> Self {
        Profile {
            id: NodeId::new(),
            name: name.into(),
            host: host.into(),
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            password_source: PasswordSource::Inline,
            protocol,
            ssh_options: Vec::new(),
            open_browser_after_connect: false,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = if port == 0 { DEFAULT_PORT } else { port };
        self
    }

    pub fn with_ssh_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ssh_options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_open_browser(mut self, open: bool) -> Self {
        self.open_browser_after_connect = open;
        self
    }

    /// Port as typed into a form field: digits in range, otherwise 22.
    pub fn port_from_text(text: &str) -> u16 {
        parse_port(text).unwrap_or(DEFAULT_PORT)
    }
}

/// Split a multi-line options field into one argument per non-blank line.
pub fn parse_ssh_options(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn parse_port(text: &str) -> Option<u16> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<u16>().ok().filter(|p| *p != 0)
}

/// Accepts a number or a numeric string; anything unusable becomes 22.
fn lenient_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let port = match raw {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .filter(|p| *p != 0),
        Value::String(s) => parse_port(&s),
        _ => None,
    };
    Ok(port.unwrap_or(DEFAULT_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_text_falls_back_to_default() {
        assert_eq!(Profile::port_from_text("22x"), 22);
        assert_eq!(Profile::port_from_text(""), 22);
        assert_eq!(Profile::port_from_text("0"), 22);
        assert_eq!(Profile::port_from_text("70000"), 22);
        assert_eq!(Profile::port_from_text("2200"), 2200);
    }

    #[test]
    fn lenient_port_on_load() {
        let json = r#"[
            {"name":"a","protocol":"SSH","port":"2200"},
            {"name":"b","protocol":"SSH","port":"abc"},
            {"name":"c","protocol":"SSH","port":-5},
            {"name":"d","protocol":"SSH","port":null},
            {"name":"e","protocol":"SSH"},
            {"name":"f","protocol":"SSH","port":3389}
        ]"#;
        let profiles: Vec<Profile> = serde_json::from_str(json).unwrap();
        let ports: Vec<u16> = profiles.iter().map(|p| p.port).collect();
        assert_eq!(ports, vec![2200, 22, 22, 22, 22, 3389]);
    }

    #[test]
    fn legacy_keys_are_accepted() {
        let json = r#"{"name":"old","host":"h","connection_type":"RDP","open_browser":true}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.protocol, Protocol::Rdp);
        assert!(profile.open_browser_after_connect);
        assert_eq!(profile.password_source, PasswordSource::Inline);
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let json = r#"{"name":"x","protocol":"VNC"}"#;
        assert!(serde_json::from_str::<Profile>(json).is_err());
        assert!("vnc".parse::<Protocol>().is_err());
        assert_eq!("rdp".parse::<Protocol>(), Ok(Protocol::Rdp));
    }

    #[test]
    fn ssh_options_drop_blank_lines() {
        assert!(parse_ssh_options("").is_empty());
        assert_eq!(
            parse_ssh_options("-v\n\n  -o StrictHostKeyChecking=no \n"),
            vec!["-v", "-o StrictHostKeyChecking=no"]
        );
    }
}
