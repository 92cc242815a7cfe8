use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::document::SettingsDocument;
use crate::errors::PersistenceError;

pub const DEFAULT_SETTINGS_FILE: &str = "app_settings.json";

/// Reads and writes the single settings file. Holds no document state itself.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.config/conman/app_settings.json` on Linux, `%APPDATA%\conman\config\...` on Windows, etc.
    pub fn user_config() -> io::Result<Self> {
        let proj = ProjectDirs::from("", "", "conman")
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "Unable to locate config dir"))?;
        Ok(Self::new(proj.config_dir().join(DEFAULT_SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. A missing file is a first run and yields defaults;
    /// anything unreadable or malformed is an error.
    pub fn load(&self) -> Result<SettingsDocument, PersistenceError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    "No settings at {}, starting with defaults",
                    self.path.display()
                );
                return Ok(SettingsDocument::default());
            }
            Err(e) => return Err(PersistenceError::io(&self.path, e)),
        };
        let doc: SettingsDocument = serde_json::from_slice(&bytes)
            .map_err(|e| PersistenceError::parse(&self.path, e))?;
        debug!(
            "Loaded {} top-level entries from {}",
            doc.folders_and_profiles.list_all().len(),
            self.path.display()
        );
        Ok(doc)
    }

    /// Serialize the whole document and replace the file.
    ///
    /// The bytes go to a sibling `.tmp` file first and are renamed over the
    /// target, so an interrupted save leaves the previous file intact.
    pub fn save(&self, doc: &SettingsDocument) -> Result<(), PersistenceError> {
        let bytes = to_pretty_json(doc).map_err(|e| PersistenceError::parse(&self.path, e))?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| PersistenceError::io(dir, e))?;
        }
        let tmp = self.tmp_path();
        write_synced(&tmp, &bytes).map_err(|e| PersistenceError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(PersistenceError::io(&self.path, e));
        }
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_SETTINGS_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Four-space indented JSON with a trailing newline, so the file stays easy to edit by hand.
fn to_pretty_json(doc: &SettingsDocument) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    doc.serialize(&mut ser)?;
    out.push(b'\n');
    Ok(out)
}
