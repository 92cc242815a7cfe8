use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tree::ProfileTree;

pub const DEFAULT_BACKGROUND_COLOR: &str = "#000000";
pub const DEFAULT_FONT_COLOR: &str = "#00FF00";

/// The whole persisted state: the profile tree plus UI preferences.
///
/// Keys this version does not know about are carried in `extra` and written
/// back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(default, alias = "connections")]
    pub folders_and_profiles: ProfileTree,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default = "default_font_color")]
    pub font_color: String,
    #[serde(default)]
    pub license_accepted: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        SettingsDocument {
            folders_and_profiles: ProfileTree::default(),
            background_color: default_background_color(),
            font_color: default_font_color(),
            license_accepted: false,
            extra: Map::new(),
        }
    }
}

fn default_background_color() -> String {
    DEFAULT_BACKGROUND_COLOR.to_string()
}

fn default_font_color() -> String {
    DEFAULT_FONT_COLOR.to_string()
}

/// Parse `#RRGGBB` (case-insensitive) into its components.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
