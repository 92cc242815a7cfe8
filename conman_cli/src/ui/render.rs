use std::io::{self, Write};

use conman_core::storage::document::parse_hex_color;
use conman_core::storage::{Node, Profile, Protocol};
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

/// Hover text of a profile: host, user, protocol and (for SSH) its options.
pub fn tooltip(profile: &Profile) -> String {
    let mut text = format!(
        "Host: {}\nUsername: {}\nType: {}\n",
        profile.host, profile.username, profile.protocol
    );
    if profile.protocol == Protocol::Ssh {
        text.push_str(&format!("SSH Options: {}\n", profile.ssh_options.join(" ")));
    }
    text
}

/// Draw the tree top to bottom in stored order. `color` is the `#RRGGBB`
/// font colour from the settings; `None` prints plain text.
pub fn render_tree<W: Write>(
    out: &mut W,
    nodes: &[Node],
    color: Option<&str>,
    details: bool,
) -> io::Result<()> {
    if let Some((r, g, b)) = color.and_then(parse_hex_color) {
        queue!(out, SetForegroundColor(Color::Rgb { r, g, b }))?;
    }
    if nodes.is_empty() {
        queue!(out, Print("(no connections yet)\n"))?;
    }
    render_level(out, nodes, 0, details)?;
    if color.is_some() {
        queue!(out, ResetColor)?;
    }
    out.flush()
}

fn render_level<W: Write>(out: &mut W, nodes: &[Node], depth: usize, details: bool) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    for node in nodes {
        match node {
            Node::Folder(folder) => {
                queue!(out, Print(format!("{indent}+ {}/\n", folder.name)))?;
                if details {
                    queue!(out, Print(format!("{indent}    Id: {}\n", folder.id)))?;
                }
                render_level(out, &folder.children, depth + 1, details)?;
            }
            Node::Profile(profile) => {
                queue!(
                    out,
                    Print(format!(
                        "{indent}- {} [{}] {}@{}:{}\n",
                        profile.name, profile.protocol, profile.username, profile.host, profile.port
                    ))
                )?;
                if details {
                    for line in tooltip(profile).lines() {
                        queue!(out, Print(format!("{indent}    {line}\n")))?;
                    }
                    queue!(out, Print(format!("{indent}    Id: {}\n", profile.id)))?;
                }
            }
        }
    }
    Ok(())
}
