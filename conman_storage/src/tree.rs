use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::NotFound;
use crate::profile::Profile;

/// Stable identifier of a folder or profile, assigned at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        NodeId(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(NodeId)
    }
}

/// A named grouping node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(default = "NodeId::new")]
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Folder {
            id: NodeId::new(),
            name: name.into(),
            children: Vec::new(),
        }
    }
}

/// One entry in the tree, told apart by the `type` tag:
/// `{ "type":"folder", "name":"Work", "children":[...] }` or
/// `{ "type":"connection", "name":"srv1", ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    #[serde(rename = "folder")]
    Folder(Folder),
    #[serde(rename = "connection")]
    Profile(Profile),
}

impl Node {
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Folder(folder) => &folder.id,
            Node::Profile(profile) => &profile.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Folder(folder) => &folder.name,
            Node::Profile(profile) => &profile.name,
        }
    }

    pub fn as_profile(&self) -> Option<&Profile> {
        match self {
            Node::Profile(profile) => Some(profile),
            Node::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Node::Folder(folder) => Some(folder),
            Node::Profile(_) => None,
        }
    }
}

/// The ordered root collection of folders and profiles.
///
/// Every lookup walks depth-first in pre-order, so "first match" means the
/// node a top-to-bottom rendering of the tree shows first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileTree {
    nodes: Vec<Node>,
}

impl ProfileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The tree for rendering, in insertion order at every level.
    pub fn list_all(&self) -> &[Node] {
        &self.nodes
    }

    /// Append an empty folder as the last child of `parent` (root when `None`).
    pub fn add_folder(
        &mut self,
        parent: Option<&NodeId>,
        name: impl Into<String>,
    ) -> Result<NodeId, NotFound> {
        let folder = Folder::new(name);
        let id = folder.id.clone();
        self.children_mut(parent)?.push(Node::Folder(folder));
        Ok(id)
    }

    /// Append a profile as the last child of `parent` (root when `None`).
    pub fn add_profile(
        &mut self,
        parent: Option<&NodeId>,
        profile: Profile,
    ) -> Result<NodeId, NotFound> {
        let id = profile.id.clone();
        self.children_mut(parent)?.push(Node::Profile(profile));
        Ok(id)
    }

    /// Replace the first profile named `old_name`. The stored id is kept.
    pub fn update_profile(&mut self, old_name: &str, new_profile: Profile) -> Result<(), NotFound> {
        let node = find_mut(&mut self.nodes, &|n| {
            matches!(n, Node::Profile(p) if p.name == old_name)
        })
        .ok_or_else(|| NotFound::new(format!("profile '{old_name}'")))?;
        replace_profile(node, new_profile);
        Ok(())
    }

    /// Rename the first folder named `old_name`.
    pub fn update_folder(&mut self, old_name: &str, new_name: impl Into<String>) -> Result<(), NotFound> {
        let node = find_mut(&mut self.nodes, &|n| {
            matches!(n, Node::Folder(f) if f.name == old_name)
        })
        .ok_or_else(|| NotFound::new(format!("folder '{old_name}'")))?;
        if let Node::Folder(folder) = node {
            folder.name = new_name.into();
        }
        Ok(())
    }

    pub fn update_profile_by_id(&mut self, id: &NodeId, new_profile: Profile) -> Result<(), NotFound> {
        let node = find_mut(&mut self.nodes, &|n| {
            matches!(n, Node::Profile(p) if &p.id == id)
        })
        .ok_or_else(|| NotFound::new(format!("profile {id}")))?;
        replace_profile(node, new_profile);
        Ok(())
    }

    pub fn rename_folder(&mut self, id: &NodeId, new_name: impl Into<String>) -> Result<(), NotFound> {
        match self.find_mut(id) {
            Some(Node::Folder(folder)) => {
                folder.name = new_name.into();
                Ok(())
            }
            _ => Err(NotFound::new(format!("folder {id}"))),
        }
    }

    /// Detach a node (and, for folders, its whole subtree).
    pub fn remove(&mut self, id: &NodeId) -> Result<Node, NotFound> {
        remove_from(&mut self.nodes, id).ok_or_else(|| NotFound::new(format!("node {id}")))
    }

    pub fn find(&self, id: &NodeId) -> Option<&Node> {
        find(&self.nodes, &|n| n.id() == id)
    }

    pub fn find_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        find_mut(&mut self.nodes, &|n| n.id() == id)
    }

    pub fn find_profile(&self, id: &NodeId) -> Option<&Profile> {
        self.find(id).and_then(Node::as_profile)
    }

    /// Look a node up by id string, falling back to the first node with that name.
    pub fn resolve(&self, reference: &str) -> Option<&Node> {
        if let Ok(id) = reference.parse::<NodeId>() {
            if let Some(node) = self.find(&id) {
                return Some(node);
            }
        }
        find(&self.nodes, &|n| n.name() == reference)
    }

    /// A profile by id, else the first profile in pre-order with that name.
    /// Folders sharing the name are skipped.
    pub fn find_profile_by_name(&self, reference: &str) -> Option<&Profile> {
        if let Some(profile) = reference.parse::<NodeId>().ok().and_then(|id| self.find_profile(&id)) {
            return Some(profile);
        }
        find(&self.nodes, &|n| matches!(n, Node::Profile(p) if p.name == reference))
            .and_then(Node::as_profile)
    }

    /// Folder counterpart of [`ProfileTree::find_profile_by_name`].
    pub fn find_folder_by_name(&self, reference: &str) -> Option<&Folder> {
        let by_id = reference
            .parse::<NodeId>()
            .ok()
            .and_then(|id| self.find(&id))
            .and_then(Node::as_folder);
        if by_id.is_some() {
            return by_id;
        }
        find(&self.nodes, &|n| matches!(n, Node::Folder(f) if f.name == reference))
            .and_then(Node::as_folder)
    }

    /// Every profile in pre-order.
    pub fn profiles(&self) -> Vec<&Profile> {
        let mut out = Vec::new();
        collect_profiles(&self.nodes, &mut out);
        out
    }

    fn children_mut(&mut self, parent: Option<&NodeId>) -> Result<&mut Vec<Node>, NotFound> {
        match parent {
            None => Ok(&mut self.nodes),
            Some(id) => match self.find_mut(id) {
                Some(Node::Folder(folder)) => Ok(&mut folder.children),
                _ => Err(NotFound::new(format!("folder {id}"))),
            },
        }
    }
}

fn replace_profile(node: &mut Node, new_profile: Profile) {
    if let Node::Profile(existing) = node {
        let id = existing.id.clone();
        *existing = Profile { id, ..new_profile };
    }
}

fn find<'a>(nodes: &'a [Node], pred: &dyn Fn(&Node) -> bool) -> Option<&'a Node> {
    for node in nodes {
        if pred(node) {
            return Some(node);
        }
        if let Node::Folder(folder) = node {
            if let Some(found) = find(&folder.children, pred) {
                return Some(found);
            }
        }
    }
    None
}

fn find_mut<'a>(nodes: &'a mut [Node], pred: &dyn Fn(&Node) -> bool) -> Option<&'a mut Node> {
    for node in nodes.iter_mut() {
        if pred(node) {
            return Some(node);
        }
        if let Node::Folder(folder) = node {
            if let Some(found) = find_mut(&mut folder.children, pred) {
                return Some(found);
            }
        }
    }
    None
}

fn remove_from(nodes: &mut Vec<Node>, id: &NodeId) -> Option<Node> {
    if let Some(pos) = nodes.iter().position(|n| n.id() == id) {
        return Some(nodes.remove(pos));
    }
    for node in nodes.iter_mut() {
        if let Node::Folder(folder) = node {
            if let Some(removed) = remove_from(&mut folder.children, id) {
                return Some(removed);
            }
        }
    }
    None
}

fn collect_profiles<'a>(nodes: &'a [Node], out: &mut Vec<&'a Profile>) {
    for node in nodes {
        match node {
            Node::Profile(profile) => out.push(profile),
            Node::Folder(folder) => collect_profiles(&folder.children, out),
        }
    }
}
