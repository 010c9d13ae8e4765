//! Arena-backed organizational tree.
//!
//! Nodes are stored in a flat `Vec` and refer to each other through
//! [`NodeId`]s, so parent links and breadcrumb paths need no reference
//! counting. The synthetic root always lives at [`NodeId::ROOT`].

use crate::types::Member;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::Arc;

/// Shared, immutable member list. Cloning is a reference-count bump, so the
/// resolver cache, the nodes and the search index all point at the same
/// allocation.
pub type Members = Arc<[Member]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    /// Configured top-level bucket (a campus).
    Category,
    /// Directory group, inferred or taken from the outline.
    Group,
}

/// Member resolution state of a node.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded {
        members: Members,
        loaded_at: DateTime<Utc>,
    },
    Failed(String),
}

impl LoadState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::Loaded { .. })
    }

    pub fn members(&self) -> Option<&Members> {
        match self {
            LoadState::Loaded { members, .. } => Some(members),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrgNode {
    /// Stable identifier: the directory group id for group nodes,
    /// `campus-<prefix>` for categories, `root` for the root.
    pub id: String,
    pub code: Option<String>,
    pub name: String,
    pub kind: NodeKind,
    /// Directory group whose members this node lists.
    pub group_id: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub status: LoadState,
    /// Members known without a directory call (outline entries, users placed
    /// by department).
    pub static_members: Vec<Member>,
}

impl OrgNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            code: None,
            name: name.into(),
            kind,
            group_id: None,
            parent: None,
            children: Vec::new(),
            status: LoadState::NotLoaded,
            static_members: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct OrgTree {
    nodes: Vec<OrgNode>,
}

impl OrgTree {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![OrgNode::new("root", root_name, NodeKind::Root)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn get(&self, id: NodeId) -> Option<&OrgNode> {
        self.nodes.get(id.0)
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    pub fn node(&self, id: NodeId) -> &OrgNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut OrgNode {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Append `node` under `parent` and return its id.
    pub fn add_child(&mut self, parent: NodeId, mut node: OrgNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn find_by_id(&self, node_id: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.id == node_id).map(NodeId)
    }

    pub fn find_by_code(&self, code: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.code.as_deref() == Some(code))
            .map(NodeId)
    }

    /// Every node that lists members of `group_id`.
    pub fn nodes_with_group<'a>(&'a self, group_id: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.group_id.as_deref() == Some(group_id))
            .map(|(i, _)| NodeId(i))
    }

    /// Names from the first level below the root down to `id` (inclusive).
    /// The root itself yields its own name.
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        if id == NodeId::ROOT {
            return vec![self.nodes[0].name.as_str()];
        }
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == NodeId::ROOT {
                break;
            }
            let node = &self.nodes[current.0];
            names.push(node.name.as_str());
            cursor = node.parent;
        }
        names.reverse();
        names
    }

    /// Depth-first pre-order walk below the root as `(depth, id)` pairs;
    /// top-level categories are depth 0.
    pub fn walk(&self) -> Vec<(usize, NodeId)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, NodeId)> = self.nodes[0]
            .children
            .iter()
            .rev()
            .map(|&c| (0, c))
            .collect();
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    /// Every member currently known for `id`: static entries first, then the
    /// resolved directory list.
    pub fn members(&self, id: NodeId) -> Vec<Member> {
        let node = self.node(id);
        let mut out = node.static_members.clone();
        if let Some(resolved) = node.status.members() {
            out.extend(resolved.iter().cloned());
        }
        out
    }

    /// Sort every child list: coded nodes by code, then uncoded nodes by name.
    pub fn sort_children(&mut self) {
        for i in 0..self.nodes.len() {
            let mut children = std::mem::take(&mut self.nodes[i].children);
            children.sort_by(|a, b| child_order(&self.nodes[a.0], &self.nodes[b.0]));
            self.nodes[i].children = children;
        }
    }
}

fn child_order(a: &OrgNode, b: &OrgNode) -> Ordering {
    match (&a.code, &b.code) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
