//! Hand-curated trees and department placement.
//!
//! [`build_outline_tree`] turns a configured whitelist outline into an
//! [`OrgTree`] without any inference. [`place_users`] hangs directory users
//! under the node whose code matches the code at the start of their
//! department string.

use crate::tree::{NodeId, NodeKind, OrgNode, OrgTree};
use crate::types::{Member, UserRecord};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

static LEADING_CODE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^([A-Z0-9]+)").expect("leading-code pattern is valid"));

static WHOLE_CODE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Z0-9]+$").expect("code pattern is valid"));

/// `[[tree.outline]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutlineNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub children: Vec<OutlineNode>,
}

/// Build a tree that mirrors `outline` exactly, in configured order.
/// Top-level entries become categories; ids shaped like codes are kept as
/// codes.
pub fn build_outline_tree(root_name: &str, outline: &[OutlineNode]) -> OrgTree {
    let mut tree = OrgTree::new(root_name);
    for entry in outline {
        insert(&mut tree, NodeId::ROOT, entry, NodeKind::Category);
    }
    tracing::info!(nodes = tree.len() - 1, "outline tree built");
    tree
}

fn insert(tree: &mut OrgTree, parent: NodeId, entry: &OutlineNode, kind: NodeKind) {
    let mut node = OrgNode::new(entry.id.clone(), entry.name.clone(), kind);
    if WHOLE_CODE.is_match(&entry.id) {
        node.code = Some(entry.id.clone());
    }
    node.group_id = entry.group_id.clone();
    node.static_members = entry.members.clone();
    let id = tree.add_child(parent, node);
    for child in &entry.children {
        insert(tree, id, child, NodeKind::Group);
    }
}

/// Code at the start of a department string (`KCHC1010.新竹教務處` → `KCHC1010`).
pub fn department_code(department: &str) -> Option<&str> {
    LEADING_CODE
        .captures(department)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Append every user whose department code names a node as a static member
/// of that node. Returns the users that found no node.
pub fn place_users(tree: &mut OrgTree, users: &[UserRecord]) -> Vec<UserRecord> {
    let mut by_code: HashMap<String, NodeId> = HashMap::new();
    for id in tree.ids() {
        if let Some(code) = &tree.node(id).code {
            by_code.entry(code.clone()).or_insert(id);
        }
    }

    let mut unplaced = Vec::new();
    let mut placed = 0usize;
    for user in users {
        let target = user
            .department
            .as_deref()
            .and_then(department_code)
            .and_then(|code| by_code.get(code).copied());
        match target {
            Some(node) => {
                tree.node_mut(node).static_members.push(Member::from(user));
                placed += 1;
            }
            None => unplaced.push(user.clone()),
        }
    }
    tracing::info!(placed, total = users.len(), "users placed by department");
    unplaced
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn outline() -> Vec<OutlineNode> {
        vec![OutlineNode {
            id: "kcqs".into(),
            name: "青山校區".into(),
            group_id: None,
            members: vec![],
            children: vec![OutlineNode {
                id: "KCQS10".into(),
                name: "青山校長室".into(),
                group_id: None,
                members: vec![],
                children: vec![OutlineNode {
                    id: "KCQS100101".into(),
                    name: "青山校長室人會組".into(),
                    group_id: Some("899b4fc4".into()),
                    members: vec![],
                    children: vec![],
                }],
            }],
        }]
    }

    fn user(id: &str, department: Option<&str>) -> UserRecord {
        UserRecord {
            id: id.into(),
            display_name: format!("user {id}"),
            mail: Some(format!("{id}@kcis.test")),
            user_principal_name: None,
            job_title: None,
            department: department.map(str::to_string),
        }
    }

    #[test]
    fn outline_keeps_structure_and_codes() {
        let tree = build_outline_tree("康橋通訊錄", &outline());
        let leaf = tree.find_by_id("KCQS100101").unwrap();
        assert_eq!(tree.node(leaf).group_id.as_deref(), Some("899b4fc4"));
        assert_eq!(tree.node(leaf).code.as_deref(), Some("KCQS100101"));
        assert_eq!(tree.path(leaf), vec!["青山校區", "青山校長室", "青山校長室人會組"]);
        let campus = tree.find_by_id("kcqs").unwrap();
        assert_eq!(tree.node(campus).code, None);
        assert_eq!(tree.node(campus).kind, NodeKind::Category);
    }

    #[test]
    fn department_code_reads_leading_code() {
        assert_eq!(department_code("KCHC1010.新竹教務處"), Some("KCHC1010"));
        assert_eq!(department_code("教務處"), None);
    }

    #[test]
    fn users_placed_by_exact_code() {
        let mut tree = build_outline_tree("root", &outline());
        let unplaced = place_users(
            &mut tree,
            &[
                user("a", Some("KCQS10.青山校長室")),
                user("b", Some("KCQS1099.unknown")),
                user("c", None),
            ],
        );
        let office = tree.find_by_code("KCQS10").unwrap();
        assert_eq!(tree.node(office).static_members.len(), 1);
        assert_eq!(tree.node(office).static_members[0].email, "a@kcis.test");
        let ids: Vec<&str> = unplaced.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }
}
