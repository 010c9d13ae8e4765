//! Demo member snapshot generation.
//!
//! For every group id named in the outline, derive a handful of placeholder
//! members from the group export so the pane can be exercised without a
//! directory connection.

use orgbook_core::config::SnapshotConfig;
use orgbook_core::outline::OutlineNode;
use orgbook_core::{GroupRecord, Member};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEMO_TITLE: &str = "示範資料";

/// Every `group_id` in `outline`, depth first, in configured order.
pub fn collect_group_ids(outline: &[OutlineNode]) -> Vec<String> {
    fn walk(nodes: &[OutlineNode], out: &mut Vec<String>) {
        for node in nodes {
            if let Some(id) = &node.group_id {
                out.push(id.clone());
            }
            walk(&node.children, out);
        }
    }
    let mut out = Vec::new();
    walk(outline, &mut out);
    out
}

/// Build the `{ groupId: [Member] }` map. Group ids missing from `groups`
/// map to an empty list and are logged.
pub fn generate_snapshot(
    groups: &[GroupRecord],
    group_ids: &[String],
    settings: &SnapshotConfig,
) -> BTreeMap<String, Vec<Member>> {
    let mut out = BTreeMap::new();
    for id in group_ids {
        let members = match groups.iter().find(|g| &g.id == id) {
            Some(group) => demo_members(group, settings),
            None => {
                tracing::warn!(group = %id, "group id not found in export");
                Vec::new()
            }
        };
        out.insert(id.clone(), members);
    }
    out
}

fn demo_members(group: &GroupRecord, settings: &SnapshotConfig) -> Vec<Member> {
    let display = if group.display_name.is_empty() {
        group.id.as_str()
    } else {
        group.display_name.as_str()
    };
    let label = display.split('.').nth(1).unwrap_or(display);
    let fallback = format!("{}@example.com", group.id);
    let mail = group.mail.as_deref().filter(|m| !m.is_empty()).unwrap_or(&fallback);
    let mail_prefix = mail.split('@').next().unwrap_or(mail);

    (1..=settings.members_per_group)
        .map(|n| {
            Member::new(
                format!("{}-member-{n}", group.id),
                format!("{label} 成員{n}"),
                format!("{mail_prefix}.member{n}@{}", settings.mail_domain),
            )
            .with_title(DEMO_TITLE)
        })
        .collect()
}

pub fn write_snapshot(path: &Path, snapshot: &BTreeMap<String, Vec<Member>>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), groups = snapshot.len(), "member snapshot written");
    Ok(())
}
