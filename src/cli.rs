//! Non-interactive subcommands: print the tree, search, list members, and
//! generate a demo member snapshot.
//!
//! Each command writes plain text to `out` so harnesses can capture it.

use anyhow::{bail, Context};
use orgbook_core::config::Config;
use orgbook_core::{DirectorySource, LoadState, SearchOutcome, Session};
use orgbook_sources::{collect_group_ids, generate_snapshot, write_snapshot};
use std::io::Write;
use std::path::Path;

/// Build a session from `source` using the `[tree]` settings.
pub async fn open_session(
    config: &Config,
    source: &dyn DirectorySource,
) -> anyhow::Result<Session> {
    let mut session = Session::new(config.tree.clone());
    session
        .initialize(source, config.directory.fetch_users)
        .await
        .context("building the organization tree")?;
    Ok(session)
}

// ---------------------------------------------------------------------------
// tree
// ---------------------------------------------------------------------------

pub fn print_tree(session: &Session, out: &mut impl Write, show_dropped: bool) -> anyhow::Result<()> {
    let tree = session.tree();
    writeln!(out, "{}", tree.node(tree.root()).name)?;
    for (depth, id) in tree.walk() {
        let node = tree.node(id);
        let indent = "  ".repeat(depth + 1);
        match &node.code {
            Some(code) => write!(out, "{indent}{code} {}", node.name)?,
            None => write!(out, "{indent}{}", node.name)?,
        }
        match &node.status {
            LoadState::Loaded { members, .. } => write!(out, " ({})", members.len())?,
            LoadState::Failed(_) => write!(out, " !")?,
            _ => {}
        }
        writeln!(out)?;
    }

    if show_dropped && !session.dropped().is_empty() {
        writeln!(out)?;
        writeln!(out, "skipped {} groups:", session.dropped().len())?;
        for dropped in session.dropped() {
            writeln!(out, "  {} {:?} ({})", dropped.id, dropped.display_name, dropped.reason)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

/// Load every group, then print one tab-separated line per hit:
/// `name, title, email, path`. Returns the hit count.
pub async fn search(
    session: &mut Session,
    source: &dyn DirectorySource,
    keyword: &str,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let failures = session.prepare_search(source).await;
    if failures > 0 {
        eprintln!("warning: {failures} groups could not be loaded; results may be incomplete");
    }

    let hits = match session.search(keyword) {
        SearchOutcome::Browse => bail!("search keyword is empty"),
        SearchOutcome::Hits(hits) => hits,
    };
    for hit in &hits {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            hit.member.name,
            hit.member.title.as_deref().unwrap_or("-"),
            hit.member.email,
            hit.path
        )?;
    }
    Ok(hits.len())
}

// ---------------------------------------------------------------------------
// members
// ---------------------------------------------------------------------------

/// Print the members of the node with code or id `key`.
pub async fn members(
    session: &mut Session,
    source: &dyn DirectorySource,
    key: &str,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let tree = session.tree();
    let Some(node) = tree.find_by_code(key).or_else(|| tree.find_by_id(key)) else {
        bail!("no node with code or id {key:?}");
    };
    session
        .load_node(node, source)
        .await
        .with_context(|| format!("loading members of {key}"))?;

    let members = session.members_of(node);
    for member in &members {
        match &member.title {
            Some(title) => writeln!(out, "{} <{}>  {title}", member.name, member.email)?,
            None => writeln!(out, "{} <{}>", member.name, member.email)?,
        }
    }
    Ok(members.len())
}

// ---------------------------------------------------------------------------
// generate-snapshot
// ---------------------------------------------------------------------------

/// Write demo members for the outline's groups (or every exported group
/// when no outline is configured) to `path`. Returns the group count.
pub async fn generate(
    config: &Config,
    source: &dyn DirectorySource,
    path: &Path,
) -> anyhow::Result<usize> {
    let groups = source.list_groups().await.context("listing groups")?;
    let mut ids = collect_group_ids(&config.tree.outline);
    if ids.is_empty() {
        ids = groups.iter().map(|g| g.id.clone()).collect();
    }
    let snapshot = generate_snapshot(&groups, &ids, &config.snapshot);
    write_snapshot(path, &snapshot).with_context(|| format!("writing {}", path.display()))?;
    Ok(snapshot.len())
}
