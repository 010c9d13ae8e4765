//! Hierarchy builder: infers a rooted tree from flat group records.
//!
//! Group display names carry an organizational code (`KCHC100101.教學組`).
//! A group hangs under the surviving group whose code is the longest strict
//! prefix of its own; groups with no such ancestor hang under their
//! category, the configured top-level bucket whose prefix matches longest.
//!
//! ```text
//! records ──► parse ──► classify ──► sort (len, code) ──► attach ──► sort children
//!               │           │
//!               └───────────┴──► dropped (with reason)
//! ```

use crate::error::DropReason;
use crate::tree::{NodeId, NodeKind, OrgNode, OrgTree};
use crate::types::GroupRecord;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

static DISPLAY_NAME: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^([A-Z0-9]+)[.\-_\s]+(.+)$").expect("display-name pattern is valid")
});

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// One `prefix → category` mapping. Several prefixes may share a name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryRule {
    pub prefix: String,
    pub name: String,
    /// Word looked for in raw display names by the permissive fallback.
    /// Defaults to `name`.
    #[serde(default)]
    pub keyword: Option<String>,
}

impl CategoryRule {
    pub fn new(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            name: name.into(),
            keyword: None,
        }
    }
}

/// How records whose code matches no category prefix are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Drop them.
    #[default]
    Strict,
    /// Try the keyword heuristic before dropping.
    Permissive,
}

/// Ordered, name-deduplicated view over the configured category rules.
#[derive(Debug, Clone)]
pub struct Categories {
    rules: Vec<CategoryRule>,
    /// Distinct category names in first-seen order.
    names: Vec<String>,
    /// `rules[i]` belongs to category `rule_category[i]`.
    rule_category: Vec<usize>,
}

impl Categories {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let mut names: Vec<String> = Vec::new();
        let mut rule_category = Vec::with_capacity(rules.len());
        for rule in &rules {
            let idx = match names.iter().position(|n| *n == rule.name) {
                Some(i) => i,
                None => {
                    names.push(rule.name.clone());
                    names.len() - 1
                }
            };
            rule_category.push(idx);
        }
        Self {
            rules,
            names,
            rule_category,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Prefix of the first rule that introduced category `idx`.
    pub fn first_prefix(&self, idx: usize) -> &str {
        self.rule_category
            .iter()
            .position(|&c| c == idx)
            .map(|r| self.rules[r].prefix.as_str())
            .unwrap_or_default()
    }

    /// Longest category prefix of `code`, as `(category, prefix)`. Equal
    /// lengths resolve to the earlier rule.
    pub fn match_code(&self, code: &str) -> Option<(usize, &str)> {
        let mut best: Option<usize> = None;
        for (i, rule) in self.rules.iter().enumerate() {
            if !code.starts_with(rule.prefix.as_str()) {
                continue;
            }
            match best {
                Some(b) if self.rules[b].prefix.len() >= rule.prefix.len() => {}
                _ => best = Some(i),
            }
        }
        best.map(|r| (self.rule_category[r], self.rules[r].prefix.as_str()))
    }

    /// Permissive fallback: the raw display name contains the category
    /// keyword or starts with one of its prefixes.
    pub fn match_keyword(&self, raw: &str) -> Option<usize> {
        self.rules.iter().enumerate().find_map(|(i, rule)| {
            let keyword = rule.keyword.as_deref().unwrap_or(rule.name.as_str());
            let hit = (!keyword.is_empty() && raw.contains(keyword))
                || (!rule.prefix.is_empty() && raw.starts_with(rule.prefix.as_str()));
            hit.then_some(self.rule_category[i])
        })
    }

    /// Owning category of a parsed record, or the reason it is dropped.
    pub fn classify(
        &self,
        code: &str,
        raw: &str,
        policy: MatchPolicy,
    ) -> Result<usize, DropReason> {
        match self.match_code(code) {
            Some((_, prefix)) if prefix == code => Err(DropReason::CategoryMarker),
            Some((category, _)) => Ok(category),
            None => match policy {
                MatchPolicy::Permissive => {
                    self.match_keyword(raw).ok_or(DropReason::NoCategory)
                }
                MatchPolicy::Strict => Err(DropReason::NoCategory),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub code: String,
    pub label: String,
}

/// Split `CODE<sep>label`. `None` for empty names, lowercase codes, missing
/// separators or blank labels.
pub fn parse_display_name(display_name: &str) -> Option<ParsedName> {
    let caps = DISPLAY_NAME.captures(display_name)?;
    let label = caps.get(2)?.as_str().trim();
    if label.is_empty() {
        return None;
    }
    Some(ParsedName {
        code: caps.get(1)?.as_str().to_string(),
        label: label.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

/// Where a parsed group hangs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// Under the surviving record at this index.
    Parent(usize),
    /// Directly under this category.
    Category(usize),
    Dropped(DropReason),
}

/// Candidate parents keyed by code. Duplicate codes keep the earliest index.
#[derive(Debug, Default)]
pub struct ParentIndex<'a> {
    by_code: HashMap<&'a str, usize>,
}

impl<'a> ParentIndex<'a> {
    pub fn new<I>(codes: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut by_code = HashMap::new();
        for (i, code) in codes.into_iter().enumerate() {
            by_code.entry(code).or_insert(i);
        }
        Self { by_code }
    }
}

/// Decide the attachment of `code` given its classification and every
/// surviving candidate. The chosen parent is the candidate whose code is the
/// longest strict prefix of `code`.
pub fn resolve_attachment(
    code: &str,
    owner: Result<usize, DropReason>,
    candidates: &ParentIndex<'_>,
) -> Attachment {
    let category = match owner {
        Ok(category) => category,
        Err(reason) => return Attachment::Dropped(reason),
    };
    (1..code.len())
        .rev()
        .filter(|&len| code.is_char_boundary(len))
        .find_map(|len| candidates.by_code.get(&code[..len]).copied())
        .map(Attachment::Parent)
        .unwrap_or(Attachment::Category(category))
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// A record that did not make it into the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedGroup {
    pub id: String,
    pub display_name: String,
    pub reason: DropReason,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub tree: OrgTree,
    pub dropped: Vec<DroppedGroup>,
    /// Category index → node.
    pub category_nodes: Vec<NodeId>,
}

struct Survivor<'r> {
    record: &'r GroupRecord,
    code: String,
    label: String,
    category: usize,
}

/// Build the organizational tree from `records`.
pub fn build_tree(
    records: &[GroupRecord],
    categories: &Categories,
    policy: MatchPolicy,
    root_name: &str,
) -> BuildReport {
    let mut tree = OrgTree::new(root_name);

    let category_nodes: Vec<NodeId> = categories
        .names()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let id = format!("campus-{}", categories.first_prefix(idx));
            tree.add_child(NodeId::ROOT, OrgNode::new(id, name.clone(), NodeKind::Category))
        })
        .collect();

    let mut dropped = Vec::new();
    let mut survivors: Vec<Survivor<'_>> = Vec::with_capacity(records.len());

    for record in records {
        let outcome = parse_display_name(&record.display_name)
            .ok_or(DropReason::Unparseable)
            .and_then(|parsed| {
                categories
                    .classify(&parsed.code, &record.display_name, policy)
                    .map(|category| (parsed, category))
            });
        match outcome {
            Ok((parsed, category)) => survivors.push(Survivor {
                record,
                code: parsed.code,
                label: parsed.label,
                category,
            }),
            Err(reason) => {
                tracing::debug!(group = %record.id, name = %record.display_name, %reason, "group dropped");
                dropped.push(DroppedGroup {
                    id: record.id.clone(),
                    display_name: record.display_name.clone(),
                    reason,
                });
            }
        }
    }

    // Shorter codes first so every candidate parent already has a node.
    survivors.sort_by(|a, b| a.code.len().cmp(&b.code.len()).then_with(|| a.code.cmp(&b.code)));

    let index = ParentIndex::new(survivors.iter().map(|s| s.code.as_str()));
    let mut node_ids: Vec<NodeId> = Vec::with_capacity(survivors.len());

    for survivor in &survivors {
        let parent = match resolve_attachment(&survivor.code, Ok(survivor.category), &index) {
            Attachment::Parent(p) => node_ids[p],
            Attachment::Category(c) => category_nodes[c],
            Attachment::Dropped(_) => unreachable!("survivors are already classified"),
        };
        let node = OrgNode::new(survivor.record.id.clone(), survivor.label.clone(), NodeKind::Group)
            .with_code(survivor.code.clone())
            .with_group(survivor.record.id.clone());
        node_ids.push(tree.add_child(parent, node));
    }

    tree.sort_children();

    tracing::info!(
        total = records.len(),
        attached = survivors.len(),
        dropped = dropped.len(),
        "org tree built"
    );

    BuildReport {
        tree,
        dropped,
        category_nodes,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
