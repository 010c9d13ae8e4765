//! Search index: flattened `(member, breadcrumb)` pairs with keyword lookup.
//!
//! The flattened list is built lazily by walking the tree and cached until
//! [`SearchIndex::invalidate`] is called. The owning session invalidates on
//! every change to the tree or to the resolved member set.
//!
//! Matching is case-insensitive substring over name, title and email. A
//! member with no substring hit is retried with a fuzzy subsequence match so
//! abbreviated input still finds people; substring hits always rank first.

use crate::tree::{NodeId, OrgTree};
use crate::types::Member;
use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32Str};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Substring,
    Fuzzy(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub member: Member,
    /// Breadcrumb, e.g. `青山校區 / 青山教務處 / 教學組`.
    pub path: String,
    /// Node the member was found under; `None` for users outside the tree.
    pub node: Option<NodeId>,
    pub kind: MatchKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Empty keyword: go back to browsing.
    Browse,
    Hits(Vec<SearchHit>),
}

#[derive(Debug, Clone)]
struct Entry {
    member: Member,
    path: String,
    node: Option<NodeId>,
    fields_lower: [String; 3],
}

impl Entry {
    fn new(member: Member, path: String, node: Option<NodeId>) -> Self {
        let fields_lower = [
            member.name.to_lowercase(),
            member.title.as_deref().unwrap_or_default().to_lowercase(),
            member.email.to_lowercase(),
        ];
        Self {
            member,
            path,
            node,
            fields_lower,
        }
    }

    fn fields(&self) -> [&str; 3] {
        [
            self.member.name.as_str(),
            self.member.title.as_deref().unwrap_or_default(),
            self.member.email.as_str(),
        ]
    }
}

#[derive(Debug)]
pub struct SearchIndex {
    separator: String,
    entries: Option<Vec<Entry>>,
    builds: usize,
}

impl SearchIndex {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            entries: None,
            builds: 0,
        }
    }

    pub fn invalidate(&mut self) {
        if self.entries.take().is_some() {
            tracing::debug!("search index invalidated");
        }
    }

    pub fn is_built(&self) -> bool {
        self.entries.is_some()
    }

    /// How many times the flattened list has been (re)built.
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Search every member reachable from `tree` plus `outside`, the users
    /// that belong to no node (listed under the root name).
    pub fn search(&mut self, tree: &OrgTree, outside: &[Member], keyword: &str) -> SearchOutcome {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return SearchOutcome::Browse;
        }
        let needle = keyword.to_lowercase();
        let entries = self.ensure(tree, outside);

        let pattern = Pattern::new(
            keyword,
            CaseMatching::Ignore,
            Normalization::Smart,
            AtomKind::Fuzzy,
        );
        let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);
        let mut buf = Vec::new();

        let mut exact = Vec::new();
        let mut fuzzy: Vec<(u32, &Entry)> = Vec::new();
        for entry in entries.iter() {
            if entry.fields_lower.iter().any(|f| f.contains(&needle)) {
                exact.push(hit(entry, MatchKind::Substring));
                continue;
            }
            let best = entry
                .fields()
                .iter()
                .filter(|f| !f.is_empty())
                .filter_map(|f| pattern.score(Utf32Str::new(f, &mut buf), &mut matcher))
                .max();
            if let Some(score) = best {
                fuzzy.push((score, entry));
            }
        }
        fuzzy.sort_by(|a, b| b.0.cmp(&a.0));

        tracing::debug!(keyword, exact = exact.len(), fuzzy = fuzzy.len(), "search");
        exact.extend(fuzzy.into_iter().map(|(score, e)| hit(e, MatchKind::Fuzzy(score))));
        SearchOutcome::Hits(exact)
    }

    fn ensure(&mut self, tree: &OrgTree, outside: &[Member]) -> &Vec<Entry> {
        if self.entries.is_none() {
            self.entries = Some(self.flatten(tree, outside));
            self.builds += 1;
        }
        self.entries.get_or_insert_with(Vec::new)
    }

    fn flatten(&self, tree: &OrgTree, outside: &[Member]) -> Vec<Entry> {
        let mut out = Vec::new();
        for (_, id) in tree.walk() {
            let members = tree.members(id);
            if members.is_empty() {
                continue;
            }
            let path = tree.path(id).join(&self.separator);
            out.extend(
                members
                    .into_iter()
                    .map(|m| Entry::new(m, path.clone(), Some(id))),
            );
        }
        let root_name = tree.node(tree.root()).name.clone();
        out.extend(
            outside
                .iter()
                .cloned()
                .map(|m| Entry::new(m, root_name.clone(), None)),
        );
        tracing::debug!(entries = out.len(), "search index built");
        out
    }
}

fn hit(entry: &Entry, kind: MatchKind) -> SearchHit {
    SearchHit {
        member: entry.member.clone(),
        path: entry.path.clone(),
        node: entry.node,
        kind,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
