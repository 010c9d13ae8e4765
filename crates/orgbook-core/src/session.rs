//! Session: the one place that owns tree, caches and selection.
//!
//! Every mutation that changes which members are reachable (a rebuild, a
//! resolved group, placed users, a forgotten group) invalidates the search
//! index before returning.

use crate::config::{TreeConfig, TreeMode};
use crate::directory::{DirectorySource, RecipientSink};
use crate::error::{DirectoryError, HostError};
use crate::hierarchy::{build_tree, DroppedGroup};
use crate::membership::{MemberRequest, MembershipResolver};
use crate::outline::{build_outline_tree, place_users};
use crate::search::{SearchIndex, SearchOutcome};
use crate::selection::{AddOutcome, Selection};
use crate::tree::{LoadState, Members, NodeId, OrgTree};
use crate::types::{Member, Recipient, RecipientKind};

/// Counts from the last [`Session::initialize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitSummary {
    pub groups: usize,
    pub nodes: usize,
    pub dropped: usize,
    pub users: usize,
    pub unplaced: usize,
}

#[derive(Debug)]
pub struct Session {
    settings: TreeConfig,
    tree: OrgTree,
    resolver: MembershipResolver,
    index: SearchIndex,
    selection: Selection,
    unplaced: Vec<Member>,
    dropped: Vec<DroppedGroup>,
}

impl Session {
    /// An empty session; call [`initialize`](Self::initialize) to populate it.
    pub fn new(settings: TreeConfig) -> Self {
        let tree = OrgTree::new(settings.root_name.clone());
        let index = SearchIndex::new(settings.path_separator.clone());
        Self {
            settings,
            tree,
            resolver: MembershipResolver::new(),
            index,
            selection: Selection::new(),
            unplaced: Vec::new(),
            dropped: Vec::new(),
        }
    }

    pub fn tree(&self) -> &OrgTree {
        &self.tree
    }

    pub fn settings(&self) -> &TreeConfig {
        &self.settings
    }

    pub fn dropped(&self) -> &[DroppedGroup] {
        &self.dropped
    }

    /// Users whose department matched no node.
    pub fn unplaced(&self) -> &[Member] {
        &self.unplaced
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn search_index(&self) -> &SearchIndex {
        &self.index
    }

    /// Build the tree from `source`. Group listing failures are returned;
    /// user listing failures are logged and treated as "no users".
    ///
    /// Any previous tree, member cache and dropped list are discarded. The
    /// selection survives.
    pub async fn initialize(
        &mut self,
        source: &dyn DirectorySource,
        fetch_users: bool,
    ) -> Result<InitSummary, DirectoryError> {
        let mut summary = InitSummary::default();

        let tree = match self.settings.mode {
            TreeMode::Inferred => {
                let groups = source.list_groups().await?;
                summary.groups = groups.len();
                let report = build_tree(
                    &groups,
                    &self.settings.categories(),
                    self.settings.match_policy,
                    &self.settings.root_name,
                );
                self.dropped = report.dropped;
                report.tree
            }
            TreeMode::Outline => {
                self.dropped.clear();
                build_outline_tree(&self.settings.root_name, &self.settings.outline)
            }
        };
        self.tree = tree;
        self.resolver.clear();
        self.unplaced.clear();

        if fetch_users {
            match source.list_all_users().await {
                Ok(users) => {
                    summary.users = users.len();
                    self.unplaced = place_users(&mut self.tree, &users)
                        .iter()
                        .map(Member::from)
                        .collect();
                }
                Err(err) => {
                    tracing::warn!(source = source.name(), error = %err, "user listing failed; search limited to groups");
                }
            }
        }
        self.index.invalidate();

        summary.nodes = self.tree.len() - 1;
        summary.dropped = self.dropped.len();
        summary.unplaced = self.unplaced.len();
        tracing::info!(
            source = source.name(),
            nodes = summary.nodes,
            dropped = summary.dropped,
            users = summary.users,
            "session initialized"
        );
        Ok(summary)
    }

    /// Ask for the members of `node`. On [`MemberRequest::Fetch`] the caller
    /// runs the directory call and reports back through
    /// [`complete_fetch`](Self::complete_fetch).
    pub fn open_node(&mut self, node: NodeId) -> MemberRequest {
        self.resolver.request(&mut self.tree, node)
    }

    pub fn complete_fetch(
        &mut self,
        group_id: &str,
        outcome: Result<Vec<Member>, DirectoryError>,
    ) -> Result<Members, DirectoryError> {
        let result = self.resolver.complete(&mut self.tree, group_id, outcome);
        if result.is_ok() {
            self.index.invalidate();
        }
        result
    }

    /// Resolve `node` in place. `Ok(None)` means a fetch is already running.
    pub async fn load_node(
        &mut self,
        node: NodeId,
        source: &dyn DirectorySource,
    ) -> Result<Option<Members>, DirectoryError> {
        let loaded_before = self.tree.node(node).status.is_loaded();
        let result = self.resolver.load(&mut self.tree, node, source).await;
        if !loaded_before && self.tree.node(node).status.is_loaded() {
            self.index.invalidate();
        }
        result
    }

    /// Start a fetch for every group node that is neither loaded nor
    /// loading. Returns the group ids the caller must fetch.
    pub fn request_unloaded(&mut self) -> Vec<String> {
        let pending: Vec<NodeId> = self
            .tree
            .ids()
            .filter(|&id| {
                let node = self.tree.node(id);
                node.group_id.is_some() && matches!(node.status, LoadState::NotLoaded | LoadState::Failed(_))
            })
            .collect();
        pending
            .into_iter()
            .filter_map(|id| match self.resolver.request(&mut self.tree, id) {
                MemberRequest::Fetch(group) => Some(group),
                _ => None,
            })
            .collect()
    }

    /// Load every unresolved group so search covers the whole tree. Failed
    /// groups are logged and skipped; the count of failures is returned.
    pub async fn prepare_search(&mut self, source: &dyn DirectorySource) -> usize {
        let mut failures = 0;
        for group in self.request_unloaded() {
            let outcome = source.list_group_members(&group).await;
            if self.complete_fetch(&group, outcome).is_err() {
                failures += 1;
            }
        }
        if failures > 0 {
            tracing::warn!(failures, "some groups could not be loaded for search");
        }
        failures
    }

    pub fn search(&mut self, keyword: &str) -> SearchOutcome {
        self.index.search(&self.tree, &self.unplaced, keyword)
    }

    pub fn members_of(&self, node: NodeId) -> Vec<Member> {
        self.tree.members(node)
    }

    /// Drop the cached members of `node`'s group so the next open refetches.
    pub fn reload_node(&mut self, node: NodeId) {
        if let Some(group) = self.tree.node(node).group_id.clone() {
            self.resolver.forget(&mut self.tree, &group);
            self.index.invalidate();
            tracing::debug!(%group, "group members forgotten");
        }
    }

    pub fn add_member(&mut self, member: &Member) -> AddOutcome {
        self.selection.add(member)
    }

    pub fn remove_recipient(&mut self, index: usize) -> Option<Recipient> {
        self.selection.remove(index)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Hand the selection to `sink` and clear it on success.
    pub async fn commit(
        &mut self,
        kind: RecipientKind,
        sink: &dyn RecipientSink,
    ) -> Result<usize, HostError> {
        let count = self.selection.commit(kind, sink).await?;
        self.selection.clear();
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
