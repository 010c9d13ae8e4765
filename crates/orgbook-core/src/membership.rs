//! Membership resolver: lazy, once-per-group member loading.
//!
//! Resolution is split in two so the UI can run the directory call on a
//! background task:
//!
//! 1. [`MembershipResolver::request`] answers from the cache, reports an
//!    in-flight fetch, or marks the group `Loading` and asks the caller to
//!    fetch.
//! 2. [`MembershipResolver::complete`] stores the outcome and mirrors it onto
//!    every node that lists the group.
//!
//! [`MembershipResolver::load`] chains both for sequential callers.

use crate::directory::DirectorySource;
use crate::error::DirectoryError;
use crate::tree::{LoadState, Members, NodeId, OrgTree};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub enum MemberRequest {
    /// Already resolved; no directory call needed.
    Ready(Members),
    /// The caller must fetch this group and call `complete`.
    Fetch(String),
    /// A fetch for this group is running. The request is dropped, not queued.
    InFlight,
    /// The node lists no directory group.
    NoGroup,
}

#[derive(Debug, Default)]
pub struct MembershipResolver {
    cache: HashMap<String, Members>,
    in_flight: HashSet<String>,
}

impl MembershipResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self, group_id: &str) -> Option<&Members> {
        self.cache.get(group_id)
    }

    pub fn is_in_flight(&self, group_id: &str) -> bool {
        self.in_flight.contains(group_id)
    }

    pub fn request(&mut self, tree: &mut OrgTree, node: NodeId) -> MemberRequest {
        let Some(group_id) = tree.node(node).group_id.clone() else {
            return MemberRequest::NoGroup;
        };
        if let Some(members) = self.cache.get(&group_id) {
            return MemberRequest::Ready(members.clone());
        }
        if !self.in_flight.insert(group_id.clone()) {
            tracing::debug!(group = %group_id, "member fetch already in flight");
            return MemberRequest::InFlight;
        }
        set_status(tree, &group_id, |_| Some(LoadState::Loading));
        tracing::debug!(group = %group_id, "member fetch started");
        MemberRequest::Fetch(group_id)
    }

    /// Record the outcome of a fetch started by [`request`](Self::request).
    ///
    /// A failure leaves nothing cached, so the next request fetches again.
    pub fn complete(
        &mut self,
        tree: &mut OrgTree,
        group_id: &str,
        outcome: Result<Vec<crate::types::Member>, DirectoryError>,
    ) -> Result<Members, DirectoryError> {
        self.in_flight.remove(group_id);
        match outcome {
            Ok(list) => {
                let members = self
                    .cache
                    .entry(group_id.to_string())
                    .or_insert_with(|| Members::from(list))
                    .clone();
                let loaded_at = chrono::Utc::now();
                set_status(tree, group_id, |current| {
                    (!current.is_loaded()).then(|| LoadState::Loaded {
                        members: members.clone(),
                        loaded_at,
                    })
                });
                tracing::debug!(group = %group_id, count = members.len(), "members loaded");
                Ok(members)
            }
            Err(err) => {
                let reason = err.to_string();
                set_status(tree, group_id, |current| {
                    (!current.is_loaded()).then(|| LoadState::Failed(reason.clone()))
                });
                tracing::warn!(group = %group_id, error = %err, "member fetch failed");
                Err(err)
            }
        }
    }

    /// Resolve `node` end to end. `Ok(None)` means another fetch for the same
    /// group is still running.
    pub async fn load(
        &mut self,
        tree: &mut OrgTree,
        node: NodeId,
        source: &dyn DirectorySource,
    ) -> Result<Option<Members>, DirectoryError> {
        match self.request(tree, node) {
            MemberRequest::Ready(members) => Ok(Some(members)),
            MemberRequest::NoGroup => Ok(Some(Members::from(Vec::new()))),
            MemberRequest::InFlight => Ok(None),
            MemberRequest::Fetch(group_id) => {
                let outcome = source.list_group_members(&group_id).await;
                self.complete(tree, &group_id, outcome).map(Some)
            }
        }
    }

    /// Drop the cached list for `group_id` so the next request refetches.
    pub fn forget(&mut self, tree: &mut OrgTree, group_id: &str) {
        self.cache.remove(group_id);
        set_status(tree, group_id, |_| Some(LoadState::NotLoaded));
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.in_flight.clear();
    }
}

fn set_status<F>(tree: &mut OrgTree, group_id: &str, mut next: F)
where
    F: FnMut(&LoadState) -> Option<LoadState>,
{
    let nodes: Vec<NodeId> = tree.nodes_with_group(group_id).collect();
    for id in nodes {
        let node = tree.node_mut(id);
        if let Some(state) = next(&node.status) {
            node.status = state;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
