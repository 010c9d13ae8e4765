//! Organization tree widget, the collapsible hierarchy in the left pane.
//!
//! # Navigation
//! - `↑`/`k` and `↓`/`j` move the cursor up and down the visible list.
//! - `→`/`l` expands the focused node; `←`/`h` collapses it, or jumps to the
//!   parent when it is already collapsed.
//! - `Enter` lists the node's members and toggles expansion.
//! - `r` forgets the node's cached members and lists them again.

use crate::event::{AppEvent, Direction};
use crate::theme::Theme;
use orgbook_core::{LoadState, NodeId, NodeKind, OrgTree};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem, ListState, StatefulWidget, Widget},
};
use std::collections::HashSet;

/// What the app shell should do after a tree event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeAction {
    Open(NodeId),
    Reload(NodeId),
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct OrgTreeState {
    expanded: HashSet<NodeId>,
    /// Index into the currently visible (flattened) list.
    pub cursor: usize,
}

impl OrgTreeState {
    pub fn reset(&mut self) {
        self.expanded.clear();
        self.cursor = 0;
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    /// Flatten the tree below the root into `(depth, id)` pairs, respecting
    /// expansion.
    pub fn visible(&self, tree: &OrgTree) -> Vec<(usize, NodeId)> {
        let mut out = Vec::new();
        let mut stack: Vec<(usize, NodeId)> =
            tree.children(tree.root()).iter().rev().map(|&c| (0, c)).collect();
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            if self.expanded.contains(&id) {
                stack.extend(tree.children(id).iter().rev().map(|&c| (depth + 1, c)));
            }
        }
        out
    }

    pub fn cursor_node(&self, tree: &OrgTree) -> Option<NodeId> {
        self.visible(tree).get(self.cursor).map(|&(_, id)| id)
    }

    /// Expand every ancestor of `id` and put the cursor on it.
    pub fn reveal(&mut self, tree: &OrgTree, id: NodeId) {
        let mut cursor = tree.node(id).parent;
        while let Some(parent) = cursor {
            self.expanded.insert(parent);
            cursor = tree.node(parent).parent;
        }
        if let Some(pos) = self.visible(tree).iter().position(|&(_, n)| n == id) {
            self.cursor = pos;
        }
    }

    pub fn handle(&mut self, event: &AppEvent, tree: &OrgTree) -> Option<TreeAction> {
        let visible_len = self.visible(tree).len();
        match event {
            AppEvent::Nav(Direction::Up) => {
                self.cursor = self.cursor.saturating_sub(1);
                tracing::debug!(cursor = self.cursor, "tree: cursor up");
                None
            }
            AppEvent::Nav(Direction::Down) => {
                if self.cursor + 1 < visible_len {
                    self.cursor += 1;
                }
                tracing::debug!(cursor = self.cursor, "tree: cursor down");
                None
            }
            AppEvent::Nav(Direction::Right) => {
                let id = self.cursor_node(tree)?;
                if !tree.node(id).is_leaf() {
                    tracing::debug!(node = %tree.node(id).id, "tree: expand");
                    self.expanded.insert(id);
                }
                None
            }
            AppEvent::Nav(Direction::Left) => {
                let id = self.cursor_node(tree)?;
                if self.expanded.remove(&id) {
                    tracing::debug!(node = %tree.node(id).id, "tree: collapse");
                } else if let Some(parent) = tree.node(id).parent.filter(|&p| p != tree.root()) {
                    self.reveal(tree, parent);
                }
                self.clamp_cursor(tree);
                None
            }
            AppEvent::Enter => {
                let id = self.cursor_node(tree)?;
                if !tree.node(id).is_leaf() && !self.expanded.remove(&id) {
                    self.expanded.insert(id);
                }
                self.clamp_cursor(tree);
                tracing::debug!(node = %tree.node(id).id, "tree: open");
                Some(TreeAction::Open(id))
            }
            AppEvent::Char('r') => self.cursor_node(tree).map(TreeAction::Reload),
            _ => None,
        }
    }

    fn clamp_cursor(&mut self, tree: &OrgTree) {
        let max = self.visible(tree).len().saturating_sub(1);
        if self.cursor > max {
            self.cursor = max;
        }
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

pub struct OrgTreeView<'a> {
    state: &'a OrgTreeState,
    tree: &'a OrgTree,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> OrgTreeView<'a> {
    pub fn new(state: &'a OrgTreeState, tree: &'a OrgTree, focused: bool, theme: &'a Theme) -> Self {
        Self {
            state,
            tree,
            focused,
            theme,
        }
    }
}

impl Widget for OrgTreeView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let root_name = self.tree.node(self.tree.root()).name.as_str();
        let block = Block::bordered()
            .title(format!(" {root_name} "))
            .border_style(self.theme.border(self.focused));
        let inner = block.inner(area);
        block.render(area, buf);

        let items: Vec<ListItem> = self
            .state
            .visible(self.tree)
            .into_iter()
            .map(|(depth, id)| {
                let node = self.tree.node(id);
                let indent = "  ".repeat(depth);
                let expand = if node.is_leaf() {
                    "  "
                } else if self.state.is_expanded(id) {
                    "▼ "
                } else {
                    "▶ "
                };
                let name_style = match node.kind {
                    NodeKind::Category => self.theme.category_style(&node.name),
                    _ => Style::default(),
                };
                let marker = match &node.status {
                    LoadState::NotLoaded => String::new(),
                    LoadState::Loading => " …".to_string(),
                    LoadState::Loaded { members, .. } => format!(" ({})", members.len()),
                    LoadState::Failed(_) => " !".to_string(),
                };
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{indent}{expand}")),
                    Span::styled(node.name.clone(), name_style),
                    Span::styled(marker, self.theme.status_style(&node.status)),
                ]))
            })
            .collect();

        let list =
            List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut list_state = ListState::default().with_selected(Some(self.state.cursor));
        StatefulWidget::render(list, inner, buf, &mut list_state);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
