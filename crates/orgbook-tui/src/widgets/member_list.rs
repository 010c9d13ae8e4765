//! Member list widget: the people under the opened node, or search hits.
//!
//! | Key | Action |
//! |-----|--------|
//! | `↑` / `k`, `↓` / `j` | Move the cursor |
//! | `PageUp` / `Ctrl+u`, `PageDown` / `Ctrl+d` | Move by a page |
//! | `Enter` / `Space` | Add the member under the cursor to the selection |
//!
//! The window follows the cursor; `offset` is the index of the first row on
//! screen.

use std::cell::Cell;

use crate::event::{AppEvent, Direction};
use crate::theme::Theme;
use orgbook_core::{Member, Selection};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget,
    },
};

const PAGE_STEP: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRow {
    pub member: Member,
    /// Breadcrumb, shown for search hits.
    pub path: Option<String>,
    /// The row came from the fuzzy fallback rather than a substring hit.
    pub fuzzy: bool,
}

impl MemberRow {
    pub fn plain(member: Member) -> Self {
        Self {
            member,
            path: None,
            fuzzy: false,
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct MemberListState {
    pub rows: Vec<MemberRow>,
    pub title: String,
    /// Shown instead of rows when the list is empty.
    pub placeholder: String,
    pub cursor: usize,
    pub offset: usize,
    /// Cached from the last render so `handle()` can page correctly.
    last_height: Cell<usize>,
}

impl Default for MemberListState {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            title: "Members".to_string(),
            placeholder: "Enter on a group lists its members".to_string(),
            cursor: 0,
            offset: 0,
            last_height: Cell::new(20),
        }
    }
}

impl MemberListState {
    /// Replace the rows. The cursor is kept when `keep_cursor` is set and
    /// still in range.
    pub fn set_rows(&mut self, title: impl Into<String>, rows: Vec<MemberRow>, keep_cursor: bool) {
        self.title = title.into();
        self.rows = rows;
        if !keep_cursor {
            self.cursor = 0;
            self.offset = 0;
        }
        self.clamp();
    }

    pub fn selected(&self) -> Option<&Member> {
        self.rows.get(self.cursor).map(|r| &r.member)
    }

    fn height(&self) -> usize {
        self.last_height.get().max(1)
    }

    fn clamp(&mut self) {
        self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
        let height = self.height();
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }
    }

    /// Returns the member to add to the selection, if the event asks for one.
    pub fn handle(&mut self, event: &AppEvent) -> Option<Member> {
        if self.rows.is_empty() {
            return None;
        }
        match event {
            AppEvent::Nav(Direction::Up) => self.cursor = self.cursor.saturating_sub(1),
            AppEvent::Nav(Direction::Down) => self.cursor += 1,
            AppEvent::ScrollUp => self.cursor = self.cursor.saturating_sub(PAGE_STEP),
            AppEvent::ScrollDown => self.cursor += PAGE_STEP,
            AppEvent::Enter | AppEvent::Char(' ') => return self.selected().cloned(),
            _ => return None,
        }
        self.clamp();
        tracing::debug!(cursor = self.cursor, offset = self.offset, "members: cursor");
        None
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

pub struct MemberList<'a> {
    state: &'a MemberListState,
    selection: &'a Selection,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> MemberList<'a> {
    pub fn new(
        state: &'a MemberListState,
        selection: &'a Selection,
        focused: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            state,
            selection,
            focused,
            theme,
        }
    }
}

impl Widget for MemberList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(format!(" {} ", self.state.title))
            .border_style(self.theme.border(self.focused));
        let inner = block.inner(area);
        block.render(area, buf);

        let height = inner.height as usize;
        self.state.last_height.set(height);

        if self.state.rows.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                self.state.placeholder.as_str(),
                Style::default().add_modifier(Modifier::DIM),
            )))
            .render(inner, buf);
            return;
        }

        let total = self.state.rows.len();
        let start = self.state.offset.min(total);
        let end = (start + height).min(total);

        let lines: Vec<Line<'static>> = self.state.rows[start..end]
            .iter()
            .enumerate()
            .map(|(row, entry)| {
                let picked = self.selection.contains_email(&entry.member.email);
                let mut line = render_row(entry, picked, self.theme);
                if self.focused && start + row == self.state.cursor {
                    line = line.patch_style(Style::default().add_modifier(Modifier::REVERSED));
                }
                line
            })
            .collect();

        let text_area = Rect {
            width: inner.width.saturating_sub(1),
            ..inner
        };
        let sb_area = Rect {
            x: inner.right().saturating_sub(1),
            width: 1,
            ..inner
        };
        Paragraph::new(lines).render(text_area, buf);

        let mut sb_state = ScrollbarState::new(total)
            .position(start)
            .viewport_content_length(height);
        StatefulWidget::render(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(None)
                .end_symbol(None),
            sb_area,
            buf,
            &mut sb_state,
        );
    }
}

fn render_row(row: &MemberRow, picked: bool, theme: &Theme) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    spans.push(if picked {
        Span::styled("✓ ", theme.member_selected)
    } else {
        Span::raw("  ")
    });

    let name_style = if row.fuzzy {
        theme.search_highlight
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    spans.push(Span::styled(row.member.name.clone(), name_style));

    if let Some(title) = row.member.title.as_deref().filter(|t| !t.is_empty()) {
        spans.push(Span::styled(format!("  {title}"), theme.member_title));
    }
    if !row.member.email.is_empty() {
        spans.push(Span::styled(format!("  <{}>", row.member.email), theme.member_email));
    }
    if let Some(path) = &row.path {
        spans.push(Span::styled(format!("  {path}"), theme.member_path));
    }
    Line::from(spans)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
