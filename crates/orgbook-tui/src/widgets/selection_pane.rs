//! Picked recipients, in pick order. `d`, `Delete` or `Backspace` removes
//! the highlighted entry.

use crate::event::{AppEvent, Direction};
use crate::theme::Theme;
use orgbook_core::Selection;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

#[derive(Debug, Default)]
pub struct SelectionPaneState {
    pub cursor: usize,
}

impl SelectionPaneState {
    /// Returns the index to remove, if the event asks for a removal.
    pub fn handle(&mut self, event: &AppEvent, len: usize) -> Option<usize> {
        match event {
            AppEvent::Nav(Direction::Up) => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            AppEvent::Nav(Direction::Down) => {
                if self.cursor + 1 < len {
                    self.cursor += 1;
                }
                None
            }
            AppEvent::Delete | AppEvent::Backspace | AppEvent::Char('d') if self.cursor < len => {
                Some(self.cursor)
            }
            _ => None,
        }
    }

    pub fn clamp(&mut self, len: usize) {
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }
}

pub struct SelectionPane<'a> {
    state: &'a SelectionPaneState,
    selection: &'a Selection,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> SelectionPane<'a> {
    pub fn new(
        state: &'a SelectionPaneState,
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

impl Widget for SelectionPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(format!(" Selected ({}) ", self.selection.len()))
            .title_bottom(" :to  :cc  :bcc ")
            .border_style(self.theme.border(self.focused));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.selection.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "Nobody yet",
                Style::default().add_modifier(Modifier::DIM),
            )))
            .render(inner, buf);
            return;
        }

        let items: Vec<ListItem> = self
            .selection
            .recipients()
            .iter()
            .map(|r| {
                ListItem::new(Line::from(vec![
                    Span::raw(r.display_name.clone()),
                    Span::styled(format!("  <{}>", r.email), self.theme.member_email),
                ]))
            })
            .collect();

        let mut list = List::new(items);
        if self.focused {
            list = list.highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        }
        let mut list_state = ListState::default().with_selected(Some(self.state.cursor));
        StatefulWidget::render(list, inner, buf, &mut list_state);
    }
}
