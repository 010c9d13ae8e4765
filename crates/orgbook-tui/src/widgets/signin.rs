//! Full-screen notice shown while the directory cannot be read.

use super::help::centered_rect;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};

pub struct SignInScreen<'a> {
    message: &'a str,
    can_login: bool,
    theme: &'a Theme,
}

impl<'a> SignInScreen<'a> {
    pub fn new(message: &'a str, can_login: bool, theme: &'a Theme) -> Self {
        Self {
            message,
            can_login,
            theme,
        }
    }
}

impl Widget for SignInScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_rect(64, 9, area);
        Clear.render(popup, buf);

        let block = Block::bordered()
            .title(" Directory unavailable ")
            .border_style(self.theme.status_error);
        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut keys = vec![Span::styled("r", Style::default().add_modifier(Modifier::BOLD)), Span::raw(" retry   ")];
        if self.can_login {
            keys.push(Span::styled("L", Style::default().add_modifier(Modifier::BOLD)));
            keys.push(Span::raw(" sign in   "));
        }
        keys.push(Span::styled("q", Style::default().add_modifier(Modifier::BOLD)));
        keys.push(Span::raw(" quit"));

        let lines = vec![
            Line::from(Span::styled(self.message, self.theme.status_error)),
            Line::default(),
            Line::from(keys),
        ];
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}
