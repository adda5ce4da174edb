use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget, Wrap};

use crate::ui::theme::Theme;

/// Shows the share text so it can be selected and copied from the terminal.
pub struct SharePopup<'a> {
    text: &'a str,
    theme: &'a Theme,
}

impl<'a> SharePopup<'a> {
    pub fn new(text: &'a str, theme: &'a Theme) -> Self {
        Self { text, theme }
    }
}

impl Widget for SharePopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        Clear.render(area, buf);

        let block = Block::bordered()
            .title(" Share your result ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));

        let mut lines: Vec<Line> = self
            .text
            .lines()
            .map(|l| {
                Line::from(Span::styled(
                    l.to_string(),
                    Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
                ))
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Select to copy. It is also printed when you quit.  [any key] Close",
            Style::default().fg(colors.text_dim()),
        )));

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
