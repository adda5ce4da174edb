use dailyword::session::input::GuessCell;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, BorderType, Widget};

use crate::ui::theme::Theme;

const CELL_WIDTH: u16 = 5;
const CELL_HEIGHT: u16 = 3;
const CELL_GAP: u16 = 1;

/// The row of letter boxes.
pub struct LetterRow<'a> {
    cells: &'a [GuessCell],
    focus: Option<usize>,
    popping: &'a [bool],
    shake_offset: i16,
    solved: bool,
    theme: &'a Theme,
}

impl<'a> LetterRow<'a> {
    pub fn new(cells: &'a [GuessCell], focus: Option<usize>, theme: &'a Theme) -> Self {
        Self {
            cells,
            focus,
            popping: &[],
            shake_offset: 0,
            solved: false,
            theme,
        }
    }

    pub fn popping(mut self, popping: &'a [bool]) -> Self {
        self.popping = popping;
        self
    }

    pub fn shake_offset(mut self, offset: i16) -> Self {
        self.shake_offset = offset;
        self
    }

    pub fn solved(mut self, solved: bool) -> Self {
        self.solved = solved;
        self
    }
}

/// Total width of `n` boxes with gaps.
fn row_width(n: usize) -> u16 {
    let n = n as u16;
    if n == 0 {
        return 0;
    }
    n * CELL_WIDTH + (n - 1) * CELL_GAP
}

/// Left edge of each box, centered in `area` and shifted by `offset`.
fn cell_origins(n: usize, area: Rect, offset: i16) -> Vec<u16> {
    let width = row_width(n).min(area.width);
    let left = area.x + (area.width - width) / 2;
    let left = (left as i32 + offset as i32).clamp(area.x as i32, (area.x + area.width - width) as i32) as u16;
    (0..n as u16)
        .map(|i| left + i * (CELL_WIDTH + CELL_GAP))
        .collect()
}

impl Widget for LetterRow<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        if area.height < CELL_HEIGHT || area.width < row_width(self.cells.len()) {
            // Too narrow for boxes: fall back to a plain line of letters.
            let text = self
                .cells
                .iter()
                .map(|c| c.character.unwrap_or('_').to_string())
                .collect::<Vec<_>>()
                .join(" ");
            buf.set_string(area.x, area.y, text, Style::default().fg(colors.fg()));
            return;
        }

        for (i, x) in cell_origins(self.cells.len(), area, self.shake_offset)
            .into_iter()
            .enumerate()
        {
            let cell = &self.cells[i];
            let rect = Rect::new(x, area.y, CELL_WIDTH, CELL_HEIGHT);
            let focused = self.focus == Some(i) && !self.solved;
            let popping = self.popping.get(i).copied().unwrap_or(false);

            let border_color = if self.solved {
                colors.success()
            } else if focused {
                colors.cell_focused()
            } else if cell.is_filled() {
                colors.cell_filled()
            } else {
                colors.cell_border()
            };
            let block = Block::bordered()
                .border_type(if focused {
                    BorderType::Thick
                } else {
                    BorderType::Rounded
                })
                .border_style(Style::default().fg(border_color));
            let inner = block.inner(rect);
            block.render(rect, buf);

            if let Some(ch) = cell.character {
                let fg = if popping {
                    colors.cell_pop()
                } else if self.solved {
                    colors.success()
                } else {
                    colors.cell_filled()
                };
                let letter: String = ch.to_uppercase().collect();
                buf.set_string(
                    inner.x + inner.width.saturating_sub(1) / 2,
                    inner.y,
                    letter,
                    Style::default().fg(fg).add_modifier(Modifier::BOLD),
                );
            }
        }
    }
}
