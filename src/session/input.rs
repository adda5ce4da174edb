use rand::Rng;
use rand::seq::SliceRandom;

/// One letter box. `filled` always mirrors `character.is_some()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GuessCell {
    pub character: Option<char>,
}

impl GuessCell {
    pub fn is_filled(&self) -> bool {
        self.character.is_some()
    }
}

/// Folds `ch` to the single lowercase letter used for comparison, rejecting
/// anything that isn't a letter or doesn't fold to exactly one char.
pub fn normalize_letter(ch: char) -> Option<char> {
    if !ch.is_alphabetic() {
        return None;
    }
    let mut lower = ch.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// The in-progress guess: one cell per answer letter plus the focused cell.
///
/// Cells only ever move between empty and filled. Backspace retreats focus
/// from an empty cell and never clears a neighbour; typing over a filled
/// cell replaces its letter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LetterInput {
    cells: Vec<GuessCell>,
    focus: Option<usize>,
}

impl LetterInput {
    pub fn new(len: usize) -> Self {
        Self {
            cells: vec![GuessCell::default(); len],
            focus: if len > 0 { Some(0) } else { None },
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[GuessCell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&GuessCell> {
        self.cells.get(index)
    }

    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(GuessCell::is_filled)
    }

    pub fn empty_indices(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_filled())
            .map(|(i, _)| i)
            .collect()
    }

    /// Moves focus to `index` if it names a cell.
    pub fn set_focus(&mut self, index: usize) -> bool {
        if index < self.cells.len() {
            self.focus = Some(index);
            true
        } else {
            false
        }
    }

    /// Writes `ch` into `index`, replacing any letter already there, then
    /// advances focus to the next cell if there is one. Returns false (and
    /// changes nothing) for non-letters or an out-of-range index.
    pub fn type_char(&mut self, index: usize, ch: char) -> bool {
        let Some(letter) = normalize_letter(ch) else {
            return false;
        };
        let Some(cell) = self.cells.get_mut(index) else {
            return false;
        };
        cell.character = Some(letter);

        self.focus = if index + 1 < self.cells.len() {
            Some(index + 1)
        } else {
            Some(index)
        };
        true
    }

    /// Empties `index`; focus is left alone.
    pub fn clear_char(&mut self, index: usize) -> bool {
        match self.cells.get_mut(index) {
            Some(cell) => {
                cell.character = None;
                true
            }
            None => false,
        }
    }

    /// On an empty cell, moves focus back one. Never touches cell contents.
    pub fn backspace(&mut self, index: usize) -> bool {
        match self.cells.get(index) {
            Some(cell) if !cell.is_filled() && index > 0 => {
                self.focus = Some(index - 1);
                true
            }
            _ => false,
        }
    }

    /// Concatenation of every filled cell; empty cells contribute nothing, so
    /// an incomplete guess is shorter than the answer.
    pub fn submit(&self) -> String {
        self.cells.iter().filter_map(|c| c.character).collect()
    }

    /// Fills every cell from `answer`, which must be normalized and of matching length.
    pub fn reveal_all(&mut self, answer: &[char]) {
        for (cell, &letter) in self.cells.iter_mut().zip(answer) {
            cell.character = Some(letter);
        }
    }

    /// Fills one random empty cell with its answer letter. Focus does not move.
    pub fn reveal_hint<R: Rng + ?Sized>(&mut self, answer: &[char], rng: &mut R) -> Option<usize> {
        let empty = self.empty_indices();
        let &idx = empty.choose(rng)?;
        let &letter = answer.get(idx)?;
        self.cells[idx].character = Some(letter);
        Some(idx)
    }
}
