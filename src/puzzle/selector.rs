use chrono::NaiveDate;

use crate::error::PuzzleError;
use crate::puzzle::Puzzle;

/// Whole days from `start_date` to `today`; negative before the start.
pub fn day_offset(start_date: NaiveDate, today: NaiveDate) -> i64 {
    today.signed_duration_since(start_date).num_days()
}

/// 1-based number of today's puzzle, as shown in the share text.
pub fn puzzle_number(start_date: NaiveDate, today: NaiveDate) -> i64 {
    day_offset(start_date, today) + 1
}

/// Index into a list of `len` puzzles for `today`. Euclidean modulo keeps
/// dates before `start_date` in range.
pub fn puzzle_index(len: usize, start_date: NaiveDate, today: NaiveDate) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let idx = day_offset(start_date, today).rem_euclid(len as i64);
    Some(idx as usize)
}

pub fn select_puzzle(
    puzzles: &[Puzzle],
    start_date: NaiveDate,
    today: NaiveDate,
) -> Result<(usize, &Puzzle), PuzzleError> {
    let idx = puzzle_index(puzzles.len(), start_date, today).ok_or(PuzzleError::InvalidPuzzleSet)?;
    Ok((idx, &puzzles[idx]))
}
