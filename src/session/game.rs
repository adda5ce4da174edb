use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::error::{GameError, PuzzleError};
use crate::puzzle::selector::{puzzle_number, select_puzzle};
use crate::puzzle::{Puzzle, PuzzleSet};
use crate::session::input::{GuessCell, LetterInput, normalize_letter};
use crate::session::share;
use crate::session::streak::StreakTracker;

pub const DEFAULT_SHARE_TITLE: &str = "Daily Word";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Some cell is still empty. Drives the shake feedback, nothing is recorded.
    Incomplete,
    Correct,
    Incorrect,
}

/// Notifications for the presentation layer, drained with [`Game::drain_events`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    CellChanged(usize),
    FocusChanged(Option<usize>),
    Outcome(Outcome),
    StreakChanged(u32),
    ShareRequested(String),
    /// The streak could not be saved; it is still valid for this session.
    PersistenceWarning(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundState {
    Playing,
    Solved,
    /// The player gave up and the answer was shown.
    Revealed,
}

struct ActivePuzzle {
    puzzle: Puzzle,
    start_date: NaiveDate,
    answer: Vec<char>,
    input: LetterInput,
    state: RoundState,
    hints_used: usize,
}

pub struct Game {
    streak: StreakTracker,
    active: Option<ActivePuzzle>,
    rng: SmallRng,
    events: Vec<GameEvent>,
    share_title: String,
}

impl Game {
    pub fn new(streak: StreakTracker) -> Self {
        Self::with_rng(streak, SmallRng::from_entropy())
    }

    pub fn with_rng(streak: StreakTracker, rng: SmallRng) -> Self {
        Self {
            streak,
            active: None,
            rng,
            events: Vec::new(),
            share_title: DEFAULT_SHARE_TITLE.to_string(),
        }
    }

    pub fn set_share_title(&mut self, title: &str) {
        self.share_title = title.to_string();
    }

    /// Selects today's puzzle and starts a fresh round. On failure no puzzle is
    /// active afterwards, even if one was before.
    pub fn load_puzzle(&mut self, set: &PuzzleSet, today: NaiveDate) -> Result<(), GameError> {
        self.active = None;
        let (index, puzzle) = select_puzzle(&set.puzzles, set.start_date, today)?;
        let answer = validate_puzzle(index, puzzle)?;

        let input = LetterInput::new(answer.len());
        log::info!(
            "puzzle #{} for {today} ({} letters)",
            puzzle_number(set.start_date, today),
            answer.len()
        );
        self.events.push(GameEvent::FocusChanged(input.focus()));
        self.active = Some(ActivePuzzle {
            puzzle: puzzle.clone(),
            start_date: set.start_date,
            answer,
            input,
            state: RoundState::Playing,
            hints_used: 0,
        });
        Ok(())
    }

    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.active.as_ref().map(|a| &a.puzzle)
    }

    pub fn input(&self) -> Option<&LetterInput> {
        self.active.as_ref().map(|a| &a.input)
    }

    pub fn state(&self) -> Option<RoundState> {
        self.active.as_ref().map(|a| a.state)
    }

    pub fn is_over(&self) -> bool {
        matches!(
            self.state(),
            Some(RoundState::Solved | RoundState::Revealed)
        )
    }

    pub fn hints_used(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.hints_used)
    }

    pub fn streak(&self) -> &StreakTracker {
        &self.streak
    }

    pub fn already_won_today(&self, today: NaiveDate) -> bool {
        self.streak.has_played(today)
    }

    /// Types into the focused cell.
    pub fn type_char(&mut self, ch: char) -> Result<bool, GameError> {
        let Some(focus) = self.input().and_then(LetterInput::focus) else {
            return self.require_active().map(|_| false);
        };
        self.type_char_at(focus, ch)
    }

    pub fn type_char_at(&mut self, index: usize, ch: char) -> Result<bool, GameError> {
        self.edit(|input, _, _| input.type_char(index, ch))
            .map(|typed| typed.unwrap_or(false))
    }

    pub fn clear_char(&mut self, index: usize) -> Result<bool, GameError> {
        self.edit(|input, _, _| input.clear_char(index))
            .map(|cleared| cleared.unwrap_or(false))
    }

    /// Retreat-only backspace on the focused cell.
    pub fn backspace(&mut self) -> Result<bool, GameError> {
        self.edit(|input, _, _| input.focus().is_some_and(|f| input.backspace(f)))
            .map(|moved| moved.unwrap_or(false))
    }

    pub fn focus_cell(&mut self, index: usize) -> Result<bool, GameError> {
        self.edit(|input, _, _| input.set_focus(index))
            .map(|moved| moved.unwrap_or(false))
    }

    /// Evaluates the current guess. A correct guess reveals the word and
    /// records today's win once; wrong or incomplete guesses leave the cells
    /// as they are for another try.
    pub fn check_answer(&mut self, today: NaiveDate) -> Result<Outcome, GameError> {
        let active = self.active.as_ref().ok_or(GameError::NoPuzzleLoaded)?;
        match active.state {
            RoundState::Revealed => return Err(GameError::RoundOver),
            // The win was recorded when the round was solved.
            RoundState::Solved => {
                self.events.push(GameEvent::Outcome(Outcome::Correct));
                return Ok(Outcome::Correct);
            }
            RoundState::Playing => {}
        }

        let guess: Vec<char> = active.input.submit().chars().collect();
        let outcome = if guess.len() != active.answer.len() || !active.input.is_complete() {
            Outcome::Incomplete
        } else if guess == active.answer {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        };
        log::debug!("guess checked: {outcome:?}");

        if outcome == Outcome::Correct {
            self.edit_unlocked(|input, answer, _| input.reveal_all(answer))?;
            if let Some(active) = self.active.as_mut() {
                active.state = RoundState::Solved;
            }
            self.record_win(today);
        }
        self.events.push(GameEvent::Outcome(outcome));
        Ok(outcome)
    }

    /// Reveals one random empty letter. `None` once every cell is filled or the
    /// round is over.
    pub fn request_hint(&mut self) -> Result<Option<usize>, GameError> {
        let hinted = self
            .edit(|input, answer, rng| input.reveal_hint(answer, rng))?
            .flatten();
        if let (Some(idx), Some(active)) = (hinted, self.active.as_mut()) {
            active.hints_used += 1;
            log::debug!("hint revealed cell {idx} ({} used)", active.hints_used);
        }
        Ok(hinted)
    }

    /// Shows the whole answer without counting a win.
    pub fn reveal(&mut self) -> Result<(), GameError> {
        if self.edit(|input, answer, _| input.reveal_all(answer))?.is_some()
            && let Some(active) = self.active.as_mut()
        {
            active.state = RoundState::Revealed;
            log::info!("answer revealed without a win");
        }
        Ok(())
    }

    /// Text to share, available once today's win is recorded.
    pub fn share_text(&self, today: NaiveDate) -> Option<String> {
        let active = self.active.as_ref()?;
        if !self.streak.has_played(today) {
            return None;
        }
        Some(share::share_text(
            &self.share_title,
            puzzle_number(active.start_date, today),
            &active.puzzle.clue,
            self.streak.current_streak(),
            active.hints_used,
        ))
    }

    pub fn request_share(&mut self, today: NaiveDate) -> Option<String> {
        let text = self.share_text(today)?;
        self.events.push(GameEvent::ShareRequested(text.clone()));
        Some(text)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn require_active(&self) -> Result<&ActivePuzzle, GameError> {
        self.active.as_ref().ok_or(GameError::NoPuzzleLoaded)
    }

    fn record_win(&mut self, today: NaiveDate) {
        let already = self.streak.has_played(today);
        match self.streak.record_win(today) {
            Ok(record) => {
                if !already {
                    self.events.push(GameEvent::StreakChanged(record.streak_count));
                }
            }
            Err(err) => {
                log::warn!("streak not saved: {err}");
                self.events
                    .push(GameEvent::StreakChanged(self.streak.current_streak()));
                self.events
                    .push(GameEvent::PersistenceWarning(err.to_string()));
            }
        }
    }

    /// Runs a player edit. `Ok(None)` means the round is over and nothing ran.
    fn edit<R>(
        &mut self,
        f: impl FnOnce(&mut LetterInput, &[char], &mut SmallRng) -> R,
    ) -> Result<Option<R>, GameError> {
        if self.require_active()?.state != RoundState::Playing {
            return Ok(None);
        }
        self.edit_unlocked(f).map(Some)
    }

    /// Applies `f` to the input and emits change events by diffing before/after.
    fn edit_unlocked<R>(
        &mut self,
        f: impl FnOnce(&mut LetterInput, &[char], &mut SmallRng) -> R,
    ) -> Result<R, GameError> {
        let active = self.active.as_mut().ok_or(GameError::NoPuzzleLoaded)?;
        let before: Vec<GuessCell> = active.input.cells().to_vec();
        let focus_before = active.input.focus();

        let result = f(&mut active.input, &active.answer, &mut self.rng);

        for (i, (old, new)) in before.iter().zip(active.input.cells()).enumerate() {
            if old != new {
                self.events.push(GameEvent::CellChanged(i));
            }
        }
        if active.input.focus() != focus_before {
            self.events.push(GameEvent::FocusChanged(active.input.focus()));
        }
        Ok(result)
    }
}

/// Normalized answer letters for a puzzle that can actually be played.
fn validate_puzzle(index: usize, puzzle: &Puzzle) -> Result<Vec<char>, PuzzleError> {
    let malformed = |reason: &str| PuzzleError::MalformedPuzzle {
        index,
        reason: reason.to_string(),
    };
    if puzzle.clue.trim().is_empty() {
        return Err(malformed("missing clue"));
    }
    let answer = puzzle.answer.trim();
    if answer.is_empty() {
        return Err(malformed("missing answer"));
    }
    answer
        .chars()
        .map(normalize_letter)
        .collect::<Option<Vec<char>>>()
        .ok_or_else(|| malformed("answer must contain only letters"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryStore, StoreError};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cat_set() -> PuzzleSet {
        PuzzleSet::new(day(2024, 1, 1), vec![Puzzle::new("x", "cat")])
    }

    fn new_game() -> Game {
        Game::with_rng(StreakTracker::in_memory(), SmallRng::seed_from_u64(1))
    }

    fn loaded_game() -> Game {
        let mut game = new_game();
        game.load_puzzle(&cat_set(), day(2024, 1, 1)).unwrap();
        game.drain_events();
        game
    }

    fn type_word(game: &mut Game, word: &str) {
        for ch in word.chars() {
            game.type_char(ch).unwrap();
        }
    }

    fn cells(game: &Game) -> Vec<Option<char>> {
        game.input()
            .unwrap()
            .cells()
            .iter()
            .map(|c| c.character)
            .collect()
    }

    #[test]
    fn test_correct_guess_wins_and_starts_streak() {
        let mut game = loaded_game();
        assert_eq!(game.puzzle().unwrap().answer, "cat");
        type_word(&mut game, "cat");
        assert_eq!(game.check_answer(day(2024, 1, 1)).unwrap(), Outcome::Correct);
        assert_eq!(game.streak().current_streak(), 1);
        assert_eq!(game.state(), Some(RoundState::Solved));
    }

    #[test]
    fn test_uppercase_answer_and_guess_match() {
        let mut game = new_game();
        let set = PuzzleSet::new(day(2024, 1, 1), vec![Puzzle::new("x", " CAT ")]);
        game.load_puzzle(&set, day(2024, 1, 1)).unwrap();
        type_word(&mut game, "CaT");
        assert_eq!(game.check_answer(day(2024, 1, 1)).unwrap(), Outcome::Correct);
    }

    #[test]
    fn test_short_guess_is_incomplete() {
        let mut game = loaded_game();
        type_word(&mut game, "ca");
        assert_eq!(
            game.check_answer(day(2024, 1, 1)).unwrap(),
            Outcome::Incomplete
        );
        assert_eq!(game.streak().current_streak(), 0);
        let events = game.drain_events();
        assert!(events.contains(&GameEvent::Outcome(Outcome::Incomplete)));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::StreakChanged(_))));
    }

    #[test]
    fn test_gap_in_middle_is_incomplete() {
        let mut game = loaded_game();
        game.type_char_at(0, 'c').unwrap();
        game.type_char_at(2, 't').unwrap();
        assert_eq!(
            game.check_answer(day(2024, 1, 1)).unwrap(),
            Outcome::Incomplete
        );
    }

    #[test]
    fn test_wrong_guess_keeps_cells_for_retry() {
        let mut game = loaded_game();
        type_word(&mut game, "cot");
        assert_eq!(
            game.check_answer(day(2024, 1, 1)).unwrap(),
            Outcome::Incorrect
        );
        assert_eq!(cells(&game), vec![Some('c'), Some('o'), Some('t')]);
        assert_eq!(game.state(), Some(RoundState::Playing));

        // Fix the middle letter and try again.
        game.type_char_at(1, 'a').unwrap();
        assert_eq!(game.check_answer(day(2024, 1, 1)).unwrap(), Outcome::Correct);
    }

    #[test]
    fn test_repeated_correct_check_records_once() {
        let mut game = loaded_game();
        type_word(&mut game, "cat");
        game.check_answer(day(2024, 1, 1)).unwrap();
        game.check_answer(day(2024, 1, 1)).unwrap();
        assert_eq!(game.streak().current_streak(), 1);
        let streak_events = game
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::StreakChanged(_)))
            .count();
        assert_eq!(streak_events, 1);
    }

    #[test]
    fn test_rechecking_a_solved_round_on_another_day_records_nothing() {
        let mut game = loaded_game();
        type_word(&mut game, "cat");
        game.check_answer(day(2024, 1, 1)).unwrap();
        assert_eq!(game.check_answer(day(2024, 1, 2)).unwrap(), Outcome::Correct);
        assert_eq!(game.streak().current_streak(), 1);
        assert!(!game.already_won_today(day(2024, 1, 2)));
    }

    #[test]
    fn test_input_locked_after_win() {
        let mut game = loaded_game();
        type_word(&mut game, "cat");
        game.check_answer(day(2024, 1, 1)).unwrap();
        assert!(!game.type_char_at(0, 'x').unwrap());
        assert!(!game.clear_char(0).unwrap());
        assert_eq!(game.request_hint().unwrap(), None);
        assert_eq!(game.input().unwrap().submit(), "cat");
    }

    #[test]
    fn test_events_follow_typing() {
        let mut game = loaded_game();
        game.type_char('c').unwrap();
        assert_eq!(
            game.drain_events(),
            vec![GameEvent::CellChanged(0), GameEvent::FocusChanged(Some(1))]
        );
        // Backspace on the empty focused cell only moves focus.
        game.backspace().unwrap();
        assert_eq!(game.drain_events(), vec![GameEvent::FocusChanged(Some(0))]);
        assert_eq!(cells(&game), vec![Some('c'), None, None]);
    }

    #[test]
    fn test_backspace_on_filled_focus_does_nothing() {
        let mut game = loaded_game();
        game.type_char_at(0, 'c').unwrap();
        game.focus_cell(0).unwrap();
        game.drain_events();
        assert!(!game.backspace().unwrap());
        assert!(game.drain_events().is_empty());
        assert_eq!(cells(&game), vec![Some('c'), None, None]);
    }

    #[test]
    fn test_hint_counts_and_keeps_focus() {
        let mut game = loaded_game();
        game.type_char('c').unwrap();
        let focus = game.input().unwrap().focus();
        let idx = game.request_hint().unwrap().unwrap();
        assert!(idx == 1 || idx == 2);
        assert_eq!(game.hints_used(), 1);
        assert_eq!(game.input().unwrap().focus(), focus);
        assert!(game.drain_events().contains(&GameEvent::CellChanged(idx)));
    }

    #[test]
    fn test_hint_on_full_word_is_noop() {
        let mut game = loaded_game();
        type_word(&mut game, "cot");
        assert_eq!(game.request_hint().unwrap(), None);
        assert_eq!(game.hints_used(), 0);
    }

    #[test]
    fn test_reveal_does_not_count_a_win() {
        let mut game = loaded_game();
        game.reveal().unwrap();
        assert_eq!(game.input().unwrap().submit(), "cat");
        assert_eq!(game.state(), Some(RoundState::Revealed));
        assert!(matches!(
            game.check_answer(day(2024, 1, 1)),
            Err(GameError::RoundOver)
        ));
        assert_eq!(game.streak().current_streak(), 0);
        assert_eq!(game.share_text(day(2024, 1, 1)), None);
    }

    #[test]
    fn test_share_after_win() {
        let mut game = loaded_game();
        game.set_share_title("Test Word");
        assert_eq!(game.request_share(day(2024, 1, 1)), None);
        type_word(&mut game, "cat");
        game.check_answer(day(2024, 1, 1)).unwrap();
        let text = game.request_share(day(2024, 1, 1)).unwrap();
        assert_eq!(text, "Test Word #1\nClue: x\nSolved it! 🔥 Streak: 1");
        assert!(!text.contains("cat"));
        assert!(
            game.drain_events()
                .contains(&GameEvent::ShareRequested(text.clone()))
        );
    }

    #[test]
    fn test_operations_without_puzzle() {
        let mut game = new_game();
        assert!(matches!(game.type_char('a'), Err(GameError::NoPuzzleLoaded)));
        assert!(matches!(
            game.check_answer(day(2024, 1, 1)),
            Err(GameError::NoPuzzleLoaded)
        ));
        assert!(matches!(game.request_hint(), Err(GameError::NoPuzzleLoaded)));
        assert!(game.share_text(day(2024, 1, 1)).is_none());
    }

    #[test]
    fn test_empty_set_fails_to_load() {
        let mut game = new_game();
        let set = PuzzleSet::new(day(2024, 1, 1), Vec::new());
        assert!(matches!(
            game.load_puzzle(&set, day(2024, 1, 1)),
            Err(GameError::Puzzle(PuzzleError::InvalidPuzzleSet))
        ));
        assert!(game.puzzle().is_none());
    }

    #[test]
    fn test_malformed_entries_fail_closed() {
        let mut game = loaded_game();
        let set = PuzzleSet::new(
            day(2024, 1, 1),
            vec![
                Puzzle::new("fine", "dog"),
                Puzzle::new("", "cat"),
                Puzzle::new("clue", "  "),
                Puzzle::new("two words", "ice cream"),
            ],
        );
        game.load_puzzle(&set, day(2024, 1, 1)).unwrap();
        for (offset, reason) in [
            (1, "missing clue"),
            (2, "missing answer"),
            (3, "answer must contain only letters"),
        ] {
            let today = day(2024, 1, 1 + offset);
            match game.load_puzzle(&set, today) {
                Err(GameError::Puzzle(PuzzleError::MalformedPuzzle { index, reason: r })) => {
                    assert_eq!(index, offset as usize);
                    assert_eq!(r, reason);
                }
                other => panic!("expected malformed puzzle, got {other:?}"),
            }
            // The earlier puzzle is gone, not left half-loaded.
            assert!(game.puzzle().is_none());
        }
    }

    #[test]
    fn test_already_won_today_from_stored_marker() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        writer.set("dailyword:won:2024-01-01", "true").unwrap();
        let (tracker, _) = StreakTracker::load(Box::new(store));
        let game = Game::with_rng(tracker, SmallRng::seed_from_u64(1));
        assert!(game.already_won_today(day(2024, 1, 1)));
        assert!(!game.already_won_today(day(2024, 1, 2)));
    }

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn set_all(&mut self, _entries: &[(&str, &str)]) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("quota exceeded")))
        }
    }

    #[test]
    fn test_save_failure_is_a_warning_not_an_error() {
        let (tracker, _) = StreakTracker::load(Box::new(ReadOnlyStore));
        let mut game = Game::with_rng(tracker, SmallRng::seed_from_u64(1));
        game.load_puzzle(&cat_set(), day(2024, 1, 1)).unwrap();
        type_word(&mut game, "cat");
        assert_eq!(game.check_answer(day(2024, 1, 1)).unwrap(), Outcome::Correct);
        assert_eq!(game.streak().current_streak(), 1);
        let events = game.drain_events();
        assert!(events.contains(&GameEvent::StreakChanged(1)));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::PersistenceWarning(msg) if msg.contains("quota")))
        );
    }
}
