use std::time::{Duration, Instant};

use chrono::NaiveDate;
use dailyword::config::Config;
use dailyword::error::GameError;
use dailyword::puzzle::PuzzleSet;
use dailyword::session::game::{Game, GameEvent, Outcome, RoundState};
use dailyword::session::streak::StreakTracker;
use dailyword::store::JsonStore;

use crate::ui::theme::Theme;

const POP_DURATION: Duration = Duration::from_millis(180);
const SHAKE_DURATION: Duration = Duration::from_millis(400);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Loading,
    Playing,
    Share,
    LoadFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug)]
pub struct Feedback {
    pub text: String,
    pub kind: FeedbackKind,
}

impl Feedback {
    fn new(kind: FeedbackKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

pub struct App {
    pub screen: AppScreen,
    pub config: Config,
    pub theme: &'static Theme,
    pub game: Game,
    pub today: NaiveDate,
    pub feedback: Option<Feedback>,
    /// Streak storage problem, shown alongside the regular feedback line.
    pub storage_warning: Option<String>,
    pub load_error: Option<String>,
    pub share_text: Option<String>,
    pub should_quit: bool,
    shake_started: Option<Instant>,
    pop_started: Vec<Option<Instant>>,
}

impl App {
    pub fn new(config: Config, theme: &'static Theme, today: NaiveDate) -> Self {
        let (tracker, storage_warning) = match JsonStore::new() {
            Ok(store) => {
                let (tracker, err) = StreakTracker::load(Box::new(store));
                (tracker, err.map(|e| e.to_string()))
            }
            Err(err) => {
                log::warn!("streak storage unavailable: {err}");
                (StreakTracker::in_memory(), Some(err.to_string()))
            }
        };
        let mut game = Game::new(tracker);
        game.set_share_title(&config.share_title);

        Self {
            screen: AppScreen::Loading,
            config,
            theme,
            game,
            today,
            feedback: None,
            storage_warning: storage_warning
                .map(|e| format!("Streak will not be saved this session ({e})")),
            load_error: None,
            share_text: None,
            should_quit: false,
            shake_started: None,
            pop_started: Vec::new(),
        }
    }

    pub fn puzzles_loaded(&mut self, result: Result<PuzzleSet, String>) {
        let loaded = result.and_then(|set| {
            self.game
                .load_puzzle(&set, self.today)
                .map_err(|e| e.to_string())
        });
        match loaded {
            Ok(()) => {
                let len = self.game.input().map_or(0, |i| i.len());
                self.pop_started = vec![None; len];
                self.screen = AppScreen::Playing;
                if self.game.already_won_today(self.today) {
                    self.feedback = Some(Feedback::new(
                        FeedbackKind::Info,
                        "You already solved today's puzzle. [Ctrl-s] to share",
                    ));
                }
            }
            Err(err) => {
                log::error!("cannot start today's game: {err}");
                self.load_error = Some(err);
                self.screen = AppScreen::LoadFailed;
            }
        }
        self.process_events();
    }

    pub fn type_char(&mut self, ch: char) {
        let result = self.game.type_char(ch);
        self.after(result);
    }

    /// Backspace key: clears the focused letter, or steps back from an empty cell.
    pub fn delete_backward(&mut self) {
        let focused_filled = self.game.input().and_then(|input| {
            let focus = input.focus()?;
            input.cell(focus).filter(|c| c.is_filled()).map(|_| focus)
        });
        let result = match focused_filled {
            Some(focus) => self.game.clear_char(focus),
            None => self.game.backspace(),
        };
        self.after(result);
    }

    /// Delete key: clears the focused cell without moving.
    pub fn delete_forward(&mut self) {
        if let Some(focus) = self.game.input().and_then(|i| i.focus()) {
            let result = self.game.clear_char(focus);
            self.after(result);
        }
    }

    pub fn move_focus(&mut self, delta: isize) {
        let Some(input) = self.game.input() else {
            return;
        };
        let Some(focus) = input.focus() else {
            return;
        };
        let last = input.len().saturating_sub(1) as isize;
        let target = (focus as isize + delta).clamp(0, last) as usize;
        let result = self.game.focus_cell(target);
        self.after(result);
    }

    pub fn submit(&mut self) {
        let result = self.game.check_answer(self.today);
        self.after(result);
    }

    pub fn hint(&mut self) {
        let result = self.game.request_hint();
        if matches!(result, Ok(None)) && !self.game.is_over() {
            self.feedback = Some(Feedback::new(FeedbackKind::Info, "No empty letters left."));
        }
        self.after(result);
    }

    pub fn reveal(&mut self) {
        let result = self.game.reveal();
        if result.is_ok() && self.game.state() == Some(RoundState::Revealed) {
            let answer = self.game.input().map(|i| i.submit()).unwrap_or_default();
            self.feedback = Some(Feedback::new(
                FeedbackKind::Warning,
                format!("The word was \"{answer}\". Come back tomorrow!"),
            ));
        }
        self.after(result);
    }

    pub fn share(&mut self) {
        if self.game.request_share(self.today).is_none() {
            self.feedback = Some(Feedback::new(
                FeedbackKind::Info,
                "Solve today's puzzle to share your result.",
            ));
        }
        self.process_events();
    }

    pub fn close_popup(&mut self) {
        if self.screen == AppScreen::Share {
            self.screen = AppScreen::Playing;
        }
    }

    /// Drops finished pop/shake animations.
    pub fn tick(&mut self, now: Instant) {
        if self
            .shake_started
            .is_some_and(|t| now.duration_since(t) >= SHAKE_DURATION)
        {
            self.shake_started = None;
        }
        for pop in &mut self.pop_started {
            if pop.is_some_and(|t| now.duration_since(t) >= POP_DURATION) {
                *pop = None;
            }
        }
    }

    pub fn is_animating(&self) -> bool {
        self.shake_started.is_some() || self.pop_started.iter().any(Option::is_some)
    }

    /// Horizontal jitter for the letter row while a shake is running.
    pub fn shake_offset(&self, now: Instant) -> i16 {
        match self.shake_started {
            Some(start) => {
                let step = now.duration_since(start).as_millis() / 50;
                if step % 2 == 0 { -2 } else { 2 }
            }
            None => 0,
        }
    }

    pub fn popping(&self) -> Vec<bool> {
        self.pop_started.iter().map(Option::is_some).collect()
    }

    fn after<T>(&mut self, result: Result<T, GameError>) {
        match result {
            Ok(_) => {}
            Err(GameError::RoundOver) => {
                self.feedback = Some(Feedback::new(
                    FeedbackKind::Info,
                    "This round is over. Come back tomorrow!",
                ));
            }
            Err(err) => log::debug!("ignored input: {err}"),
        }
        self.process_events();
    }

    fn process_events(&mut self) {
        let now = Instant::now();
        for event in self.game.drain_events() {
            match event {
                GameEvent::CellChanged(idx) => {
                    let filled = self
                        .game
                        .input()
                        .and_then(|i| i.cell(idx))
                        .is_some_and(|c| c.is_filled());
                    if let Some(pop) = self.pop_started.get_mut(idx) {
                        *pop = filled.then_some(now);
                    }
                }
                GameEvent::FocusChanged(_) => {}
                GameEvent::Outcome(outcome) => {
                    self.feedback = Some(match outcome {
                        Outcome::Correct => Feedback::new(FeedbackKind::Success, "🎉 Correct!"),
                        Outcome::Incorrect => Feedback::new(FeedbackKind::Error, "❌ Incorrect"),
                        Outcome::Incomplete => {
                            Feedback::new(FeedbackKind::Error, "The word is not complete.")
                        }
                    });
                    if outcome != Outcome::Correct {
                        self.shake_started = Some(now);
                    }
                }
                GameEvent::StreakChanged(count) => {
                    log::info!("streak is now {count}");
                }
                GameEvent::ShareRequested(text) => {
                    self.share_text = Some(text);
                    self.screen = AppScreen::Share;
                }
                GameEvent::PersistenceWarning(msg) => {
                    self.storage_warning =
                        Some(format!("Streak will not be saved this session ({msg})"));
                }
            }
        }
    }
}
