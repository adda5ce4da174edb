use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent};
use dailyword::puzzle::PuzzleSet;
use dailyword::puzzle::source::PuzzleSource;

pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    Resize(#[allow(dead_code)] u16, #[allow(dead_code)] u16),
    /// One-shot result of the background puzzle list load.
    PuzzlesLoaded(Result<PuzzleSet, String>),
}

pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    tx: mpsc::Sender<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let input_tx = tx.clone();

        thread::spawn(move || {
            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(Event::Key(key)) => {
                            if input_tx.send(AppEvent::Key(key)).is_err() {
                                return;
                            }
                        }
                        Ok(Event::Resize(w, h)) => {
                            if input_tx.send(AppEvent::Resize(w, h)).is_err() {
                                return;
                            }
                        }
                        _ => {}
                    }
                } else if input_tx.send(AppEvent::Tick).is_err() {
                    return;
                }
            }
        });

        Self { rx, tx }
    }

    /// Loads the puzzle list off the UI thread; the result arrives as `PuzzlesLoaded`.
    pub fn spawn_puzzle_load(&self, source: PuzzleSource) {
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = source.load().map_err(|err| {
                log::error!("puzzle load from {} failed: {err}", source.describe());
                err.to_string()
            });
            let _ = tx.send(AppEvent::PuzzlesLoaded(result));
        });
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}
