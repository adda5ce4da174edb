use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::store::{KeyValueStore, MemoryStore, StoreError};

const KEY_STREAK: &str = "dailyword:streak";
const KEY_BEST_STREAK: &str = "dailyword:best_streak";
const KEY_LAST_WIN: &str = "dailyword:last_win";
const WON_PREFIX: &str = "dailyword:won:";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Per-date "played" marker key.
pub fn won_key(day: NaiveDate) -> String {
    format!("{WON_PREFIX}{}", day.format(DATE_FORMAT))
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreakRecord {
    pub streak_count: u32,
    pub best_streak: u32,
    pub last_win_date: Option<NaiveDate>,
    /// Days known to be won this session (plus the last win loaded from storage).
    pub won_dates: BTreeSet<NaiveDate>,
}

impl StreakRecord {
    /// Applies a win on `today`. Returns false if today was already counted.
    pub fn apply_win(&mut self, today: NaiveDate) -> bool {
        if self.won_dates.contains(&today) {
            return false;
        }
        let continues = self
            .last_win_date
            .and_then(|last| today.pred_opt().map(|yesterday| last == yesterday))
            .unwrap_or(false);
        self.streak_count = if continues { self.streak_count + 1 } else { 1 };
        self.best_streak = self.best_streak.max(self.streak_count);
        self.last_win_date = Some(today);
        self.won_dates.insert(today);
        true
    }
}

/// Daily win streak on top of a persistent key-value store.
///
/// Storage failures never invalidate the in-memory record: the game stays
/// playable and the error is handed back for the caller to surface.
pub struct StreakTracker {
    store: Box<dyn KeyValueStore>,
    record: StreakRecord,
}

impl StreakTracker {
    /// Reads the persisted record. On a read failure the tracker starts empty
    /// and the error is returned alongside it.
    pub fn load(store: Box<dyn KeyValueStore>) -> (Self, Option<StoreError>) {
        match read_record(store.as_ref()) {
            Ok(record) => (Self { store, record }, None),
            Err(err) => {
                log::warn!("could not read streak, starting from zero: {err}");
                (
                    Self {
                        store,
                        record: StreakRecord::default(),
                    },
                    Some(err),
                )
            }
        }
    }

    /// Session-only tracker, used when no persistent store can be opened.
    pub fn in_memory() -> Self {
        Self {
            store: Box::new(MemoryStore::new()),
            record: StreakRecord::default(),
        }
    }

    pub fn record(&self) -> &StreakRecord {
        &self.record
    }

    pub fn current_streak(&self) -> u32 {
        self.record.streak_count
    }

    pub fn best_streak(&self) -> u32 {
        self.record.best_streak
    }

    pub fn has_played(&self, day: NaiveDate) -> bool {
        if self.record.won_dates.contains(&day) {
            return true;
        }
        match self.store.get(&won_key(day)) {
            Ok(marker) => marker.is_some(),
            Err(err) => {
                log::warn!("could not read played marker for {day}: {err}");
                false
            }
        }
    }

    /// Counts a win for `today` at most once. If saving fails the returned
    /// error still leaves the in-memory record updated.
    pub fn record_win(&mut self, today: NaiveDate) -> Result<&StreakRecord, StoreError> {
        if self.has_played(today) {
            // A marker from an earlier session: remember it so we stop asking the store.
            self.record.won_dates.insert(today);
            return Ok(&self.record);
        }
        self.record.apply_win(today);
        log::info!(
            "win recorded for {today}, streak {} (best {})",
            self.record.streak_count,
            self.record.best_streak
        );
        self.persist(today)?;
        Ok(&self.record)
    }

    /// Saves the whole record in one batch, so a stored day marker always
    /// comes with the streak it produced.
    fn persist(&mut self, today: NaiveDate) -> Result<(), StoreError> {
        let streak = self.record.streak_count.to_string();
        let best = self.record.best_streak.to_string();
        let last = today.format(DATE_FORMAT).to_string();
        let marker = won_key(today);
        self.store.set_all(&[
            (KEY_STREAK, streak.as_str()),
            (KEY_LAST_WIN, last.as_str()),
            (KEY_BEST_STREAK, best.as_str()),
            (marker.as_str(), "true"),
        ])
    }
}

fn read_record(store: &dyn KeyValueStore) -> Result<StreakRecord, StoreError> {
    let streak_count: u32 = read_parsed(store, KEY_STREAK)?.unwrap_or(0);
    let best_streak: u32 = read_parsed(store, KEY_BEST_STREAK)?.unwrap_or(0);
    let last_win_date = match store.get(KEY_LAST_WIN)? {
        Some(raw) => match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
            Ok(day) => Some(day),
            Err(_) => {
                log::warn!("ignoring unparseable {KEY_LAST_WIN} value {raw:?}");
                None
            }
        },
        None => None,
    };

    let mut won_dates = BTreeSet::new();
    won_dates.extend(last_win_date);
    Ok(StreakRecord {
        streak_count,
        // Older data may predate best-streak tracking.
        best_streak: best_streak.max(streak_count),
        last_win_date,
        won_dates,
    })
}

fn read_parsed<T: FromStr>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StoreError> {
    Ok(store.get(key)?.and_then(|raw| match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring unparseable {key} value {raw:?}");
            None
        }
    }))
}
