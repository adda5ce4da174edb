pub mod selector;
pub mod source;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};

/// One day's clue and hidden word. Missing fields deserialize as empty so
/// a bad entry only fails when it is actually selected.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Puzzle {
    #[serde(default)]
    pub clue: String,
    #[serde(default)]
    pub answer: String,
}

impl Puzzle {
    pub fn new(clue: &str, answer: &str) -> Self {
        Self {
            clue: clue.to_string(),
            answer: answer.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleSet {
    #[serde(deserialize_with = "deserialize_start_date")]
    pub start_date: NaiveDate,
    pub puzzles: Vec<Puzzle>,
}

impl PuzzleSet {
    pub fn new(start_date: NaiveDate, puzzles: Vec<Puzzle>) -> Self {
        Self {
            start_date,
            puzzles,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Accepts `2024-01-01` as well as a full RFC 3339 timestamp, keeping the date part.
fn deserialize_start_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_start_date(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("startDate is not an ISO date: {raw:?}"))
    })
}

fn parse_start_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
