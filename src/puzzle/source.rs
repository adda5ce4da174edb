use std::fs;
use std::path::PathBuf;

use rust_embed::Embed;
use thiserror::Error;

use crate::puzzle::PuzzleSet;

#[derive(Embed)]
#[folder = "assets/puzzles/"]
struct PuzzleAssets;

const BUNDLED_FILE: &str = "default.json";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not read puzzle list: {0}")]
    Io(#[from] std::io::Error),
    #[error("puzzle list must look like {{ startDate, puzzles }}: {0}")]
    Format(#[from] serde_json::Error),
    #[error("could not download puzzle list: {0}")]
    Http(String),
    #[error("built without network support, cannot fetch {0}")]
    NetworkDisabled(String),
    #[error("bundled puzzle list is missing")]
    MissingBundle,
}

/// Where the puzzle list comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PuzzleSource {
    Bundled,
    File(PathBuf),
    Url(String),
}

impl PuzzleSource {
    /// `"bundled"`, an `http(s)://` URL, or a filesystem path.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if spec.is_empty() || spec.eq_ignore_ascii_case("bundled") {
            PuzzleSource::Bundled
        } else if spec.starts_with("http://") || spec.starts_with("https://") {
            PuzzleSource::Url(spec.to_string())
        } else {
            PuzzleSource::File(PathBuf::from(spec))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            PuzzleSource::Bundled => "bundled puzzles".to_string(),
            PuzzleSource::File(path) => path.display().to_string(),
            PuzzleSource::Url(url) => url.clone(),
        }
    }

    pub fn load(&self) -> Result<PuzzleSet, SourceError> {
        let json = match self {
            PuzzleSource::Bundled => bundled_json()?,
            PuzzleSource::File(path) => fs::read_to_string(path)?,
            PuzzleSource::Url(url) => fetch_with_cache(url, PuzzleCache::new())?,
        };
        let set = PuzzleSet::from_json(&json)?;
        log::info!(
            "loaded {} puzzles from {} (start {})",
            set.puzzles.len(),
            self.describe(),
            set.start_date
        );
        Ok(set)
    }
}

fn bundled_json() -> Result<String, SourceError> {
    let file = PuzzleAssets::get(BUNDLED_FILE).ok_or(SourceError::MissingBundle)?;
    Ok(String::from_utf8_lossy(file.data.as_ref()).into_owned())
}

/// Last successfully downloaded copy of each remote list.
pub struct PuzzleCache {
    base_dir: PathBuf,
}

impl PuzzleCache {
    pub fn new() -> Option<Self> {
        let base = dirs::cache_dir()?.join("dailyword").join("puzzles");
        Self::with_base_dir(base)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Option<Self> {
        fs::create_dir_all(&base_dir).ok()?;
        Some(Self { base_dir })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.base_dir.join(Self::sanitize_key(key))).ok()
    }

    pub fn put(&self, key: &str, content: &str) -> bool {
        fs::write(self.base_dir.join(Self::sanitize_key(key)), content).is_ok()
    }

    fn sanitize_key(key: &str) -> String {
        key.chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

fn fetch_with_cache(url: &str, cache: Option<PuzzleCache>) -> Result<String, SourceError> {
    resolve_fetch(url, fetch_url(url), cache.as_ref())
}

/// Picks between a fresh download and the cached copy of `url`.
fn resolve_fetch(
    url: &str,
    fetched: Result<String, SourceError>,
    cache: Option<&PuzzleCache>,
) -> Result<String, SourceError> {
    let cached = || cache.and_then(|c| c.get(url));
    match fetched {
        Ok(body) => {
            if PuzzleSet::from_json(&body).is_ok() {
                if let Some(cache) = cache
                    && !cache.put(url, &body)
                {
                    log::warn!("could not cache puzzle list from {url}");
                }
                return Ok(body);
            }
            // A 200 that isn't a puzzle list (a captive portal page, say) never
            // replaces a good cached copy.
            match cached() {
                Some(copy) => {
                    log::warn!("{url} did not return a puzzle list; using cached copy");
                    Ok(copy)
                }
                None => Ok(body),
            }
        }
        Err(err) => match cached() {
            Some(copy) => {
                log::warn!("{err}; using cached copy of {url}");
                Ok(copy)
            }
            None => Err(err),
        },
    }
}

#[cfg(feature = "network")]
fn fetch_url(url: &str) -> Result<String, SourceError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .map_err(|e| SourceError::Http(e.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| SourceError::Http(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Http(format!("{url} returned {status}")));
    }
    response.text().map_err(|e| SourceError::Http(e.to_string()))
}

#[cfg(not(feature = "network"))]
fn fetch_url(url: &str) -> Result<String, SourceError> {
    Err(SourceError::NetworkDisabled(url.to_string()))
}
