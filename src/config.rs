use std::env;
use std::path::PathBuf;

use crate::report::Labels;

const CACHE_DIR: &str = "wc_history";
const DB_FILE: &str = "matches.sqlite";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Run settings resolved from `.env` files and the environment. CLI flags
/// override these in the binary.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: Option<String>,
    pub db_path: Option<PathBuf>,
    pub labels: Labels,
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            db_path: default_db_path(),
            labels: Labels::En,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|val| !val.trim().is_empty());

        Self {
            source: non_empty("WC_HISTORY_SOURCE"),
            db_path: non_empty("WC_HISTORY_DB")
                .map(PathBuf::from)
                .or(defaults.db_path),
            labels: non_empty("WC_HISTORY_LABELS")
                .and_then(|val| val.parse::<Labels>().ok())
                .unwrap_or(defaults.labels),
            http_timeout_secs: non_empty("WC_HISTORY_HTTP_TIMEOUT_SECS")
                .and_then(|val| val.trim().parse::<u64>().ok())
                .unwrap_or(defaults.http_timeout_secs)
                .max(1),
        }
    }
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}
