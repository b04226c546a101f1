//! Environment-driven runtime configuration.
//!
//! # Responsibility
//! - Read `TAGFEED_*` variables with defaults for every setting.
//! - Reject values that parse but fall outside their allowed range.
//!
//! # Invariants
//! - Blank variables count as unset.
//! - Parsing never panics; bad input becomes [`ConfigError`].

use crate::logging::default_log_level;
use crate::search::client::SearchClientConfig;
use crate::search::query::QueryOptions;
use crate::service::feed_service::{DEFAULT_FEED_PAGE_SIZE, FEED_PAGE_SIZE_MAX};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "tagfeed.sqlite3";
const DEFAULT_SEARCH_URL: &str = "https://api.twitter.com/1.1";
const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SEARCH_LANGUAGE: &str = "pt";
const DEFAULT_SEARCH_PAGE_SIZE: u32 = 100;
const SEARCH_PAGE_SIZE_MAX: u32 = 100;
const DEFAULT_LINK_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Full runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub db_path: PathBuf,
    pub search_url: String,
    pub search_token: Option<String>,
    pub search_timeout_ms: u64,
    pub search_language: String,
    pub search_page_size: u32,
    pub feed_page_size: u32,
    pub link_timeout_ms: u64,
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            search_token: None,
            search_timeout_ms: DEFAULT_SEARCH_TIMEOUT_MS,
            search_language: DEFAULT_SEARCH_LANGUAGE.to_string(),
            search_page_size: DEFAULT_SEARCH_PAGE_SIZE,
            feed_page_size: DEFAULT_FEED_PAGE_SIZE,
            link_timeout_ms: DEFAULT_LINK_TIMEOUT_MS,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl FeedConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            db_path: get("TAGFEED_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            search_url: get("TAGFEED_SEARCH_URL")
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.search_url),
            search_token: get("TAGFEED_SEARCH_TOKEN"),
            search_timeout_ms: parse_ranged(
                "TAGFEED_SEARCH_TIMEOUT_MS",
                get("TAGFEED_SEARCH_TIMEOUT_MS"),
                defaults.search_timeout_ms,
                1..=u64::MAX,
            )?,
            search_language: get("TAGFEED_SEARCH_LANGUAGE")
                .map(|value| value.trim().to_ascii_lowercase())
                .unwrap_or(defaults.search_language),
            search_page_size: parse_ranged(
                "TAGFEED_SEARCH_PAGE_SIZE",
                get("TAGFEED_SEARCH_PAGE_SIZE"),
                defaults.search_page_size,
                1..=SEARCH_PAGE_SIZE_MAX,
            )?,
            feed_page_size: parse_ranged(
                "TAGFEED_FEED_PAGE_SIZE",
                get("TAGFEED_FEED_PAGE_SIZE"),
                defaults.feed_page_size,
                1..=FEED_PAGE_SIZE_MAX,
            )?,
            link_timeout_ms: parse_ranged(
                "TAGFEED_LINK_TIMEOUT_MS",
                get("TAGFEED_LINK_TIMEOUT_MS"),
                defaults.link_timeout_ms,
                1..=u64::MAX,
            )?,
            log_level: get("TAGFEED_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: get("TAGFEED_LOG_DIR").map(PathBuf::from),
        })
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            language: self.search_language.clone(),
            page_size: self.search_page_size,
        }
    }

    pub fn search_client_config(&self) -> SearchClientConfig {
        SearchClientConfig {
            base_url: self.search_url.clone(),
            bearer_token: self.search_token.clone(),
            timeout_ms: self.search_timeout_ms,
        }
    }
}

fn parse_ranged<T>(
    key: &'static str,
    raw: Option<String>,
    default: T,
    range: std::ops::RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Display,
    T::Err: Display,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = raw.trim().parse::<T>().map_err(|err| ConfigError::Invalid {
        key,
        value: raw.clone(),
        reason: err.to_string(),
    })?;
    if !range.contains(&value) {
        return Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: format!("expected {}..={}", range.start(), range.end()),
        });
    }
    Ok(value)
}
