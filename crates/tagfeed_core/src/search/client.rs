//! Search API contract and HTTP adapter.
//!
//! # Responsibility
//! - Define [`SearchApi`], the seam the ingestion engine fetches through.
//! - Provide [`HttpSearchClient`] for a Twitter v1.1-style search endpoint.
//!
//! # Invariants
//! - Every HTTP call carries the configured timeout.
//! - Responses are untrusted: statuses missing an id or author are dropped,
//!   undecodable bodies become [`FetchError::Parse`].

use crate::search::query::SearchQuery;
use chrono::DateTime;
use log::{debug, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";
const MAX_ERROR_BODY_CHARS: usize = 200;

pub type FetchResult<T> = Result<T, FetchError>;

/// Failure of one query against the search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Network(String),
    Timeout,
    Api { status: u16, message: String },
    Parse(String),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(message) => write!(f, "search request failed: {message}"),
            Self::Timeout => write!(f, "search request timed out"),
            Self::Api { status, message } => {
                write!(f, "search api error (status {status}): {message}")
            }
            Self::Parse(message) => write!(f, "malformed search response: {message}"),
        }
    }
}

impl Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Candidate post as returned by the search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPost {
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub author_image_url: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// External search collaborator.
pub trait SearchApi {
    fn search(&self, query: &SearchQuery) -> FetchResult<Vec<RawPost>>;
}

impl<T: SearchApi + ?Sized> SearchApi for &T {
    fn search(&self, query: &SearchQuery) -> FetchResult<Vec<RawPost>> {
        (**self).search(query)
    }
}

impl<T: SearchApi + ?Sized> SearchApi for Box<T> {
    fn search(&self, query: &SearchQuery) -> FetchResult<Vec<RawPost>> {
        (**self).search(query)
    }
}

#[derive(Debug, Clone)]
pub struct SearchClientConfig {
    /// e.g. `https://api.twitter.com/1.1`, without trailing slash.
    pub base_url: String,
    pub bearer_token: Option<String>,
    pub timeout_ms: u64,
}

/// Blocking HTTP search client.
pub struct HttpSearchClient {
    config: SearchClientConfig,
    http: Client,
}

impl std::fmt::Debug for HttpSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSearchClient")
            .field("base_url", &self.config.base_url)
            .field("timeout_ms", &self.config.timeout_ms)
            .finish_non_exhaustive()
    }
}

impl HttpSearchClient {
    pub fn new(config: SearchClientConfig) -> FetchResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            config: SearchClientConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            http,
        })
    }

    pub fn config(&self) -> &SearchClientConfig {
        &self.config
    }
}

impl SearchApi for HttpSearchClient {
    fn search(&self, query: &SearchQuery) -> FetchResult<Vec<RawPost>> {
        let url = format!("{}/search/tweets.json", self.config.base_url);
        let mut params = vec![
            ("q", query.term.clone()),
            ("lang", query.language.clone()),
            ("count", query.page_size.to_string()),
            ("result_type", "recent".to_string()),
            ("tweet_mode", "extended".to_string()),
        ];
        if let Some(since_id) = &query.since_id {
            params.push(("since_id", since_id.clone()));
        }

        let mut request = self.http.get(url).query(&params);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body = resp.text()?;
        parse_search_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    statuses: Vec<StatusPayload>,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    id_str: Option<String>,
    #[serde(default)]
    full_text: Option<String>,
    #[serde(default)]
    text: Option<String>,
    created_at: Option<String>,
    user: Option<UserPayload>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    screen_name: Option<String>,
    #[serde(default)]
    profile_image_url_https: Option<String>,
    #[serde(default)]
    profile_image_url: Option<String>,
}

/// Decodes a search response body into candidates.
///
/// Author ids are `@`-prefixed screen names. Statuses without an id, an
/// author or a parseable timestamp are skipped.
pub fn parse_search_response(body: &str) -> FetchResult<Vec<RawPost>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let mut posts = Vec::with_capacity(response.statuses.len());
    for status in response.statuses {
        match raw_post_from_status(status) {
            Some(post) => posts.push(post),
            None => debug!("event=search_parse module=search status=skip reason=incomplete_status"),
        }
    }
    Ok(posts)
}

fn raw_post_from_status(status: StatusPayload) -> Option<RawPost> {
    let id = status
        .id_str
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())?;
    let user = status.user?;
    let screen_name = user.screen_name.filter(|name| !name.trim().is_empty())?;
    let created_at = match status.created_at.as_deref().map(parse_created_at) {
        Some(Some(millis)) => millis,
        _ => {
            warn!("event=search_parse module=search status=skip reason=bad_created_at id={id}");
            return None;
        }
    };

    Some(RawPost {
        id,
        text: status.full_text.or(status.text).unwrap_or_default(),
        author_id: format!("@{}", screen_name.trim_start_matches('@')),
        author_image_url: user.profile_image_url_https.or(user.profile_image_url),
        created_at,
    })
}

/// Accepts the v1.1 `Wed Aug 27 13:08:45 +0000 2008` form and RFC 3339.
fn parse_created_at(value: &str) -> Option<i64> {
    DateTime::parse_from_str(value, TWITTER_DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.timestamp_millis())
}
