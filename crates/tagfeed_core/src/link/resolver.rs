//! HTTP-backed link resolver.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use serde::Serialize;
use std::time::Duration;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Display metadata for one link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkInfo {
    pub final_url: String,
    pub title: String,
}

/// Resolves links to their final location and page title.
pub trait LinkResolver {
    /// Follows one redirect hop; returns `url` itself when there is none.
    fn unwrap(&self, url: &str) -> String;
    /// Page title, or `url` when the page cannot be fetched or has none.
    fn title(&self, url: &str) -> String;

    fn resolve(&self, url: &str) -> LinkInfo {
        let final_url = self.unwrap(url);
        let title = self.title(&final_url);
        LinkInfo { final_url, title }
    }
}

pub struct HttpLinkResolver {
    /// Does not follow redirects, so `Location` stays observable.
    probe: Client,
    /// Follows redirects like a browser.
    page: Client,
}

impl HttpLinkResolver {
    pub fn new(timeout_ms: u64) -> reqwest::Result<Self> {
        let timeout = Duration::from_millis(timeout_ms);
        let probe = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;
        let page = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { probe, page })
    }
}

impl LinkResolver for HttpLinkResolver {
    fn unwrap(&self, url: &str) -> String {
        let resp = match self.probe.get(url).send() {
            Ok(resp) => resp,
            Err(err) => {
                warn!("event=link_unwrap module=link status=error error={err}");
                return url.to_string();
            }
        };

        match resp
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(location) => {
                debug!("event=link_unwrap module=link status=ok redirected=true");
                location.to_string()
            }
            None => url.to_string(),
        }
    }

    fn title(&self, url: &str) -> String {
        let body = self
            .page
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text());

        match body {
            Ok(html) => extract_title(&html).unwrap_or_else(|| url.to_string()),
            Err(err) => {
                warn!("event=link_title module=link status=error error={err}");
                url.to_string()
            }
        }
    }
}

/// Extracts the first non-blank `<title>` from an HTML document.
pub fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE_RE.captures(html)?.get(1)?.as_str();
    let collapsed = WHITESPACE_RE.replace_all(raw, " ");
    let title = decode_basic_entities(collapsed.trim());
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

fn decode_basic_entities(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::{extract_title, LinkInfo, LinkResolver};

    #[test]
    fn extracts_and_normalizes_title() {
        let html = "<html><head><TITLE>\n  Rust &amp; Ruby\t news </TITLE></head></html>";
        assert_eq!(extract_title(html).as_deref(), Some("Rust & Ruby news"));
    }

    #[test]
    fn missing_or_blank_title_is_none() {
        assert_eq!(extract_title("<html><body>hi</body></html>"), None);
        assert_eq!(extract_title("<title>   </title>"), None);
    }

    struct StaticResolver;

    impl LinkResolver for StaticResolver {
        fn unwrap(&self, url: &str) -> String {
            if url == "https://t.co/abc" {
                "https://example.com/post".to_string()
            } else {
                url.to_string()
            }
        }

        fn title(&self, url: &str) -> String {
            format!("title of {url}")
        }
    }

    #[test]
    fn resolve_titles_the_unwrapped_url() {
        assert_eq!(
            StaticResolver.resolve("https://t.co/abc"),
            LinkInfo {
                final_url: "https://example.com/post".to_string(),
                title: "title of https://example.com/post".to_string(),
            }
        );
    }
}
