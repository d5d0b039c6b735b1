//! Robots-directive compliance, crawl-delay enforcement, and the standard
//! outbound header set consulted before any scraped-site fetch.

pub mod robots;

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

pub use robots::RobotsTxt;

const CACHE_TTL: chrono::Duration = chrono::Duration::hours(24);

struct CacheEntry {
    robots: RobotsTxt,
    fetched_at: DateTime<Utc>,
}

/// Result of a politeness check for one (origin, path) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolitenessDecision {
    Allowed,
    Disallowed,
}

/// Caches robots directives per origin and exposes the standard outbound
/// header set. Grounded on `robots_compliance.py`'s fail-open behavior:
/// an unreachable robots.txt yields a permissive cached entry, never a
/// hard failure.
pub struct PolitenessLayer {
    client: reqwest::Client,
    cache: RwLock<HashMap<String, CacheEntry>>,
    user_agent: String,
    contact: String,
}

impl PolitenessLayer {
    pub fn new(client: reqwest::Client, user_agent: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            client,
            cache: RwLock::new(HashMap::new()),
            user_agent: user_agent.into(),
            contact: contact.into(),
        }
    }

    async fn directive_for(&self, origin: &str) -> RobotsTxt {
        if let Some(entry) = self.cache.read().unwrap().get(origin) {
            if Utc::now() - entry.fetched_at < CACHE_TTL {
                return entry.robots.clone();
            }
        }

        let robots = robots::fetch_robots_txt(&self.client, origin).await;
        self.cache.write().unwrap().insert(
            origin.to_string(),
            CacheEntry {
                robots: robots.clone(),
                fetched_at: Utc::now(),
            },
        );
        robots
    }

    /// Whether `path` on `origin` may be fetched by this agent.
    pub async fn check(&self, origin: &str, path: &str) -> PolitenessDecision {
        let robots = self.directive_for(origin).await;
        if robots.is_allowed(&self.user_agent, path) {
            PolitenessDecision::Allowed
        } else {
            PolitenessDecision::Disallowed
        }
    }

    /// Crawl delay directed by robots.txt for this origin, if any.
    pub async fn crawl_delay(&self, origin: &str) -> Option<Duration> {
        self.directive_for(origin).await.crawl_delay(&self.user_agent)
    }

    /// Standard outbound header set: descriptive User-Agent with contact,
    /// Accept, Accept-Language, Accept-Encoding, keep-alive, DNT.
    /// Primes the robots cache for an origin without a network fetch.
    /// Test-only seam: production callers always populate the cache via
    /// `directive_for`.
    #[cfg(test)]
    pub(crate) fn seed_cache(&self, origin: &str, robots: RobotsTxt) {
        self.cache.write().unwrap().insert(origin.to_string(), CacheEntry { robots, fetched_at: Utc::now() });
    }

    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let ua = format!("{} (+{})", self.user_agent, self.contact);
        headers.insert(
            HeaderName::from_static("user-agent"),
            HeaderValue::from_str(&ua).unwrap_or_else(|_| HeaderValue::from_static("ProviderValidationBot/1.0")),
        );
        headers.insert(HeaderName::from_static("accept"), HeaderValue::from_static("text/html,application/xhtml+xml"));
        headers.insert(HeaderName::from_static("accept-language"), HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(HeaderName::from_static("accept-encoding"), HeaderValue::from_static("gzip, deflate"));
        headers.insert(HeaderName::from_static("connection"), HeaderValue::from_static("keep-alive"));
        headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
        headers
    }
}
