//! Robots.txt handling module
//!
//! This module provides the optional pre-flight policy check: it fetches the
//! target host's robots.txt, evaluates it for the configured agent, and reports
//! whether the URL may be fetched together with any declared pacing.
//! Every call fetches afresh; nothing is cached.

mod parser;

pub use parser::{ParsedRobots, RequestRate};

use crate::config::PolicySettings;
use crate::request::validate_target_url;
use crate::{PolicyError, RequestError};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Result of a policy check
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyResult {
    /// Whether the agent may fetch the URL
    pub allowed: bool,
    /// Declared `Request-rate`, if any
    pub request_rate: Option<RequestRate>,
    /// Declared `Crawl-delay` in seconds, if any
    pub crawl_delay: Option<f64>,
}

impl PolicyResult {
    /// Evaluates a parsed document for one URL and agent
    pub fn evaluate(robots: &ParsedRobots, url: &str, user_agent: &str) -> Self {
        Self {
            allowed: robots.is_allowed(url, user_agent),
            request_rate: robots.request_rate(user_agent),
            crawl_delay: robots.crawl_delay(user_agent),
        }
    }
}

/// Builds the HTTP client used for robots.txt fetches
///
/// # Arguments
///
/// * `settings` - Policy settings (timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_policy_client(settings: &PolicySettings) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(settings.timeout_secs);

    Client::builder()
        .user_agent(concat!("arana/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Derives `<scheme>://<host>[:port]/robots.txt` for a URL
pub fn robots_url(url: &Url) -> Result<Url, PolicyError> {
    url.join("/robots.txt")
        .map_err(|e| PolicyError::InvalidUrl(format!("{}: {}", url, e)))
}

/// Checks the target host's robots.txt for a URL
///
/// # Status handling
///
/// | robots.txt response | Result |
/// |---------------------|--------|
/// | 2xx | Parse the body |
/// | 401 / 403 | Everything disallowed |
/// | Other 4xx | Everything allowed |
/// | 5xx, other status, transport error | `PolicyError::Unavailable` |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL the scraper is about to visit
/// * `user_agent` - Agent token to evaluate (`*` for a generic agent)
///
/// # Returns
///
/// * `Ok(PolicyResult)` - The document was evaluated (allowed or not)
/// * `Err(PolicyError)` - Bad URL or the document could not be obtained
pub async fn check_policy(
    client: &Client,
    url: &str,
    user_agent: &str,
) -> Result<PolicyResult, PolicyError> {
    let parsed = validate_target_url(url).map_err(|e| match e {
        RequestError::InvalidUrl(reason) => PolicyError::InvalidUrl(reason),
        other => PolicyError::InvalidUrl(other.to_string()),
    })?;
    let robots = fetch_robots(client, &parsed).await?;

    let result = PolicyResult::evaluate(&robots, url, user_agent);
    tracing::debug!("Policy for {} ({}): {:?}", url, user_agent, result);
    Ok(result)
}

/// Fetches and parses robots.txt for the host of `url`
pub async fn fetch_robots(client: &Client, url: &Url) -> Result<ParsedRobots, PolicyError> {
    let robots_url = robots_url(url)?;
    tracing::info!("Fetching {}", robots_url);

    let unavailable = |reason: String| PolicyError::Unavailable {
        url: robots_url.to_string(),
        reason,
    };

    let response = client
        .get(robots_url.clone())
        .send()
        .await
        .map_err(|e| unavailable(describe_request_error(&e)))?;

    let status = response.status();

    if status.is_success() {
        let body = response
            .text()
            .await
            .map_err(|e| unavailable(describe_request_error(&e)))?;
        return Ok(ParsedRobots::from_content(&body));
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        tracing::info!("{} answered {}, treating site as disallowed", robots_url, status);
        return Ok(ParsedRobots::disallow_all());
    }

    if status.is_client_error() {
        tracing::debug!("{} answered {}, no policy in place", robots_url, status);
        return Ok(ParsedRobots::allow_all());
    }

    Err(unavailable(format!("HTTP {}", status)))
}

fn describe_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}
