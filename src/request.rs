//! Scrape request construction
//!
//! A [`ScrapeRequest`] is the validated, immutable form of one CLI invocation.
//! Construction is the only place user input is checked; everything downstream
//! can rely on an http(s) URL with a host and an absolute, existing config path.

use crate::RequestError;
use std::path::{Path, PathBuf};
use url::Url;

/// One scrape job, as handed to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    target_url: String,
    config_path: PathBuf,
    page_count: u32,
    executable: String,
}

impl ScrapeRequest {
    /// Validates the raw inputs and builds a request
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute http or https URL to scrape
    /// * `config_path` - Page-configuration file; must exist
    /// * `page_count` - Passed through to the scraper untouched
    /// * `executable` - Path or bare name of the scraper runtime
    ///
    /// # Returns
    ///
    /// * `Ok(ScrapeRequest)` - With `config_path` made absolute
    /// * `Err(RequestError)` - Invalid URL or missing config file
    pub fn new(
        url: &str,
        config_path: &Path,
        page_count: u32,
        executable: impl Into<String>,
    ) -> Result<Self, RequestError> {
        validate_target_url(url)?;

        if !config_path.is_file() {
            return Err(RequestError::MissingConfig(config_path.to_path_buf()));
        }

        // Lexical only: the child may run elsewhere, but symlinks stay as given
        let config_path = std::path::absolute(config_path)?;

        Ok(Self {
            target_url: url.to_string(),
            config_path,
            page_count,
            executable: executable.into(),
        })
    }

    /// The URL exactly as the user supplied it
    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    /// Absolute path of the page-configuration file
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }
}

/// Checks that a URL is absolute, http or https, and names a host
pub fn validate_target_url(url: &str) -> Result<Url, RequestError> {
    let parsed = Url::parse(url).map_err(|e| RequestError::InvalidUrl(format!("{}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(RequestError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                url, other
            )))
        }
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(RequestError::InvalidUrl(format!("{}: missing host", url)));
    }

    Ok(parsed)
}
