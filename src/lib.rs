//! Arana: a command-line front-end for a headless-browser page scraper
//!
//! This crate builds the scraper's command line from a [`ScrapeRequest`], runs it
//! as a child process with full output capture, and maps the result onto a
//! uniform [`ProcessOutcome`]. An optional robots.txt pre-flight can refuse a
//! request before anything is spawned.

pub mod config;
pub mod orchestrator;
pub mod request;
pub mod robots;
pub mod runner;

use std::path::PathBuf;
use thiserror::Error;

/// Settings-file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised while turning CLI input into a [`ScrapeRequest`]
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Config file does not exist: {}", .0.display())]
    MissingConfig(PathBuf),

    #[error("Failed to resolve config path: {0}")]
    Io(#[from] std::io::Error),
}

/// Robots.txt pre-flight errors
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Incorrect URL: {0}")]
    InvalidUrl(String),

    #[error("Crawling not allowed by robots.txt: {url}")]
    Disallowed { url: String },

    #[error("robots.txt unavailable at {url}: {reason}")]
    Unavailable { url: String, reason: String },
}

/// Result type alias for settings operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Settings;
pub use orchestrator::{Dispatch, Orchestrator};
pub use request::ScrapeRequest;
pub use robots::{check_policy, PolicyResult, RequestRate};
pub use runner::{OutcomeKind, ProcessOutcome, Runner, ScraperCommand, SystemRunner};
