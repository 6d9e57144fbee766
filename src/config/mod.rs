//! Settings module for Arana
//!
//! This module handles loading, parsing, and validating the optional TOML
//! settings file. Every key has a default, so an absent file is equivalent to
//! [`Settings::default`].
//!
//! # Example
//!
//! ```no_run
//! use arana::config::load_settings;
//! use std::path::Path;
//!
//! let settings = load_settings(Path::new("arana.toml")).unwrap();
//! println!("Scraper runtime: {}", settings.runner.executable);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{PolicySettings, RunnerSettings, Settings, DEFAULT_EXECUTABLE, DEFAULT_SCRIPT};

// Re-export parser functions
pub use parser::{load_settings, parse_settings};
