use serde::Deserialize;
use std::path::PathBuf;

/// Scraper runtime used when neither settings nor CLI name one
pub const DEFAULT_EXECUTABLE: &str = "casperjs";

/// Scraper script location, relative to the base directory
pub const DEFAULT_SCRIPT: &str = "bin/scrape.js";

/// Top-level settings structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub runner: RunnerSettings,
    #[serde(default)]
    pub policy: PolicySettings,
}

/// How the scraper child process is launched
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerSettings {
    /// Path or bare name of the scraper runtime
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Scraper script, resolved against `base_dir` when relative
    #[serde(default = "default_script")]
    pub script: PathBuf,

    /// Working directory of the child (the installation root)
    #[serde(rename = "base-dir", default)]
    pub base_dir: Option<PathBuf>,

    /// Kill the child after this many seconds
    #[serde(rename = "timeout-secs", default)]
    pub timeout_secs: Option<u64>,
}

/// Robots.txt pre-flight behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySettings {
    /// Whether the pre-flight runs at all
    #[serde(default)]
    pub enabled: bool,

    /// Agent token looked up in the policy document
    #[serde(rename = "user-agent", default = "default_policy_agent")]
    pub user_agent: String,

    /// HTTP timeout for the robots.txt fetch (seconds)
    #[serde(rename = "timeout-secs", default = "default_policy_timeout")]
    pub timeout_secs: u64,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            script: default_script(),
            base_dir: None,
            timeout_secs: None,
        }
    }
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            user_agent: default_policy_agent(),
            timeout_secs: default_policy_timeout(),
        }
    }
}

fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

fn default_script() -> PathBuf {
    PathBuf::from(DEFAULT_SCRIPT)
}

fn default_policy_agent() -> String {
    "*".to_string()
}

fn default_policy_timeout() -> u64 {
    10
}
