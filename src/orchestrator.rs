//! Scrape orchestration
//!
//! The [`Orchestrator`] runs one request end to end:
//! 1. Optionally check robots.txt and refuse disallowed URLs
//! 2. Build the scraper command line
//! 3. Dispatch it through a [`Runner`] inside the base directory
//! 4. Map the outcome onto printed output and an exit code

use crate::config::Settings;
use crate::request::ScrapeRequest;
use crate::robots::{build_policy_client, check_policy};
use crate::runner::{ProcessOutcome, Runner, ScraperCommand, SystemRunner};
use crate::PolicyError;
use reqwest::Client;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Exit code used when no child exit status is available
pub const FAILURE_EXIT_CODE: i32 = 1;

/// What happened to a request
#[derive(Debug)]
pub enum Dispatch {
    /// The runner was invoked; the outcome may still be a failure
    Completed(ProcessOutcome),
    /// The policy pre-flight stopped the request before any spawn
    Refused(PolicyError),
}

impl Dispatch {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(outcome) if !outcome.failed)
    }

    /// The process exit code this dispatch maps to
    ///
    /// Mirrors the child's status when it exited non-zero, otherwise
    /// [`FAILURE_EXIT_CODE`] for any failure without one.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed(outcome) if !outcome.failed => 0,
            Self::Completed(outcome) => match outcome.exit_code {
                Some(code) if code != 0 => code,
                _ => FAILURE_EXIT_CODE,
            },
            Self::Refused(_) => FAILURE_EXIT_CODE,
        }
    }

    /// Writes the user-facing result
    ///
    /// Success prints the child's stdout verbatim to `out`. Failure prints a
    /// single JSON payload to `err`.
    pub fn emit<O: Write, E: Write>(&self, out: &mut O, err: &mut E) -> io::Result<()> {
        match self {
            Self::Completed(outcome) if !outcome.failed => {
                writeln!(out, "{}", outcome.stdout.as_deref().unwrap_or(""))?;
                out.flush()
            }
            Self::Completed(outcome) => {
                writeln!(err, "{}", outcome.to_payload())?;
                err.flush()
            }
            Self::Refused(e) => {
                writeln!(err, "{}", failure_payload(&e.to_string()))?;
                err.flush()
            }
        }
    }
}

#[derive(Serialize)]
struct FailurePayload<'a> {
    failed: bool,
    message: &'a str,
}

/// Serializes `{"failed":true,"message":...}` for failures that never reached the runner
pub fn failure_payload(message: &str) -> String {
    let payload = FailurePayload {
        failed: true,
        message,
    };
    serde_json::to_string(&payload)
        .unwrap_or_else(|_| r#"{"failed":true,"message":"unknown error"}"#.to_string())
}

#[derive(Debug, Clone)]
struct PolicyCheck {
    client: Client,
    user_agent: String,
}

/// Drives a single scrape request
#[derive(Debug)]
pub struct Orchestrator<R = SystemRunner> {
    runner: R,
    base_dir: PathBuf,
    script: PathBuf,
    policy: Option<PolicyCheck>,
}

impl Orchestrator<SystemRunner> {
    /// Builds an orchestrator backed by real child processes
    ///
    /// # Arguments
    ///
    /// * `settings` - Loaded settings (script, timeout, policy)
    /// * `base_dir` - Installation root the child runs in
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to dispatch
    /// * `Err(reqwest::Error)` - The policy HTTP client could not be built
    pub fn from_settings(settings: &Settings, base_dir: &Path) -> Result<Self, reqwest::Error> {
        let mut runner = SystemRunner::new();
        if let Some(secs) = settings.runner.timeout_secs {
            runner = runner.with_timeout(Duration::from_secs(secs));
        }

        let mut orchestrator = Self::new(runner, base_dir, &settings.runner.script);

        if settings.policy.enabled {
            let client = build_policy_client(&settings.policy)?;
            orchestrator = orchestrator.with_policy_check(client, &settings.policy.user_agent);
        }

        Ok(orchestrator)
    }
}

impl<R: Runner> Orchestrator<R> {
    /// Creates an orchestrator with the policy pre-flight disabled
    pub fn new(runner: R, base_dir: &Path, script: &Path) -> Self {
        Self {
            runner,
            base_dir: base_dir.to_path_buf(),
            script: script.to_path_buf(),
            policy: None,
        }
    }

    /// Enables the robots.txt pre-flight
    pub fn with_policy_check(mut self, client: Client, user_agent: &str) -> Self {
        self.policy = Some(PolicyCheck {
            client,
            user_agent: user_agent.to_string(),
        });
        self
    }

    pub fn policy_check_enabled(&self) -> bool {
        self.policy.is_some()
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The exact command a request would run
    pub fn command_for(&self, request: &ScrapeRequest) -> ScraperCommand {
        ScraperCommand::for_request(request, &self.script, &self.base_dir)
    }

    /// Runs one request to completion
    ///
    /// Spawns at most one child process. Nothing is retried.
    pub async fn dispatch(&self, request: &ScrapeRequest) -> Dispatch {
        if let Some(policy) = &self.policy {
            if let Err(e) = self.preflight(policy, request).await {
                tracing::info!("Refused: {}", e);
                return Dispatch::Refused(e);
            }
        }

        let command = self.command_for(request);
        let outcome = self.runner.run(&command, &self.base_dir).await;

        if outcome.failed {
            tracing::info!("Scrape of {} failed: {}", request.target_url(), outcome.message);
        }

        Dispatch::Completed(outcome)
    }

    async fn preflight(&self, policy: &PolicyCheck, request: &ScrapeRequest) -> Result<(), PolicyError> {
        let url = request.target_url();
        let result = check_policy(&policy.client, url, &policy.user_agent).await?;

        if !result.allowed {
            return Err(PolicyError::Disallowed {
                url: url.to_string(),
            });
        }

        // Pacing belongs to the scraper; it is reported, not enforced here
        if let Some(delay) = result.crawl_delay {
            tracing::info!("robots.txt declares Crawl-delay: {}s", delay);
        }
        if let Some(rate) = result.request_rate {
            tracing::info!(
                "robots.txt declares Request-rate: {}/{}s",
                rate.requests,
                rate.seconds
            );
        }

        Ok(())
    }
}
