//! Process outcome reporting
//!
//! A [`ProcessOutcome`] is produced exactly once per child invocation and
//! serializes to the error payload printed on failure.

use serde::Serialize;
use std::time::Duration;

pub const SUCCESS_MESSAGE: &str = "Script run successful";
pub const NON_ZERO_MESSAGE: &str = "Script exited with non zero exit status";

/// How the child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// Exited with status 0
    Success,
    /// Exited with a non-zero status
    NonZeroExit,
    /// Killed by a signal, so no exit status exists
    Signalled,
    /// Killed after exceeding the configured timeout; partial output is kept
    TimedOut,
    /// No process was ever created
    SpawnFailure,
}

impl OutcomeKind {
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Success)
    }
}

/// The structured result of one scraper run
///
/// `failed` is true iff the child exited non-zero or never ran to completion.
/// Streams are `None` only when the child never ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutcome {
    pub failed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip)]
    kind: OutcomeKind,
}

impl ProcessOutcome {
    /// Builds the outcome for a child that exited with `code`
    pub fn exited(code: i32, stdout: &[u8], stderr: &[u8]) -> Self {
        let (kind, message) = if code == 0 {
            (OutcomeKind::Success, SUCCESS_MESSAGE)
        } else {
            (OutcomeKind::NonZeroExit, NON_ZERO_MESSAGE)
        };

        Self {
            failed: kind.is_failure(),
            message: message.to_string(),
            exit_code: Some(code),
            stdout: Some(decode(stdout)),
            stderr: Some(decode(stderr)),
            kind,
        }
    }

    /// Builds the outcome for a child terminated by a signal
    pub fn signalled(signal: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Self {
        let message = match signal {
            Some(sig) => format!("Script terminated by signal {}", sig),
            None => "Script terminated without an exit status".to_string(),
        };

        Self {
            failed: true,
            message,
            exit_code: None,
            stdout: Some(decode(stdout)),
            stderr: Some(decode(stderr)),
            kind: OutcomeKind::Signalled,
        }
    }

    /// Builds the outcome for a child killed after `limit`
    ///
    /// `stdout`/`stderr` hold whatever the child wrote before it was killed.
    pub fn timed_out(limit: Duration, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            failed: true,
            message: format!("Script timed out after {}s", limit.as_secs()),
            exit_code: None,
            stdout: Some(decode(stdout)),
            stderr: Some(decode(stderr)),
            kind: OutcomeKind::TimedOut,
        }
    }

    /// Builds the outcome for a process that could not be created
    pub fn spawn_failure(message: impl Into<String>) -> Self {
        Self {
            failed: true,
            message: message.into(),
            exit_code: None,
            stdout: None,
            stderr: None,
            kind: OutcomeKind::SpawnFailure,
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    /// Serializes the outcome as the single-line error payload
    pub fn to_payload(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::debug!("Failed to serialize outcome: {}", e);
            format!(r#"{{"failed":{},"message":"unserializable outcome"}}"#, self.failed)
        })
    }
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
