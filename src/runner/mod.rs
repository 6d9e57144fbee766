//! Scraper process runner
//!
//! This module launches the scraper as a child process and reports how it ended:
//! - [`ScraperCommand`] builds the argument vector
//! - [`Runner`] is the seam the orchestrator dispatches through
//! - [`SystemRunner`] spawns a real OS process and captures its output
//! - [`ProcessOutcome`] carries the result back

mod command;
mod outcome;

pub use command::ScraperCommand;
pub use outcome::{OutcomeKind, ProcessOutcome, NON_ZERO_MESSAGE, SUCCESS_MESSAGE};

use std::future::Future;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;

/// Executes a command and reports its outcome
///
/// Implementations issue exactly one invocation per call and never retry.
pub trait Runner {
    fn run(
        &self,
        command: &ScraperCommand,
        working_dir: &Path,
    ) -> impl Future<Output = ProcessOutcome> + Send;
}

/// Runs commands as real child processes
///
/// The child gets a null stdin and separate stdout/stderr pipes. The call
/// returns once the child has exited and both streams are fully drained.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    /// Creates a runner that waits for the child indefinitely
    pub fn new() -> Self {
        Self::default()
    }

    /// Kills the child and reports [`OutcomeKind::TimedOut`] after `limit`
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Runner for SystemRunner {
    async fn run(&self, command: &ScraperCommand, working_dir: &Path) -> ProcessOutcome {
        let program = command.program().to_string_lossy().into_owned();

        if program.is_empty() {
            return ProcessOutcome::spawn_failure("No executable given");
        }

        if !working_dir.is_dir() {
            return ProcessOutcome::spawn_failure(format!(
                "Working directory does not exist: {}",
                working_dir.display()
            ));
        }

        tracing::info!("Running: {}", command);
        tracing::debug!("Working directory: {}", working_dir.display());

        let child = tokio::process::Command::new(command.program())
            .args(command.args())
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!("Failed to spawn '{}': {}", program, e);
                return ProcessOutcome::spawn_failure(format!(
                    "Failed to execute '{}': {}",
                    program, e
                ));
            }
        };

        tracing::debug!("Spawned '{}' (pid {:?})", program, child.id());

        // Both pipes are drained concurrently so neither can fill and stall the child
        let stdout = StreamCapture::start(child.stdout.take());
        let stderr = StreamCapture::start(child.stderr.take());

        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        tracing::debug!("Failed to kill '{}': {}", program, e);
                    }
                    tracing::info!("'{}' exceeded {:?}, killed", program, limit);

                    // Descendants may still hold the pipes open; take what arrived
                    let stdout = stdout.finish_within(KILL_GRACE).await;
                    let stderr = stderr.finish_within(KILL_GRACE).await;
                    return ProcessOutcome::timed_out(limit, &stdout, &stderr);
                }
            },
            None => child.wait().await,
        };

        match status {
            Ok(status) => {
                let stdout = stdout.finish().await;
                let stderr = stderr.finish().await;
                let outcome = outcome_from_status(status, &stdout, &stderr);
                tracing::info!("'{}' finished: {}", program, outcome.message);
                outcome
            }
            Err(e) => {
                stdout.abort();
                stderr.abort();
                tracing::debug!("Failed to wait for '{}': {}", program, e);
                ProcessOutcome::spawn_failure(format!(
                    "Failed to wait for '{}': {}",
                    program, e
                ))
            }
        }
    }
}

/// How long to keep reading pipes after a timed-out child is killed
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Reads one child pipe in the background into a shared buffer
///
/// The buffer survives an aborted reader, so partial output is never lost.
struct StreamCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl StreamCapture {
    fn start<S>(stream: Option<S>) -> Self
    where
        S: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);

        let task = tokio::spawn(async move {
            let Some(mut stream) = stream else {
                return;
            };
            let mut chunk = [0u8; 8192];
            loop {
                match stream.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if let Ok(mut buffer) = sink.lock() {
                            buffer.extend_from_slice(&chunk[..n]);
                        }
                    }
                    Err(e) => {
                        tracing::debug!("Pipe read failed: {}", e);
                        break;
                    }
                }
            }
        });

        Self { buffer, task }
    }

    /// Waits for end of stream and returns everything read
    async fn finish(mut self) -> Vec<u8> {
        if let Err(e) = (&mut self.task).await {
            tracing::debug!("Pipe reader stopped: {}", e);
        }
        self.take()
    }

    /// Like `finish`, but gives up after `grace` and keeps what was read
    async fn finish_within(mut self, grace: Duration) -> Vec<u8> {
        if tokio::time::timeout(grace, &mut self.task).await.is_err() {
            self.task.abort();
        }
        self.take()
    }

    fn abort(self) {
        self.task.abort();
    }

    fn take(&self) -> Vec<u8> {
        self.buffer
            .lock()
            .map(|mut buffer| std::mem::take(&mut *buffer))
            .unwrap_or_default()
    }
}

fn outcome_from_status(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> ProcessOutcome {
    match status.code() {
        Some(code) => ProcessOutcome::exited(code, stdout, stderr),
        None => ProcessOutcome::signalled(exit_signal(&status), stdout, stderr),
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}
