//! Arana main entry point
//!
//! This is the command-line interface for the Arana scraper front-end.

use anyhow::Context;
use arana::config::{load_settings, Settings};
use arana::orchestrator::failure_payload;
use arana::{ConfigError, Orchestrator, RequestError, ScrapeRequest};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Exit code for bad invocations (invalid URL, missing config, bad settings)
const USAGE_EXIT_CODE: i32 = 2;

/// Arana is a web scraper built on top of casperJS.
///
/// Provide the scrape URL and CONFIG file as arguments. The scraper's result is
/// printed to stdout; on failure a JSON diagnostic is printed to stderr and the
/// exit code mirrors the scraper's.
#[derive(Parser, Debug)]
#[command(name = "arana")]
#[command(version)]
#[command(about = "A web scraper front-end for casperJS", long_about)]
#[command(after_help = "Example:\n  $ arana https://jobs.apple.com/in/search config/apple.json")]
struct Cli {
    /// URL of the page to scrape
    #[arg(value_name = "URL")]
    url: String,

    /// Path to the page-configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// How many pages to scrape
    #[arg(short, long, default_value_t = 0)]
    page: u32,

    /// Path to the casperjs executable
    #[arg(short = 'c', long, value_name = "PATH")]
    casperjs: Option<String>,

    /// Scraper script, relative to the base directory unless absolute
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Directory the scraper runs in (defaults to the install root)
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Kill the scraper after this many seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Check the site's robots.txt before scraping
    #[arg(long)]
    check_robots: bool,

    /// Path to a TOML settings file
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress everything but errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!("{:#}", e);
            eprintln!("{}", failure_payload(&format!("{:#}", e)));
            exit_code_for(&e)
        }
    };

    std::process::exit(code);
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout is reserved for the scraper's payload. Outcomes
/// are logged below `warn`, so by default a failed run leaves only the JSON
/// payload on stderr.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("arana=warn"),
            1 => EnvFilter::new("arana=info,warn"),
            2 => EnvFilter::new("arana=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs one invocation and returns the process exit code
async fn run(cli: Cli) -> anyhow::Result<i32> {
    let settings = resolve_settings(&cli)?;

    let request = ScrapeRequest::new(
        &cli.url,
        &cli.config,
        cli.page,
        settings.runner.executable.as_str(),
    )?;

    let base_dir = match &settings.runner.base_dir {
        Some(dir) => dir.clone(),
        None => install_root()?,
    };
    tracing::debug!("Base directory: {}", base_dir.display());

    let orchestrator = Orchestrator::from_settings(&settings, &base_dir)
        .context("Failed to build robots.txt HTTP client")?;

    let dispatch = orchestrator.dispatch(&request).await;

    dispatch
        .emit(&mut std::io::stdout().lock(), &mut std::io::stderr().lock())
        .context("Failed to write scraper output")?;

    Ok(dispatch.exit_code())
}

/// Loads the settings file (if any) and applies CLI overrides
fn resolve_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match &cli.settings {
        Some(path) => load_settings(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    if let Some(executable) = &cli.casperjs {
        settings.runner.executable = executable.clone();
    }
    if let Some(script) = &cli.script {
        settings.runner.script = script.clone();
    }
    if let Some(dir) = &cli.base_dir {
        settings.runner.base_dir = Some(dir.clone());
    }
    if cli.timeout.is_some() {
        settings.runner.timeout_secs = cli.timeout;
    }
    if cli.check_robots {
        settings.policy.enabled = true;
    }

    Ok(settings)
}

/// The directory above the one holding this executable
///
/// Mirrors an install layout of `<root>/bin/arana` next to `<root>/bin/scrape.js`.
fn install_root() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the arana executable")?;
    let exe = exe
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", exe.display()))?;

    let bin_dir = exe
        .parent()
        .with_context(|| format!("{} has no parent directory", exe.display()))?;

    Ok(bin_dir.parent().unwrap_or(bin_dir).to_path_buf())
}

fn exit_code_for(e: &anyhow::Error) -> i32 {
    if e.downcast_ref::<RequestError>().is_some() || e.downcast_ref::<ConfigError>().is_some() {
        USAGE_EXIT_CODE
    } else {
        arana::orchestrator::FAILURE_EXIT_CODE
    }
}
