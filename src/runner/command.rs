//! Scraper command-line construction
//!
//! The argument vector is built as discrete tokens and handed to the OS as-is,
//! so URL and path contents are never split or shell-interpreted.

use crate::request::ScrapeRequest;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// An executable plus its ordered arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl ScraperCommand {
    /// Creates a command from raw parts
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<OsString>,
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds the scraper invocation for a request
    ///
    /// The resulting argument vector is:
    ///
    /// ```text
    /// <script> --disk-cache=true --url=<url> --crawler=<abs-config> --page=<n>
    /// ```
    ///
    /// The flag order is what the scraper's argument parser expects.
    ///
    /// # Arguments
    ///
    /// * `request` - The validated scrape request
    /// * `script` - Scraper script path; relative paths are joined onto `base_dir`
    /// * `base_dir` - The installation root the child runs in
    pub fn for_request(request: &ScrapeRequest, script: &Path, base_dir: &Path) -> Self {
        let script = resolve_script(script, base_dir);

        let mut crawler = OsString::from("--crawler=");
        crawler.push(request.config_path());

        let args: Vec<OsString> = vec![
            script.into_os_string(),
            "--disk-cache=true".into(),
            format!("--url={}", request.target_url()).into(),
            crawler,
            format!("--page={}", request.page_count()).into(),
        ];

        Self::new(request.executable(), args)
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

fn resolve_script(script: &Path, base_dir: &Path) -> PathBuf {
    if script.is_absolute() {
        script.to_path_buf()
    } else {
        base_dir.join(script)
    }
}

/// Renders the command for log lines only; quoting is cosmetic
impl fmt::Display for ScraperCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

fn quote(token: &str) -> String {
    let plain = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=./:,@%+".contains(c));

    if plain {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}
