//! Integration tests for Arana
//!
//! - `policy_tests`: robots.txt pre-flight against wiremock servers
//! - `dispatch_tests`: orchestrator runs against real child processes
//! - `cli_tests`: the compiled binary, end to end

mod cli_tests;
mod policy_tests;
