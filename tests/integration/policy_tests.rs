//! Robots.txt pre-flight tests
//!
//! These use wiremock to serve policy documents with various statuses.

use crate::common::{CountingRunner, Workspace};
use arana::config::PolicySettings;
use arana::robots::build_policy_client;
use arana::{check_policy, Dispatch, Orchestrator, PolicyError, RequestRate, ScrapeRequest};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> reqwest::Client {
    build_policy_client(&PolicySettings::default()).expect("build client")
}

async fn serve_robots(status: u16, body: &str) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_allowed_with_pacing() {
    let body = "User-agent: *\nDisallow: /admin\nCrawl-delay: 2\nRequest-rate: 1/5";
    let mock_server = serve_robots(200, body).await;
    let url = format!("{}/jobs?page=1", mock_server.uri());

    let result = check_policy(&client(), &url, "*").await.expect("policy check");

    assert!(result.allowed);
    assert_eq!(result.crawl_delay, Some(2.0));
    assert_eq!(
        result.request_rate,
        Some(RequestRate {
            requests: 1,
            seconds: 5
        })
    );
}

#[tokio::test]
async fn test_disallowed_path() {
    let mock_server = serve_robots(200, "User-agent: *\nDisallow: /jobs").await;
    let url = format!("{}/jobs/42", mock_server.uri());

    let result = check_policy(&client(), &url, "*").await.expect("policy check");
    assert!(!result.allowed);
}

#[tokio::test]
async fn test_named_group_does_not_bind_generic_agent() {
    let body = "User-agent: arana\nDisallow: /\n\nUser-agent: *\nDisallow:";
    let mock_server = serve_robots(200, body).await;
    let url = format!("{}/jobs", mock_server.uri());

    let result = check_policy(&client(), &url, "*").await.expect("policy check");
    assert!(result.allowed);
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let mock_server = serve_robots(404, "not found").await;
    let url = format!("{}/jobs", mock_server.uri());

    let result = check_policy(&client(), &url, "*").await.expect("policy check");
    assert!(result.allowed);
    assert_eq!(result.crawl_delay, None);
    assert_eq!(result.request_rate, None);
}

#[tokio::test]
async fn test_forbidden_robots_disallows_everything() {
    let mock_server = serve_robots(403, "").await;
    let url = format!("{}/", mock_server.uri());

    let result = check_policy(&client(), &url, "*").await.expect("policy check");
    assert!(!result.allowed);
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let mock_server = serve_robots(503, "down").await;
    let url = format!("{}/jobs", mock_server.uri());

    let result = check_policy(&client(), &url, "*").await;
    match result {
        Err(PolicyError::Unavailable { url, reason }) => {
            assert!(url.ends_with("/robots.txt"));
            assert!(reason.contains("503"));
        }
        other => panic!("expected Unavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_failure_is_unavailable() {
    // Bind then release a port so nothing is listening on it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let url = format!("http://127.0.0.1:{}/jobs", port);
    let result = check_policy(&client(), &url, "*").await;
    assert!(matches!(result, Err(PolicyError::Unavailable { .. })));
}

#[tokio::test]
async fn test_each_check_fetches_again() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client();
    let url = format!("{}/a", mock_server.uri());
    assert!(check_policy(&client, &url, "*").await.unwrap().allowed);
    assert!(check_policy(&client, &url, "*").await.unwrap().allowed);
}

#[tokio::test]
async fn test_orchestrator_refuses_before_spawning() {
    let mock_server = serve_robots(200, "User-agent: *\nDisallow: /").await;
    let workspace = Workspace::new();
    let url = format!("{}/jobs", mock_server.uri());
    let request = ScrapeRequest::new(&url, &workspace.config, 0, "casperjs").unwrap();

    let orchestrator = Orchestrator::new(
        CountingRunner::default(),
        workspace.path(),
        Path::new("bin/scrape.js"),
    )
    .with_policy_check(client(), "*");

    let dispatch = orchestrator.dispatch(&request).await;
    assert!(matches!(
        dispatch,
        Dispatch::Refused(PolicyError::Disallowed { .. })
    ));
    assert_eq!(dispatch.exit_code(), 1);
    assert_eq!(orchestrator.runner().count(), 0);
}

#[tokio::test]
async fn test_orchestrator_runs_when_allowed() {
    let mock_server = serve_robots(200, "User-agent: *\nAllow: /").await;
    let workspace = Workspace::new();
    let url = format!("{}/jobs", mock_server.uri());
    let request = ScrapeRequest::new(&url, &workspace.config, 0, "casperjs").unwrap();

    let runner = CountingRunner::default();
    let orchestrator = Orchestrator::new(runner, workspace.path(), Path::new("bin/scrape.js"))
        .with_policy_check(client(), "*");

    let dispatch = orchestrator.dispatch(&request).await;
    assert!(dispatch.is_success());
    assert_eq!(orchestrator.runner().count(), 1);
}

#[tokio::test]
async fn test_orchestrator_refuses_when_unavailable() {
    let mock_server = serve_robots(500, "").await;
    let workspace = Workspace::new();
    let url = format!("{}/jobs", mock_server.uri());
    let request = ScrapeRequest::new(&url, &workspace.config, 0, "casperjs").unwrap();

    let orchestrator = Orchestrator::new(
        CountingRunner::default(),
        workspace.path(),
        Path::new("bin/scrape.js"),
    )
    .with_policy_check(client(), "*");

    let dispatch = orchestrator.dispatch(&request).await;
    assert!(matches!(
        dispatch,
        Dispatch::Refused(PolicyError::Unavailable { .. })
    ));
    assert_eq!(orchestrator.runner().count(), 0);
}

#[tokio::test]
async fn test_policy_disabled_by_default() {
    let workspace = Workspace::new();
    // No server exists at this address; a fetch would fail
    let request =
        ScrapeRequest::new("http://127.0.0.1:9/jobs", &workspace.config, 0, "casperjs").unwrap();

    let runner = CountingRunner::default();
    let orchestrator = Orchestrator::new(runner, workspace.path(), Path::new("bin/scrape.js"));
    assert!(!orchestrator.policy_check_enabled());

    let dispatch = orchestrator.dispatch(&request).await;
    assert!(dispatch.is_success());
    assert_eq!(orchestrator.runner().count(), 1);
}
