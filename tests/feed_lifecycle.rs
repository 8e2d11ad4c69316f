//! Integration tests for the update lifecycle: download, merge, persist,
//! restart.
//!
//! Each test gets its own mock HTTP server and its own directory under the
//! system temp dir, so tests run in isolation.

use flurry::app::{App, UpdateError, UpdateStatus};
use flurry::config::{Config, Paths};
use flurry::feed::{FeedId, FetchError, Fetcher};
use flurry::library::LibraryError;
use flurry::storage::{Subscription, SubscriptionList};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LAST_MODIFIED: &str = "Sun, 06 Nov 1994 08:49:37 GMT";

fn rss(title: &str, items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(guid, title)| {
            format!(
                "<item><title>{title}</title><guid>{guid}</guid>\
                 <description>&lt;p&gt;Body of {title}&lt;/p&gt;</description></item>"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>{title}</title><link>https://example.com</link>{items}</channel></rss>"#
    )
}

fn temp_paths(name: &str) -> Paths {
    let root = std::env::temp_dir().join(format!("flurry_it_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&root);
    std::fs::create_dir_all(&root).unwrap();
    Paths::under(&root)
}

fn cleanup(paths: &Paths) {
    if let Some(root) = paths.config_file.parent() {
        std::fs::remove_dir_all(root).ok();
    }
}

fn subscribe(paths: &Paths, url: String, filter: Option<&str>) {
    SubscriptionList {
        feeds: vec![Subscription {
            url,
            categories: vec!["test".into()],
            filter: filter.map(str::to_owned),
            ..Default::default()
        }],
    }
    .save(&paths.subscriptions)
    .unwrap();
}

async fn serve(server: &MockServer, body: String) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// App with one subscription pointing at `server`.
async fn app_for(server: &MockServer, name: &str, filter: Option<&str>) -> (App, Paths, FeedId) {
    let paths = temp_paths(name);
    let url = format!("{}/feed.xml", server.uri());
    subscribe(&paths, url.clone(), filter);
    let app = App::load(paths.clone()).unwrap();
    let id = app.library.find_by_url(&url).unwrap().id();
    (app, paths, id)
}

// ============================================================================
// Update and merge
// ============================================================================

#[tokio::test]
async fn test_update_carries_read_state_across_downloads() {
    let server = MockServer::start().await;
    serve(&server, rss("Example", &[("a", "Alpha"), ("b", "Beta")])).await;
    let (mut app, paths, id) = app_for(&server, "carry", None).await;
    let fetcher = Fetcher::new().unwrap();

    let results = app.update(&fetcher, None).await;
    assert_eq!(results.len(), 1);
    match &results[0].result {
        Ok(UpdateStatus::Updated(outcome)) => {
            assert_eq!(outcome.total, 2);
            assert_eq!(outcome.new, 2);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(app.library.feed(id).unwrap().title(), "Example");

    app.mark_read(id, Some(1)).unwrap();

    serve(
        &server,
        rss("Example", &[("a", "Alpha"), ("b", "Beta"), ("c", "Gamma")]),
    )
    .await;
    let results = app.update(&fetcher, Some(id)).await;
    match &results[0].result {
        Ok(UpdateStatus::Updated(outcome)) => {
            assert_eq!(outcome.total, 3);
            assert_eq!(outcome.new, 1);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let feed = app.library.feed(id).unwrap();
    let read: Vec<bool> = feed.items().iter().map(|i| i.is_read()).collect();
    assert_eq!(read, vec![true, false, false]);
    assert_eq!(app.library.smart_feed().unwrap().items().len(), 2);
    cleanup(&paths);
}

#[tokio::test]
async fn test_not_modified_keeps_items() {
    let server = MockServer::start().await;
    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Last-Modified", LAST_MODIFIED)
                .set_body_string(rss("Example", &[("a", "Alpha")])),
        )
        .mount(&server)
        .await;
    let (mut app, paths, id) = app_for(&server, "notmodified", None).await;
    let fetcher = Fetcher::new().unwrap();

    app.update(&fetcher, None).await;
    assert_eq!(app.library.feed(id).unwrap().last_modified, Some(784_111_777));

    server.reset().await;
    Mock::given(method("GET"))
        .and(header_exists("If-Modified-Since"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let results = app.update(&fetcher, None).await;
    assert!(matches!(results[0].result, Ok(UpdateStatus::NotModified)));
    let feed = app.library.feed(id).unwrap();
    assert_eq!(feed.items().len(), 1);
    assert!(!feed.problem);
    cleanup(&paths);
}

#[tokio::test]
async fn test_parse_failure_flags_problem_and_keeps_items() {
    let server = MockServer::start().await;
    serve(&server, rss("Example", &[("a", "Alpha"), ("b", "Beta")])).await;
    let (mut app, paths, id) = app_for(&server, "parsefail", None).await;
    let fetcher = Fetcher::new().unwrap();
    app.update(&fetcher, None).await;

    serve(&server, "this is not a feed".into()).await;
    let results = app.update(&fetcher, None).await;
    assert!(matches!(
        results[0].result,
        Err(UpdateError::Library(LibraryError::Parse(_)))
    ));

    let feed = app.library.feed(id).unwrap();
    assert!(feed.problem);
    assert_eq!(feed.items().len(), 2);

    // A good download clears the flag again
    serve(&server, rss("Example", &[("a", "Alpha")])).await;
    app.update(&fetcher, None).await;
    assert!(!app.library.feed(id).unwrap().problem);
    cleanup(&paths);
}

#[tokio::test]
async fn test_http_error_flags_problem() {
    let server = MockServer::start().await;
    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (mut app, paths, id) = app_for(&server, "httperror", None).await;

    let results = app.update(&Fetcher::new().unwrap(), None).await;
    assert!(matches!(
        results[0].result,
        Err(UpdateError::Fetch(FetchError::HttpStatus(500)))
    ));
    assert!(app.library.feed(id).unwrap().problem);
    cleanup(&paths);
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_restart_restores_items_and_read_state() {
    let server = MockServer::start().await;
    serve(&server, rss("Example", &[("a", "Alpha"), ("b", "Beta")])).await;
    let (mut app, paths, id) = app_for(&server, "restart", None).await;

    app.update(&Fetcher::new().unwrap(), None).await;
    app.mark_read(id, Some(2)).unwrap();
    app.save().unwrap();
    drop(app);

    let app = App::load(paths.clone()).unwrap();
    let url = format!("{}/feed.xml", server.uri());
    let feed = app.library.find_by_url(&url).unwrap();
    assert_eq!(feed.title(), "Example");
    assert_eq!(feed.categories(), ["test"]);
    let read: Vec<bool> = feed.items().iter().map(|i| i.is_read()).collect();
    assert_eq!(read, vec![false, true]);

    // The smart feed is rebuilt from the restored items
    let smart = app.library.smart_feed().unwrap();
    assert_eq!(smart.items().len(), 1);
    assert_eq!(smart.items()[0].display_title(), "Alpha");
    cleanup(&paths);
}

#[tokio::test]
async fn test_unsubscribe_removes_cache() {
    let server = MockServer::start().await;
    serve(&server, rss("Example", &[("a", "Alpha")])).await;
    let config = Config {
        smart_feed: false,
        ..Config::default()
    };
    let paths = temp_paths("unsubscribe");
    let url = format!("{}/feed.xml", server.uri());
    subscribe(&paths, url.clone(), None);
    let mut app = App::with_config(paths.clone(), config).unwrap();
    let id = app.resolve_feed("1").unwrap();

    app.update(&Fetcher::new().unwrap(), None).await;
    let cache_files = || std::fs::read_dir(&paths.cache_dir).map(|d| d.count()).unwrap_or(0);
    assert_eq!(cache_files(), 1);

    app.unsubscribe(id).unwrap();
    app.save().unwrap();
    assert_eq!(cache_files(), 0);
    assert!(app.library.categories().is_empty());
    cleanup(&paths);
}

// ============================================================================
// Filter commands
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn test_filter_command_rewrites_download() {
    let server = MockServer::start().await;
    serve(&server, rss("Original", &[("a", "Alpha")])).await;
    let (mut app, paths, id) = app_for(&server, "filter", Some("sed s/Original/Filtered/")).await;

    app.update(&Fetcher::new().unwrap(), None).await;
    assert_eq!(app.library.feed(id).unwrap().title(), "Filtered");
    cleanup(&paths);
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_filter_flags_problem() {
    let server = MockServer::start().await;
    serve(&server, rss("Original", &[("a", "Alpha")])).await;
    let (mut app, paths, id) = app_for(&server, "badfilter", Some("exit 3")).await;

    let results = app.update(&Fetcher::new().unwrap(), None).await;
    assert!(matches!(results[0].result, Err(UpdateError::Filter(_))));
    let feed = app.library.feed(id).unwrap();
    assert!(feed.problem);
    assert!(feed.items().is_empty());
    cleanup(&paths);
}
