//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end over the HTTP fetch strategy.

use mailcrawl::config::{parse_config, UserAgentConfig};
use mailcrawl::crawler::{
    crawl_website, scrape_emails_from_url, scrape_emails_from_website, CrawlCallbacks,
    CrawlOptions, LoggingObserver, PageOptions, WebsiteOptions,
};
use mailcrawl::{ConfigError, MailcrawlError};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates crawl options with a short timeout suitable for local servers
fn website_options(max_depth: u32, max_pages: usize, same_domain_only: bool) -> WebsiteOptions {
    WebsiteOptions {
        crawl: CrawlOptions {
            max_depth,
            max_pages,
            same_domain_only,
        },
        page: PageOptions {
            timeout: Duration::from_secs(5),
            user_agent: UserAgentConfig {
                crawler_name: "TestBot".to_string(),
                crawler_version: "1.0.0".to_string(),
                contact_url: "https://example.com/bot".to_string(),
            },
            ..PageOptions::default()
        },
    }
}

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Same server reached through a different host name
fn localhost_uri(server: &MockServer) -> String {
    format!("http://localhost:{}", server.address().port())
}

fn sorted(emails: impl IntoIterator<Item = String>) -> Vec<String> {
    emails.into_iter().collect()
}

#[tokio::test]
async fn test_crawl_follows_relative_link() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<html><body>
            <p>reach us at info@example.com</p>
            <a href="/contact">Contact</a>
        </body></html>"#,
    )
    .await;
    mount_html(
        &server,
        "/contact",
        r#"<html><body><a href="mailto:Sales@Example.com?subject=Hi">Sales</a></body></html>"#,
    )
    .await;

    let emails = scrape_emails_from_website(
        &server.uri(),
        &website_options(1, 50, true),
        None,
        &mut LoggingObserver,
    )
    .await
    .unwrap();

    assert_eq!(
        sorted(emails),
        vec!["info@example.com", "sales@example.com"]
    );
}

#[tokio::test]
async fn test_page_budget_of_one_fetches_only_start() {
    let server = MockServer::start().await;

    let links = (1..=5)
        .map(|i| format!(r#"<a href="/page{}">Page {}</a>"#, i, i))
        .collect::<String>();
    mount_html(&server, "/", &format!("<html><body>{}</body></html>", links)).await;

    for i in 1..=5 {
        Mock::given(method("GET"))
            .and(path(format!("/page{}", i)))
            .respond_with(ResponseTemplate::new(200).set_body_string("never@example.com"))
            .expect(0)
            .mount(&server)
            .await;
    }

    let mut observer = LoggingObserver;
    let outcome = crawl_website(
        &server.uri(),
        &website_options(3, 1, true),
        None,
        &mut observer,
    )
    .await
    .unwrap();

    assert_eq!(outcome.stats.pages_visited, 1);
    assert!(outcome.emails.is_empty());
}

#[tokio::test]
async fn test_other_domain_never_fetched() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        &format!(
            r#"<a href="{}/elsewhere">Elsewhere</a> home@example.com"#,
            localhost_uri(&server)
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_string("other@example.com"))
        .expect(0)
        .mount(&server)
        .await;

    let emails = scrape_emails_from_website(
        &server.uri(),
        &website_options(3, 50, true),
        None,
        &mut LoggingObserver,
    )
    .await
    .unwrap();

    assert_eq!(sorted(emails), vec!["home@example.com"]);
}

#[tokio::test]
async fn test_cross_domain_crawl_follows_other_host() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        &format!(
            r#"<a href="{}/elsewhere">Elsewhere</a> home@example.com"#,
            localhost_uri(&server)
        ),
    )
    .await;
    mount_html(&server, "/elsewhere", "other@example.com").await;

    let emails = scrape_emails_from_website(
        &server.uri(),
        &website_options(3, 50, false),
        None,
        &mut LoggingObserver,
    )
    .await
    .unwrap();

    assert_eq!(
        sorted(emails),
        vec!["home@example.com", "other@example.com"]
    );
}

#[tokio::test]
async fn test_failing_page_reported_and_crawl_continues() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<a href="/broken">Broken</a><a href="/team">Team</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_html(&server, "/team", "team@example.com").await;

    let errors = Arc::new(Mutex::new(Vec::new()));
    let visits = Arc::new(Mutex::new(Vec::new()));
    let error_log = Arc::clone(&errors);
    let visit_log = Arc::clone(&visits);
    let mut callbacks = CrawlCallbacks::new()
        .on_page_visited(move |url, depth, count| {
            visit_log.lock().unwrap().push((url.to_string(), depth, count));
        })
        .on_error(move |url, error| {
            error_log
                .lock()
                .unwrap()
                .push((url.to_string(), error.to_string()));
        });

    let emails = scrape_emails_from_website(
        &server.uri(),
        &website_options(2, 50, true),
        None,
        &mut callbacks,
    )
    .await
    .unwrap();

    assert_eq!(sorted(emails), vec!["team@example.com"]);

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].0.ends_with("/broken"));
    assert!(errors[0].1.contains("500"));

    let visits = visits.lock().unwrap();
    assert_eq!(visits.len(), 2);
    assert_eq!(visits[0].1, 0);
    assert!(visits[1].0.ends_with("/team"));
    assert_eq!(visits[1].1, 1);
    assert_eq!(visits[1].2, 1);
}

#[tokio::test]
async fn test_equivalent_links_fetched_once() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r##"
            <a href="/about">About</a>
            <a href="/about/">About again</a>
            <a href="/about#team">Team</a>
            <a href="./about?utm_source=nav">Tracked</a>
            <a href="/">Home</a>
        "##,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<a href="/">Home</a> about@example.com"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut observer = LoggingObserver;
    let outcome = crawl_website(
        &server.uri(),
        &website_options(3, 50, true),
        None,
        &mut observer,
    )
    .await
    .unwrap();

    assert_eq!(outcome.stats.pages_visited, 2);
    assert_eq!(sorted(outcome.emails), vec!["about@example.com"]);
}

#[tokio::test]
async fn test_depth_limit_respected() {
    let server = MockServer::start().await;

    mount_html(&server, "/", r#"<a href="/level1">1</a>"#).await;
    mount_html(&server, "/level1", r#"<a href="/level2">2</a> one@example.com"#).await;
    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("two@example.com"))
        .expect(0)
        .mount(&server)
        .await;

    let emails = scrape_emails_from_website(
        &server.uri(),
        &website_options(1, 50, true),
        None,
        &mut LoggingObserver,
    )
    .await
    .unwrap();

    assert_eq!(sorted(emails), vec!["one@example.com"]);
}

#[tokio::test]
async fn test_browser_mode_without_browser_fails_before_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x@example.com"))
        .expect(0)
        .mount(&server)
        .await;

    let mut options = website_options(3, 50, true);
    options.page.use_browser = true;

    let result =
        scrape_emails_from_website(&server.uri(), &options, None, &mut LoggingObserver).await;

    assert!(matches!(
        result,
        Err(MailcrawlError::Config(ConfigError::MissingBrowser))
    ));
}

#[tokio::test]
async fn test_single_page_scrape() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/contact",
        r#"<html><body>
            Press: press&#64;example.com
            <a href="/other">Other</a>
            <img src="/logo@2x.png">
        </body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/other"))
        .respond_with(ResponseTemplate::new(200).set_body_string("other@example.com"))
        .expect(0)
        .mount(&server)
        .await;

    let options = website_options(3, 50, true).page;
    let emails = scrape_emails_from_url(&format!("{}/contact", server.uri()), &options, None)
        .await
        .unwrap();

    assert_eq!(sorted(emails), vec!["press@example.com"]);
}

#[tokio::test]
async fn test_single_page_error_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let options = website_options(3, 50, true).page;
    let result = scrape_emails_from_url(&format!("{}/gone", server.uri()), &options, None).await;

    assert!(matches!(
        result,
        Err(MailcrawlError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_options_from_config_file() {
    let server = MockServer::start().await;
    mount_html(&server, "/", r#"<a href="/next">Next</a> first@example.com"#).await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(ResponseTemplate::new(200).set_body_string("next@example.com"))
        .expect(0)
        .mount(&server)
        .await;

    let config = parse_config(
        r#"
[crawler]
max-depth = 0

[fetch]
timeout-ms = 5000
"#,
    )
    .unwrap();

    let emails = scrape_emails_from_website(
        &server.uri(),
        &WebsiteOptions::from(&config),
        None,
        &mut LoggingObserver,
    )
    .await
    .unwrap();

    assert_eq!(sorted(emails), vec!["first@example.com"]);
}

#[tokio::test]
async fn test_relative_link_resolves_against_directory_page() {
    let server = MockServer::start().await;

    mount_html(&server, "/blog/", r#"<a href="post">Latest post</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/blog/post"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("author@example.com")
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(200).set_body_string("wrong@example.com"))
        .expect(0)
        .mount(&server)
        .await;

    let emails = scrape_emails_from_website(
        &format!("{}/blog/", server.uri()),
        &website_options(1, 50, true),
        None,
        &mut LoggingObserver,
    )
    .await
    .unwrap();

    assert_eq!(sorted(emails), vec!["author@example.com"]);
}

#[tokio::test]
async fn test_binary_link_reported_as_page_error() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<a href="/brochure.pdf">Brochure</a><a href="/team">Team</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/brochure.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"%PDF-1.4 pdf@example.com".to_vec(), "application/pdf"),
        )
        .mount(&server)
        .await;
    mount_html(&server, "/team", "team@example.com").await;

    let errors = Arc::new(Mutex::new(Vec::new()));
    let error_log = Arc::clone(&errors);
    let mut callbacks = CrawlCallbacks::new().on_error(move |url, error| {
        error_log
            .lock()
            .unwrap()
            .push((url.to_string(), error.to_string()));
    });

    let outcome = crawl_website(
        &server.uri(),
        &website_options(1, 50, true),
        None,
        &mut callbacks,
    )
    .await
    .unwrap();

    assert_eq!(sorted(outcome.emails), vec!["team@example.com"]);
    assert_eq!(outcome.stats.pages_failed, 1);

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].0.ends_with("/brochure.pdf"));
    assert!(errors[0].1.contains("application/pdf"));
}
