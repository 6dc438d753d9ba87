use crate::support::{api_client, create_test_config, history_page, HISTORY_PATH};
use std::time::Duration;
use wiki_history::history::{
    load_history, AbortHandle, AbortSignal, DriverStatus, HistoryFetcher, PaginationDriver,
    PaginationOptions, StopReason,
};
use wiki_history::url::LanguageCode;
use wiki_history::{
    parse_wikipedia_url, HistoryError, RequestDescriptor, RevisionAggregate, UrlError,
};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn einstein() -> RequestDescriptor {
    RequestDescriptor::wikipedia(LanguageCode::En, "Albert_Einstein")
}

fn fast_options(max_pages: u32) -> PaginationOptions {
    PaginationOptions {
        max_pages,
        inter_page_delay: Duration::from_millis(1),
    }
}

fn driver_for(base_url: &str, options: PaginationOptions, abort: AbortSignal) -> PaginationDriver {
    PaginationDriver::new(
        HistoryFetcher::new(api_client(base_url, None)),
        einstein(),
        options,
        abort,
    )
}

/// Mounts the first page (ids 51..=150) pointing at `/cursor/2`
async fn mount_first_page(mock_server: &MockServer) {
    let older = format!("{}/cursor/2", mock_server.uri());
    Mock::given(method("GET"))
        .and(path(HISTORY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(51..=150, Some(older))))
        .expect(1)
        .mount(mock_server)
        .await;
}

fn assert_sorted(aggregate: &RevisionAggregate) {
    let revisions = aggregate.revisions();
    assert!(
        revisions
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp),
        "revisions are not in timestamp order"
    );
}

#[tokio::test]
async fn test_two_pages_until_exhausted() {
    let mock_server = MockServer::start().await;
    mount_first_page(&mock_server).await;

    // Last page: no `older` link
    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(1..=50, None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut aggregate = RevisionAggregate::new();
    let mut driver = driver_for(&mock_server.uri(), fast_options(2), AbortSignal::never());

    let summary = driver.run(&mut aggregate).await.expect("History load failed");

    assert_eq!(summary.pages, 2);
    assert_eq!(summary.stop, StopReason::Exhausted);
    assert_eq!(aggregate.len(), 150);
    assert!(!aggregate.has_more());
    assert!(!aggregate.is_loading());
    assert_eq!(aggregate.continuation_cursor(), None);
    assert_sorted(&aggregate);
    assert_eq!(aggregate.revisions()[0].id, 1);
    assert_eq!(aggregate.revisions()[149].id, 150);
}

#[tokio::test]
async fn test_page_events_report_merged_state() {
    let mock_server = MockServer::start().await;
    mount_first_page(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(1..=50, None)))
        .mount(&mock_server)
        .await;

    let mut aggregate = RevisionAggregate::new();
    let mut driver = driver_for(&mock_server.uri(), fast_options(5), AbortSignal::never());

    let first = driver.next_page(&mut aggregate).await.unwrap().unwrap();
    assert_eq!(first.page_number, 1);
    assert_eq!(first.report.accepted, 100);
    assert_eq!(first.total_revisions, 100);
    assert!(first.has_more);

    let second = driver.next_page(&mut aggregate).await.unwrap().unwrap();
    assert_eq!(second.page_number, 2);
    assert_eq!(second.total_revisions, 150);
    assert!(!second.has_more);

    assert!(driver.next_page(&mut aggregate).await.unwrap().is_none());
    assert_eq!(driver.status(), DriverStatus::Done(StopReason::Exhausted));
}

#[tokio::test]
async fn test_abort_between_pages() {
    let mock_server = MockServer::start().await;
    mount_first_page(&mock_server).await;

    // Must never be requested
    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(1..=50, None)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let handle = AbortHandle::new();
    let mut aggregate = RevisionAggregate::new();
    let mut driver = driver_for(&mock_server.uri(), fast_options(5), handle.signal());

    driver
        .next_page(&mut aggregate)
        .await
        .expect("First page failed")
        .expect("First page missing");
    handle.abort();

    let result = driver.next_page(&mut aggregate).await;
    assert!(matches!(result, Err(HistoryError::Aborted)));
    assert_eq!(driver.status(), DriverStatus::Aborted);
    assert_eq!(aggregate.len(), 100);

    // Aborting is terminal
    assert!(driver.next_page(&mut aggregate).await.unwrap().is_none());
}

#[tokio::test]
async fn test_abort_during_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HISTORY_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(history_page(1..=10, None))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let handle = AbortHandle::new();
    let trigger = handle.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.abort();
    });

    let mut aggregate = RevisionAggregate::new();
    let mut driver = driver_for(&mock_server.uri(), fast_options(5), handle.signal());

    let started = std::time::Instant::now();
    let result = driver.next_page(&mut aggregate).await;

    assert!(matches!(result, Err(HistoryError::Aborted)));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(aggregate.is_empty());
}

#[tokio::test]
async fn test_resume_from_stored_cursor() {
    let mock_server = MockServer::start().await;
    mount_first_page(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(1..=50, None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut aggregate = RevisionAggregate::new();

    let mut first = driver_for(&mock_server.uri(), fast_options(1), AbortSignal::never());
    let summary = first.run(&mut aggregate).await.unwrap();
    assert_eq!(summary.stop, StopReason::PageLimit);
    assert!(aggregate.has_more());
    assert_eq!(
        aggregate.continuation_cursor(),
        Some(format!("{}/cursor/2", mock_server.uri()).as_str())
    );

    // "Load more": a new driver continues where the first one stopped
    let mut second = driver_for(&mock_server.uri(), fast_options(1), AbortSignal::never());
    let summary = second.run(&mut aggregate).await.unwrap();
    assert_eq!(summary.pages, 1);
    assert_eq!(aggregate.len(), 150);
    assert!(!aggregate.has_more());

    // Nothing left; no request is issued
    let mut third = driver_for(&mock_server.uri(), fast_options(1), AbortSignal::never());
    let summary = third.run(&mut aggregate).await.unwrap();
    assert_eq!(summary.pages, 0);
    assert_eq!(summary.stop, StopReason::Exhausted);
}

#[tokio::test]
async fn test_server_error_keeps_merged_pages() {
    let mock_server = MockServer::start().await;
    mount_first_page(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut aggregate = RevisionAggregate::new();
    let mut driver = driver_for(&mock_server.uri(), fast_options(5), AbortSignal::never());

    let result = driver.run(&mut aggregate).await;
    match result {
        Err(HistoryError::RemoteApi {
            status,
            status_text,
        }) => {
            assert_eq!(status, 500);
            assert_eq!(status_text, "Internal Server Error");
        }
        other => panic!("Expected RemoteApi error, got {:?}", other),
    }

    assert_eq!(driver.status(), DriverStatus::Failed);
    assert_eq!(aggregate.len(), 100);
    assert!(aggregate.has_more());
    assert!(!aggregate.is_loading());
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_required() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HISTORY_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let mut aggregate = RevisionAggregate::new();
    let mut driver = driver_for(&mock_server.uri(), fast_options(5), AbortSignal::never());

    let err = driver.next_page(&mut aggregate).await.unwrap_err();
    assert!(matches!(
        err,
        HistoryError::AuthRequired {
            editor: None,
            lang: Some(LanguageCode::En),
            ..
        }
    ));
    assert!(err.is_user_facing());
}

#[tokio::test]
async fn test_malformed_payload() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HISTORY_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"revisions": [{"id": "not-a-number"}]})),
        )
        .mount(&mock_server)
        .await;

    let mut aggregate = RevisionAggregate::new();
    let mut driver = driver_for(&mock_server.uri(), fast_options(5), AbortSignal::never());

    let err = driver.next_page(&mut aggregate).await.unwrap_err();
    match err {
        HistoryError::RemoteApi {
            status,
            status_text,
        } => {
            assert_eq!(status, 200);
            assert!(status_text.starts_with("malformed response body"));
        }
        other => panic!("Expected RemoteApi error, got {:?}", other),
    }
    assert!(aggregate.is_empty());
}

#[tokio::test]
async fn test_identifying_headers_and_token() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HISTORY_PATH))
        .and(header("accept", "application/json"))
        .and(header("api-user-agent", "TestViewer/1.0 (test@example.com)"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(1..=3, None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = api_client(&mock_server.uri(), Some("secret-token"));
    let mut aggregate = RevisionAggregate::new();
    let mut driver = PaginationDriver::new(
        HistoryFetcher::new(api),
        einstein(),
        fast_options(5),
        AbortSignal::never(),
    );

    let summary = driver.run(&mut aggregate).await.expect("History load failed");
    assert_eq!(summary.pages, 1);
    assert_eq!(aggregate.len(), 3);
}

#[tokio::test]
async fn test_no_token_sends_no_authorization() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(HISTORY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(1..=3, None)))
        .mount(&mock_server)
        .await;

    let mut aggregate = RevisionAggregate::new();
    let mut driver = driver_for(&mock_server.uri(), fast_options(5), AbortSignal::never());
    driver.run(&mut aggregate).await.expect("History load failed");
    assert_eq!(aggregate.len(), 3);
}

#[tokio::test]
async fn test_overlapping_pages_are_deduplicated() {
    let mock_server = MockServer::start().await;
    mount_first_page(&mock_server).await;

    // Ids 51..=60 were already delivered with page one
    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(1..=60, None)))
        .mount(&mock_server)
        .await;

    let mut aggregate = RevisionAggregate::new();
    let mut driver = driver_for(&mock_server.uri(), fast_options(5), AbortSignal::never());

    driver.next_page(&mut aggregate).await.unwrap().unwrap();
    let second = driver.next_page(&mut aggregate).await.unwrap().unwrap();

    assert_eq!(second.report.accepted, 50);
    assert_eq!(second.report.duplicates, 10);
    assert_eq!(aggregate.len(), 150);
    assert_sorted(&aggregate);
}

#[tokio::test]
async fn test_anonymous_and_hidden_editors() {
    let mock_server = MockServer::start().await;
    let body = serde_json::json!({
        "revisions": [
            {
                "id": 3,
                "timestamp": "2024-01-03T00:00:00Z",
                "size": 300,
                "user": {"id": null, "name": "192.0.2.7"},
                "delta": 4
            },
            {
                "id": 2,
                "timestamp": "2024-01-02T00:00:00Z",
                "size": 296,
                "user": {"id": null, "name": null}
            },
            {
                "id": 1,
                "timestamp": "2024-01-01T00:00:00Z",
                "size": 296,
                "user": {"id": 17, "name": "Alice"}
            }
        ]
    });
    Mock::given(method("GET"))
        .and(path(HISTORY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&mock_server)
        .await;

    let mut aggregate = RevisionAggregate::new();
    let mut driver = driver_for(&mock_server.uri(), fast_options(5), AbortSignal::never());
    driver.run(&mut aggregate).await.unwrap();

    let ids: Vec<u64> = aggregate.revisions().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(aggregate.revisions()[1].editor.id, None);
    assert_eq!(
        aggregate.revisions()[1].editor.name.as_deref(),
        Some("192.0.2.7")
    );
}

#[tokio::test]
async fn test_load_history_resets_aggregate() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HISTORY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(1..=5, None)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/core/v1/wikipedia/en/page/Louvre/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(900..=910, None)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let mut aggregate = RevisionAggregate::new();

    load_history(&config, einstein(), None, &mut aggregate, AbortSignal::never())
        .await
        .unwrap();
    assert_eq!(aggregate.len(), 5);

    // Submitting another article replaces, never mixes
    let mut changes = aggregate.subscribe();
    let louvre = RequestDescriptor::wikipedia(LanguageCode::En, "Louvre");
    let summary = load_history(&config, louvre, None, &mut aggregate, AbortSignal::never())
        .await
        .unwrap();

    assert_eq!(summary.pages, 1);
    assert_eq!(aggregate.len(), 11);
    assert!(aggregate.revisions().iter().all(|r| r.id >= 900));
    assert!(changes.has_changed().unwrap());
}

#[tokio::test]
async fn test_bare_wikipedia_host_is_rejected() {
    let result = parse_wikipedia_url("https://wikipedia.org/wiki/Louvre");
    assert!(matches!(result, Err(UrlError::UnsupportedHost(_))));
}

#[tokio::test]
async fn test_mobile_url_loads_history() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/core/v1/wikipedia/fr/page/Louvre/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(1..=2, None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let descriptor = parse_wikipedia_url("https://fr.m.wikipedia.org/wiki/Louvre").unwrap();
    let config = create_test_config(&mock_server.uri());
    let mut aggregate = RevisionAggregate::new();

    load_history(&config, descriptor, None, &mut aggregate, AbortSignal::never())
        .await
        .unwrap();
    assert_eq!(aggregate.len(), 2);
}

#[tokio::test]
async fn test_abort_during_pacing_delay() {
    let mock_server = MockServer::start().await;
    mount_first_page(&mock_server).await;

    // Must never be requested
    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(1..=50, None)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let options = PaginationOptions {
        max_pages: 5,
        inter_page_delay: Duration::from_secs(5),
    };
    let handle = AbortHandle::new();
    let mut aggregate = RevisionAggregate::new();
    let mut driver = driver_for(&mock_server.uri(), options, handle.signal());

    driver.next_page(&mut aggregate).await.unwrap().unwrap();

    let trigger = handle.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.abort();
    });

    let started = std::time::Instant::now();
    let result = driver.next_page(&mut aggregate).await;

    assert!(matches!(result, Err(HistoryError::Aborted)));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(driver.status(), DriverStatus::Aborted);
    assert_eq!(aggregate.len(), 100);
}

#[tokio::test]
async fn test_pacing_delay_between_pages() {
    let mock_server = MockServer::start().await;
    mount_first_page(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(1..=50, None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let delay = Duration::from_millis(300);
    let options = PaginationOptions {
        max_pages: 5,
        inter_page_delay: delay,
    };
    let mut aggregate = RevisionAggregate::new();
    let mut driver = driver_for(&mock_server.uri(), options, AbortSignal::never());

    let started = std::time::Instant::now();
    let summary = driver.run(&mut aggregate).await.unwrap();

    assert_eq!(summary.pages, 2);
    assert!(
        started.elapsed() >= delay,
        "two pages took only {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_token_stays_on_api_origin() {
    let api_server = MockServer::start().await;
    let foreign_server = MockServer::start().await;

    let older = format!("{}/cursor/2", foreign_server.uri());
    Mock::given(method("GET"))
        .and(path(HISTORY_PATH))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(51..=150, Some(older))))
        .expect(1)
        .mount(&api_server)
        .await;

    Mock::given(method("GET"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&foreign_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_page(1..=50, None)))
        .expect(1)
        .mount(&foreign_server)
        .await;

    let api = api_client(&api_server.uri(), Some("secret-token"));
    let mut aggregate = RevisionAggregate::new();
    let mut driver = PaginationDriver::new(
        HistoryFetcher::new(api),
        einstein(),
        fast_options(5),
        AbortSignal::never(),
    );

    driver.run(&mut aggregate).await.expect("History load failed");
    assert_eq!(aggregate.len(), 150);
}
