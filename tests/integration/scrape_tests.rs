//! End-to-end scrape runs against a mock shop

use crate::common::*;
use stall_scraper::config::SiteRules;
use stall_scraper::crawler::{PageFetcher, PageIterator, ProductExtractor, RetryPolicy, RunParams};
use stall_scraper::ScrapeError;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_page_iterator_yields_each_page_in_order() {
    let server = MockServer::start().await;
    for page in 2..=4 {
        let code = format!("product-{}", page);
        mount_page(
            &server,
            page,
            listing_page(&[card(&code, "Product", &plain_price("10.00"))]),
        )
        .await;
    }

    let fetcher = PageFetcher::new(&fetcher_config(&server), "").unwrap();
    let extractor = ProductExtractor::new(&SiteRules::default()).unwrap();
    let mut pages = PageIterator::new(&fetcher, &extractor, 2, 4);

    assert_eq!(pages.remaining(), 3);
    let mut seen = Vec::new();
    while let Some(page) = pages.next().await {
        let page = page.unwrap();
        assert_eq!(page.len(), 1);
        assert!(page.get(&format!("product-{}", page.page)).is_some());
        seen.push(page.page);
    }

    assert_eq!(seen, vec![2, 3, 4]);
    assert_eq!(seen.len() as u32, RunParams::new(2, 4, "").page_count());
    assert_eq!(pages.remaining(), 0);
    assert!(pages.next().await.is_none());
    assert_eq!(
        requested_paths(&server).await,
        vec![page_path(2), page_path(3), page_path(4)]
    );
}

#[tokio::test]
async fn test_page_iterator_is_lazy() {
    let server = MockServer::start().await;
    mount_page(&server, 1, listing_page(&[])).await;

    let fetcher = PageFetcher::new(&fetcher_config(&server), "").unwrap();
    let extractor = ProductExtractor::new(&SiteRules::default()).unwrap();
    let mut pages = PageIterator::new(&fetcher, &extractor, 1, 50);

    assert!(requested_paths(&server).await.is_empty());
    let first = pages.next().await.unwrap().unwrap();
    assert!(first.is_empty());

    // stopping here means pages 2..=50 are never requested
    assert_eq!(requested_paths(&server).await, vec![page_path(1)]);
    assert_eq!(pages.remaining(), 49);
}

#[tokio::test]
async fn test_run_classifies_and_persists_every_product() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        listing_page(&[
            card("dental-mirror-x2", "Mirror X2", &plain_price("850.00")),
            card("composite-kit", "Composite Kit", &sale_price("1,500.00", "1,200.00")),
        ]),
    )
    .await;
    mount_page(
        &server,
        2,
        listing_page(&[card("scaler-tips", "Scaler Tips", &plain_price("45.00"))]),
    )
    .await;

    let cache = fresh_cache();
    let (coordinator, sink) = coordinator(&server, cache.clone());

    let summary = coordinator.run(RunParams::new(1, 2, "")).await.unwrap();

    assert_eq!(summary.created, 3);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.unchanged, 0);
    assert_eq!(summary.total(), 3);
    assert_eq!(sink.len() as u64, summary.total());
    assert_eq!(cache.get("composite-kit").as_deref(), Some("1,200.00"));

    let lines = sink.lines();
    let mirror = lines
        .iter()
        .find(|l| l.starts_with("dental-mirror-x2,"))
        .unwrap();
    // image paths are stored as rendered; product URLs are made absolute
    let uri = server.uri();
    assert!(mirror.starts_with(&format!(
        "dental-mirror-x2,Dental Mirror X2,Mirror X2,850.00,/images/dental-mirror-x2.jpg,{uri}/product/dental-mirror-x2/,850.00,"
    )));
    assert!(mirror.ends_with('\n'));

    let kit = lines.iter().find(|l| l.starts_with("composite-kit,")).unwrap();
    assert_eq!(kit.matches("\"1,200.00\"").count(), 2);
}

#[tokio::test]
async fn test_second_run_reports_everything_unchanged() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        listing_page(&[
            card("probe", "Probe", &plain_price("12.00")),
            card("forceps", "Forceps", &plain_price("30.00")),
        ]),
    )
    .await;

    let (coordinator, sink) = coordinator(&server, fresh_cache());

    let first = coordinator.run(RunParams::default()).await.unwrap();
    assert_eq!(first.created, 2);

    let second = coordinator.run(RunParams::default()).await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.unchanged, 2);

    // unchanged products are logged again
    assert_eq!(sink.len(), 4);
}

#[tokio::test]
async fn test_new_and_repriced_products() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        listing_page(&[
            card("a", "A", &plain_price("90")),
            card("b", "B", &plain_price("120")),
        ]),
    )
    .await;

    let cache = fresh_cache();
    cache.insert("b", "100");
    let (coordinator, sink) = coordinator(&server, cache.clone());

    let summary = coordinator.run(RunParams::default()).await.unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.unchanged, 0);
    assert_eq!(sink.len(), 2);
    assert_eq!(cache.get("a").as_deref(), Some("90"));
    assert_eq!(cache.get("b").as_deref(), Some("120"));
}

#[tokio::test]
async fn test_price_comparison_is_exact() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        listing_page(&[card("probe", "Probe", &plain_price("100"))]),
    )
    .await;

    let cache = fresh_cache();
    cache.insert("probe", "100.00");
    let (coordinator, _sink) = coordinator(&server, cache.clone());

    let summary = coordinator.run(RunParams::default()).await.unwrap();

    assert_eq!(summary.updated, 1);
    assert_eq!(cache.get("probe").as_deref(), Some("100"));
}

#[tokio::test]
async fn test_offset_after_limit_has_no_side_effects() {
    let server = MockServer::start().await;
    let cache = fresh_cache();
    let (coordinator, sink) = coordinator(&server, cache.clone());

    let result = coordinator.run(RunParams::new(5, 2, "")).await;

    assert!(matches!(
        result,
        Err(ScrapeError::OffsetAfterLimit {
            offset: 5,
            limit: 2
        })
    ));
    assert!(requested_paths(&server).await.is_empty());
    assert!(cache.is_empty());
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_fetch_failure_aborts_run_and_keeps_earlier_rows() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        listing_page(&[card("probe", "Probe", &plain_price("12.00"))]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(page_path(2)))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let (coordinator, sink) = coordinator(&server, fresh_cache());

    let result = coordinator.run(RunParams::new(1, 3, "")).await;

    match result {
        Err(ScrapeError::Fetch { url, attempts, .. }) => {
            assert_eq!(url, format!("{}{}", server.uri(), page_path(2)));
            assert_eq!(attempts, 3);
        }
        other => panic!("expected fetch error, got {:?}", other),
    }
    assert_eq!(sink.len(), 1);
    assert!(!requested_paths(&server).await.contains(&page_path(3)));
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(page_path(1)))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        1,
        listing_page(&[card("probe", "Probe", &plain_price("12.00"))]),
    )
    .await;

    let (coordinator, sink) = coordinator(&server, fresh_cache());

    let summary = coordinator.run(RunParams::default()).await.unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(sink.len(), 1);
    assert_eq!(requested_paths(&server).await.len(), 2);
}

#[tokio::test]
async fn test_attempt_window_covers_the_whole_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(page_path(1)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&[card("probe", "Probe", &plain_price("1"))]))
                .set_delay(Duration::from_millis(1_500)),
        )
        .expect(1)
        .mount(&server)
        .await;

    // first attempt gets the whole 3s window
    let fetcher = PageFetcher::new(&fetcher_config(&server), "")
        .unwrap()
        .with_policy(RetryPolicy::new(2, Duration::from_secs(3)));

    let (url, body) = fetcher.fetch(1).await.unwrap();

    assert_eq!(url.path(), page_path(1));
    assert!(!body.is_empty());
}

#[tokio::test]
async fn test_slow_pages_time_out_on_every_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(page_path(1)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&[]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    // 200ms then 400ms, both shorter than the delay
    let fetcher = PageFetcher::new(&fetcher_config(&server), "")
        .unwrap()
        .with_policy(fast_policy(2));

    let result = fetcher.fetch(1).await;

    assert!(matches!(result, Err(ScrapeError::Fetch { attempts: 2, .. })));
}

#[tokio::test]
async fn test_malformed_card_aborts_run() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        listing_page(&[
            card("probe", "Probe", &plain_price("12.00")),
            card("quote-only", "Quote Only", "<span>Ask for price</span>"),
        ]),
    )
    .await;

    let (coordinator, sink) = coordinator(&server, fresh_cache());

    let result = coordinator.run(RunParams::default()).await;

    assert!(matches!(result, Err(ScrapeError::Extraction(_))));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_unreachable_proxy_fails_the_run() {
    let server = MockServer::start().await;
    mount_page(&server, 1, listing_page(&[])).await;

    let (coordinator, _sink) = coordinator(&server, fresh_cache());
    let coordinator = coordinator.with_retry_policy(fast_policy(1));

    // nothing listens on port 9 of the loopback interface
    let result = coordinator
        .run(RunParams::new(1, 1, "http://127.0.0.1:9"))
        .await;

    assert!(matches!(result, Err(ScrapeError::Fetch { .. })));
    assert!(requested_paths(&server).await.is_empty());
}
