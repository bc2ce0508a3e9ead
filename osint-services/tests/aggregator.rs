mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::json;

use osint_core::{AdapterErrorKind, RawResponse, SearchStatus, VendorId, VendorOutcome, VendorState};
use osint_normalize::Registry;
use osint_services::{AggregatorConfig, Projection};
use osint_vendors::FetchError;

use common::{echo, email, MockFetcher, ECHO_VENDORS};

#[tokio::test]
async fn test_http_403_only_affects_that_vendor() {
    let fetcher = Arc::new(
        MockFetcher::with_responder(|vendor, query| match vendor {
            VendorId::LeakCheck => Err(FetchError::Http {
                status: 403,
                body: r#"{"error":"subscription required"}"#.to_string(),
            }),
            _ => echo(vendor, query),
        })
        .delay(VendorId::BreachDirectory, 50)
        .delay(VendorId::HackCheck, 80),
    );
    let aggregator = fetcher.into_aggregator(AggregatorConfig::default());

    let search = aggregator.collect(1, email("a@x.com"), &ECHO_VENDORS).await;

    let error = search.outcome_for(VendorId::LeakCheck).and_then(VendorOutcome::error).unwrap();
    assert_eq!(error.kind, AdapterErrorKind::Http);
    assert_eq!(error.status, Some(403));

    assert_eq!(search.vendor_state(VendorId::BreachDirectory), VendorState::Completed);
    assert_eq!(search.vendor_state(VendorId::HackCheck), VendorState::Completed);
    assert_eq!(search.total_records(), 2);
    assert_eq!(search.status(), SearchStatus::Done);
}

#[tokio::test]
async fn test_timeout_is_per_vendor() {
    let fetcher = Arc::new(MockFetcher::new().delay(VendorId::HackCheck, 500));
    let config = AggregatorConfig {
        vendor_timeout: Duration::from_millis(50),
        ..AggregatorConfig::default()
    };
    let aggregator = fetcher.into_aggregator(config);

    let search = aggregator.collect(1, email("a@x.com"), &ECHO_VENDORS).await;

    let error = search.outcome_for(VendorId::HackCheck).and_then(VendorOutcome::error).unwrap();
    assert_eq!(error.kind, AdapterErrorKind::Timeout);
    assert_eq!(search.vendor_state(VendorId::LeakCheck), VendorState::Completed);
    assert_eq!(search.vendor_state(VendorId::BreachDirectory), VendorState::Completed);
}

#[tokio::test]
async fn test_results_arrive_in_completion_order() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .delay(VendorId::LeakCheck, 120)
            .delay(VendorId::BreachDirectory, 10)
            .delay(VendorId::HackCheck, 60),
    );
    let aggregator = fetcher.into_aggregator(AggregatorConfig::default());

    let order: Vec<VendorId> = aggregator
        .search(email("a@x.com"), &ECHO_VENDORS)
        .map(|outcome| outcome.vendor())
        .collect()
        .await;

    assert_eq!(
        order,
        vec![VendorId::BreachDirectory, VendorId::HackCheck, VendorId::LeakCheck]
    );
}

#[tokio::test]
async fn test_elapsed_time_is_recorded() {
    let fetcher = Arc::new(MockFetcher::new().delay(VendorId::LeakCheck, 40));
    let aggregator = fetcher.into_aggregator(AggregatorConfig::default());

    let search = aggregator.collect(1, email("a@x.com"), &[VendorId::LeakCheck]).await;
    let set = search.result_sets().next().unwrap();
    assert!(set.elapsed_ms >= 40, "elapsed {}ms", set.elapsed_ms);
}

#[tokio::test]
async fn test_unsupported_vendor_is_skipped_without_request() {
    let fetcher = Arc::new(MockFetcher::new());
    let aggregator = Arc::clone(&fetcher).into_aggregator(AggregatorConfig::default());

    let outcomes: Vec<VendorOutcome> = aggregator
        .search(email("a@x.com"), &[VendorId::LeakCheck, VendorId::Shodan])
        .collect()
        .await;

    assert_eq!(outcomes[0].vendor(), VendorId::Shodan);
    assert_eq!(outcomes[0].state(), VendorState::Skipped);
    assert_eq!(outcomes[1].state(), VendorState::Completed);
    assert_eq!(fetcher.started.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unconfigured_vendor_fails_locally() {
    let fetcher = Arc::new(MockFetcher::new().unconfigured(VendorId::HackCheck));
    let aggregator = Arc::clone(&fetcher).into_aggregator(AggregatorConfig::default());

    let search = aggregator
        .collect(1, email("a@x.com"), &[VendorId::HackCheck, VendorId::LeakCheck])
        .await;

    let error = search.outcome_for(VendorId::HackCheck).and_then(VendorOutcome::error).unwrap();
    assert_eq!(error.kind, AdapterErrorKind::Configuration);
    assert_eq!(fetcher.started.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_all_skipped_or_failed_is_failed() {
    let fetcher = Arc::new(MockFetcher::with_responder(|_, _| {
        Err(FetchError::Network("connection refused".to_string()))
    }));
    let aggregator = fetcher.into_aggregator(AggregatorConfig::default());

    let search = aggregator
        .collect(1, email("a@x.com"), &[VendorId::LeakCheck, VendorId::Shodan])
        .await;

    assert!(search.is_complete());
    assert_eq!(search.status(), SearchStatus::Failed);
}

#[tokio::test]
async fn test_dropping_the_stream_cancels_in_flight_requests() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .delay(VendorId::LeakCheck, 10)
            .delay(VendorId::BreachDirectory, 200)
            .delay(VendorId::HackCheck, 200),
    );
    let aggregator = Arc::clone(&fetcher).into_aggregator(AggregatorConfig::default());

    let mut outcomes = aggregator.search(email("a@x.com"), &ECHO_VENDORS);
    let first = outcomes.next().await.unwrap();
    assert_eq!(first.vendor(), VendorId::LeakCheck);
    drop(outcomes);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(fetcher.started.load(Ordering::SeqCst), 3);
    assert_eq!(fetcher.finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_max_concurrency_bounds_fan_out() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .delay(VendorId::LeakCheck, 30)
            .delay(VendorId::BreachDirectory, 30)
            .delay(VendorId::HackCheck, 30),
    );
    let config = AggregatorConfig {
        max_concurrency: Some(1),
        ..AggregatorConfig::default()
    };
    let aggregator = Arc::clone(&fetcher).into_aggregator(config);

    let search = aggregator.collect(1, email("a@x.com"), &ECHO_VENDORS).await;

    assert!(search.is_complete());
    assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_snusbase_grouped_breaches() {
    let fetcher = Arc::new(MockFetcher::with_responder(|_, _| {
        Ok(RawResponse::Json(json!({
            "results": {
                "db1": [{"email": "a@x.com", "password": "p1"}],
                "db2": []
            }
        })))
    }));
    let aggregator = fetcher.into_aggregator(AggregatorConfig::default());

    let search = aggregator.collect(1, email("a@x.com"), &[VendorId::Snusbase]).await;
    let set = search.result_sets().next().unwrap();

    assert_eq!(set.records.len(), 1);
    let record = &set.records[0];
    assert_eq!(record.keys().collect::<Vec<_>>(), vec!["database", "email", "password"]);
    assert_eq!(record.get("database"), Some(&json!("db1")));
    assert_eq!(record.get("email"), Some(&json!("a@x.com")));
    assert_eq!(record.get("password"), Some(&json!("p1")));
}

#[tokio::test]
async fn test_sse_batch_response() {
    let body = concat!(
        "data: {\"status\":\"batch_results\",\"results\":[{\"plugin_name\":\"X\",",
        "\"data\":{\"badges\":[\"A\"],\"meta\":{\"name\":\"Svc\"}}}]}\n\n",
        "data: {\"status\":\"completed\",\"creditsLeft\":5}\n\n",
    );
    let fetcher = Arc::new(MockFetcher::with_responder(move |_, _| {
        Ok(RawResponse::Text(body.to_string()))
    }));
    let aggregator = fetcher.into_aggregator(AggregatorConfig::default());

    let search = aggregator
        .collect(1, email("a@x.com"), &[VendorId::OsintIndustries])
        .await;
    let set = search.result_sets().next().unwrap();

    assert_eq!(set.records.len(), 1);
    assert_eq!(
        set.records[0].iter().collect::<Vec<_>>(),
        vec![
            ("plugin", &json!("X")),
            ("service", &json!("Svc")),
            ("badges", &json!("A")),
        ]
    );
}

#[tokio::test]
async fn test_projected_columns_cover_every_record_key() {
    let fetcher = Arc::new(MockFetcher::with_responder(|vendor, query| match vendor {
        VendorId::HackCheck => Ok(RawResponse::Json(json!({
            "results": [
                {"email": query.value, "source": {"name": "S1", "date": "2020-01"}},
                {"username": "bob", "ip": "1.2.3.4"}
            ]
        }))),
        _ => echo(vendor, query),
    }));
    let aggregator = fetcher.into_aggregator(AggregatorConfig::default());
    let registry = Registry::builtin();

    let search = aggregator.collect(1, email("a@x.com"), &ECHO_VENDORS).await;

    for set in search.result_sets() {
        let adapter = registry.get(set.vendor).unwrap();
        let projection = Projection::new(set, adapter.preferred_columns());
        for record in &set.records {
            for key in record.keys() {
                assert!(projection.columns.iter().any(|c| c == key), "{} missing", key);
            }
        }
        assert_eq!(projection.rows.len(), set.records.len());
    }
}
