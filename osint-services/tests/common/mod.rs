//! In-process vendor fetcher for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use osint_core::{QueryType, RawResponse, SearchQuery, VendorId};
use osint_services::{Aggregator, AggregatorConfig};
use osint_vendors::{FetchError, VendorFetcher};

type Responder = dyn Fn(VendorId, &SearchQuery) -> Result<RawResponse, FetchError> + Send + Sync;

/// Vendors whose built-in specs read `result`/`results` and accept email
pub const ECHO_VENDORS: [VendorId; 3] = [
    VendorId::LeakCheck,
    VendorId::BreachDirectory,
    VendorId::HackCheck,
];

/// A body every [`ECHO_VENDORS`] adapter understands, carrying the query
/// value so tests can tell searches apart
pub fn echo(vendor: VendorId, query: &SearchQuery) -> Result<RawResponse, FetchError> {
    let rows = json!([{ "email": query.value, "vendor": vendor.as_str() }]);
    Ok(RawResponse::Json(json!({
        "success": true,
        "result": rows,
        "results": rows,
    })))
}

pub fn email(value: &str) -> SearchQuery {
    SearchQuery::new(value, QueryType::Email).unwrap()
}

pub struct MockFetcher {
    responder: Box<Responder>,
    delays: HashMap<VendorId, Duration>,
    unconfigured: Vec<VendorId>,
    pub started: AtomicUsize,
    pub finished: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::with_responder(echo)
    }

    pub fn with_responder(
        responder: impl Fn(VendorId, &SearchQuery) -> Result<RawResponse, FetchError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            delays: HashMap::new(),
            unconfigured: Vec::new(),
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn delay(mut self, vendor: VendorId, millis: u64) -> Self {
        self.delays.insert(vendor, Duration::from_millis(millis));
        self
    }

    pub fn unconfigured(mut self, vendor: VendorId) -> Self {
        self.unconfigured.push(vendor);
        self
    }

    pub fn into_aggregator(self: Arc<Self>, config: AggregatorConfig) -> Aggregator {
        Aggregator::new(self, config)
    }
}

#[async_trait]
impl VendorFetcher for MockFetcher {
    async fn fetch(
        &self,
        vendor: VendorId,
        query: &SearchQuery,
    ) -> Result<RawResponse, FetchError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let _guard = InFlight(&self.in_flight);
        if let Some(delay) = self.delays.get(&vendor) {
            tokio::time::sleep(*delay).await;
        }

        self.finished.fetch_add(1, Ordering::SeqCst);
        (self.responder)(vendor, query)
    }

    fn is_configured(&self, vendor: VendorId) -> bool {
        !self.unconfigured.contains(&vendor)
    }
}

/// Decrements the in-flight count even when the fetch is cancelled
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
