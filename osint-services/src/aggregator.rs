//! Search Aggregator
//!
//! Fans one query out across the selected vendors, runs every request
//! concurrently under its own deadline and yields each vendor's outcome as
//! soon as it is known. Dropping the returned stream drops every in-flight
//! request with it.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use osint_core::{AdapterError, AggregateSearch, SearchQuery, VendorId, VendorOutcome};
use osint_normalize::{Registry, VendorAdapter};
use osint_vendors::VendorFetcher;

/// Default per-vendor deadline
pub const DEFAULT_VENDOR_TIMEOUT_SECS: u64 = 60;

/// Configuration for the Aggregator
#[derive(Clone, Debug)]
pub struct AggregatorConfig {
    /// Deadline for each vendor request, measured from dispatch
    pub vendor_timeout: Duration,
    /// Cap on simultaneous vendor requests; `None` runs them all at once
    pub max_concurrency: Option<usize>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            vendor_timeout: Duration::from_secs(DEFAULT_VENDOR_TIMEOUT_SECS),
            max_concurrency: None,
        }
    }
}

impl AggregatorConfig {
    /// Load from `OSINT_VENDOR_TIMEOUT_SECS` and `OSINT_MAX_CONCURRENCY`,
    /// falling back to defaults for unset or unparsable values
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let vendor_timeout = std::env::var("OSINT_VENDOR_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.vendor_timeout);

        let max_concurrency = std::env::var("OSINT_MAX_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0);

        Self {
            vendor_timeout,
            max_concurrency,
        }
    }
}

/// Concurrent multi-vendor search
#[derive(Clone)]
pub struct Aggregator {
    registry: Arc<Registry>,
    fetcher: Arc<dyn VendorFetcher>,
    config: AggregatorConfig,
}

impl Aggregator {
    /// Create an aggregator over the built-in vendor registry
    pub fn new(fetcher: Arc<dyn VendorFetcher>, config: AggregatorConfig) -> Self {
        Self::with_registry(Arc::new(Registry::builtin().clone()), fetcher, config)
    }

    pub fn with_registry(
        registry: Arc<Registry>,
        fetcher: Arc<dyn VendorFetcher>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            registry,
            fetcher,
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn fetcher(&self) -> &Arc<dyn VendorFetcher> {
        &self.fetcher
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Search `vendors` for `query`.
    ///
    /// Outcomes that need no request (unsupported query type, unknown or
    /// unconfigured vendor) come first, then one outcome per remaining
    /// vendor in completion order. Each vendor appears exactly once.
    pub fn search(
        &self,
        query: SearchQuery,
        vendors: &[VendorId],
    ) -> BoxStream<'static, VendorOutcome> {
        let mut immediate = Vec::new();
        let mut runnable: Vec<VendorAdapter> = Vec::new();

        for vendor in dedup(vendors) {
            match self.registry.get(vendor) {
                Err(e) => immediate.push(VendorOutcome::Failed {
                    vendor,
                    error: AdapterError::configuration(e.to_string()),
                    elapsed_ms: 0,
                }),
                Ok(adapter) if !adapter.supports(query.query_type) => {
                    debug!("Skipping {}: {} not supported", vendor, query.query_type);
                    immediate.push(VendorOutcome::Skipped {
                        vendor,
                        query_type: query.query_type,
                    });
                }
                Ok(_) if !self.fetcher.is_configured(vendor) => {
                    warn!("Not dispatching {}: no credentials configured", vendor);
                    immediate.push(VendorOutcome::Failed {
                        vendor,
                        error: AdapterError::configuration(format!(
                            "No credentials configured for {}",
                            vendor
                        )),
                        elapsed_ms: 0,
                    });
                }
                Ok(adapter) => runnable.push(*adapter),
            }
        }

        // Query values may be passwords or hashes, keep them out of logs
        info!(
            "Searching {} across {} vendors ({} not dispatched)",
            query.query_type,
            runnable.len(),
            immediate.len()
        );

        let limit = self
            .config
            .max_concurrency
            .unwrap_or(runnable.len())
            .max(1);
        let fetcher = Arc::clone(&self.fetcher);
        let timeout = self.config.vendor_timeout;

        let requests = stream::iter(runnable)
            .map(move |adapter| {
                let fetcher = Arc::clone(&fetcher);
                let query = query.clone();
                async move { run_vendor(fetcher.as_ref(), adapter, &query, timeout).await }
            })
            .buffer_unordered(limit);

        stream::iter(immediate).chain(requests).boxed()
    }

    /// Run a search to completion and collect it into an [`AggregateSearch`]
    pub async fn collect(
        &self,
        search_id: u64,
        query: SearchQuery,
        vendors: &[VendorId],
    ) -> AggregateSearch {
        let mut search = AggregateSearch::new(search_id, query.clone(), vendors.to_vec());
        let mut outcomes = self.search(query, vendors);
        while let Some(outcome) = outcomes.next().await {
            search.record(outcome);
        }
        info!(
            "Search #{} finished: {} records from {} vendors",
            search_id,
            search.total_records(),
            search.vendors.len()
        );
        search
    }
}

fn dedup(vendors: &[VendorId]) -> Vec<VendorId> {
    let mut unique = Vec::with_capacity(vendors.len());
    for vendor in vendors {
        if !unique.contains(vendor) {
            unique.push(*vendor);
        }
    }
    unique
}

/// Fetch and adapt one vendor's response
async fn run_vendor(
    fetcher: &dyn VendorFetcher,
    adapter: VendorAdapter,
    query: &SearchQuery,
    timeout: Duration,
) -> VendorOutcome {
    let vendor = adapter.id;
    let started = Instant::now();
    let result = tokio::time::timeout(timeout, fetcher.fetch(vendor, query)).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(Ok(raw)) => {
            let set = adapter.adapt(&raw, query.query_type).with_elapsed(elapsed_ms);
            debug!("{} returned {} records in {}ms", vendor, set.records.len(), elapsed_ms);
            VendorOutcome::Completed(set)
        }
        Ok(Err(e)) => {
            warn!("{} failed after {}ms: {}", vendor, elapsed_ms, e);
            VendorOutcome::Failed {
                vendor,
                error: e.into(),
                elapsed_ms,
            }
        }
        Err(_) => {
            warn!("{} timed out after {}ms", vendor, elapsed_ms);
            VendorOutcome::Failed {
                vendor,
                error: AdapterError::timeout(format!(
                    "No response within {}s",
                    timeout.as_secs_f64()
                )),
                elapsed_ms,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_position() {
        let vendors = [VendorId::Shodan, VendorId::IpInfo, VendorId::Shodan];
        assert_eq!(dedup(&vendors), vec![VendorId::Shodan, VendorId::IpInfo]);
    }

    #[test]
    fn test_default_config() {
        let config = AggregatorConfig::default();
        assert_eq!(config.vendor_timeout, Duration::from_secs(60));
        assert_eq!(config.max_concurrency, None);
    }
}
