//! Search session
//!
//! Holds the single "current" search shown to the user. Starting a new
//! search aborts the previous one's in-flight requests, and any result
//! that still arrives for a superseded search is dropped before it can
//! touch the new search's state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use osint_core::{
    AdapterError, AggregateSearch, SearchQuery, SearchStatus, VendorId, VendorOutcome,
};

use crate::aggregator::Aggregator;

/// Capacity of the session event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Progress notification for session subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Started {
        search_id: u64,
        vendors: Vec<VendorId>,
    },
    Outcome {
        search_id: u64,
        outcome: VendorOutcome,
    },
    Finished {
        search_id: u64,
        status: SearchStatus,
    },
}

impl SessionEvent {
    pub fn search_id(&self) -> u64 {
        match self {
            SessionEvent::Started { search_id, .. }
            | SessionEvent::Outcome { search_id, .. }
            | SessionEvent::Finished { search_id, .. } => *search_id,
        }
    }
}

#[derive(Default)]
struct SessionState {
    current: Option<AggregateSearch>,
    task: Option<JoinHandle<()>>,
}

/// The user's current search and its background driver
pub struct SearchSession {
    aggregator: Aggregator,
    state: Arc<RwLock<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
    next_id: AtomicU64,
}

impl SearchSession {
    pub fn new(aggregator: Aggregator) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            aggregator,
            state: Arc::new(RwLock::new(SessionState::default())),
            events,
            next_id: AtomicU64::new(0),
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Subscribe to progress events for this and later searches
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Start a search, superseding whatever was running. Returns its id.
    pub async fn start(&self, query: SearchQuery, vendors: Vec<VendorId>) -> u64 {
        let search_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let search = AggregateSearch::new(search_id, query.clone(), vendors);
        let vendors = search.vendors.clone();

        // Hold the write lock until the new task is registered so the
        // driver cannot record anything before `current` is replaced
        let mut state = self.state.write().await;
        if let Some(previous) = state.task.take() {
            previous.abort();
            if let Some(old) = &state.current {
                info!("Search #{} superseded by #{}", old.search_id, search_id);
            }
        }
        state.current = Some(search);

        let _ = self.events.send(SessionEvent::Started {
            search_id,
            vendors: vendors.clone(),
        });

        let outcomes = self.aggregator.search(query, &vendors);
        let shared = Arc::clone(&self.state);
        let events = self.events.clone();
        state.task = Some(tokio::spawn(drive(search_id, outcomes, shared, events)));

        search_id
    }

    /// Abort the running search, keeping whatever already arrived. Vendors
    /// still pending are marked cancelled so the search finishes.
    pub async fn cancel(&self) {
        let mut state = self.state.write().await;
        let Some(task) = state.task.take() else {
            return;
        };
        task.abort();

        let Some(search) = state.current.as_mut() else {
            return;
        };
        let search_id = search.search_id;
        let elapsed_ms = (Utc::now() - search.started_at).num_milliseconds().max(0) as u64;
        let pending: Vec<VendorId> = search
            .vendors
            .iter()
            .copied()
            .filter(|v| search.outcome_for(*v).is_none())
            .collect();

        for vendor in pending {
            let outcome = VendorOutcome::Failed {
                vendor,
                error: AdapterError::cancelled("Search cancelled before the vendor answered"),
                elapsed_ms,
            };
            if search.record(outcome.clone()) {
                let _ = self.events.send(SessionEvent::Outcome { search_id, outcome });
            }
        }

        let status = search.status();
        info!("Search #{} cancelled: {:?}", search_id, status);
        let _ = self.events.send(SessionEvent::Finished { search_id, status });
    }

    /// Copy of the current search
    pub async fn snapshot(&self) -> Option<AggregateSearch> {
        self.state.read().await.current.clone()
    }

    /// Id of the current search, if any
    pub async fn current_id(&self) -> Option<u64> {
        self.state.read().await.current.as_ref().map(|s| s.search_id)
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_write() {
            if let Some(task) = state.task.take() {
                task.abort();
            }
        }
    }
}

/// Record outcomes into the session until the stream ends or the search
/// is superseded
async fn drive(
    search_id: u64,
    mut outcomes: futures::stream::BoxStream<'static, VendorOutcome>,
    state: Arc<RwLock<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
) {
    while let Some(outcome) = outcomes.next().await {
        let mut state = state.write().await;
        let Some(search) = state.current.as_mut().filter(|s| s.search_id == search_id) else {
            debug!("Dropping late result for superseded search #{}", search_id);
            return;
        };
        if search.record(outcome.clone()) {
            let _ = events.send(SessionEvent::Outcome { search_id, outcome });
        }
    }

    let mut state = state.write().await;
    let Some(search) = state.current.as_ref().filter(|s| s.search_id == search_id) else {
        return;
    };
    let status = search.status();
    info!(
        "Search #{} {:?}: {} records",
        search_id,
        status,
        search.total_records()
    );
    let _ = events.send(SessionEvent::Finished { search_id, status });
    state.task = None;
}
