//! Unified multi-vendor search over Server-Sent Events
//!
//! Each vendor outcome is sent as an `outcome` event the moment it is
//! known, followed by one `done` event. Closing the connection drops the
//! stream and with it every request still in flight.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::post,
    Json, Router,
};
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;

use osint_core::{AggregateSearch, SearchStatus, VendorId, VendorOutcome, VendorState};

use super::SearchRequest;
use crate::AppState;

/// Payload of the final `done` event
#[derive(Debug, Serialize)]
struct SearchSummary {
    status: SearchStatus,
    total_records: usize,
    vendor_states: Vec<(VendorId, VendorState)>,
}

/// Create search routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/search", post(search))
}

/// POST /api/search - Stream per-vendor outcomes in completion order
async fn search(State(state): State<AppState>, Json(request): Json<SearchRequest>) -> Response {
    let query = match request.search_query() {
        Ok(query) => query,
        Err(response) => return response,
    };
    let vendors = match request.vendor_ids(&state, query.query_type) {
        Ok(vendors) => vendors,
        Err(response) => return response,
    };

    let search = AggregateSearch::new(0, query.clone(), vendors.clone());
    let outcomes = state.aggregator.search(query, &vendors);

    Sse::new(events(outcomes, search))
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// Forward outcomes as events while tallying them, then close with `done`
fn events(
    outcomes: stream::BoxStream<'static, VendorOutcome>,
    search: AggregateSearch,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(
        (outcomes, Some(search)),
        |(mut outcomes, search)| async move {
            let mut search = search?;
            match outcomes.next().await {
                Some(outcome) => {
                    let event = json_event("outcome", &outcome);
                    search.record(outcome);
                    Some((Ok(event), (outcomes, Some(search))))
                }
                None => {
                    let summary = SearchSummary {
                        status: search.status(),
                        total_records: search.total_records(),
                        vendor_states: search.vendor_states().into_iter().collect(),
                    };
                    Some((Ok(json_event("done", &summary)), (outcomes, None)))
                }
            }
        },
    )
}

fn json_event<T: Serialize>(name: &str, payload: &T) -> Event {
    let json = serde_json::to_string(payload).unwrap_or_default();
    Event::default().event(name).data(json)
}
