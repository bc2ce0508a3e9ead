//! Session endpoints: the dashboard's current search, its tables and
//! downloads

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::info;

use osint_core::{AggregateSearch, OsintError, SearchStatus, VendorId, VendorState};
use osint_services::{export_result_set, export_search, Cell, Export, Projection};

use super::{error_response, SearchRequest};
use crate::AppState;

#[derive(Debug, Serialize)]
struct StartedResponse {
    search_id: u64,
    vendors: Vec<VendorId>,
}

#[derive(Debug, Serialize)]
struct SnapshotResponse {
    status: SearchStatus,
    vendor_states: Vec<(VendorId, VendorState)>,
    total_records: usize,
    search: AggregateSearch,
}

/// One page of a vendor's results table
#[derive(Debug, Serialize)]
struct TablePage<'a> {
    vendor: VendorId,
    columns: &'a [String],
    rows: &'a [Vec<Cell>],
    page: usize,
    page_count: usize,
    total_rows: usize,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    page: usize,
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    /// Export a single vendor instead of the whole search
    vendor: Option<String>,
}

/// Create session routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(snapshot))
        .route("/session/search", post(start_search))
        .route("/session/cancel", post(cancel_search))
        .route("/session/events", get(session_events))
        .route("/session/table/{vendor}", get(table_page))
        .route("/session/table/{vendor}/tsv", get(table_tsv))
        .route("/session/export", get(export))
}

/// POST /api/session/search - Start a search, superseding the current one
async fn start_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Response {
    let query = match request.search_query() {
        Ok(query) => query,
        Err(response) => return response,
    };
    let vendors = match request.vendor_ids(&state, query.query_type) {
        Ok(vendors) => vendors,
        Err(response) => return response,
    };

    let search_id = state.session.start(query, vendors.clone()).await;
    info!("Session search #{} started", search_id);

    (
        StatusCode::ACCEPTED,
        Json(StartedResponse { search_id, vendors }),
    )
        .into_response()
}

/// POST /api/session/cancel - Stop the current search, keeping what arrived
async fn cancel_search(State(state): State<AppState>) -> Response {
    if state.session.current_id().await.is_none() {
        return error_response(OsintError::not_found("No search has been started"));
    }
    state.session.cancel().await;
    snapshot(State(state)).await
}

/// GET /api/session - Snapshot of the current search
async fn snapshot(State(state): State<AppState>) -> Response {
    match current(&state).await {
        Ok(search) => Json(SnapshotResponse {
            status: search.status(),
            vendor_states: search.vendor_states().into_iter().collect(),
            total_records: search.total_records(),
            search,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/session/events - Live session progress
async fn session_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.session.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let json = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().event("session").data(json)))
        }
        Err(_) => None, // Lagged - skip missed messages
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// GET /api/session/table/{vendor}?page=n - One page of a vendor's table
async fn table_page(
    State(state): State<AppState>,
    Path(vendor): Path<String>,
    Query(params): Query<PageQuery>,
) -> Response {
    match projection(&state, &vendor).await {
        Ok(projection) => Json(TablePage {
            vendor: projection.vendor,
            columns: &projection.columns,
            rows: projection.page(params.page),
            page: params.page,
            page_count: projection.page_count(),
            total_rows: projection.rows.len(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/session/table/{vendor}/tsv - Whole table as tab-separated text
async fn table_tsv(State(state): State<AppState>, Path(vendor): Path<String>) -> Response {
    match projection(&state, &vendor).await {
        Ok(projection) => (
            [(header::CONTENT_TYPE, "text/tab-separated-values; charset=utf-8")],
            projection.to_tsv(),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/session/export[?vendor=name] - JSON download
async fn export(State(state): State<AppState>, Query(params): Query<ExportQuery>) -> Response {
    let search = match current(&state).await {
        Ok(search) => search,
        Err(e) => return error_response(e),
    };

    let export = match params.vendor {
        None => export_search(&search, Utc::now()),
        Some(name) => {
            let vendor = match state.registry.lookup(&name) {
                Ok(adapter) => adapter.id,
                Err(e) => return error_response(e),
            };
            match search.result_sets().find(|s| s.vendor == vendor) {
                Some(set) => export_result_set(set, &search.query.value, Utc::now()),
                None => {
                    return error_response(OsintError::not_found(format!(
                        "No results from {} in the current search",
                        vendor
                    )))
                }
            }
        }
    };

    download(export)
}

fn download(export: Export) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.to_json(),
    )
        .into_response()
}

async fn current(state: &AppState) -> Result<AggregateSearch, OsintError> {
    state
        .session
        .snapshot()
        .await
        .ok_or_else(|| OsintError::not_found("No search has been started"))
}

async fn projection(state: &AppState, vendor: &str) -> Result<Projection, OsintError> {
    let adapter = state.registry.lookup(vendor)?;
    let search = current(state).await?;
    let set = search
        .result_sets()
        .find(|s| s.vendor == adapter.id)
        .ok_or_else(|| {
            OsintError::not_found(format!("No results from {} in the current search", adapter.id))
        })?;
    Ok(Projection::new(set, adapter.preferred_columns()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum::Router;
    use serde_json::{json, Value};

    use crate::routes::test_support::{get, post_json, send, test_app};

    async fn started_app() -> Router {
        let app = test_app();
        let (status, _) = send(
            app.clone(),
            post_json(
                "/api/session/search",
                json!({
                    "query": "a@x.com",
                    "query_type": "email",
                    "vendors": ["hackcheck", "leakcheck"]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        for _ in 0..50 {
            let (_, body) = send(app.clone(), get("/api/session")).await;
            let json: Value = serde_json::from_str(&body).unwrap();
            if json["status"] != "searching" {
                return app;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session search did not finish");
    }

    #[tokio::test]
    async fn test_snapshot_before_any_search() {
        let (status, _) = send(test_app(), get("/api/session")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_session_snapshot_and_table() {
        let app = started_app().await;

        let (_, body) = send(app.clone(), get("/api/session")).await;
        let snapshot: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(snapshot["status"], "done");
        assert_eq!(snapshot["total_records"], 1);

        let (status, body) = send(app.clone(), get("/api/session/table/hackcheck?page=0")).await;
        assert_eq!(status, StatusCode::OK);
        let table: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(table["columns"], json!(["email"]));
        assert_eq!(table["rows"][0][0]["display"], "a@x.com");
        assert_eq!(table["page_count"], 1);

        let (status, body) = send(app, get("/api/session/table/hackcheck/tsv")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "email\na@x.com");
    }

    #[tokio::test]
    async fn test_cancel_returns_finished_snapshot() {
        let (status, _) = send(test_app(), post_json("/api/session/cancel", json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let app = started_app().await;
        let (status, body) = send(app, post_json("/api/session/cancel", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        let snapshot: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(snapshot["status"], "done");
    }

    #[tokio::test]
    async fn test_export_download() {
        let app = started_app().await;

        let response = {
            use tower::ServiceExt;
            app.clone()
                .oneshot(get("/api/session/export?vendor=hackcheck"))
                .await
                .unwrap()
        };
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"hackcheck_email_a@x.com_"));

        let (status, body) = send(app.clone(), get("/api/session/export")).await;
        assert_eq!(status, StatusCode::OK);
        let document: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(document["outcomes"].as_array().unwrap().len(), 2);

        let (status, _) = send(app, get("/api/session/export?vendor=snusbase")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
