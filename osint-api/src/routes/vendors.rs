//! Vendor listing and single-vendor proxy endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use osint_core::{
    AdapterErrorKind, OsintError, QueryType, RawResponse, ResultSet, VendorCategory, VendorId,
};
use osint_vendors::FetchError;

use super::{error_response, SearchRequest};
use crate::AppState;

/// One entry of `GET /api/vendors`
#[derive(Debug, Serialize)]
struct VendorInfo {
    id: VendorId,
    name: &'static str,
    category: VendorCategory,
    query_types: Vec<QueryType>,
    preferred_columns: &'static [&'static str],
    configured: bool,
}

/// Response envelope of the single-vendor endpoint
#[derive(Debug, Serialize)]
struct ProxyResponse {
    success: bool,
    data: Option<RawResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    normalized: Option<ResultSet>,
}

/// Create vendor routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vendors", get(list_vendors))
        .route("/vendors/{vendor}/search", post(search_vendor))
}

/// GET /api/vendors - Every registered vendor and what it accepts
async fn list_vendors(State(state): State<AppState>) -> Json<Vec<VendorInfo>> {
    let vendors = state
        .registry
        .all_vendors()
        .into_iter()
        .filter_map(|id| state.registry.get(id).ok())
        .map(|adapter| VendorInfo {
            id: adapter.id,
            name: adapter.id.display_name(),
            category: adapter.id.category(),
            query_types: adapter.query_types.to_vec(),
            preferred_columns: adapter.preferred_columns(),
            configured: state.fetcher.is_configured(adapter.id),
        })
        .collect();

    Json(vendors)
}

/// POST /api/vendors/{vendor}/search - Query one vendor and return both its
/// raw payload and the normalized result set
async fn search_vendor(
    State(state): State<AppState>,
    Path(vendor): Path<String>,
    Json(request): Json<SearchRequest>,
) -> Response {
    let adapter = match state.registry.lookup(&vendor) {
        Ok(adapter) => *adapter,
        Err(e) => return error_response(e),
    };
    let query = match request.search_query() {
        Ok(query) => query,
        Err(response) => return response,
    };
    if !adapter.supports(query.query_type) {
        return error_response(OsintError::invalid_query(format!(
            "{} does not support {} searches",
            adapter.id, query.query_type
        )));
    }

    let timeout = state.aggregator.config().vendor_timeout;
    let started = Instant::now();
    let result = tokio::time::timeout(timeout, state.fetcher.fetch(adapter.id, &query)).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(Ok(raw)) => {
            let normalized = adapter.adapt(&raw, query.query_type).with_elapsed(elapsed_ms);
            debug!(
                "{} proxy search returned {} records",
                adapter.id,
                normalized.records.len()
            );
            let success = normalized
                .error
                .as_ref()
                .map_or(true, |e| e.kind != AdapterErrorKind::MalformedResponse);
            let error = normalized.error.as_ref().map(|e| e.message.clone());
            (
                StatusCode::OK,
                Json(ProxyResponse {
                    success,
                    data: Some(raw),
                    error,
                    normalized: Some(normalized),
                }),
            )
                .into_response()
        }
        Ok(Err(e)) => {
            warn!("{} proxy search failed: {}", adapter.id, e);
            failure(fetch_status(&e), e.to_string(), upstream_body(&e))
        }
        Err(_) => {
            warn!("{} proxy search timed out", adapter.id);
            failure(
                StatusCode::GATEWAY_TIMEOUT,
                format!("No response within {}s", timeout.as_secs()),
                None,
            )
        }
    }
}

fn fetch_status(err: &FetchError) -> StatusCode {
    match err {
        FetchError::MissingCredentials(_) => StatusCode::SERVICE_UNAVAILABLE,
        FetchError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FetchError::InvalidRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
        FetchError::Http { .. } | FetchError::Network(_) | FetchError::BodyTooLarge(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

/// The vendor's own error body, when it sent one
fn upstream_body(err: &FetchError) -> Option<RawResponse> {
    match err {
        FetchError::Http { body, .. } if !body.is_empty() => Some(RawResponse::from_body(body)),
        _ => None,
    }
}

fn failure(status: StatusCode, error: String, data: Option<RawResponse>) -> Response {
    (
        status,
        Json(ProxyResponse {
            success: false,
            data,
            error: Some(error),
            normalized: None,
        }),
    )
        .into_response()
}
