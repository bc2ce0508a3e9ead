//! API route definitions

mod health;
mod search;
mod session;
mod vendors;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Deserialize;

use osint_core::{OsintError, QueryType, SearchQuery, VendorId};

use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(vendors::routes())
        .merge(search::routes())
        .merge(session::routes())
}

/// Body shared by every search endpoint. Vendor-specific extras sent by
/// older clients are ignored.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Raw query value as typed by the user
    pub query: String,
    /// Query type name (`email`, `ip`, ...)
    pub query_type: String,
    /// Vendors to search; defaults to every configured vendor that
    /// supports the query type
    #[serde(default)]
    pub vendors: Option<Vec<String>>,
}

impl SearchRequest {
    /// Validate the query before any vendor is contacted
    pub fn search_query(&self) -> Result<SearchQuery, Response> {
        let query_type: QueryType = self.query_type.parse().map_err(error_response)?;
        SearchQuery::new(&self.query, query_type).map_err(error_response)
    }

    /// Resolve the vendor selection
    pub fn vendor_ids(
        &self,
        state: &AppState,
        query_type: QueryType,
    ) -> Result<Vec<VendorId>, Response> {
        match &self.vendors {
            Some(names) => names
                .iter()
                .map(|name| state.registry.lookup(name).map(|a| a.id))
                .collect::<Result<Vec<_>, _>>()
                .map_err(error_response),
            None => Ok(state
                .registry
                .vendors_for(query_type)
                .into_iter()
                .filter(|v| state.fetcher.is_configured(*v))
                .collect()),
        }
    }
}

/// Map a top-level error to an HTTP response
pub fn error_response(err: OsintError) -> Response {
    let status = match &err {
        OsintError::InvalidQuery(_) | OsintError::Configuration(_) => StatusCode::BAD_REQUEST,
        OsintError::NotFound(_) => StatusCode::NOT_FOUND,
    };

    (
        status,
        Json(serde_json::json!({
            "error": err.to_string()
        })),
    )
        .into_response()
}


#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};

    use osint_core::{RawResponse, SearchQuery, VendorId};
    use osint_services::AggregatorConfig;
    use osint_vendors::{FetchError, VendorFetcher};

    use crate::{app, AppState};

    /// Answers every vendor with one record echoing the query, except
    /// LeakCheck which always gets a 403
    pub struct StubFetcher;

    #[async_trait]
    impl VendorFetcher for StubFetcher {
        async fn fetch(
            &self,
            vendor: VendorId,
            query: &SearchQuery,
        ) -> Result<RawResponse, FetchError> {
            if vendor == VendorId::LeakCheck {
                return Err(FetchError::Http {
                    status: 403,
                    body: r#"{"error":"subscription required"}"#.to_string(),
                });
            }
            let rows = json!([{ "email": query.value }]);
            Ok(RawResponse::Json(json!({ "result": rows, "results": rows })))
        }

        fn is_configured(&self, vendor: VendorId) -> bool {
            vendor != VendorId::Shodan
        }
    }

    pub fn test_app() -> Router {
        app(AppState::new(Arc::new(StubFetcher), AggregatorConfig::default()))
    }

    pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        use tower::ServiceExt;

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }
}
