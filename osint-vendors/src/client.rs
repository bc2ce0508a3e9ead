//! HTTP client for vendor APIs
//!
//! Requests are built from the [`Endpoint`] table as plain data first
//! ([`build_request`]), then sent with reqwest. Only the send step touches
//! the network.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use regex::{Captures, Regex};
use reqwest::{Client, Response};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use url::Url;

use osint_core::{RawResponse, SearchQuery, VendorId};

use crate::credentials::{Credential, VendorCredentials};
use crate::endpoints::{Auth, BodyTemplate, Endpoint, HttpMethod};
use crate::error::FetchError;

/// Default HTTP timeout; the aggregator applies its own deadline on top
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// Largest response body read into memory
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Longest error body kept in [`FetchError::Http`]
const MAX_ERROR_BODY_CHARS: usize = 2_000;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(value|type|key)\}").expect("valid placeholder pattern"));

/// Anything able to fetch a vendor's raw response for a query.
///
/// The aggregator only talks to this trait, so tests can swap in canned
/// responses.
#[async_trait]
pub trait VendorFetcher: Send + Sync {
    async fn fetch(&self, vendor: VendorId, query: &SearchQuery)
        -> Result<RawResponse, FetchError>;

    /// Whether the vendor has the credentials it needs
    fn is_configured(&self, _vendor: VendorId) -> bool {
        true
    }
}

/// A request ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub basic_auth: Option<(String, String)>,
    pub body: PreparedBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreparedBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

struct Substitutions<'a> {
    value: &'a str,
    type_name: &'a str,
    key: &'a str,
}

impl Substitutions<'_> {
    /// Fill every placeholder in one pass so values that themselves look
    /// like placeholders are left alone
    fn fill(&self, template: &str, percent_encode: bool) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| {
                let raw = match &caps[1] {
                    "value" => self.value,
                    "type" => self.type_name,
                    _ => self.key,
                };
                if percent_encode {
                    urlencoding::encode(raw).into_owned()
                } else {
                    raw.to_string()
                }
            })
            .into_owned()
    }

    fn fill_json(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.fill(&s, false)),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.fill_json(v)).collect())
            }
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (self.fill(&k, false), self.fill_json(v)))
                    .collect::<Map<_, _>>(),
            ),
            other => other,
        }
    }
}

/// Build the request for `query` against `endpoint`
pub fn build_request(
    endpoint: &Endpoint,
    query: &SearchQuery,
    credential: Option<&Credential>,
) -> Result<PreparedRequest, FetchError> {
    if credential.is_none() && endpoint.credentials.is_some_and(|c| c.required) {
        return Err(FetchError::MissingCredentials(endpoint.vendor));
    }

    let subs = Substitutions {
        value: &query.value,
        type_name: endpoint.type_name(query.query_type),
        key: credential.map(|c| c.key.as_str()).unwrap_or_default(),
    };

    let url = Url::parse(&subs.fill(endpoint.url, true)).map_err(|e| {
        FetchError::InvalidRequest(format!("bad URL for {}: {}", endpoint.vendor, e))
    })?;

    let mut headers: Vec<(String, String)> = endpoint
        .headers
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    let mut basic_auth = None;

    if let Some(credential) = credential {
        match endpoint.auth {
            Auth::None | Auth::Template => {}
            Auth::Header(name) => headers.push((name.to_string(), credential.key.clone())),
            Auth::Bearer => headers.push((
                "Authorization".to_string(),
                format!("Bearer {}", credential.key),
            )),
            Auth::Basic => {
                let user = credential.user.clone().unwrap_or_default();
                basic_auth = Some((user, credential.key.clone()));
            }
            Auth::HeaderPair { user, key } => {
                headers.push((user.to_string(), credential.user.clone().unwrap_or_default()));
                headers.push((key.to_string(), credential.key.clone()));
            }
        }
    }

    let body = match endpoint.body {
        BodyTemplate::None => PreparedBody::Empty,
        BodyTemplate::Json(template) => {
            let parsed: Value = serde_json::from_str(template).map_err(|e| {
                FetchError::InvalidRequest(format!(
                    "bad body template for {}: {}",
                    endpoint.vendor, e
                ))
            })?;
            PreparedBody::Json(subs.fill_json(parsed))
        }
        BodyTemplate::Form(fields) => PreparedBody::Form(
            fields
                .iter()
                .map(|(name, value)| (subs.fill(name, false), subs.fill(value, false)))
                .collect(),
        ),
    };

    Ok(PreparedRequest {
        method: endpoint.method,
        url,
        headers,
        basic_auth,
        body,
    })
}

/// Vendor client backed by reqwest
#[derive(Clone)]
pub struct HttpVendorClient {
    client: Client,
    credentials: VendorCredentials,
}

impl HttpVendorClient {
    pub fn new(credentials: VendorCredentials) -> Self {
        Self::with_timeout(credentials, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(credentials: VendorCredentials, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            credentials,
        }
    }

    pub fn credentials(&self) -> &VendorCredentials {
        &self.credentials
    }

    async fn send(&self, request: PreparedRequest) -> Result<Response, FetchError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(request.url),
            HttpMethod::Post => self.client.post(request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some((user, password)) = request.basic_auth {
            builder = builder.basic_auth(user, Some(password));
        }
        builder = match request.body {
            PreparedBody::Empty => builder,
            PreparedBody::Json(body) => builder.json(&body),
            PreparedBody::Form(fields) => builder.form(&fields),
        };

        builder.send().await.map_err(request_error)
    }
}

#[async_trait]
impl VendorFetcher for HttpVendorClient {
    #[instrument(skip(self, query), fields(query_type = %query.query_type))]
    async fn fetch(
        &self,
        vendor: VendorId,
        query: &SearchQuery,
    ) -> Result<RawResponse, FetchError> {
        let endpoint = Endpoint::for_vendor(vendor);
        let request = build_request(endpoint, query, self.credentials.get(vendor))?;

        debug!(
            "Querying {} at {}",
            vendor,
            request.url.host_str().unwrap_or_default()
        );

        let response = self.send(request).await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("{} returned status {}", vendor, status);
            return Err(FetchError::Http {
                status,
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body = read_body(response).await?;
        debug!("{} returned {} bytes", vendor, body.len());

        Ok(RawResponse::from_body(&body))
    }

    fn is_configured(&self, vendor: VendorId) -> bool {
        self.credentials.is_configured(vendor)
    }
}

/// Read the full body, streaming so that event-stream responses and
/// oversized payloads are handled without a single unbounded buffer
async fn read_body(response: Response) -> Result<String, FetchError> {
    let mut stream = response.bytes_stream();
    let mut buffer = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(request_error)?;
        if buffer.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(FetchError::BodyTooLarge(MAX_BODY_BYTES));
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn request_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err.to_string())
    }
}
