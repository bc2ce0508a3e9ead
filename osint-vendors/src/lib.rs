//! OSINT Vendors - HTTP access to third-party OSINT services
//!
//! This crate turns a [`SearchQuery`](osint_core::SearchQuery) into a
//! vendor request, sends it and hands back the raw response body.
//! Interpreting that body is left to `osint-normalize`.

pub mod client;
pub mod credentials;
pub mod endpoints;
pub mod error;

pub use client::{build_request, HttpVendorClient, PreparedBody, PreparedRequest, VendorFetcher};
pub use credentials::{Credential, VendorCredentials};
pub use endpoints::{Auth, BodyTemplate, Endpoint, HttpMethod, ENDPOINTS};
pub use error::FetchError;
