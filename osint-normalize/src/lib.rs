//! Vendor response normalization
//!
//! This crate turns the inconsistent payloads returned by OSINT vendors
//! into flat, uniform [`ResultSet`](osint_core::ResultSet)s:
//! - `sse`: incremental Server-Sent-Events decoding
//! - `spec`: declarative per-vendor response descriptions
//! - `engine`: the single interpreter for those descriptions
//! - `registry`: vendor id to adapter lookup, with the built-in catalogue

pub mod adapter;
pub mod catalogue;
pub mod engine;
pub mod flatten;
pub mod registry;
pub mod spec;
pub mod sse;

pub use adapter::VendorAdapter;
pub use engine::{normalize, NormalizeError, Normalized};
pub use registry::Registry;
pub use spec::{AdapterSpec, Merge, Shape, DEFAULT_RESULT_FIELDS};
pub use sse::{parse_events, SseDecoder, SseEvent};
