//! Core types for the OSINT search dashboard
//!
//! This crate defines the shared data structures used across the workspace,
//! including query types, vendor identifiers, normalized records and the
//! per-search aggregate state.

pub mod error;
pub mod query;
pub mod record;
pub mod search;
pub mod vendor;

pub use error::{OsintError, OsintResult};
pub use query::{QueryType, SearchQuery};
pub use record::{AdapterError, AdapterErrorKind, NormalizedRecord, RawResponse, ResultSet};
pub use search::{AggregateSearch, SearchStatus, VendorOutcome, VendorState};
pub use vendor::{VendorCategory, VendorId};
