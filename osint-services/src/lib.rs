//! Search orchestration for the OSINT dashboard
//!
//! This crate drives searches across vendors and shapes their results
//! for display and download.

pub mod aggregator;
pub mod export;
pub mod projection;
pub mod session;

pub use aggregator::{Aggregator, AggregatorConfig, DEFAULT_VENDOR_TIMEOUT_SECS};
pub use export::{
    export_filename, export_result_set, export_search, safe_serialize, Export, SafeValue,
    CIRCULAR_SENTINEL, MAX_EXPORT_DEPTH,
};
pub use projection::{Cell, CellFormat, Projection, PAGE_SIZE};
pub use session::{SearchSession, SessionEvent};
