//! Per-vendor adapter: a vendor id, the query types it accepts, and the
//! spec that normalizes its payloads

use tracing::{debug, warn};

use osint_core::{QueryType, RawResponse, ResultSet, VendorId};

use crate::engine::normalize;
use crate::spec::AdapterSpec;

/// Normalizer for one vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorAdapter {
    pub id: VendorId,
    pub query_types: &'static [QueryType],
    pub spec: AdapterSpec,
}

impl VendorAdapter {
    pub fn supports(&self, query_type: QueryType) -> bool {
        self.query_types.contains(&query_type)
    }

    /// Columns shown first when this vendor's results are tabulated
    pub fn preferred_columns(&self) -> &'static [&'static str] {
        self.spec.preferred_columns
    }

    /// Normalize a raw response into a result set.
    ///
    /// Never fails: an unrecognised payload yields an empty result set
    /// whose `error` explains what was wrong.
    pub fn adapt(&self, raw: &RawResponse, query_type: QueryType) -> ResultSet {
        match normalize(&self.spec, raw) {
            Ok(normalized) => {
                debug!(
                    "{} normalized {} records (reported total {:?})",
                    self.id,
                    normalized.records.len(),
                    normalized.reported_total
                );
                let mut set = ResultSet::new(self.id, query_type, normalized.records);
                set.reported_total = normalized.reported_total;
                set
            }
            Err(e) => {
                warn!("{} response could not be normalized: {}", self.id, e);
                ResultSet::malformed(self.id, query_type, e.to_string())
            }
        }
    }
}
