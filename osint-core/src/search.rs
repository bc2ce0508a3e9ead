//! Aggregate state of one user-initiated search

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{AdapterError, QueryType, ResultSet, SearchQuery, VendorId};

/// Per-vendor progress within a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorState {
    Pending,
    Completed,
    Skipped,
    Errored,
}

impl VendorState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, VendorState::Pending)
    }
}

/// Overall progress of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    Idle,
    Searching,
    Done,
    /// Every selected vendor failed or was skipped
    Failed,
}

/// Terminal result of one vendor within a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VendorOutcome {
    /// The adapter produced a result set (possibly empty or malformed)
    Completed(ResultSet),
    /// The vendor does not support the query type; no request was made
    Skipped {
        vendor: VendorId,
        query_type: QueryType,
    },
    /// The request failed before an adapter could run
    Failed {
        vendor: VendorId,
        error: AdapterError,
        elapsed_ms: u64,
    },
}

impl VendorOutcome {
    pub fn vendor(&self) -> VendorId {
        match self {
            VendorOutcome::Completed(set) => set.vendor,
            VendorOutcome::Skipped { vendor, .. } | VendorOutcome::Failed { vendor, .. } => *vendor,
        }
    }

    pub fn state(&self) -> VendorState {
        match self {
            VendorOutcome::Completed(set) if set.error.is_some() => VendorState::Errored,
            VendorOutcome::Completed(_) => VendorState::Completed,
            VendorOutcome::Skipped { .. } => VendorState::Skipped,
            VendorOutcome::Failed { .. } => VendorState::Errored,
        }
    }

    pub fn result_set(&self) -> Option<&ResultSet> {
        match self {
            VendorOutcome::Completed(set) => Some(set),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AdapterError> {
        match self {
            VendorOutcome::Completed(set) => set.error.as_ref(),
            VendorOutcome::Failed { error, .. } => Some(error),
            VendorOutcome::Skipped { .. } => None,
        }
    }
}

/// One query fanned out across a set of vendors
///
/// Outcomes are appended in arrival order; a vendor's first terminal
/// outcome wins and later ones are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSearch {
    /// Monotonic identifier, newer searches have larger ids
    pub search_id: u64,
    pub query: SearchQuery,
    pub vendors: Vec<VendorId>,
    pub outcomes: Vec<VendorOutcome>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl AggregateSearch {
    pub fn new(search_id: u64, query: SearchQuery, vendors: Vec<VendorId>) -> Self {
        let mut unique = Vec::with_capacity(vendors.len());
        for vendor in vendors {
            if !unique.contains(&vendor) {
                unique.push(vendor);
            }
        }

        Self {
            search_id,
            query,
            vendors: unique,
            outcomes: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Record a vendor outcome. Returns false when it was ignored because
    /// the vendor is not part of this search or already finished.
    pub fn record(&mut self, outcome: VendorOutcome) -> bool {
        let vendor = outcome.vendor();
        if !self.vendors.contains(&vendor) || self.outcome_for(vendor).is_some() {
            return false;
        }

        self.outcomes.push(outcome);
        if self.is_complete() && self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
        true
    }

    pub fn outcome_for(&self, vendor: VendorId) -> Option<&VendorOutcome> {
        self.outcomes.iter().find(|o| o.vendor() == vendor)
    }

    pub fn vendor_state(&self, vendor: VendorId) -> VendorState {
        self.outcome_for(vendor)
            .map(VendorOutcome::state)
            .unwrap_or(VendorState::Pending)
    }

    /// State of every selected vendor, in selection order
    pub fn vendor_states(&self) -> IndexMap<VendorId, VendorState> {
        self.vendors
            .iter()
            .map(|v| (*v, self.vendor_state(*v)))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.vendors
            .iter()
            .all(|v| self.vendor_state(*v).is_terminal())
    }

    pub fn status(&self) -> SearchStatus {
        if self.vendors.is_empty() {
            return SearchStatus::Idle;
        }
        if !self.is_complete() {
            return SearchStatus::Searching;
        }
        let any_completed = self
            .outcomes
            .iter()
            .any(|o| o.state() == VendorState::Completed);
        if any_completed {
            SearchStatus::Done
        } else {
            SearchStatus::Failed
        }
    }

    /// Result sets that were produced, in arrival order
    pub fn result_sets(&self) -> impl Iterator<Item = &ResultSet> {
        self.outcomes.iter().filter_map(VendorOutcome::result_set)
    }

    pub fn total_records(&self) -> usize {
        self.result_sets().map(|s| s.records.len()).sum()
    }
}
