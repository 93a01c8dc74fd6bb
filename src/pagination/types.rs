//! Pagination types and traits
//!
//! Defines the request/response shapes exchanged with a [`PageFetcher`] and
//! the configuration and result types of a pagination run.

use super::slots::SlotId;
use crate::error::{Error, Result};
use crate::filter::{default_expand, expand_param, ProductFilter};
use crate::http::RateLimiterConfig;
use crate::types::OptionStringExt;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Records per page requested from the catalog
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Concurrent fetch slots per run
pub const DEFAULT_SLOTS: usize = 5;

// ============================================================================
// Request / Result
// ============================================================================

/// One page request against the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// `$filter` predicates, including the profile context
    pub filter: ProductFilter,
    /// `$expand` collections
    pub expand: Vec<String>,
    /// `$skip` offset
    pub offset: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(ProductFilter::default(), default_expand())
    }
}

impl PageRequest {
    /// Create a request template starting at offset 0
    pub fn new(filter: ProductFilter, expand: Vec<String>) -> Self {
        Self {
            filter,
            expand,
            offset: 0,
        }
    }

    /// Set the starting offset
    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Concrete request for one dispatch: this template at `offset`, with
    /// the run's start date as the `CreateDateUtc` predicate
    pub fn at(&self, offset: u64, since: Option<NaiveDate>) -> Self {
        Self {
            filter: self.filter.clone().with_created_since(since),
            expand: self.expand.clone(),
            offset,
        }
    }

    /// Check that filter and expand can be rendered
    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        expand_param(&self.expand)?;
        Ok(())
    }

    /// Query parameters in the order they are sent
    pub fn query_params(&self) -> Result<Vec<(String, String)>> {
        Ok(vec![
            ("$filter".to_string(), self.filter.to_odata()),
            ("$expand".to_string(), expand_param(&self.expand)?),
            ("$skip".to_string(), self.offset.to_string()),
        ])
    }
}

/// Records of one page plus the continuation cursor
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<R> {
    /// Records in server order
    pub records: Vec<R>,
    /// Opaque continuation; `None` on the last page
    pub next_cursor: Option<String>,
}

impl<R> PageResult<R> {
    /// Create a page result; an empty cursor means no more pages
    pub fn new(records: Vec<R>, next_cursor: Option<String>) -> Self {
        Self {
            records,
            next_cursor: next_cursor.none_if_empty(),
        }
    }

    /// Create a terminal page
    pub fn last(records: Vec<R>) -> Self {
        Self::new(records, None)
    }

    /// Whether the server reported another page
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

// ============================================================================
// Fetcher
// ============================================================================

/// Performs a single page request
///
/// Implementations must not retry; any error is fatal to the run.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Record type carried by each page
    type Record: Send + 'static;

    /// Fetch and decode one page
    async fn fetch(&self, request: &PageRequest) -> Result<PageResult<Self::Record>>;
}

/// Immutable parameters of one spawned unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchUnit {
    /// Slot this unit holds
    pub slot: SlotId,
    /// `$skip` offset to fetch
    pub offset: u64,
    /// Start date for the `CreateDateUtc` predicate
    pub since: Option<NaiveDate>,
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a [`Paginator`](super::Paginator)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatorConfig {
    /// Number of concurrent fetch slots
    pub slots: usize,
    /// Offset increment between consecutive pages
    pub page_size: u64,
    /// External call ceiling; `None` disables rate limiting
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOTS,
            page_size: DEFAULT_PAGE_SIZE,
            rate_limit: Some(RateLimiterConfig::default()),
        }
    }
}

impl PaginatorConfig {
    /// Create a new paginator config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slot count
    #[must_use]
    pub fn with_slots(mut self, slots: usize) -> Self {
        self.slots = slots;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the rate ceiling
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimiterConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    /// Disable rate limiting
    #[must_use]
    pub fn no_rate_limit(mut self) -> Self {
        self.rate_limit = None;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.slots == 0 {
            return Err(Error::invalid_value(
                "pagination.slots",
                "at least one slot is required",
            ));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_value(
                "pagination.page_size",
                "must be greater than zero",
            ));
        }
        if let Some(rate_limit) = &self.rate_limit {
            rate_limit.period_for_slots(self.slots)?;
        }
        Ok(())
    }
}

// ============================================================================
// Results
// ============================================================================

/// Statistics from a pagination run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Pages fetched and merged
    pub pages_fetched: usize,
    /// Records in the aggregate
    pub records: usize,
    /// Units spawned by the governing loop
    pub dispatched: usize,
    /// Slot count of the run
    pub slots: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// All records of one run, in no particular order
#[derive(Debug, Clone)]
pub struct AggregateResult<R> {
    /// Every record from every fetched page
    pub records: Vec<R>,
    /// Run statistics
    pub stats: RunStats,
}

impl<R> AggregateResult<R> {
    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the run produced no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Take the records
    pub fn into_records(self) -> Vec<R> {
        self.records
    }
}
