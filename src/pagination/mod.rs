//! Pagination module
//!
//! # Overview
//!
//! The catalog pages its collection by `$skip` offset and signals the end of
//! the collection by omitting `@odata.nextLink`. The [`Paginator`] walks the
//! collection with a fixed number of concurrent slots under a global call
//! ceiling and returns every record once all slots have drained.

mod paginator;
mod slots;
mod types;

pub use paginator::Paginator;
pub use slots::{SlotId, SlotLease, SlotPool};
pub use types::{
    AggregateResult, DispatchUnit, PageFetcher, PageRequest, PageResult, PaginatorConfig,
    RunStats, DEFAULT_PAGE_SIZE, DEFAULT_SLOTS,
};
