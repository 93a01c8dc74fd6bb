//! Response decoder module
//!
//! # Overview
//!
//! The catalog answers every page request with an OData collection:
//! `{"@odata.context": ..., "value": [...], "@odata.nextLink": ...}`.
//! Decoders turn that body into a [`PageResult`](crate::pagination::PageResult).

mod decoders;
mod types;

pub use decoders::ODataDecoder;
pub use types::{ODataPage, PageDecoder};
