//! Decoder types and traits
//!
//! Defines the page payload shape and the decoder abstraction.

use crate::error::Result;
use crate::pagination::PageResult;
use serde::Deserialize;

/// Top-level OData collection payload
#[derive(Debug, Deserialize)]
pub struct ODataPage<R> {
    /// Metadata context URL (unused)
    #[serde(rename = "@odata.context", default)]
    pub context: Option<String>,
    /// Records on this page
    #[serde(default = "Vec::new")]
    pub value: Vec<R>,
    /// Link to the next page, absent on the last page
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

impl<R> From<ODataPage<R>> for PageResult<R> {
    fn from(page: ODataPage<R>) -> Self {
        PageResult::new(page.value, page.next_link)
    }
}

/// Trait for decoding response bodies into a page of records
pub trait PageDecoder: Send + Sync {
    /// Record type produced by this decoder
    type Record;

    /// Decode the response body into a page
    fn decode(&self, body: &str) -> Result<PageResult<Self::Record>>;
}
