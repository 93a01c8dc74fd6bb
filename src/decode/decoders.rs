//! Decoder implementations

use super::types::{ODataPage, PageDecoder};
use crate::error::{Error, Result};
use crate::pagination::PageResult;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Decoder for OData collection responses (`value` + `@odata.nextLink`)
pub struct ODataDecoder<R> {
    _record: PhantomData<fn() -> R>,
}

impl<R> ODataDecoder<R> {
    /// Create a new OData decoder
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<R> Default for ODataDecoder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for ODataDecoder<R> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<R> std::fmt::Debug for ODataDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ODataDecoder")
            .field("record", &std::any::type_name::<R>())
            .finish()
    }
}

impl<R: DeserializeOwned> PageDecoder for ODataDecoder<R> {
    type Record = R;

    fn decode(&self, body: &str) -> Result<PageResult<R>> {
        let page: ODataPage<R> = serde_json::from_str(body).map_err(|e| Error::Decode {
            message: format!("Failed to parse page: {e}"),
        })?;
        Ok(page.into())
    }
}
