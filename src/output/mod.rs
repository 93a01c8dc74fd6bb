//! Output module
//!
//! Lays products out as the catalog's CSV upload feed and posts the feed
//! back to the upload endpoint.

mod csv;
mod upload;

pub use self::csv::{CsvLayout, BASE_COLUMNS};
pub use upload::{Uploader, DEFAULT_UPLOAD_PATH};
