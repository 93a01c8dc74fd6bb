//! Product upload endpoint

use super::csv::CsvLayout;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use tracing::info;

/// Default upload endpoint, relative to the API base URL
pub const DEFAULT_UPLOAD_PATH: &str = "/v1/ProductUpload";

/// Posts CSV feeds to the catalog's upload endpoint
#[derive(Debug, Clone)]
pub struct Uploader {
    client: HttpClient,
    upload_path: String,
}

impl Uploader {
    /// Create an uploader for `upload_path`
    pub fn new(client: HttpClient, upload_path: impl Into<String>) -> Self {
        Self {
            client,
            upload_path: upload_path.into(),
        }
    }

    /// Post `layout` as `text/csv` for the given profile region
    pub async fn upload(&self, layout: &CsvLayout, region: u64) -> Result<()> {
        if region == 0 {
            return Err(Error::invalid_value("region", "region not set"));
        }

        let body = layout.to_csv_bytes()?;
        let size = body.len();
        let config = RequestConfig::new()
            .query("profileid", region.to_string())
            .payload("text/csv", body);

        let response = self.client.post(&self.upload_path, config).await?;

        info!(
            "Uploaded {} rows ({} bytes) to profile {}: {}",
            layout.len(),
            size,
            region,
            response.status()
        );
        Ok(())
    }
}
