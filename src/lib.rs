//! # Catalog Harvest
//!
//! Pulls every product matching a label/profile filter out of a paginated
//! OData catalog API, under the API's call ceiling, and pushes the result
//! back as a CSV upload feed.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use catalog_harvest::{AppConfig, Catalog, HttpClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut config = AppConfig::from_file("harvest.yaml")?;
//!     config.apply_env(|key| std::env::var(key).ok());
//!
//!     let client = HttpClient::with_auth(config.http_config(), config.auth_config())?;
//!     let catalog = Catalog::new(
//!         client,
//!         config.catalog_paths(),
//!         config.page_template(),
//!         config.paginator_config(),
//!     )?;
//!
//!     let since = chrono::NaiveDate::from_ymd_opt(2024, 1, 1);
//!     let products = catalog.products(since).await?;
//!     catalog.upload(&products.records, 12345).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         Catalog                               │
//! │   products(since) → AggregateResult    upload(products, id)   │
//! └───────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────────┬───────────┬───────────┐
//! │  Paginator   │  CatalogFetcher           │  Decode   │  Output   │
//! ├──────────────┼───────────────────────────┼───────────┼───────────┤
//! │ Slot pool    │ $filter / $expand / $skip │ OData     │ CSV feed  │
//! │ Rate permit  │ HttpClient + OAuth2       │ nextLink  │ Uploader  │
//! │ Aggregate    │                           │           │           │
//! └──────────────┴───────────────────────────┴───────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

pub mod auth;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod decode;
pub mod error;
pub mod filter;
pub mod http;
pub mod output;
pub mod pagination;
pub mod types;

pub use catalog::{Catalog, CatalogFetcher, CatalogPaths};
pub use config::AppConfig;
pub use error::{Error, ErrorCategory, Result};
pub use filter::ProductFilter;
pub use http::HttpClient;
pub use pagination::{AggregateResult, PageFetcher, PageRequest, PageResult, Paginator};
pub use types::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
