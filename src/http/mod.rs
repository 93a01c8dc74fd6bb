//! HTTP client module
//!
//! Provides the authenticated HTTP client and the dispatch rate limiter.
//!
//! # Features
//!
//! - **Authentication**: Integration with auth module
//! - **Typed failures**: Non-2xx responses become `Error::HttpStatus`
//! - **Rate Limiting**: GCRA rate limiter using governor

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, Payload, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
