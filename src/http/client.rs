//! Authenticated transport for the catalog API
//!
//! Paths are resolved against the configured base URL (absolute URLs such as
//! an `@odata.nextLink` pass through untouched), credentials come from the
//! [`Authenticator`], and any 4xx/5xx response is turned into
//! [`Error::HttpStatus`] carrying the response body.
//!
//! There is no retry loop: a request is sent once and its failure is handed
//! straight back to the caller.

use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use bytes::Bytes;
use reqwest::{Client, Method, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client-wide settings
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Prefix for relative paths
    pub base_url: Option<String>,
    /// Timeout applied when a request sets none of its own
    pub timeout: Duration,
    /// Sent with every request, before per-request headers
    pub default_headers: Vec<(String, String)>,
    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            default_headers: Vec::new(),
            user_agent: concat!("catalog-harvest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpClientConfig {
    /// Start a config builder from the defaults
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Resolve `target` to the URL that will actually be requested
    pub fn resolve(&self, target: &str) -> String {
        let absolute = target.starts_with("http://") || target.starts_with("https://");
        match &self.base_url {
            Some(base) if !absolute => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                target.trim_start_matches('/')
            ),
            _ => target.to_string(),
        }
    }
}

/// Builder for [`HttpClientConfig`]
#[derive(Debug, Default)]
pub struct HttpClientConfigBuilder {
    inner: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.inner.base_url = Some(url.into());
        self
    }

    /// Set the client-wide timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner.timeout = timeout;
        self
    }

    /// Add a default header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.default_headers.push((name.into(), value.into()));
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.inner.user_agent = agent.into();
        self
    }

    /// Finish the config
    pub fn build(self) -> HttpClientConfig {
        self.inner
    }
}

/// Request body with its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// `Content-Type` header value
    pub content_type: String,
    /// Body bytes, sent as is
    pub bytes: Bytes,
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query pairs, encoded in insertion order
    pub query: Vec<(String, String)>,
    /// Headers added after the client defaults
    pub headers: Vec<(String, String)>,
    /// Request body
    pub payload: Option<Payload>,
    /// Overrides the client-wide timeout
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    /// Empty request options
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query parameter
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body and its content type
    #[must_use]
    pub fn payload(mut self, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        self.payload = Some(Payload {
            content_type: content_type.into(),
            bytes: bytes.into(),
        });
        self
    }

    /// Override the timeout for this request
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Copy these options onto a reqwest builder
    fn decorate(self, mut req: RequestBuilder) -> RequestBuilder {
        for (name, value) in &self.headers {
            req = req.header(name, value);
        }
        if !self.query.is_empty() {
            req = req.query(&self.query);
        }
        if let Some(Payload {
            content_type,
            bytes,
        }) = self.payload
        {
            req = req
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(bytes);
        }
        req
    }
}

/// reqwest client plus base URL and optional credentials
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Option<Authenticator>,
}

impl HttpClient {
    /// Client with default settings and no credentials
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Client with custom settings and no credentials
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            authenticator: None,
        })
    }

    /// Build a client whose requests carry credentials from `auth`.
    ///
    /// The authenticator shares the underlying connection pool, so token
    /// refreshes go through the same client.
    pub fn with_auth(config: HttpClientConfig, auth: AuthConfig) -> Result<Self> {
        let mut http = Self::with_config(config)?;
        http.authenticator = Some(Authenticator::with_client(auth, http.client.clone()));
        Ok(http)
    }

    /// Whether requests carry credentials
    pub fn is_authenticated(&self) -> bool {
        self.authenticator.is_some()
    }

    /// Send a GET request
    pub async fn get(&self, target: &str, options: RequestConfig) -> Result<Response> {
        self.send(Method::GET, target, options).await
    }

    /// Send a POST request
    pub async fn post(&self, target: &str, options: RequestConfig) -> Result<Response> {
        self.send(Method::POST, target, options).await
    }

    /// GET and read the whole body as text
    pub async fn get_text(&self, target: &str, options: RequestConfig) -> Result<String> {
        let response = self.get(target, options).await?;
        Ok(response.text().await?)
    }

    /// Send one request and classify the outcome
    pub async fn send(
        &self,
        method: Method,
        target: &str,
        options: RequestConfig,
    ) -> Result<Response> {
        let url = self.config.resolve(target);
        let timeout = options.timeout.unwrap_or(self.config.timeout);

        let mut req = self.client.request(method.clone(), &url).timeout(timeout);
        for (name, value) in &self.config.default_headers {
            req = req.header(name, value);
        }
        req = options.decorate(req);
        if let Some(auth) = &self.authenticator {
            req = auth.apply(req).await?;
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                }
            } else {
                Error::Http(e)
            }
        })?;

        let status = response.status();
        if !(status.is_client_error() || status.is_server_error()) {
            debug!("{} {} -> {}", method, url, status);
            return Ok(response);
        }

        debug!("{} {} failed with {}", method, url, status);
        Err(Error::HttpStatus {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
