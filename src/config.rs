//! Application configuration
//!
//! Loaded from a YAML file with every section optional. Credentials may
//! also come from the environment (`CLIENT_ID`, `CLIENT_SECRET`,
//! `REFRESH_TOKEN`, `REDIRECT_URL`), which takes precedence over the file.

use crate::auth::{AuthConfig, AuthorizationFlow, TokenStore};
use crate::catalog::{CatalogPaths, DEFAULT_PRODUCTS_PATH};
use crate::error::{Error, Result};
use crate::filter::{default_expand, ProductFilter, DEFAULT_LABEL, DEFAULT_PROFILE_ID};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::output::DEFAULT_UPLOAD_PATH;
use crate::pagination::{PageRequest, PaginatorConfig, DEFAULT_PAGE_SIZE, DEFAULT_SLOTS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote API endpoints
    pub api: ApiSection,
    /// Credentials
    pub auth: AuthSection,
    /// Product selection
    pub catalog: CatalogSection,
    /// Concurrency and rate ceiling
    pub pagination: PaginationSection,
}

// ============================================================================
// Sections
// ============================================================================

/// API endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    pub products_path: String,
    pub upload_path: String,
    pub timeout_seconds: u64,
    pub user_agent: Option<String>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.channeladvisor.com".to_string(),
            products_path: DEFAULT_PRODUCTS_PATH.to_string(),
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
            timeout_seconds: 30,
            user_agent: None,
        }
    }
}

/// OAuth2 credentials
///
/// With `client_id` and `client_secret` set the refresh token flow is used;
/// otherwise a static `access_token` is sent as a bearer token if present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub token_url: String,
    /// Consent page for the first-run `authorize` command
    pub authorize_url: String,
    /// Redirect target registered for the application
    pub redirect_url: Option<String>,
    pub scope: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
    /// Token cache file; `None` disables caching
    pub token_cache: Option<PathBuf>,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            token_url: "https://api.channeladvisor.com/oauth2/token".to_string(),
            authorize_url: "https://api.channeladvisor.com/oauth2/authorize".to_string(),
            redirect_url: None,
            scope: "inventory".to_string(),
            client_id: None,
            client_secret: None,
            refresh_token: None,
            access_token: None,
            token_cache: Some(PathBuf::from("credentials/ca-toks.json")),
        }
    }
}

/// Which products to fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    pub label: String,
    pub profile_id: u64,
    pub expand: Vec<String>,
    pub parent_only: bool,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            profile_id: DEFAULT_PROFILE_ID,
            expand: default_expand(),
            parent_only: false,
        }
    }
}

/// Paginator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSection {
    pub slots: usize,
    pub page_size: u64,
    /// Call ceiling per window
    pub max_calls: u32,
    pub window_seconds: u64,
}

impl Default for PaginationSection {
    fn default() -> Self {
        let rate = RateLimiterConfig::default();
        Self {
            slots: DEFAULT_SLOTS,
            page_size: DEFAULT_PAGE_SIZE,
            max_calls: rate.max_calls,
            window_seconds: rate.window.as_secs(),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl AppConfig {
    /// Parse configuration from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_yaml_str(&content)
    }

    /// Override credentials from the environment
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(value) = read("CLIENT_ID") {
            self.auth.client_id = Some(value);
        }
        if let Some(value) = read("CLIENT_SECRET") {
            self.auth.client_secret = Some(value);
        }
        if let Some(value) = read("REFRESH_TOKEN") {
            self.auth.refresh_token = Some(value);
        }
        if let Some(value) = read("REDIRECT_URL") {
            self.auth.redirect_url = Some(value);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(Error::missing_field("api.base_url"));
        }
        url::Url::parse(&self.api.base_url)
            .map_err(|e| Error::invalid_value("api.base_url", e.to_string()))?;
        if self.api.products_path.is_empty() {
            return Err(Error::missing_field("api.products_path"));
        }
        if self.api.upload_path.is_empty() {
            return Err(Error::missing_field("api.upload_path"));
        }
        if self.api.timeout_seconds == 0 {
            return Err(Error::invalid_value(
                "api.timeout_seconds",
                "must be greater than zero",
            ));
        }

        match (&self.auth.client_id, &self.auth.client_secret) {
            (Some(_), None) => return Err(Error::missing_field("auth.client_secret")),
            (None, Some(_)) => return Err(Error::missing_field("auth.client_id")),
            _ => {}
        }

        if self.pagination.window_seconds == 0 {
            return Err(Error::invalid_value(
                "pagination.window_seconds",
                "must be greater than zero",
            ));
        }

        self.page_template().validate()?;
        self.paginator_config().validate()
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Paginator configuration
    pub fn paginator_config(&self) -> PaginatorConfig {
        PaginatorConfig::new()
            .with_slots(self.pagination.slots)
            .with_page_size(self.pagination.page_size)
            .with_rate_limit(RateLimiterConfig::new(
                self.pagination.max_calls,
                Duration::from_secs(self.pagination.window_seconds),
            ))
    }

    /// HTTP client configuration
    pub fn http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.api.base_url)
            .timeout(Duration::from_secs(self.api.timeout_seconds));
        if let Some(agent) = &self.api.user_agent {
            builder = builder.user_agent(agent);
        }
        builder.build()
    }

    /// Authentication configuration
    pub fn auth_config(&self) -> AuthConfig {
        let auth = &self.auth;
        match (&auth.client_id, &auth.client_secret) {
            (Some(client_id), Some(client_secret)) => AuthConfig::Oauth2Refresh {
                token_url: auth.token_url.clone(),
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                refresh_token: auth.refresh_token.clone(),
                store: self.token_store(),
            },
            _ => match &auth.access_token {
                Some(token) => AuthConfig::Bearer {
                    token: token.clone(),
                },
                None => AuthConfig::None,
            },
        }
    }

    /// Authorization-code grant settings
    ///
    /// Needs the client id, secret, redirect URL and a token cache to write
    /// the result to.
    pub fn authorization_flow(&self) -> Result<AuthorizationFlow> {
        let auth = &self.auth;
        let require = |value: &Option<String>, field: &str| {
            value.clone().ok_or_else(|| Error::missing_field(field))
        };
        Ok(AuthorizationFlow {
            authorize_url: auth.authorize_url.clone(),
            token_url: auth.token_url.clone(),
            client_id: require(&auth.client_id, "auth.client_id")?,
            client_secret: require(&auth.client_secret, "auth.client_secret")?,
            redirect_url: require(&auth.redirect_url, "auth.redirect_url")?,
            scope: auth.scope.clone(),
        })
    }

    /// Token cache the refresh flow reads and `authorize` writes
    pub fn token_store(&self) -> Option<TokenStore> {
        self.auth.token_cache.as_ref().map(TokenStore::new)
    }

    /// `$filter` predicates for the configured selection
    pub fn product_filter(&self) -> ProductFilter {
        ProductFilter::new(&self.catalog.label, self.catalog.profile_id)
            .with_is_parent(self.catalog.parent_only.then_some(true))
    }

    /// Request template for every page
    pub fn page_template(&self) -> PageRequest {
        PageRequest::new(self.product_filter(), self.catalog.expand.clone())
    }

    /// Endpoint paths
    pub fn catalog_paths(&self) -> CatalogPaths {
        CatalogPaths {
            products: self.api.products_path.clone(),
            upload: self.api.upload_path.clone(),
        }
    }
}
