//! Auth configuration types
//!
//! These types represent the runtime auth configuration after the config
//! file and environment have been resolved.

use super::store::TokenStore;
use chrono::{DateTime, Utc};

/// Authentication configuration
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// Static bearer token
    Bearer {
        /// The bearer token
        token: String,
    },

    /// OAuth2 Refresh Token flow
    Oauth2Refresh {
        /// Token endpoint URL
        token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Refresh token, if not taken from the token cache
        refresh_token: Option<String>,
        /// On-disk token cache
        store: Option<TokenStore>,
    },
}

impl AuthConfig {
    /// Whether this config needs a token endpoint round trip
    pub fn needs_refresh(&self) -> bool {
        matches!(self, Self::Oauth2Refresh { .. })
    }
}

/// Tokens are treated as expired this long before their actual expiry
pub const EXPIRY_BUFFER_SECS: i64 = 30;

/// Access token held in memory between requests
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub token: String,
    /// `None` for tokens the server issued without a lifetime
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Token with a lifetime of `seconds` from now, as reported by `expires_in`
    pub fn expires_in(token: String, seconds: i64) -> Self {
        Self::new(token, Some(Utc::now() + chrono::Duration::seconds(seconds)))
    }

    /// Usable lifetime left, after the expiry buffer
    pub fn remaining(&self) -> Option<chrono::Duration> {
        self.expires_at
            .map(|at| at - Utc::now() - chrono::Duration::seconds(EXPIRY_BUFFER_SECS))
    }

    /// Whether the token must be refreshed before use
    pub fn is_expired(&self) -> bool {
        self.remaining()
            .is_some_and(|left| left <= chrono::Duration::zero())
    }
}
