//! Credential application and OAuth2 refresh
//!
//! Concurrent dispatch units share one [`Authenticator`]. The first unit to
//! find the access token missing or expired performs the refresh while the
//! others wait on the same lock and then reuse its result.

use super::store::StoredToken;
use super::types::{AuthConfig, CachedToken};
use crate::error::{Error, Result};
use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Access token in use plus the refresh token that renews it
#[derive(Default)]
struct Session {
    access: Option<CachedToken>,
    refresh: Option<String>,
}

impl Session {
    fn live_token(&self) -> Option<String> {
        self.access
            .as_ref()
            .filter(|token| !token.is_expired())
            .map(|token| token.token.clone())
    }
}

#[derive(Clone)]
pub struct Authenticator {
    config: AuthConfig,
    session: Arc<RwLock<Session>>,
    client: Client,
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Use `client` for token endpoint calls
    pub fn with_client(config: AuthConfig, client: Client) -> Self {
        let refresh = match &config {
            AuthConfig::Oauth2Refresh { refresh_token, .. } => refresh_token.clone(),
            AuthConfig::None | AuthConfig::Bearer { .. } => None,
        };
        Self {
            config,
            session: Arc::new(RwLock::new(Session {
                access: None,
                refresh,
            })),
            client,
        }
    }

    /// Attach credentials to `req`, refreshing the access token first if needed
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match &self.config {
            AuthConfig::None => req,
            AuthConfig::Bearer { token } => req.bearer_auth(token),
            AuthConfig::Oauth2Refresh { .. } => req.bearer_auth(self.access_token().await?),
        })
    }

    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.session.read().await.live_token() {
            return Ok(token);
        }

        let mut session = self.session.write().await;
        // a unit queued on the write lock may find the work already done
        if let Some(token) = session.live_token() {
            return Ok(token);
        }

        let fresh = self.renew(&mut session).await?;
        let token = fresh.token.clone();
        session.access = Some(fresh);
        Ok(token)
    }

    /// Reuse an unexpired token from the store, otherwise exchange the
    /// refresh token and persist what comes back
    async fn renew(&self, session: &mut Session) -> Result<CachedToken> {
        let AuthConfig::Oauth2Refresh {
            token_url,
            client_id,
            client_secret,
            store,
            ..
        } = &self.config
        else {
            return Err(Error::auth("credentials of this kind cannot be refreshed"));
        };

        if let Some(store) = store {
            if let Some(saved) = store.load().await? {
                // the store is written on every rotation, so it is never
                // older than the configured token
                if saved.refresh_token.is_some() {
                    session.refresh = saved.refresh_token.clone();
                }
                let cached = saved.to_cached();
                if !cached.is_expired() {
                    debug!("Reusing stored token from {}", store.path().display());
                    return Ok(cached);
                }
            }
        }

        let refresh = session.refresh.clone().ok_or_else(|| {
            Error::auth("No refresh token available; authorize the application first")
        })?;

        let form = [("grant_type", "refresh_token"), ("refresh_token", refresh.as_str())];
        let grant =
            request_grant(&self.client, token_url, client_id, client_secret, &form).await?;
        let saved = grant.into_stored(Some(refresh));
        info!(
            "Obtained new access token (refresh token rotated: {})",
            saved.refresh_token != session.refresh
        );
        session.refresh = saved.refresh_token.clone();

        if let Some(store) = store {
            store.save(&saved).await?;
        }
        Ok(saved.to_cached())
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.config {
            AuthConfig::None => "none",
            AuthConfig::Bearer { .. } => "bearer",
            AuthConfig::Oauth2Refresh { .. } => "oauth2_refresh",
        };
        f.debug_struct("Authenticator").field("kind", &kind).finish()
    }
}

/// POST a grant to the token endpoint. The client id and secret go in the
/// Basic header.
pub(super) async fn request_grant(
    client: &Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    form: &[(&str, &str)],
) -> Result<TokenGrant> {
    let response = client
        .post(token_url)
        .basic_auth(client_id, Some(client_secret))
        .form(form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::TokenRefresh {
            message: format!("status {}: {body}", status.as_u16()),
        });
    }

    response.json().await.map_err(|e| Error::TokenRefresh {
        message: format!("unreadable token response: {e}"),
    })
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenGrant {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Present only when the server issues or rotates a refresh token
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenGrant {
    /// Keep `previous_refresh` unless the grant carries a new one
    pub(super) fn into_stored(self, previous_refresh: Option<String>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            refresh_token: self.refresh_token.or(previous_refresh),
            expiry: self
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        }
    }
}
