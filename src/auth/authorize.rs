//! First-run authorization
//!
//! The refresh flow needs a refresh token to start from. This module builds
//! the consent URL the user opens in a browser, then trades the code the
//! server redirects back with for the first token pair.

use super::authenticator::request_grant;
use super::store::StoredToken;
use crate::error::{Error, Result};
use reqwest::Client;
use tracing::info;
use url::Url;

/// Settings for the `authorization_code` grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationFlow {
    /// Consent page the user is sent to
    pub authorize_url: String,
    /// Endpoint that exchanges the code
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Registered redirect target, echoed back on the exchange
    pub redirect_url: String,
    /// Space-separated scopes
    pub scope: String,
}

impl AuthorizationFlow {
    /// Consent URL asking for offline access so a refresh token is issued
    pub fn consent_url(&self, state: &str) -> Result<String> {
        let mut url = Url::parse(&self.authorize_url)
            .map_err(|e| Error::invalid_value("auth.authorize_url", e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("access_type", "offline")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scope)
            .append_pair("state", state);
        Ok(url.into())
    }

    /// Trade an authorization code for a token pair
    pub async fn exchange(&self, client: &Client, code: &str) -> Result<StoredToken> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::auth("authorization code is empty"));
        }

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_url.as_str()),
        ];
        let grant = request_grant(
            client,
            &self.token_url,
            &self.client_id,
            &self.client_secret,
            &form,
        )
        .await?;

        let token = grant.into_stored(None);
        if token.refresh_token.is_none() {
            return Err(Error::auth(
                "token endpoint issued no refresh token; offline access was not granted",
            ));
        }
        info!("Authorization code exchanged for a new token pair");
        Ok(token)
    }
}
