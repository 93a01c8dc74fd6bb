//! Authentication module
//!
//! Supports: static Bearer tokens, the OAuth2 refresh-token flow, and the
//! one-off authorization-code grant that obtains the first refresh token
//!
//! The `Authenticator` applies credentials to outgoing requests and manages
//! token refresh. Refreshed tokens can be persisted through a `TokenStore`
//! so later runs reuse them.

mod authenticator;
mod authorize;
mod store;
mod types;

pub use authenticator::Authenticator;
pub use authorize::AuthorizationFlow;
pub use store::{StoredToken, TokenStore};
pub use types::{AuthConfig, CachedToken};
