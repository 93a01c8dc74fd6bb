//! On-disk OAuth2 token cache
//!
//! Tokens are stored as a single JSON object using the common OAuth2 field
//! names (`access_token`, `token_type`, `refresh_token`, `expiry`).

use super::types::CachedToken;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Token as persisted in the cache file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl StoredToken {
    /// Convert into the in-memory cached form
    pub fn to_cached(&self) -> CachedToken {
        CachedToken::new(self.access_token.clone(), self.expiry)
    }
}

/// File-backed token cache
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Create a store for the given file path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached token, `None` if the file does not exist
    pub async fn load(&self) -> Result<Option<StoredToken>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };

        let token = serde_json::from_str(&contents).map_err(|e| {
            Error::auth(format!(
                "Failed to parse token cache {}: {e}",
                self.path.display()
            ))
        })?;
        Ok(Some(token))
    }

    /// Write the token to the cache file, replacing any previous contents
    pub async fn save(&self, token: &StoredToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(token)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await?;
        tokio::io::AsyncWriteExt::write_all(&mut file, &json).await?;
        tokio::io::AsyncWriteExt::flush(&mut file).await?;

        debug!("Saved token cache to {}", self.path.display());
        Ok(())
    }
}
