//! Keyring-based storage for the streaming-service token

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::{debug, info};

use super::prompt;
use crate::yandex::YandexMusicClient;

const KEYRING_SERVICE: &str = "tunesort";
const TOKEN_ENTRY: &str = "yandex:token";

/// Manages the OAuth token
pub struct AuthManager;

impl AuthManager {
    /// Configure a token for later runs
    ///
    /// Reuses the stored token unless `force` is set, otherwise prompts,
    /// verifies the new token against the API, and stores it.
    pub async fn authenticate(token: Option<String>, force: bool, cover_size: &str) -> Result<String> {
        if !force && token.is_none() {
            if let Ok(token) = Self::load() {
                info!("Found existing token in keyring");
                return Ok(token);
            }
        } else if force {
            debug!("Force flag set, ignoring stored token");
        }

        let token = match token {
            Some(token) => token,
            None => prompt::password("Yandex Music OAuth token").await?,
        };
        let token = token.trim().to_string();
        if token.is_empty() {
            anyhow::bail!("Token cannot be empty");
        }

        Self::verify(&token, cover_size).await?;
        Self::store(&token)?;
        info!("Token stored in keyring");

        Ok(token)
    }

    /// Token for a single run: flag/env, then keyring, then a prompt
    pub async fn resolve(token: Option<String>) -> Result<String> {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            debug!("Using token from command line or environment");
            return Ok(token.trim().to_string());
        }

        if let Ok(token) = Self::load() {
            debug!("Using token from keyring");
            return Ok(token);
        }

        let token = prompt::password("Yandex Music OAuth token").await?;
        let token = token.trim().to_string();
        if token.is_empty() {
            anyhow::bail!("No token available. Run 'tunesort auth' or pass --token.");
        }
        Ok(token)
    }

    /// Load the token from the keyring
    pub fn load() -> Result<String> {
        Self::entry()?
            .get_password()
            .context("No Yandex Music token in keyring")
    }

    /// Store the token in the keyring
    pub fn store(token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .context("Failed to store token in keyring")?;
        debug!("Token stored in keyring");
        Ok(())
    }

    /// Verify a token by asking for the account status
    async fn verify(token: &str, cover_size: &str) -> Result<()> {
        debug!("Verifying token");

        let client = YandexMusicClient::new(token, cover_size)?;
        let status = client
            .account_status()
            .await
            .context("Failed to verify token")?;

        if status.account.uid.is_none() {
            anyhow::bail!("Token was accepted but is not linked to an account");
        }

        info!(
            "Token verified for {}",
            status.account.login.as_deref().unwrap_or("unknown login")
        );
        Ok(())
    }

    fn entry() -> Result<Entry> {
        Entry::new(KEYRING_SERVICE, TOKEN_ENTRY).context("Failed to access keyring")
    }
}
