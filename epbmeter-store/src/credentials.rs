//! Credential lookup.
//!
//! Credentials come from `EPB_USERNAME` / `EPB_PASSWORD` when both are set,
//! otherwise from the system keychain under `epbmeter:epb`.

use std::fmt;
use std::sync::Arc;

use epbmeter_core::Credentials;
use epbmeter_fetch::KeychainApi;
use epbmeter_fetch::SystemKeychain;
use epbmeter_fetch::host::keychain::{accounts, services};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::StoreError;

/// Environment variable holding the portal username.
pub const USERNAME_ENV: &str = "EPB_USERNAME";

/// Environment variable holding the portal password.
pub const PASSWORD_ENV: &str = "EPB_PASSWORD";

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Where a set of credentials was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    /// Process environment.
    Env,
    /// System keychain.
    Keychain,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env => write!(f, "environment"),
            Self::Keychain => write!(f, "keychain"),
        }
    }
}

/// Loads, saves and clears EPB credentials.
#[derive(Clone)]
pub struct CredentialStore {
    keychain: Arc<dyn KeychainApi>,
    env: EnvLookup,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::system()
    }
}

impl CredentialStore {
    /// Creates a store over the given keychain, reading the process environment.
    pub fn new(keychain: Arc<dyn KeychainApi>) -> Self {
        Self {
            keychain,
            env: Arc::new(|key| std::env::var(key).ok()),
        }
    }

    /// Creates a store over the system keychain.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemKeychain::new()))
    }

    /// Replaces the environment lookup.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    fn env_var(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|v| !v.is_empty())
    }

    /// Returns the first complete set of credentials and where it came from.
    pub async fn load(&self) -> Result<Option<(Credentials, CredentialSource)>, StoreError> {
        if let (Some(username), Some(password)) =
            (self.env_var(USERNAME_ENV), self.env_var(PASSWORD_ENV))
        {
            debug!("Using credentials from environment");
            return Ok(Some((
                Credentials::new(username, password),
                CredentialSource::Env,
            )));
        }

        let username = self.keychain.get(services::EPB, accounts::USERNAME).await?;
        let password = self.keychain.get(services::EPB, accounts::PASSWORD).await?;

        match (username, password) {
            (Some(username), Some(password)) => {
                debug!("Using credentials from keychain");
                Ok(Some((
                    Credentials::new(username, password),
                    CredentialSource::Keychain,
                )))
            }
            _ => Ok(None),
        }
    }

    /// Like [`CredentialStore::load`], but missing credentials are an error.
    pub async fn require(&self) -> Result<Credentials, StoreError> {
        self.load()
            .await?
            .map(|(credentials, _)| credentials)
            .ok_or(StoreError::CredentialsMissing)
    }

    /// Stores credentials in the keychain.
    pub async fn save(&self, credentials: &Credentials) -> Result<(), StoreError> {
        if credentials.is_incomplete() {
            return Err(StoreError::Config(
                "username and password must not be empty".to_string(),
            ));
        }
        self.keychain
            .set(services::EPB, accounts::USERNAME, credentials.username())
            .await?;
        self.keychain
            .set(services::EPB, accounts::PASSWORD, credentials.password())
            .await?;
        info!(username = %credentials.username(), "Saved credentials to keychain");
        Ok(())
    }

    /// Removes stored credentials from the keychain.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.keychain.delete(services::EPB, accounts::USERNAME).await?;
        self.keychain.delete(services::EPB, accounts::PASSWORD).await?;
        info!("Removed credentials from keychain");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use epbmeter_fetch::KeychainError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryKeychain {
        entries: Mutex<HashMap<(String, String), String>>,
    }

    #[async_trait]
    impl KeychainApi for MemoryKeychain {
        async fn get(&self, service: &str, account: &str) -> Result<Option<String>, KeychainError> {
            let entries = self.entries.lock().unwrap();
            Ok(entries.get(&(service.to_string(), account.to_string())).cloned())
        }

        async fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), KeychainError> {
            self.entries
                .lock()
                .unwrap()
                .insert((service.to_string(), account.to_string()), secret.to_string());
            Ok(())
        }

        async fn delete(&self, service: &str, account: &str) -> Result<(), KeychainError> {
            self.entries
                .lock()
                .unwrap()
                .remove(&(service.to_string(), account.to_string()));
            Ok(())
        }
    }

    fn store(env: &'static [(&'static str, &'static str)]) -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryKeychain::default())).with_env(move |key| {
            env.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        })
    }

    #[tokio::test]
    async fn test_empty_store_has_no_credentials() {
        let store = store(&[]);
        assert!(store.load().await.unwrap().is_none());
        assert!(matches!(store.require().await, Err(StoreError::CredentialsMissing)));
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = store(&[]);
        store.save(&Credentials::new("alice", "s3cret")).await.unwrap();

        let (credentials, source) = store.load().await.unwrap().unwrap();
        assert_eq!(credentials, Credentials::new("alice", "s3cret"));
        assert_eq!(source, CredentialSource::Keychain);

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_env_takes_priority() {
        let store = store(&[(USERNAME_ENV, "env_user"), (PASSWORD_ENV, "env_pass")]);
        store.save(&Credentials::new("alice", "s3cret")).await.unwrap();

        let (credentials, source) = store.load().await.unwrap().unwrap();
        assert_eq!(credentials.username(), "env_user");
        assert_eq!(source, CredentialSource::Env);
    }

    #[tokio::test]
    async fn test_partial_env_falls_back_to_keychain() {
        let store = store(&[(USERNAME_ENV, "env_user"), (PASSWORD_ENV, "")]);
        store.save(&Credentials::new("alice", "s3cret")).await.unwrap();

        let credentials = store.require().await.unwrap();
        assert_eq!(credentials.username(), "alice");
    }

    #[tokio::test]
    async fn test_rejects_incomplete_credentials() {
        let store = store(&[]);
        assert!(store.save(&Credentials::new("alice", "")).await.is_err());
    }
}
