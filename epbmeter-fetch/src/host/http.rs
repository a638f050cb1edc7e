//! HTTP client with tracing and domain allowlist.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing
//! - Domain allowlist for security
//! - JSON and custom-header convenience methods
//!
//! The wrapper is a cheap handle around a pooled [`reqwest::Client`]. A host
//! that already owns a client can share it through [`HttpClient::from_client`].

use reqwest::{header::HeaderMap, Client, Response};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::HttpError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for EPBMeter.
const USER_AGENT: &str = concat!("EPBMeter/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self::from_client(client))
    }

    /// Wraps an existing client. Its timeout and pool are used as-is.
    pub fn from_client(client: Client) -> Self {
        Self {
            inner: client,
            allowed_domains: None,
        }
    }

    /// Restricts requests to the given domains and their subdomains.
    #[must_use]
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &str) -> Result<(), HttpError> {
        let Some(ref allowed) = self.allowed_domains else {
            return Ok(()); // No restrictions
        };

        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    /// Performs a GET request with custom headers.
    #[instrument(skip(self, headers), fields(url = %url))]
    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("GET request with headers");

        let response = self.inner.get(url).headers(headers).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a POST request with JSON body.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<Response, HttpError> {
        self.post_json_with_headers(url, body, HeaderMap::new()).await
    }

    /// Performs a POST request with JSON body and custom headers.
    #[instrument(skip(self, body, headers), fields(url = %url))]
    pub async fn post_json_with_headers<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: HeaderMap,
    ) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("POST request with JSON");

        let response = self
            .inner
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Returns the inner reqwest client for advanced operations.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_allowlist() {
        let client = HttpClient::from_client(Client::new())
            .with_allowed_domains(vec!["epb.com".to_string()]);

        // Allowed domain and subdomain
        assert!(client.is_domain_allowed("https://epb.com/").is_ok());
        assert!(client.is_domain_allowed("https://api.epb.com/web/api/v1/login/").is_ok());

        // Not allowed
        assert!(client.is_domain_allowed("https://evil.com/steal").is_err());
        assert!(client.is_domain_allowed("https://notepb.com/").is_err());
    }

    #[test]
    fn test_no_domain_restrictions() {
        let client = HttpClient::from_client(Client::new());

        // All domains allowed when no restrictions
        assert!(client.is_domain_allowed("https://any.domain.com").is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let client = HttpClient::from_client(Client::new())
            .with_allowed_domains(vec!["epb.com".to_string()]);

        assert!(matches!(
            client.is_domain_allowed("not-a-valid-url"),
            Err(HttpError::InvalidUrl(_))
        ));
    }
}
