//! EPB API client.
//!
//! The client owns the login credentials and a single bearer-token slot.
//! Every data call fills the slot on demand; a `400` response carrying
//! `TOKEN_EXPIRED` clears it, logs in again and repeats the call once.

use std::fmt;

use epbmeter_core::{AccountLink, BillingPeriod, Credentials, Tariff, Tz, UsageReading};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{EpbError, HttpError};
use crate::host::http::HttpClient;
use crate::parser;

// ============================================================================
// Constants
// ============================================================================

/// EPB API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.epb.com";

/// Login endpoint.
const LOGIN_ENDPOINT: &str = "/web/api/v1/login/";

/// Account links endpoint.
const ACCOUNT_LINKS_ENDPOINT: &str = "/web/api/v1/account-links/";

/// Daily usage comparison endpoint.
const USAGE_ENDPOINT: &str = "/web/api/v1/usage/power/permanent/compare/daily";

/// Header carrying the session token.
const TOKEN_HEADER: &str = "x-user-token";

/// Body marker of an expired-token response.
const TOKEN_EXPIRED_MARKER: &str = "TOKEN_EXPIRED";

/// Grant type sent with the login request.
const GRANT_TYPE: &str = "PASSWORD";

// ============================================================================
// Options
// ============================================================================

/// Settings for an [`EpbClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Scheme and host of the API, without a trailing path.
    pub base_url: String,
    /// Zone sent with usage requests and used to pick the billing period.
    pub zone: Tz,
    /// Rate schedule for estimating cost when the API omits it.
    pub tariff: Tariff,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            zone: Tz::America__New_York,
            tariff: Tariff::default(),
        }
    }
}

impl ClientOptions {
    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the operating zone.
    #[must_use]
    pub fn with_zone(mut self, zone: Tz) -> Self {
        self.zone = zone;
        self
    }

    /// Sets the tariff.
    #[must_use]
    pub fn with_tariff(mut self, tariff: Tariff) -> Self {
        self.tariff = tariff;
        self
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    grant_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    tokens: Option<LoginTokens>,
}

#[derive(Debug, Deserialize)]
struct LoginTokens {
    #[serde(default)]
    access: Option<AccessToken>,
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    #[serde(default)]
    token: Option<String>,
}

impl LoginResponse {
    fn into_token(self) -> Option<String> {
        self.tokens?.access?.token.filter(|t| !t.is_empty())
    }
}

/// Body of a usage request.
#[derive(Debug, Clone, Serialize)]
struct UsageRequest<'a> {
    account_number: &'a str,
    gis_id: Option<&'a str>,
    zone_id: &'a str,
    usage_year: i32,
    usage_month: u32,
}

/// An authenticated call that can be repeated after re-login.
#[derive(Debug)]
enum ApiCall<'a> {
    AccountLinks,
    Usage(UsageRequest<'a>),
}

impl ApiCall<'_> {
    fn name(&self) -> &'static str {
        match self {
            Self::AccountLinks => "account-links",
            Self::Usage(_) => "usage",
        }
    }
}

/// Status and body of a completed response.
#[derive(Debug)]
struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    fn is_token_expired(&self) -> bool {
        self.status == StatusCode::BAD_REQUEST && self.body.contains(TOKEN_EXPIRED_MARKER)
    }

    fn into_success_body(self) -> Result<String, EpbError> {
        if self.status == StatusCode::OK {
            Ok(self.body)
        } else {
            Err(EpbError::status(self.status, self.body))
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// EPB API client.
///
/// Methods take `&self`; share one client behind an `Arc` to query several
/// accounts concurrently. Token refresh is serialized internally.
pub struct EpbClient {
    http: HttpClient,
    credentials: Credentials,
    options: ClientOptions,
    token: Mutex<Option<String>>,
}

impl fmt::Debug for EpbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpbClient")
            .field("base_url", &self.options.base_url)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl EpbClient {
    /// Creates a client with default options.
    pub fn new(credentials: Credentials, http: HttpClient) -> Self {
        Self::with_options(credentials, http, ClientOptions::default())
    }

    /// Creates a client with explicit options.
    pub fn with_options(credentials: Credentials, http: HttpClient, options: ClientOptions) -> Self {
        debug!(username = %credentials.username(), base_url = %options.base_url, "Initializing EPB API client");
        Self {
            http,
            credentials,
            options,
            token: Mutex::new(None),
        }
    }

    /// Returns the client options.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns true if a session token is currently held.
    pub async fn has_token(&self) -> bool {
        self.token.lock().await.is_some()
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.options.base_url, endpoint)
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Logs in and stores a fresh session token.
    ///
    /// On failure the token slot is left empty.
    ///
    /// # Errors
    ///
    /// `Auth` if the credentials are rejected or the response has no token,
    /// `Transport` on connection failure.
    pub async fn authenticate(&self) -> Result<(), EpbError> {
        let mut slot = self.token.lock().await;
        match self.login().await {
            Ok(token) => {
                *slot = Some(token);
                Ok(())
            }
            Err(e) => {
                *slot = None;
                Err(e)
            }
        }
    }

    #[instrument(skip(self), fields(username = %self.credentials.username()))]
    async fn login(&self) -> Result<String, EpbError> {
        let url = self.url(LOGIN_ENDPOINT);
        info!(url = %url, "Authenticating with EPB API");

        let request = LoginRequest {
            username: self.credentials.username(),
            password: self.credentials.password(),
            grant_type: GRANT_TYPE,
        };

        let response = self.http.post_json(&url, &request).await?;
        let status = response.status();
        let body = response.text().await.map_err(EpbError::Transport)?;
        debug!(status = %status, "Auth response received");

        if status != StatusCode::OK {
            return Err(EpbError::Auth(format!(
                "Authentication failed with status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token = serde_json::from_str::<LoginResponse>(&body)
            .ok()
            .and_then(LoginResponse::into_token)
            .ok_or_else(|| EpbError::Auth("No token in authentication response".to_string()))?;

        if HeaderValue::from_str(&token).is_err() {
            return Err(EpbError::Auth(
                "Malformed token in authentication response".to_string(),
            ));
        }

        info!("Successfully authenticated with EPB API");
        Ok(token)
    }

    /// Returns the stored token, logging in first if there is none.
    async fn ensure_token(&self) -> Result<String, EpbError> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }
        let token = self.login().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Clears the slot if it still holds `stale`.
    ///
    /// A concurrent caller may already have replaced it with a fresh token.
    async fn invalidate_token(&self, stale: &str) {
        let mut slot = self.token.lock().await;
        if slot.as_deref() == Some(stale) {
            *slot = None;
        }
    }

    // ========================================================================
    // Requests
    // ========================================================================

    async fn send(&self, call: &ApiCall<'_>, token: &str) -> Result<ApiResponse, EpbError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(token)
            .map_err(|_| HttpError::InvalidHeader(TOKEN_HEADER))?;
        headers.insert(HeaderName::from_static(TOKEN_HEADER), value);

        let response = match call {
            ApiCall::AccountLinks => {
                self.http
                    .get_with_headers(&self.url(ACCOUNT_LINKS_ENDPOINT), headers)
                    .await?
            }
            ApiCall::Usage(body) => {
                self.http
                    .post_json_with_headers(&self.url(USAGE_ENDPOINT), body, headers)
                    .await?
            }
        };

        let status = response.status();
        let body = response.text().await.map_err(EpbError::Transport)?;
        debug!(call = call.name(), status = %status, body = %body, "Response received");

        Ok(ApiResponse { status, body })
    }

    /// Sends `call` with the session token, re-authenticating once on expiry.
    ///
    /// A second expiry is returned as-is for the caller to reject.
    async fn send_authorized(&self, call: &ApiCall<'_>) -> Result<ApiResponse, EpbError> {
        let token = self.ensure_token().await?;
        let response = self.send(call, &token).await?;
        if !response.is_token_expired() {
            return Ok(response);
        }

        info!(call = call.name(), "Token expired, refreshing");
        self.invalidate_token(&token).await;
        let token = self.ensure_token().await?;

        let response = self.send(call, &token).await?;
        if response.is_token_expired() {
            warn!(call = call.name(), "Token rejected again after re-authentication");
        }
        Ok(response)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Lists the accounts linked to the user.
    ///
    /// # Errors
    ///
    /// `Auth` if login fails, `Api` on a non-200 response or a body that is
    /// not a list of account links, `Transport` on connection failure.
    #[instrument(skip(self))]
    pub async fn list_linked_accounts(&self) -> Result<Vec<AccountLink>, EpbError> {
        let body = self
            .send_authorized(&ApiCall::AccountLinks)
            .await?
            .into_success_body()?;

        let links: Vec<AccountLink> = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "Failed to parse account links response");
            EpbError::unexpected(format!("Invalid account links response: {e}"))
        })?;

        debug!(count = links.len(), "Fetched account links");
        Ok(links)
    }

    /// Fetches usage for the current billing period.
    ///
    /// See [`BillingPeriod::current`] for how the period is chosen.
    ///
    /// # Errors
    ///
    /// See [`EpbClient::get_usage_for_period`].
    pub async fn get_usage(
        &self,
        account_id: &str,
        gis_id: Option<&str>,
    ) -> Result<UsageReading, EpbError> {
        let period = BillingPeriod::current(self.options.zone);
        self.get_usage_for_period(account_id, gis_id, period).await
    }

    /// Fetches usage for an explicit billing period.
    ///
    /// Payloads without usable figures yield a zero reading rather than an
    /// error.
    ///
    /// # Errors
    ///
    /// `Auth` if login fails, `Api` on a non-200 response, `Transport` on
    /// connection failure.
    #[instrument(skip(self, period), fields(period = %period))]
    pub async fn get_usage_for_period(
        &self,
        account_id: &str,
        gis_id: Option<&str>,
        period: BillingPeriod,
    ) -> Result<UsageReading, EpbError> {
        let request = UsageRequest {
            account_number: account_id,
            gis_id,
            zone_id: self.options.zone.name(),
            usage_year: period.year,
            usage_month: period.month,
        };
        debug!(payload = ?request, "Fetching usage data");

        let body = self
            .send_authorized(&ApiCall::Usage(request))
            .await?
            .into_success_body()?;

        Ok(parser::extract_reading(&body, &self.options.tariff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ClientOptions::default();
        assert_eq!(options.base_url, DEFAULT_BASE_URL);
        assert_eq!(options.zone.name(), epbmeter_core::DEFAULT_ZONE_ID);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let options = ClientOptions::default().with_base_url("http://127.0.0.1:8080/");
        assert_eq!(options.base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_login_response_token() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"tokens":{"access":{"token":"abc"}}}"#).unwrap();
        assert_eq!(response.into_token().as_deref(), Some("abc"));

        let response: LoginResponse = serde_json::from_str(r#"{"tokens":{}}"#).unwrap();
        assert_eq!(response.into_token(), None);

        let response: LoginResponse =
            serde_json::from_str(r#"{"tokens":{"access":{"token":""}}}"#).unwrap();
        assert_eq!(response.into_token(), None);
    }

    #[test]
    fn test_usage_request_serializes_null_gis_id() {
        let request = UsageRequest {
            account_number: "123",
            gis_id: None,
            zone_id: "America/New_York",
            usage_year: 2024,
            usage_month: 12,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "account_number": "123",
                "gis_id": null,
                "zone_id": "America/New_York",
                "usage_year": 2024,
                "usage_month": 12
            })
        );
    }

    #[test]
    fn test_token_expired_detection() {
        let expired = ApiResponse {
            status: StatusCode::BAD_REQUEST,
            body: r#"{"error":"TOKEN_EXPIRED"}"#.to_string(),
        };
        assert!(expired.is_token_expired());

        let other_400 = ApiResponse {
            status: StatusCode::BAD_REQUEST,
            body: "bad request".to_string(),
        };
        assert!(!other_400.is_token_expired());

        let wrong_status = ApiResponse {
            status: StatusCode::UNAUTHORIZED,
            body: "TOKEN_EXPIRED".to_string(),
        };
        assert!(!wrong_status.is_token_expired());
    }
}
