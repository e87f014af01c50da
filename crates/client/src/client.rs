//! Authenticated API client with silent token refresh
//!
//! The client decorates every outgoing request with bearer authorization
//! from the persisted token pair. A 401 triggers at most one refresh of the
//! access token followed by a single retry; if the response is still 401
//! the tokens are dropped and the navigator is sent to the login page.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use taskdeck_core::{
    MemoryTokenStore, Navigator, NullNavigator, TokenPair, TokenStore, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};

use crate::error::ClientError;
use crate::types::{ApiEnvelope, RefreshData};

/// Page unrecoverable auth failures redirect to
const LOGIN_PATH: &str = "/login";

/// Endpoint exchanging a refresh token for a new access token
const REFRESH_ENDPOINT: &str = "/auth/refresh-token";

/// Caller-controlled parts of a single [`ApiClient::request`] call
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Attach a JSON-serialized body
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }

    /// Set a header; takes precedence over the client's auth headers
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// One logical request in flight, carrying its single-retry budget.
/// The retry flag is per call, never shared, so concurrent requests do
/// not consume each other's budget.
struct PendingRequest {
    url: String,
    method: Method,
    headers: HeaderMap,
    body: Option<String>,
    is_retry: bool,
}

/// Taskdeck API client
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: Arc<RwLock<TokenPair>>,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Snapshot of the current token pair
    pub fn current_tokens(&self) -> TokenPair {
        self.tokens
            .read()
            .expect("failed to acquire token lock")
            .clone()
    }

    /// Update whichever tokens are provided, leaving the other untouched,
    /// and write through to the persistent store
    pub fn set_tokens(&self, access: Option<&str>, refresh: Option<&str>) {
        if let Some(access) = access {
            self.store.set(ACCESS_TOKEN_KEY, access);
        }
        if let Some(refresh) = refresh {
            self.store.set(REFRESH_TOKEN_KEY, refresh);
        }

        let mut tokens = self.tokens.write().expect("failed to acquire token lock");
        *tokens = tokens.updated(access, refresh);
    }

    /// Remove both tokens from memory and the persistent store. Idempotent.
    pub fn clear_tokens(&self) {
        self.store.remove(ACCESS_TOKEN_KEY);
        self.store.remove(REFRESH_TOKEN_KEY);

        let mut tokens = self.tokens.write().expect("failed to acquire token lock");
        *tokens = TokenPair::default();
    }

    /// Default headers for an API call: JSON content type plus bearer
    /// authorization when an access token is held
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(access) = self.current_tokens().access {
            match HeaderValue::from_str(&format!("Bearer {access}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("stored access token is not a valid header value"),
            }
        }

        headers
    }

    fn resolve_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.base_url, endpoint)
        }
    }

    /// Issue a request with authorization, refresh-and-retry, and
    /// redirect-on-auth-failure handling
    ///
    /// Non-401 responses are returned unaltered; interpreting the body is
    /// the caller's job (see [`handle_response`]). Network errors are
    /// logged and re-raised.
    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Response, ClientError> {
        // caller-supplied headers win over the auth defaults
        let mut headers = self.auth_headers();
        for (name, value) in options.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        let pending = PendingRequest {
            url: self.resolve_url(endpoint),
            method: options.method,
            headers,
            body: options.body,
            is_retry: false,
        };

        let mut response = self.send(&pending).await?;

        if response.status() == StatusCode::UNAUTHORIZED
            && self.current_tokens().refresh.is_some()
            && !pending.is_retry
            && self.refresh_access_token().await
        {
            let mut retried = pending;
            if let Some(access) = self.current_tokens().access {
                if let Ok(value) = HeaderValue::from_str(&format!("Bearer {access}")) {
                    retried.headers.insert(AUTHORIZATION, value);
                }
            }
            retried.is_retry = true;

            debug!(url = %retried.url, "retrying request with refreshed access token");
            response = self.send(&retried).await?;
        }

        // still 401 after the refresh attempt, or no refresh token at all
        if response.status() == StatusCode::UNAUTHORIZED {
            self.clear_tokens();

            if self.navigator.current_path() != LOGIN_PATH {
                self.navigator.redirect(LOGIN_PATH);
                return Err(ClientError::AuthenticationFailed(
                    "Unauthorized. Please log in again.".to_string(),
                ));
            }
            // already on the login page; redirecting again would loop
            return Err(ClientError::AuthenticationFailed(
                "Invalid email or password.".to_string(),
            ));
        }

        Ok(response)
    }

    async fn send(&self, pending: &PendingRequest) -> Result<Response, ClientError> {
        let mut request = self
            .http
            .request(pending.method.clone(), &pending.url)
            .headers(pending.headers.clone());

        if let Some(body) = &pending.body {
            request = request.body(body.clone());
        }

        request.send().await.map_err(|err| {
            error!(url = %pending.url, error = %err, "request failed");
            ClientError::from(err)
        })
    }

    /// Exchange the refresh token for a new access token
    ///
    /// Goes straight through the raw HTTP client: the refresh protocol must
    /// never re-enter [`ApiClient::request`] and trigger its own retry.
    /// Failures are handled locally (tokens cleared, navigator sent to the
    /// login page) and reported only as `false`.
    pub async fn refresh_access_token(&self) -> bool {
        let Some(refresh) = self.current_tokens().refresh else {
            return false;
        };

        debug!("access token rejected, attempting refresh");

        let result = self
            .http
            .post(self.resolve_url(REFRESH_ENDPOINT))
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {refresh}"))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<ApiEnvelope<RefreshData>>().await {
                    Ok(envelope) => {
                        self.set_tokens(Some(&envelope.data.access_token), None);
                        debug!("access token refreshed");
                        true
                    }
                    Err(err) => {
                        warn!(error = %err, "token refresh returned a malformed body");
                        self.fail_refresh()
                    }
                }
            }
            Ok(response) => {
                warn!(status = %response.status(), "token refresh rejected");
                self.fail_refresh()
            }
            Err(err) => {
                error!(error = %err, "token refresh failed");
                self.fail_refresh()
            }
        }
    }

    fn fail_refresh(&self) -> bool {
        self.clear_tokens();
        if self.navigator.current_path() != LOGIN_PATH {
            self.navigator.redirect(LOGIN_PATH);
        }
        false
    }

    pub async fn get(&self, endpoint: &str) -> Result<Response, ClientError> {
        self.request(endpoint, RequestOptions::new(Method::GET)).await
    }

    pub async fn post<T: Serialize>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<Response, ClientError> {
        self.request(endpoint, RequestOptions::new(Method::POST).json(body)?)
            .await
    }

    pub async fn put<T: Serialize>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<Response, ClientError> {
        self.request(endpoint, RequestOptions::new(Method::PUT).json(body)?)
            .await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Response, ClientError> {
        self.request(endpoint, RequestOptions::new(Method::DELETE))
            .await
    }
}

/// Interpret a response: deserialize the JSON body on success, otherwise
/// surface the server's `detail`/`message` error text, falling back to a
/// fixed per-status message
pub async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from_response(status, response).await);
    }
    Ok(response.json().await?)
}

/// Like [`handle_response`] for endpoints whose success body carries
/// nothing the caller needs (deletions)
pub async fn handle_empty_response(response: Response) -> Result<(), ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from_response(status, response).await);
    }
    Ok(())
}

async fn error_from_response(status: StatusCode, response: Response) -> ClientError {
    let message = match response.json::<serde_json::Value>().await {
        Ok(body) => {
            extract_error_message(&body).unwrap_or_else(|| ClientError::status_message(status))
        }
        Err(_) => ClientError::status_message(status),
    };
    ClientError::from_status(status, message)
}

/// Servers report errors under `detail` or `message`, in that order
fn extract_error_message(body: &serde_json::Value) -> Option<String> {
    body.get("detail")
        .or_else(|| body.get("message"))
        .and_then(|value| value.as_str())
        .map(str::to_owned)
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    store: Option<Arc<dyn TokenStore>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl ApiClientBuilder {
    /// Set the base URL (required)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Persist tokens through this store instead of the in-memory default
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Route auth-failure redirects through this navigator
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Build the client; picks up tokens already held by the store
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }
        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| "taskdeck-client/0.1.0".to_string()),
        );
        let http = client_builder.build()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));
        let navigator = self.navigator.unwrap_or_else(|| Arc::new(NullNavigator));
        let tokens = TokenPair::load(store.as_ref());

        Ok(ApiClient {
            http,
            base_url,
            tokens: Arc::new(RwLock::new(tokens)),
            store,
            navigator,
        })
    }
}
