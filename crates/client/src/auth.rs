//! Authentication API client methods

use tracing::info;

use crate::client::{handle_response, ApiClient};
use crate::error::ClientError;
use crate::types::{ApiEnvelope, LoginRequest, MessageResponse, RegisterRequest, TokenGrant};

impl ApiClient {
    /// Log in and persist the issued token pair
    pub async fn login(&self, request: &LoginRequest) -> Result<TokenGrant, ClientError> {
        let response = self.post("/users/login", request).await?;
        let envelope: ApiEnvelope<TokenGrant> = handle_response(response).await?;

        let grant = envelope.data;
        self.set_tokens(Some(&grant.access_token), Some(&grant.refresh_token));
        info!("login succeeded, tokens stored");
        Ok(grant)
    }

    /// Register a new account; returns the server's confirmation message
    pub async fn register(&self, request: &RegisterRequest) -> Result<String, ClientError> {
        let response = self.post("/users/register", request).await?;
        let body: MessageResponse = handle_response(response).await?;
        Ok(body.message)
    }

    /// Drop the stored credentials; subsequent requests go out anonymous
    pub fn logout(&self) {
        self.clear_tokens();
    }
}
