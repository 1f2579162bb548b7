//! Token authority clients
//!
//! Services that need tokens talk to the authority through `TokenClient`,
//! either in-process or over HTTP.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::jwt::{Operation, TokenError, VerifiedToken};
use super::TokenAuthority;
use crate::error::ErrorResponse;
use crate::models::{
    GenerateLinkRequest, GenerateTokenRequest, LinkResponse, TokenResponse, ValidateTokenRequest,
};

/// Remote-capable view of the token authority
#[async_trait]
pub trait TokenClient: Send + Sync {
    async fn generate_token(&self, subject: Uuid, operation: Operation)
        -> Result<String, TokenError>;

    async fn validate_token(&self, token: &str) -> Result<VerifiedToken, TokenError>;

    async fn generate_link(
        &self,
        base: &str,
        subject: Uuid,
        operation: Operation,
    ) -> Result<String, TokenError>;
}

/// Bound a call into the token authority; expiry surfaces as `Unavailable`
pub async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, TokenError>
where
    F: std::future::Future<Output = Result<T, TokenError>>,
{
    tokio::time::timeout(timeout, call).await.map_err(|_| {
        TokenError::Unavailable(format!(
            "no response from token authority within {}ms",
            timeout.as_millis()
        ))
    })?
}

/// Calls the authority directly in the current process
#[derive(Clone, Debug)]
pub struct LocalTokenClient {
    authority: TokenAuthority,
}

impl LocalTokenClient {
    pub fn new(authority: TokenAuthority) -> Self {
        Self { authority }
    }
}

#[async_trait]
impl TokenClient for LocalTokenClient {
    async fn generate_token(
        &self,
        subject: Uuid,
        operation: Operation,
    ) -> Result<String, TokenError> {
        self.authority.issue(subject, operation)
    }

    async fn validate_token(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.authority.validate(token)
    }

    async fn generate_link(
        &self,
        base: &str,
        subject: Uuid,
        operation: Operation,
    ) -> Result<String, TokenError> {
        self.authority.issue_link(base, subject, operation)
    }
}

/// Calls a token authority exposed by another instance of this service
#[derive(Clone, Debug)]
pub struct HttpTokenClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpTokenClient {
    /// Create a client whose every request is bounded by `timeout`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TokenError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TokenError::Internal(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, TokenError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "Token authority request failed");
                TokenError::Unavailable(e.to_string())
            })?;

        if response.status().is_success() {
            return response
                .json::<R>()
                .await
                .map_err(|e| TokenError::Internal(format!("Invalid response body: {}", e)));
        }

        let status = response.status();
        let body: ErrorResponse = response.json().await.map_err(|e| {
            TokenError::Internal(format!("Unexpected {} response: {}", status, e))
        })?;

        Err(error_from_code(&body.error.code, body.error.message))
    }
}

/// Rebuild the authority's error from its wire code
fn error_from_code(code: &str, message: String) -> TokenError {
    match code {
        "INVALID_OPERATION" => {
            TokenError::InvalidOperation(detail(message, "Invalid operation type: "))
        }
        "INVALID_SIGNATURE" => TokenError::InvalidSignature,
        "TOKEN_EXPIRED" => TokenError::Expired,
        "MALFORMED_TOKEN" => TokenError::Malformed(detail(message, "Malformed token: ")),
        "SERVICE_UNAVAILABLE" => TokenError::Unavailable(message),
        _ => TokenError::Internal(message),
    }
}

/// Drop the label the authority already put in front of the detail
fn detail(message: String, label: &str) -> String {
    match message.strip_prefix(label) {
        Some(rest) => rest.to_string(),
        None => message,
    }
}

#[async_trait]
impl TokenClient for HttpTokenClient {
    async fn generate_token(
        &self,
        subject: Uuid,
        operation: Operation,
    ) -> Result<String, TokenError> {
        let request = GenerateTokenRequest {
            subject,
            operation: operation.as_str().to_string(),
        };
        let response: TokenResponse = self.post("/token/generate", &request).await?;
        Ok(response.token)
    }

    async fn validate_token(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let request = ValidateTokenRequest {
            token: token.to_string(),
        };
        self.post("/token/validate", &request).await
    }

    async fn generate_link(
        &self,
        base: &str,
        subject: Uuid,
        operation: Operation,
    ) -> Result<String, TokenError> {
        let request = GenerateLinkRequest {
            base: base.to_string(),
            subject,
            operation: operation.as_str().to_string(),
        };
        let response: LinkResponse = self.post("/token/link", &request).await?;
        Ok(response.link)
    }
}
