//! Credential providers for token-based model endpoints.
//!
//! The three transport configurations (direct API key, managed-identity
//! token, chained credential) share one `CredentialProvider` interface so
//! client construction never branches on provider internals.

use async_trait::async_trait;
use mnemo_abstraction::ModelError;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

/// A source of bearer tokens for authenticated model endpoints.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns a bearer token suitable for an `Authorization` header.
    ///
    /// # Errors
    /// Returns `ModelError::AuthError` if no token could be obtained.
    async fn bearer_token(&self) -> Result<String, ModelError>;

    /// Human-readable name used in logs and chained-failure messages.
    fn name(&self) -> &str;
}

/// Static credential wrapping a pre-issued API key or token.
#[derive(Debug, Clone)]
pub struct ApiKeyCredential {
    key: String,
}

impl ApiKeyCredential {
    /// Creates a credential from an explicit key.
    #[must_use]
    pub fn new(key: String) -> Self {
        Self { key }
    }
}

#[async_trait]
impl CredentialProvider for ApiKeyCredential {
    async fn bearer_token(&self) -> Result<String, ModelError> {
        if self.key.is_empty() {
            return Err(ModelError::AuthError("API key is empty".to_string()));
        }
        Ok(self.key.clone())
    }

    fn name(&self) -> &str {
        "api_key"
    }
}

/// Managed-identity credential that fetches tokens from an instance
/// metadata endpoint.
#[derive(Debug, Clone)]
pub struct ManagedIdentityCredential {
    /// Token endpoint URL, including the resource/scope query.
    token_url: String,
    client: Client,
}

/// Default instance-metadata token endpoint.
const DEFAULT_IMDS_TOKEN_URL: &str =
    "http://169.254.169.254/metadata/identity/oauth2/token?api-version=2018-02-01&resource=https://cognitiveservices.azure.com/";

impl ManagedIdentityCredential {
    /// Creates a credential against the default instance-metadata endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_token_url(DEFAULT_IMDS_TOKEN_URL.to_string())
    }

    /// Creates a credential against an explicit token endpoint.
    #[must_use]
    pub fn with_token_url(token_url: String) -> Self {
        Self { token_url, client: Client::new() }
    }
}

impl Default for ManagedIdentityCredential {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[async_trait]
impl CredentialProvider for ManagedIdentityCredential {
    async fn bearer_token(&self) -> Result<String, ModelError> {
        debug!(url = %self.token_url, "Requesting managed identity token");

        let response = self
            .client
            .get(&self.token_url)
            .header("Metadata", "true")
            .send()
            .await
            .map_err(|e| ModelError::AuthError(format!("Token endpoint unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ModelError::AuthError(format!("Token endpoint returned {}", status)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ModelError::AuthError(format!("Malformed token response: {}", e)))?;

        Ok(token.access_token)
    }

    fn name(&self) -> &str {
        "managed_identity"
    }
}

/// Ordered fallback chain over credential providers.
///
/// Providers are tried in order; the first token obtained wins. The chain
/// fails only when every provider has failed.
pub struct ChainedCredential {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl ChainedCredential {
    /// Creates a chain from the given providers.
    #[must_use]
    pub fn new(providers: Vec<Box<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl CredentialProvider for ChainedCredential {
    async fn bearer_token(&self) -> Result<String, ModelError> {
        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.bearer_token().await {
                Ok(token) => {
                    debug!(provider = provider.name(), "Chained credential resolved");
                    return Ok(token);
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Credential in chain failed");
                    failures.push(format!("{}: {}", provider.name(), e));
                }
            }
        }
        Err(ModelError::AuthError(format!(
            "All credentials in chain failed: [{}]",
            failures.join("; ")
        )))
    }

    fn name(&self) -> &str {
        "chained"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_key_credential_returns_key() {
        let cred = ApiKeyCredential::new("sk-test".to_string());
        assert_eq!(cred.bearer_token().await.unwrap(), "sk-test");
    }

    #[tokio::test]
    async fn test_api_key_credential_rejects_empty_key() {
        let cred = ApiKeyCredential::new(String::new());
        assert!(matches!(cred.bearer_token().await, Err(ModelError::AuthError(_))));
    }

    #[tokio::test]
    async fn test_managed_identity_fetches_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/token")
            .match_header("Metadata", "true")
            .with_status(200)
            .with_body(r#"{"access_token": "tok-123"}"#)
            .create_async()
            .await;

        let cred = ManagedIdentityCredential::with_token_url(format!("{}/token", server.url()));
        assert_eq!(cred.bearer_token().await.unwrap(), "tok-123");
    }

    #[tokio::test]
    async fn test_chained_credential_prefers_first_success() {
        let chain = ChainedCredential::new(vec![
            Box::new(ApiKeyCredential::new(String::new())),
            Box::new(ApiKeyCredential::new("second".to_string())),
            Box::new(ApiKeyCredential::new("third".to_string())),
        ]);
        assert_eq!(chain.bearer_token().await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_chained_credential_reports_all_failures() {
        let chain = ChainedCredential::new(vec![
            Box::new(ApiKeyCredential::new(String::new())),
            Box::new(ApiKeyCredential::new(String::new())),
        ]);
        let err = chain.bearer_token().await.unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("All credentials in chain failed"));
    }
}
