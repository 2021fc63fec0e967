//! Model factory for creating chat clients from configuration.
//!
//! Client construction selects among the known transport configurations by
//! provider name; an unknown name is a fatal configuration error.

use crate::credentials::{ApiKeyCredential, ChainedCredential, CredentialProvider, ManagedIdentityCredential};
use crate::{AzureOpenAIModel, MockModel, OpenAIModel};
use mnemo_abstraction::{ChatModel, ModelError, ModelParameters};
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Known client provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI with a direct API key.
    OpenAI,
    /// Azure OpenAI with a managed-identity token.
    AzureOpenAI,
    /// Azure OpenAI with a chained credential (explicit token, then managed identity).
    AzureChained,
    /// Mock model for testing.
    Mock,
}

impl FromStr for ProviderKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "azure_openai" => Ok(Self::AzureOpenAI),
            "azure_chained" => Ok(Self::AzureChained),
            "mock" => Ok(Self::Mock),
            other => Err(ModelError::UnsupportedModelProvider(other.to_string())),
        }
    }
}

/// Client configuration, typically the `client` section of the settings file.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Provider name: "openai", "azure_openai", "azure_chained" or "mock".
    pub provider: String,
    /// The model ID (e.g., "gpt-4o-2024-08-06").
    pub model: String,
    /// API key for direct-key providers (falls back to `OPENAI_API_KEY`).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Azure resource endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Azure deployment name (defaults to "<model>-eval").
    #[serde(default)]
    pub deployment: Option<String>,
    /// Azure API version.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Override for the managed-identity token endpoint.
    #[serde(default)]
    pub token_url: Option<String>,
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Nucleus sampling mass.
    #[serde(default)]
    pub top_p: Option<f32>,
    /// Maximum completion tokens.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Presence penalty.
    #[serde(default)]
    pub presence_penalty: Option<f32>,
    /// Frequency penalty.
    #[serde(default)]
    pub frequency_penalty: Option<f32>,
    /// Transport-level retry count.
    #[serde(default)]
    pub max_retries: u32,
}

fn default_api_version() -> String {
    "2024-06-01".to_string()
}

impl ClientConfig {
    /// Generation parameters carried by this configuration.
    #[must_use]
    pub fn parameters(&self) -> ModelParameters {
        ModelParameters {
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            presence_penalty: self.presence_penalty,
            frequency_penalty: self.frequency_penalty,
            stop_sequences: None,
        }
    }

    fn deployment_name(&self) -> String {
        self.deployment.clone().unwrap_or_else(|| format!("{}-eval", self.model))
    }

    fn require_endpoint(&self) -> Result<String, ModelError> {
        self.endpoint.clone().ok_or_else(|| {
            ModelError::UnsupportedModelProvider(format!(
                "provider '{}' requires an endpoint",
                self.provider
            ))
        })
    }
}

/// Environment variable holding a pre-issued Azure token, checked first by
/// the chained credential.
const AZURE_TOKEN_ENV: &str = "AZURE_OPENAI_TOKEN";

/// Factory for creating chat model instances.
pub struct ModelFactory;

impl ModelFactory {
    /// Creates a chat model from the given configuration.
    ///
    /// # Errors
    /// Returns a `ModelError` if the provider name is unknown or required
    /// settings are missing.
    pub fn create(config: &ClientConfig) -> Result<Arc<dyn ChatModel>, ModelError> {
        let kind = ProviderKind::from_str(&config.provider)?;
        debug!(provider = ?kind, model = %config.model, "Creating chat client");

        match kind {
            ProviderKind::OpenAI => {
                let model = match &config.api_key {
                    Some(key) => OpenAIModel::with_api_key(config.model.clone(), key.clone()),
                    None => OpenAIModel::new(config.model.clone())?,
                };
                Ok(Arc::new(model.with_max_retries(config.max_retries)))
            }
            ProviderKind::AzureOpenAI => {
                let credential: Arc<dyn CredentialProvider> = match &config.token_url {
                    Some(url) => Arc::new(ManagedIdentityCredential::with_token_url(url.clone())),
                    None => Arc::new(ManagedIdentityCredential::new()),
                };
                Ok(Arc::new(Self::azure_model(config, credential)?))
            }
            ProviderKind::AzureChained => {
                let mut chain: Vec<Box<dyn CredentialProvider>> = Vec::new();
                if let Ok(token) = env::var(AZURE_TOKEN_ENV) {
                    chain.push(Box::new(ApiKeyCredential::new(token)));
                }
                chain.push(match &config.token_url {
                    Some(url) => Box::new(ManagedIdentityCredential::with_token_url(url.clone())),
                    None => Box::new(ManagedIdentityCredential::new()),
                });
                let credential = Arc::new(ChainedCredential::new(chain));
                Ok(Arc::new(Self::azure_model(config, credential)?))
            }
            ProviderKind::Mock => Ok(Arc::new(MockModel::new(config.model.clone()))),
        }
    }

    fn azure_model(
        config: &ClientConfig,
        credential: Arc<dyn CredentialProvider>,
    ) -> Result<AzureOpenAIModel, ModelError> {
        Ok(AzureOpenAIModel::new(
            config.model.clone(),
            config.require_endpoint()?,
            config.deployment_name(),
            config.api_version.clone(),
            credential,
        ))
    }
}
