//! Azure OpenAI chat model implementation.
//!
//! Token-based transport against an Azure OpenAI deployment. The bearer
//! token is obtained per request from an injected `CredentialProvider`, so
//! managed-identity and chained-credential configurations share this client.

use crate::credentials::CredentialProvider;
use crate::openai::{ChatRequest, ChatResponse};
use async_trait::async_trait;
use mnemo_abstraction::{ChatMessage, ChatModel, ModelError, ModelParameters, ModelResponse};
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, error};

/// Azure OpenAI chat model client.
pub struct AzureOpenAIModel {
    /// The underlying model ID (e.g., "gpt-4o-2024-08-06").
    model_id: String,
    /// Resource endpoint (e.g., "https://example.openai.azure.com").
    endpoint: String,
    /// Deployment name within the resource.
    deployment: String,
    /// API version query parameter.
    api_version: String,
    /// Token source for the Authorization header.
    credential: Arc<dyn CredentialProvider>,
    /// HTTP client for making requests.
    client: Client,
}

impl AzureOpenAIModel {
    /// Creates a new Azure OpenAI client.
    ///
    /// # Arguments
    /// * `model_id` - The underlying model ID
    /// * `endpoint` - The resource endpoint URL
    /// * `deployment` - The deployment name
    /// * `api_version` - The API version string
    /// * `credential` - Token source for authentication
    #[must_use]
    pub fn new(
        model_id: String,
        endpoint: String,
        deployment: String,
        api_version: String,
        credential: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            model_id,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            deployment,
            api_version,
            credential,
            client: Client::new(),
        }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[async_trait]
impl ChatModel for AzureOpenAIModel {
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            deployment = %self.deployment,
            message_count = messages.len(),
            "AzureOpenAIModel generating chat completion"
        );

        let token = self.credential.bearer_token().await?;
        let body = ChatRequest::build(&self.model_id, messages, parameters);

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to Azure OpenAI");
                ModelError::RequestError(format!("Network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Azure OpenAI returned error status");
            return Err(ModelError::ModelResponseError(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        parsed.into_model_response()
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::ApiKeyCredential;

    fn test_model(endpoint: String) -> AzureOpenAIModel {
        AzureOpenAIModel::new(
            "gpt-4o-2024-08-06".to_string(),
            endpoint,
            "gpt-4o-eval".to_string(),
            "2024-06-01".to_string(),
            Arc::new(ApiKeyCredential::new("tok".to_string())),
        )
    }

    #[test]
    fn test_completions_url_shape() {
        let model = test_model("https://example.openai.azure.com/".to_string());
        assert_eq!(
            model.completions_url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o-eval/chat/completions?api-version=2024-06-01"
        );
    }

    #[tokio::test]
    async fn test_azure_chat_completion_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "POST",
                "/openai/deployments/gpt-4o-eval/chat/completions?api-version=2024-06-01",
            )
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"message": {"role": "assistant", "content": "ok"}}]}"#,
            )
            .create_async()
            .await;

        let model = test_model(server.url());
        let response = model.generate_text("hello", None).await.unwrap();
        assert_eq!(response.content, "ok");
    }
}
