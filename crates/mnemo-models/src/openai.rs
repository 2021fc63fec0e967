//! OpenAI chat model implementation.
//!
//! This module provides an implementation of the `ChatModel` trait for
//! OpenAI's chat completions API using a direct API key.

use async_trait::async_trait;
use mnemo_abstraction::{ChatMessage, ChatModel, ModelError, ModelParameters, ModelResponse, ModelUsage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, warn};

/// OpenAI chat model client.
#[derive(Debug, Clone)]
pub struct OpenAIModel {
    /// The model ID (e.g., "gpt-4o", "gpt-4o-mini").
    model_id: String,
    /// The API key for authentication.
    api_key: String,
    /// The base URL for the OpenAI API.
    base_url: String,
    /// Number of times a transport-level failure is retried.
    max_retries: u32,
    /// HTTP client for making requests.
    client: Client,
}

impl OpenAIModel {
    /// Creates a new `OpenAIModel` with the given model ID.
    ///
    /// # Arguments
    /// * `model_id` - The OpenAI model ID to use (e.g., "gpt-4o")
    ///
    /// # Errors
    /// Returns a `ModelError` if the API key is not found in environment variables.
    pub fn new(model_id: String) -> Result<Self, ModelError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            ModelError::AuthError("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Ok(Self::with_api_key(model_id, api_key))
    }

    /// Creates a new `OpenAIModel` with an explicit API key.
    ///
    /// # Arguments
    /// * `model_id` - The OpenAI model ID to use
    /// * `api_key` - The API key for authentication
    #[must_use]
    pub fn with_api_key(model_id: String, api_key: String) -> Self {
        Self {
            model_id,
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            max_retries: 0,
            client: Client::new(),
        }
    }

    /// Overrides the base URL (used for tests and compatible endpoints).
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Sets the number of transport-level retries.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[async_trait]
impl ChatModel for OpenAIModel {
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            message_count = messages.len(),
            "OpenAIModel generating chat completion"
        );

        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest::build(&self.model_id, messages, parameters);

        // Retry only transport failures; API errors are returned as-is.
        let mut attempt = 0;
        let response = loop {
            match self.client.post(&url).bearer_auth(&self.api_key).json(&body).send().await {
                Ok(response) => break response,
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(error = %e, attempt, "Retrying OpenAI request after network error");
                }
                Err(e) => {
                    error!(error = %e, "Failed to send request to OpenAI API");
                    return Err(ModelError::RequestError(format!("Network error: {}", e)));
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "OpenAI API returned error status");
            return Err(ModelError::ModelResponseError(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse OpenAI API response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        parsed.into_model_response()
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// OpenAI chat completions request body.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

impl ChatRequest {
    pub(crate) fn build(
        model_id: &str,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Self {
        let wire_messages = messages
            .iter()
            .map(|msg| WireMessage { role: msg.role.clone(), content: msg.content.clone() })
            .collect();

        let mut request = Self {
            model: model_id.to_string(),
            messages: wire_messages,
            temperature: None,
            top_p: None,
            max_tokens: None,
            presence_penalty: None,
            frequency_penalty: None,
            stop: None,
        };

        if let Some(params) = parameters {
            request.temperature = params.temperature;
            request.top_p = params.top_p;
            request.max_tokens = params.max_tokens;
            request.presence_penalty = params.presence_penalty;
            request.frequency_penalty = params.frequency_penalty;
            request.stop = params.stop_sequences;
        }

        request
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

/// OpenAI chat completions response body.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl ChatResponse {
    pub(crate) fn into_model_response(self) -> Result<ModelResponse, ModelError> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            ModelError::ModelResponseError("Response contained no choices".to_string())
        })?;

        Ok(ModelResponse {
            content: choice.message.content,
            model_id: self.model,
            usage: self.usage.map(|u| ModelUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_applies_parameters() {
        let params = ModelParameters {
            temperature: Some(0.1),
            top_p: Some(0.9),
            max_tokens: Some(64),
            presence_penalty: Some(0.5),
            frequency_penalty: Some(0.25),
            stop_sequences: None,
        };
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatRequest::build("gpt-4o", &messages, Some(params));

        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.presence_penalty, Some(0.5));
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn test_chat_response_without_choices_is_error() {
        let response = ChatResponse { choices: vec![], model: None, usage: None };
        assert!(response.into_model_response().is_err());
    }

    #[tokio::test]
    async fn test_generate_chat_completion_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "model": "gpt-4o",
                    "choices": [{"message": {"role": "assistant", "content": "42"}}],
                    "usage": {"prompt_tokens": 5, "completion_tokens": 1, "total_tokens": 6}
                }"#,
            )
            .create_async()
            .await;

        let model = OpenAIModel::with_api_key("gpt-4o".to_string(), "test-key".to_string())
            .with_base_url(server.url());
        let response = model.generate_text("What is the answer?", None).await.unwrap();

        assert_eq!(response.content, "42");
        assert_eq!(response.usage.unwrap().total_tokens, 6);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_chat_completion_maps_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(400)
            .with_body("bad request")
            .create_async()
            .await;

        let model = OpenAIModel::with_api_key("gpt-4o".to_string(), "test-key".to_string())
            .with_base_url(server.url());
        let err = model.generate_text("hi", None).await.unwrap_err();
        assert!(matches!(err, ModelError::ModelResponseError(_)));
    }
}
