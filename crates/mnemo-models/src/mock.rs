//! Mock chat model for testing.

use async_trait::async_trait;
use mnemo_abstraction::{ChatMessage, ChatModel, ModelError, ModelParameters, ModelResponse, ModelUsage};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Mock chat model implementation for testing.
///
/// Replies are taken from a scripted queue when one is provided; otherwise
/// the model echoes the last message back.
pub struct MockModel {
    /// Model ID reported to callers.
    model_id: String,
    /// Scripted replies, consumed in order.
    scripted: Mutex<VecDeque<String>>,
}

impl MockModel {
    /// Creates a new mock model with the given ID.
    #[must_use]
    pub fn new(model_id: impl Into<String>) -> Self {
        Self { model_id: model_id.into(), scripted: Mutex::new(VecDeque::new()) }
    }

    /// Queues replies to return from subsequent completion calls.
    #[must_use]
    pub fn with_replies(self, replies: Vec<String>) -> Self {
        self.scripted.lock().expect("mock reply queue poisoned").extend(replies);
        self
    }

    /// Appends a single reply to the queue.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.scripted.lock().expect("mock reply queue poisoned").push_back(reply.into());
    }

    /// Number of scripted replies not yet consumed.
    pub fn remaining_replies(&self) -> usize {
        self.scripted.lock().expect("mock reply queue poisoned").len()
    }
}

#[async_trait]
impl ChatModel for MockModel {
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        _parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        let scripted_reply = self.scripted.lock().expect("mock reply queue poisoned").pop_front();

        let content = match scripted_reply {
            Some(reply) => reply,
            None => {
                let last = messages
                    .last()
                    .map(|m| m.content.as_str())
                    .unwrap_or_default();
                format!("Mock response to: {}", last)
            }
        };

        let prompt_len: usize = messages.iter().map(|m| m.content.len()).sum();
        Ok(ModelResponse {
            model_id: Some(self.model_id.clone()),
            usage: Some(ModelUsage {
                prompt_tokens: prompt_len as u32,
                completion_tokens: content.len() as u32,
                total_tokens: (prompt_len + content.len()) as u32,
            }),
            content,
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_model_echoes_without_script() {
        let model = MockModel::new("mock-1");
        let response = model.generate_text("Hello world", None).await.unwrap();
        assert!(response.content.contains("Hello world"));
        assert_eq!(response.model_id.as_deref(), Some("mock-1"));
        assert!(response.usage.is_some());
    }

    #[tokio::test]
    async fn test_mock_model_consumes_scripted_replies_in_order() {
        let model = MockModel::new("mock-1")
            .with_replies(vec!["first".to_string(), "second".to_string()]);

        assert_eq!(model.generate_text("a", None).await.unwrap().content, "first");
        assert_eq!(model.generate_text("b", None).await.unwrap().content, "second");
        assert_eq!(model.remaining_replies(), 0);

        // Queue exhausted, falls back to echo.
        let response = model.generate_text("c", None).await.unwrap();
        assert!(response.content.contains("c"));
    }
}
