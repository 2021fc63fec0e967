//! Response grading via a secondary model call.
//!
//! The grader extracts the final answer from a free-text response, then
//! asks the model whether that answer is equivalent to the expected one.
//! The judgment itself is opaque and non-deterministic; this module only
//! shapes the two calls and parses the verdict.

use crate::error::Result;
use mnemo_abstraction::{ChatMessage, ChatModel, ModelParameters};
use std::sync::Arc;
use tracing::debug;

/// Grades free-text responses against expected answers.
pub struct Grader {
    client: Arc<dyn ChatModel>,
    parameters: ModelParameters,
}

impl Grader {
    /// Creates a grader over the given chat client.
    #[must_use]
    pub fn new(client: Arc<dyn ChatModel>) -> Self {
        // Grading wants determinism, not creativity.
        let parameters = ModelParameters { temperature: Some(0.0), ..ModelParameters::default() };
        Self { client, parameters }
    }

    /// Judges whether `response` answers `task` with `expected_answer`.
    ///
    /// Returns the verdict and the answer extracted from the response.
    pub async fn is_response_correct(
        &self,
        task: &str,
        response: &str,
        expected_answer: &str,
    ) -> Result<(bool, String)> {
        let extracted_answer = self.extract_answer(task, response).await?;
        debug!(extracted = %extracted_answer, "Extracted answer from response");

        let verdict_prompt = format!(
            "Consider this question:\n\n{}\n\nThe expected answer is:\n{}\n\nA student answered:\n{}\n\nIs the student's answer equivalent to the expected answer? Reply with exactly one word, yes or no.",
            task, expected_answer, extracted_answer
        );
        let messages = vec![
            ChatMessage::system("You are a strict but fair grader of question answering."),
            ChatMessage::user(verdict_prompt),
        ];
        let verdict =
            self.client.generate_chat_completion(&messages, Some(self.parameters.clone())).await?;

        let is_correct = parse_verdict(&verdict.content);
        debug!(is_correct, "Grader verdict");
        Ok((is_correct, extracted_answer))
    }

    async fn extract_answer(&self, task: &str, response: &str) -> Result<String> {
        let prompt = format!(
            "Consider this question:\n\n{}\n\nExtract the final answer from the following response, as briefly as possible, with no commentary:\n\n{}",
            task, response
        );
        let messages = vec![
            ChatMessage::system("You extract final answers from long-form responses."),
            ChatMessage::user(prompt),
        ];
        let extracted =
            self.client.generate_chat_completion(&messages, Some(self.parameters.clone())).await?;
        Ok(extracted.content.trim().to_string())
    }
}

/// A verdict counts as correct only when it leads with "yes".
fn parse_verdict(content: &str) -> bool {
    content.trim().to_lowercase().starts_with("yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_models::MockModel;

    #[test]
    fn test_parse_verdict() {
        assert!(parse_verdict("yes"));
        assert!(parse_verdict("  Yes.\n"));
        assert!(parse_verdict("YES, it matches"));
        assert!(!parse_verdict("no"));
        assert!(!parse_verdict("the answer is yes")); // must lead with yes
        assert!(!parse_verdict(""));
    }

    #[tokio::test]
    async fn test_is_response_correct_with_scripted_model() {
        let model = MockModel::new("mock").with_replies(vec![
            "100".to_string(), // extraction
            "yes".to_string(), // verdict
        ]);
        let grader = Grader::new(Arc::new(model));

        let (correct, extracted) = grader
            .is_response_correct("How many liars?", "I believe all 100 are liars.", "100")
            .await
            .unwrap();

        assert!(correct);
        assert_eq!(extracted, "100");
    }

    #[tokio::test]
    async fn test_is_response_correct_negative_verdict() {
        let model = MockModel::new("mock")
            .with_replies(vec!["50".to_string(), "no".to_string()]);
        let grader = Grader::new(Arc::new(model));

        let (correct, extracted) =
            grader.is_response_correct("How many liars?", "Maybe half?", "100").await.unwrap();

        assert!(!correct);
        assert_eq!(extracted, "50");
    }
}
