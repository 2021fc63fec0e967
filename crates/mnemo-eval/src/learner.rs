//! Fast-learner capability interface and registry.
//!
//! Learner implementations are resolved by name through a registry of
//! factory functions populated at startup; an unknown name is a fatal
//! configuration error and a failing constructor is logged with context
//! and propagated.

use crate::config::LearnerSettings;
use crate::error::{EvalError, Result};
use async_trait::async_trait;
use mnemo_abstraction::{ChatMessage, ChatModel, Embedder, ModelParameters};
use mnemo_memory::StringSimilarityMap;
use mnemo_models::{HashEmbedder, OpenAIEmbedder};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tracing::{debug, error, info};

/// The pluggable agent under evaluation.
///
/// Capable of answering tasks and optionally persisting learned advice
/// across calls. Evaluations run on a single task, so the futures are not
/// required to be `Send`; this keeps non-`Sync` storage handles usable
/// behind the trait.
#[async_trait(?Send)]
pub trait FastLearner: Send {
    /// Clears any persisted memory.
    async fn reset_memory(&mut self) -> Result<()>;

    /// Handles a free-form user message (a question or a piece of advice)
    /// and returns the learner's response.
    async fn handle_user_message(&mut self, text: &str) -> Result<String>;

    /// Attempts the given task, optionally consulting memory.
    async fn assign_task(&mut self, task: &str, use_memory: bool) -> Result<String>;

    /// Stores a worked demonstration of a similar task.
    async fn learn_from_demonstration(&mut self, task: &str, demonstration: &str) -> Result<()>;

    /// Trains on a task with a known expected answer.
    async fn train_on_task(&mut self, task: &str, expected_answer: &str) -> Result<()>;
}

/// Factory for a learner implementation.
#[async_trait(?Send)]
pub trait LearnerFactory: Send + Sync {
    /// Constructs a learner from its settings and the shared chat client.
    async fn create(
        &self,
        settings: &LearnerSettings,
        client: Arc<dyn ChatModel>,
    ) -> Result<Box<dyn FastLearner>>;
}

/// Registry mapping learner names to factories.
pub struct LearnerRegistry {
    factories: HashMap<String, Box<dyn LearnerFactory>>,
}

impl LearnerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { factories: HashMap::new() }
    }

    /// Creates a registry with the built-in learners registered.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("prompted", Box::new(PromptedLearnerFactory));
        registry.register("recall", Box::new(RecallLearnerFactory));
        registry
    }

    /// Registers a factory under the given name.
    pub fn register(&mut self, name: impl Into<String>, factory: Box<dyn LearnerFactory>) {
        self.factories.insert(name.into(), factory);
    }

    /// Names of all registered learners, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolves and constructs the learner named in the settings.
    ///
    /// # Errors
    /// Returns `Configuration` for an unknown name and `AgentResolution`
    /// when the factory fails.
    pub async fn create(
        &self,
        settings: &LearnerSettings,
        client: Arc<dyn ChatModel>,
    ) -> Result<Box<dyn FastLearner>> {
        let factory = self.factories.get(&settings.name).ok_or_else(|| {
            EvalError::Configuration(format!(
                "unknown fast learner '{}' (known: {})",
                settings.name,
                self.names().join(", ")
            ))
        })?;

        factory.create(settings, client).await.map_err(|e| {
            error!(learner = %settings.name, error = %e, "Failed to construct fast learner");
            EvalError::AgentResolution(format!("constructing '{}': {}", settings.name, e))
        })
    }
}

impl Default for LearnerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Memoryless baseline learner that forwards tasks straight to the model.
pub struct PromptedLearner {
    client: Arc<dyn ChatModel>,
    parameters: ModelParameters,
}

impl PromptedLearner {
    /// Creates a baseline learner over the given client.
    #[must_use]
    pub fn new(client: Arc<dyn ChatModel>) -> Self {
        Self { client, parameters: ModelParameters::default() }
    }
}

#[async_trait(?Send)]
impl FastLearner for PromptedLearner {
    async fn reset_memory(&mut self) -> Result<()> {
        Ok(())
    }

    async fn handle_user_message(&mut self, text: &str) -> Result<String> {
        let response = self.client.generate_text(text, Some(self.parameters.clone())).await?;
        Ok(response.content)
    }

    async fn assign_task(&mut self, task: &str, _use_memory: bool) -> Result<String> {
        self.handle_user_message(task).await
    }

    async fn learn_from_demonstration(&mut self, _task: &str, _demonstration: &str) -> Result<()> {
        Ok(())
    }

    async fn train_on_task(&mut self, _task: &str, _expected_answer: &str) -> Result<()> {
        Ok(())
    }
}

struct PromptedLearnerFactory;

#[async_trait(?Send)]
impl LearnerFactory for PromptedLearnerFactory {
    async fn create(
        &self,
        _settings: &LearnerSettings,
        client: Arc<dyn ChatModel>,
    ) -> Result<Box<dyn FastLearner>> {
        Ok(Box::new(PromptedLearner::new(client)))
    }
}

/// Memory-backed learner over a string similarity map.
///
/// Advice and demonstrations are stored keyed by the text they relate to;
/// when a task arrives, related memos are retrieved and prepended to the
/// prompt.
pub struct RecallLearner {
    client: Arc<dyn ChatModel>,
    parameters: ModelParameters,
    memory: StringSimilarityMap,
    max_memos: usize,
    distance_threshold: f32,
}

impl RecallLearner {
    /// Creates a learner from settings, opening its similarity store.
    ///
    /// # Errors
    /// Returns `Configuration` if `memory_dir` is missing or the embedder
    /// name is unknown.
    pub async fn from_settings(
        settings: &LearnerSettings,
        client: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let memory_dir = settings.memory_dir.as_ref().ok_or_else(|| {
            EvalError::Configuration("recall learner requires 'memory_dir'".to_string())
        })?;

        let embedder: Arc<dyn Embedder> = match settings.embedder.as_str() {
            "hash" => Arc::new(HashEmbedder::new()),
            "openai" => {
                let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
                    EvalError::Configuration(
                        "openai embedder requires OPENAI_API_KEY".to_string(),
                    )
                })?;
                Arc::new(OpenAIEmbedder::with_api_key(api_key))
            }
            other => {
                return Err(EvalError::Configuration(format!("unknown embedder '{}'", other)));
            }
        };

        let memory = StringSimilarityMap::open(
            settings.similarity.clone(),
            settings.reset_memory,
            memory_dir,
            embedder,
        )
        .await?;

        Ok(Self {
            client,
            parameters: ModelParameters::default(),
            memory,
            max_memos: settings.max_memos,
            distance_threshold: settings.distance_threshold,
        })
    }

    async fn related_advice(&self, text: &str) -> Result<Vec<String>> {
        let memos =
            self.memory.get_related(text, self.max_memos, self.distance_threshold).await?;
        // Self pairs only record that a message was seen; advice carries a
        // payload distinct from its key. Exact-key matches (a stored
        // demonstration or training memo for this very task) must come back.
        Ok(memos
            .into_iter()
            .filter(|memo| memo.input_text != memo.output_text)
            .map(|memo| memo.output_text)
            .collect())
    }

    async fn answer_with_advice(&self, task: &str, advice: &[String]) -> Result<String> {
        let mut messages = vec![ChatMessage::system(
            "You are a careful problem solver. Use any prior advice that applies.",
        )];
        if !advice.is_empty() {
            debug!(memos = advice.len(), "Prepending retrieved advice");
            let advice_block =
                format!("Advice from earlier sessions that may help:\n- {}", advice.join("\n- "));
            messages.push(ChatMessage::system(advice_block));
        }
        messages.push(ChatMessage::user(task));

        let response = self
            .client
            .generate_chat_completion(&messages, Some(self.parameters.clone()))
            .await?;
        Ok(response.content)
    }
}

#[async_trait(?Send)]
impl FastLearner for RecallLearner {
    async fn reset_memory(&mut self) -> Result<()> {
        info!("Resetting learner memory");
        self.memory.reset()?;
        Ok(())
    }

    async fn handle_user_message(&mut self, text: &str) -> Result<String> {
        let advice = self.related_advice(text).await?;
        let response = self.answer_with_advice(text, &advice).await?;

        // Every user message is remembered as potential advice for related
        // future messages.
        self.memory.add_pair(text, text).await?;
        self.memory.save()?;
        Ok(response)
    }

    async fn assign_task(&mut self, task: &str, use_memory: bool) -> Result<String> {
        let advice = if use_memory { self.related_advice(task).await? } else { Vec::new() };
        self.answer_with_advice(task, &advice).await
    }

    async fn learn_from_demonstration(&mut self, task: &str, demonstration: &str) -> Result<()> {
        self.memory.add_pair(task, demonstration).await?;
        self.memory.save()?;
        Ok(())
    }

    async fn train_on_task(&mut self, task: &str, expected_answer: &str) -> Result<()> {
        let memo = format!("A very similar task had this expected answer: {}", expected_answer);
        self.memory.add_pair(task, &memo).await?;
        self.memory.save()?;
        Ok(())
    }
}

struct RecallLearnerFactory;

#[async_trait(?Send)]
impl LearnerFactory for RecallLearnerFactory {
    async fn create(
        &self,
        settings: &LearnerSettings,
        client: Arc<dyn ChatModel>,
    ) -> Result<Box<dyn FastLearner>> {
        Ok(Box::new(RecallLearner::from_settings(settings, client).await?))
    }
}
