//! Model client implementations for Mnemo.
//!
//! Provides concrete `ChatModel` and `Embedder` implementations for the
//! OpenAI API, Azure OpenAI (token based), a mock client for testing, plus
//! the credential providers and the factory that selects among them.

pub mod azure;
pub mod credentials;
pub mod embeddings;
pub mod factory;
pub mod mock;
pub mod openai;

pub use azure::AzureOpenAIModel;
pub use credentials::{
    ApiKeyCredential, ChainedCredential, CredentialProvider, ManagedIdentityCredential,
};
pub use embeddings::{HashEmbedder, OpenAIEmbedder};
pub use factory::{ClientConfig, ModelFactory, ProviderKind};
pub use mock::MockModel;
pub use openai::OpenAIModel;
