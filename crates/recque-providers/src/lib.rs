//! recque-providers — LLM question provider integrations.
//!
//! Implements the `QuestionProvider` trait for OpenAI-compatible APIs and
//! Ollama, plus a deterministic mock for tests and offline runs. All
//! providers share the prompt dialect in [`prompts`].

pub mod config;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod prompts;

pub use config::{create_provider, load_config, load_config_from, ProviderConfig, RecqueConfig};
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
