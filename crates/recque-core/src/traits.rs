//! Collaborator traits: question providers and session stores.
//!
//! These async traits are implemented by the `recque-providers` and
//! `recque-store` crates respectively. Both are fallible, latency-bearing
//! calls; the engine commits their results atomically or not at all.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, ProviderError, StoreError};
use crate::model::{SessionState, SessionSummary};

// ---------------------------------------------------------------------------
// Question provider trait
// ---------------------------------------------------------------------------

/// Trait for backends that generate skills and questions on demand.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Human-readable provider name (e.g. "openai").
    fn name(&self) -> &str;

    /// Generate the ordered skill list for a topic. Must return at least
    /// one skill; the engine treats an empty list as an invalid response.
    async fn generate_skills(&self, topic: &str) -> Result<Vec<String>, ProviderError>;

    /// Generate a single multiple-choice question.
    async fn generate_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<GeneratedQuestion, ProviderError>;
}

/// Request to generate a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRequest {
    /// The topic being studied.
    pub topic: String,
    /// The skill this question targets.
    pub skill: String,
    /// 0 for a root question; `parent depth + 1` for a simpler follow-up.
    pub depth: u32,
    /// Context about the wrong answer that prompted this question.
    /// Present exactly when `depth > 0`.
    #[serde(default)]
    pub misconception: Option<MisconceptionContext>,
}

/// What the learner got wrong, forwarded verbatim to the provider.
///
/// The engine fills this in and never interprets it; how a provider turns
/// it into a simpler question is its own business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MisconceptionContext {
    /// Prompt text of the question that was answered incorrectly.
    pub prior_prompt: String,
    /// Text of the option the learner chose.
    pub chosen_answer: String,
}

/// A provider's wire payload for one question, before the engine has
/// validated it and minted a `Question` from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    /// The question stem, without answer alternatives.
    pub prompt_text: String,
    /// All answer options in presentation order.
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct_option_index: usize,
}

impl GeneratedQuestion {
    /// Boundary validation: providers are loosely trusted, so the engine
    /// checks structure before building a `Question`.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.options.len() < 2 {
            return Err(EngineError::MalformedQuestion(format!(
                "only {} option(s), need at least 2",
                self.options.len()
            )));
        }
        if self.correct_option_index >= self.options.len() {
            return Err(EngineError::MalformedQuestion(format!(
                "correct index {} out of range for {} options",
                self.correct_option_index,
                self.options.len()
            )));
        }
        for (i, option) in self.options.iter().enumerate() {
            if self.options[..i].contains(option) {
                return Err(EngineError::MalformedQuestion(format!(
                    "duplicate option text: '{option}'"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session store trait
// ---------------------------------------------------------------------------

/// Trait for durable session persistence.
///
/// The engine writes only at commit points (after `start_topic` and after
/// every applied answer transition), so a crash between commit points is
/// recovered by `load` + `resume`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a session snapshot, overwriting any previous one.
    async fn save(&self, state: &SessionState) -> Result<(), StoreError>;

    /// Load the last committed snapshot for a session.
    async fn load(&self, session_id: Uuid) -> Result<SessionState, StoreError>;

    /// Summaries of all stored sessions.
    async fn list(&self) -> Result<Vec<SessionSummary>, StoreError>;

    /// Remove a stored session.
    async fn delete(&self, session_id: Uuid) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Markdown JSON extraction
// ---------------------------------------------------------------------------

/// Strip a markdown code fence from a model response before JSON parsing.
///
/// Models frequently wrap JSON payloads in ```json fences even when asked
/// not to. Handles ```json and bare ``` fences, including unclosed ones;
/// responses without fences are returned as-is.
pub fn extract_json_from_markdown(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line ("json", "JSON", or empty).
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => return trimmed,
    };
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}
