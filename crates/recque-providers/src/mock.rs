//! Mock provider for testing and offline demo runs.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use recque_core::error::ProviderError;
use recque_core::traits::{GeneratedQuestion, QuestionProvider, QuestionRequest};

/// A deterministic question provider that never touches the network.
///
/// Every generated question has four options with the correct one at a
/// fixed index, so tests and demo sessions can script right and wrong
/// answers without inspecting the question first.
pub struct MockProvider {
    /// Skill list returned for any topic.
    skills: Vec<String>,
    /// Index of the correct option in every generated question.
    correct_index: usize,
    /// Number of question generation calls made.
    call_count: AtomicU32,
    /// Last question request received.
    last_request: Mutex<Option<QuestionRequest>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_skills(&["fundamentals", "core concepts", "advanced applications"])
    }

    /// Create a mock that returns the given skills for every topic.
    pub fn with_skills(skills: &[&str]) -> Self {
        Self {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            correct_index: 1,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Index of the correct option in every question this mock generates.
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// Get the number of question generation calls made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last question request made to this provider.
    pub fn last_request(&self) -> Option<QuestionRequest> {
        self.last_request.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl QuestionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_skills(&self, topic: &str) -> Result<Vec<String>, ProviderError> {
        Ok(self
            .skills
            .iter()
            .map(|s| format!("{s} of {topic}"))
            .collect())
    }

    async fn generate_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<GeneratedQuestion, ProviderError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(request.clone());

        let prompt_text = match &request.misconception {
            None => format!("Which statement best describes {}?", request.skill),
            Some(ctx) => format!(
                "Let's step back from \"{}\". What is the more basic idea behind {}?",
                ctx.chosen_answer, request.skill
            ),
        };

        Ok(GeneratedQuestion {
            prompt_text,
            options: vec![
                format!("a common misconception ({n})"),
                format!("the accurate description ({n})"),
                format!("an unrelated fact ({n})"),
                format!("a partial truth ({n})"),
            ],
            correct_option_index: self.correct_index,
        })
    }
}
