//! The question stack: an explicit LIFO of unresolved questions.
//!
//! When a learner answers incorrectly, a simpler question is pushed; when
//! they answer correctly, the top is popped and the learner returns to the
//! question that spawned it. The stack is an explicit, serializable data
//! structure (not implicit call-stack state) so a session can be
//! persisted, inspected, and resumed mid-recursion.
//!
//! Single owner, no interior locking: the owning engine serializes access.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::Question;

/// LIFO of unresolved questions for the active skill. The top is the most
/// recently pushed question, i.e. the one currently presented.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionStack {
    entries: Vec<Question>,
}

impl QuestionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a question onto the stack.
    ///
    /// Preconditions: on an empty stack the question must be a root
    /// (depth 0, no parent); otherwise its `parent_question_id` must be the
    /// current top's id and its depth the current top's depth + 1.
    pub fn push(&mut self, question: Question) -> Result<(), EngineError> {
        match self.entries.last() {
            None => {
                if question.depth != 0 || question.parent_question_id.is_some() {
                    return Err(EngineError::InvariantViolation(format!(
                        "pushed depth-{} question onto an empty stack",
                        question.depth
                    )));
                }
            }
            Some(top) => {
                if question.parent_question_id != Some(top.id) {
                    return Err(EngineError::InvariantViolation(format!(
                        "pushed question's parent {:?} is not the current top {}",
                        question.parent_question_id, top.id
                    )));
                }
                if question.depth != top.depth + 1 {
                    return Err(EngineError::InvariantViolation(format!(
                        "pushed question has depth {}, expected {}",
                        question.depth,
                        top.depth + 1
                    )));
                }
            }
        }
        self.entries.push(question);
        tracing::debug!(depth = self.entries.len(), "pushed question");
        Ok(())
    }

    /// Remove and return the top question.
    pub fn pop(&mut self) -> Result<Question, EngineError> {
        let question = self.entries.pop().ok_or(EngineError::EmptyStack)?;
        tracing::debug!(depth = self.entries.len(), "popped question");
        Ok(question)
    }

    /// The top question without removing it.
    pub fn peek(&self) -> Result<&Question, EngineError> {
        self.entries.last().ok_or(EngineError::EmptyStack)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Depth of the top question, if any.
    pub fn depth_of_top(&self) -> Option<u32> {
        self.entries.last().map(|q| q.depth)
    }

    /// Questions from the bottom (root) to the top (current).
    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.entries.iter()
    }
}
