//! The questioning engine: a stack-based state machine over one session.
//!
//! On every answer the engine decides whether to push a simpler
//! sub-question, pop back to the parent question, or advance to the next
//! skill. It owns exactly one `SessionState`, talks to the outside world
//! only through the `QuestionProvider` and `SessionStore` traits, and
//! commits collaborator results atomically or not at all: a failed
//! provider call leaves the stack, history, and state untouched.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{EngineError, ProviderError};
use crate::model::{AnswerRecord, Question, SessionState, SessionStatus, Skill, SkillAdvance, SkillTrack};
use crate::traits::{
    GeneratedQuestion, MisconceptionContext, QuestionProvider, QuestionRequest, SessionStore,
};

/// Observable engine states.
///
/// `Feedback` and `SkillComplete` from the conceptual machine are
/// transient: they are computed and resolved inside `submit_answer`, and
/// any pause before advancing is a presentation concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No topic started.
    Idle,
    /// Stack empty; a root question for the active skill is needed.
    AwaitingQuestion,
    /// A question is presented and unanswered.
    AwaitingAnswer,
    /// Every skill in the track is complete. Terminal.
    TopicComplete,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::AwaitingQuestion => write!(f, "awaiting-question"),
            EngineState::AwaitingAnswer => write!(f, "awaiting-answer"),
            EngineState::TopicComplete => write!(f, "topic-complete"),
        }
    }
}

/// What a submitted answer led to.
#[derive(Debug, Clone)]
pub enum AnswerOutcome {
    /// Incorrect: a simpler question was pushed; the current question
    /// stays pending underneath it.
    NewSubquestion(Question),
    /// Correct at depth > 0: the resolved question was popped and the
    /// parent is re-presented as-is.
    RetryParent(Question),
    /// Correct at depth 0: the skill is complete.
    SkillFinished(SkillAdvance),
}

/// State machine coordinating the question stack and the skill track.
///
/// One engine instance owns one session; callers serialize access per
/// session. Independent sessions run fully in parallel with no shared
/// mutable state.
pub struct QuestioningEngine {
    provider: Arc<dyn QuestionProvider>,
    store: Option<Arc<dyn SessionStore>>,
    session: Option<SessionState>,
    state: EngineState,
    /// Set when a commit-point save failed and the in-memory session is
    /// ahead of the persisted snapshot.
    dirty: bool,
}

impl QuestioningEngine {
    /// An engine without persistence; sessions live only in memory.
    pub fn new(provider: Arc<dyn QuestionProvider>) -> Self {
        Self {
            provider,
            store: None,
            session: None,
            state: EngineState::Idle,
            dirty: false,
        }
    }

    /// An engine that persists the session at every commit point.
    pub fn with_store(provider: Arc<dyn QuestionProvider>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::new(provider)
        }
    }

    // -- read-only surface --------------------------------------------------

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    pub fn topic(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.skill_track.topic_name())
    }

    /// The currently presented question, if one is pending.
    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref().and_then(|s| s.stack.peek().ok())
    }

    pub fn current_skill(&self) -> Option<&Skill> {
        self.session.as_ref().and_then(|s| s.skill_track.active_skill())
    }

    pub fn stack_depth(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.stack.len())
    }

    pub fn history(&self) -> &[AnswerRecord] {
        self.session.as_ref().map_or(&[], |s| &s.answer_history)
    }

    pub fn is_complete(&self) -> bool {
        self.state == EngineState::TopicComplete
    }

    /// Whether the in-memory session is ahead of its persisted snapshot.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // -- operations ---------------------------------------------------------

    /// Start a new topic: fetch its ordered skill list, build the track
    /// with the first skill active, and persist the fresh session.
    ///
    /// Apply-or-abort: on any failure (provider or store) the engine is
    /// still `Idle` with no session.
    pub async fn start_topic(&mut self, topic: &str) -> Result<(), EngineError> {
        self.require_state(EngineState::Idle, "start_topic")?;

        let skills = self.provider.generate_skills(topic).await?;
        if skills.is_empty() {
            return Err(ProviderError::InvalidResponse(format!(
                "empty skill list for topic '{topic}'"
            ))
            .into());
        }

        let track = SkillTrack::new(topic, skills)?;
        let session = SessionState::new(track);
        if let Some(store) = &self.store {
            store.save(&session).await?;
        }

        tracing::info!(
            session_id = %session.id,
            topic,
            skills = session.skill_track.len(),
            "topic started"
        );
        self.session = Some(session);
        self.state = EngineState::AwaitingQuestion;
        self.dirty = false;
        Ok(())
    }

    /// Install a previously persisted session and derive the machine state
    /// from it. Recovery after a crash is `SessionStore::load`, `resume`,
    /// then `request_current_question`.
    pub fn resume(&mut self, mut session: SessionState) -> Result<(), EngineError> {
        self.require_state(EngineState::Idle, "resume")?;

        if let Ok(top) = session.stack.peek() {
            let active = session
                .skill_track
                .active_skill()
                .ok_or_else(|| {
                    EngineError::InvariantViolation(
                        "session has a pending question but no active skill".into(),
                    )
                })?;
            if top.skill != active.name {
                return Err(EngineError::InvariantViolation(format!(
                    "pending question belongs to skill '{}', active skill is '{}'",
                    top.skill, active.name
                )));
            }
        }

        self.state = if session.skill_track.is_complete() {
            EngineState::TopicComplete
        } else if session.stack.is_empty() {
            EngineState::AwaitingQuestion
        } else {
            EngineState::AwaitingAnswer
        };
        if self.state != EngineState::TopicComplete {
            session.status = SessionStatus::Active;
        }
        tracing::info!(session_id = %session.id, state = %self.state, "session resumed");
        self.session = Some(session);
        self.dirty = false;
        Ok(())
    }

    /// Return the question to present.
    ///
    /// With a pending question this is idempotent: it returns the current
    /// top unchanged, issues no provider call, and mutates nothing. With an
    /// empty stack it generates, validates, and pushes the root question
    /// for the active skill.
    pub async fn request_current_question(&mut self) -> Result<Question, EngineError> {
        match self.state {
            EngineState::AwaitingAnswer => {
                let session = self.session_mut("request_current_question")?;
                Ok(session.stack.peek()?.clone())
            }
            EngineState::AwaitingQuestion => {
                let (topic, skill) = {
                    let session = self.session_mut("request_current_question")?;
                    let skill = session.skill_track.active_skill().ok_or_else(|| {
                        EngineError::InvariantViolation("no active skill".into())
                    })?;
                    (
                        session.skill_track.topic_name().to_string(),
                        skill.name.clone(),
                    )
                };
                let request = QuestionRequest {
                    topic,
                    skill,
                    depth: 0,
                    misconception: None,
                };
                // No mutation until the provider call has succeeded and
                // its payload has been validated.
                let generated = self.provider.generate_question(&request).await?;
                generated.validate()?;
                let question = mint_question(generated, &request.skill, 0, None, None);

                let session = self.session_mut("request_current_question")?;
                session.stack.push(question.clone())?;
                self.state = EngineState::AwaitingAnswer;
                tracing::debug!(question_id = %question.id, skill = %question.skill, "root question presented");
                Ok(question)
            }
            state => Err(EngineError::InvalidState {
                operation: "request_current_question",
                state: state.to_string(),
            }),
        }
    }

    /// Evaluate an answer to the current question and resolve the
    /// transition: push a simpler question, pop back to the parent, or
    /// complete the skill.
    pub async fn submit_answer(&mut self, chosen: usize) -> Result<AnswerOutcome, EngineError> {
        self.require_state(EngineState::AwaitingAnswer, "submit_answer")?;
        let top = {
            let session = self.session_mut("submit_answer")?;
            session.stack.peek()?.clone()
        };

        if chosen >= top.options.len() {
            return Err(EngineError::InvalidAnswerIndex {
                chosen,
                options: top.options.len(),
            });
        }
        let correct = chosen == top.correct_option_index;

        let outcome = if correct {
            self.resolve_correct(&top, chosen)?
        } else {
            self.resolve_incorrect(&top, chosen).await?
        };

        if let Some(session) = self.session.as_mut() {
            session.updated_at = Utc::now();
        }
        self.commit().await;
        Ok(outcome)
    }

    /// Correct answer: pop the resolved question and either re-present the
    /// parent or, at the root, complete the skill and advance.
    fn resolve_correct(
        &mut self,
        top: &Question,
        chosen: usize,
    ) -> Result<AnswerOutcome, EngineError> {
        let session = self.session_mut("submit_answer")?;
        session.answer_history.push(record(top, chosen, true));
        let resolved = session.stack.pop()?;

        if resolved.is_root() {
            let advance = session.skill_track.complete_active_and_advance()?;
            match &advance {
                SkillAdvance::AdvancedTo(next) => {
                    tracing::info!(skill = %resolved.skill, next = %next.name, "skill complete");
                    self.state = EngineState::AwaitingQuestion;
                }
                SkillAdvance::TrackComplete => {
                    tracing::info!(topic = %session.skill_track.topic_name(), "topic complete");
                    session.status = SessionStatus::Completed;
                    self.state = EngineState::TopicComplete;
                }
            }
            Ok(AnswerOutcome::SkillFinished(advance))
        } else {
            // The exposed parent is still unresolved and is re-presented
            // as-is; no provider call.
            let parent = session.stack.peek()?.clone();
            tracing::debug!(question_id = %parent.id, depth = parent.depth, "unwound to parent");
            Ok(AnswerOutcome::RetryParent(parent))
        }
    }

    /// Incorrect answer: generate a simpler question one depth lower,
    /// targeting the apparent misconception. The current top stays pending.
    async fn resolve_incorrect(
        &mut self,
        top: &Question,
        chosen: usize,
    ) -> Result<AnswerOutcome, EngineError> {
        let topic = self
            .topic()
            .ok_or_else(|| EngineError::InvariantViolation("no session".into()))?
            .to_string();
        let chosen_answer = top.options[chosen].clone();
        let request = QuestionRequest {
            topic,
            skill: top.skill.clone(),
            depth: top.depth + 1,
            misconception: Some(MisconceptionContext {
                prior_prompt: top.prompt_text.clone(),
                chosen_answer: chosen_answer.clone(),
            }),
        };

        // Provider call first: on failure the stack, history, and state
        // are exactly as they were, and the same answer can be resubmitted.
        let generated = self.provider.generate_question(&request).await?;
        generated.validate()?;
        let question = mint_question(
            generated,
            &top.skill,
            top.depth + 1,
            Some(top.id),
            Some(chosen_answer),
        );

        let session = self.session_mut("submit_answer")?;
        session.answer_history.push(record(top, chosen, false));
        session.stack.push(question.clone())?;
        tracing::debug!(
            question_id = %question.id,
            depth = question.depth,
            parent = %top.id,
            "subquestion pushed"
        );
        Ok(AnswerOutcome::NewSubquestion(question))
    }

    /// Drop the session and return to `Idle`. The persisted snapshot, if
    /// any, is left as the last committed state; nothing is deleted.
    pub fn abandon_session(&mut self) -> Result<SessionState, EngineError> {
        match self.state {
            EngineState::AwaitingQuestion | EngineState::AwaitingAnswer => {
                let mut session = self
                    .session
                    .take()
                    .ok_or_else(|| EngineError::InvariantViolation("no session".into()))?;
                session.status = SessionStatus::Abandoned;
                tracing::info!(session_id = %session.id, "session abandoned");
                self.state = EngineState::Idle;
                self.dirty = false;
                Ok(session)
            }
            state => Err(EngineError::InvalidState {
                operation: "abandon_session",
                state: state.to_string(),
            }),
        }
    }

    /// Retry persisting the current session, e.g. after a commit-point
    /// save failed and `is_dirty` returned true.
    pub async fn persist(&mut self) -> Result<(), EngineError> {
        if let (Some(store), Some(session)) = (&self.store, &self.session) {
            store.save(session).await?;
        }
        self.dirty = false;
        Ok(())
    }

    // -- internals ----------------------------------------------------------

    /// Commit-point save. A failure here must not lose the already-applied
    /// transition, so it is surfaced as a warning plus the dirty flag
    /// rather than an error; `persist` retries explicitly.
    async fn commit(&mut self) {
        let (Some(store), Some(session)) = (&self.store, &self.session) else {
            return;
        };
        match store.save(session).await {
            Ok(()) => self.dirty = false,
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "session save failed, continuing in-memory");
                self.dirty = true;
            }
        }
    }

    fn require_state(
        &self,
        expected: EngineState,
        operation: &'static str,
    ) -> Result<(), EngineError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(EngineError::InvalidState {
                operation,
                state: self.state.to_string(),
            })
        }
    }

    fn session_mut(&mut self, operation: &'static str) -> Result<&mut SessionState, EngineError> {
        let state = self.state;
        self.session.as_mut().ok_or(EngineError::InvalidState {
            operation,
            state: state.to_string(),
        })
    }
}

/// Build a `Question` from a validated provider payload. Ids, depth,
/// parentage, and the misconception tag are minted engine-side so stack
/// invariants never depend on provider honesty.
fn mint_question(
    generated: GeneratedQuestion,
    skill: &str,
    depth: u32,
    parent: Option<Uuid>,
    misconception_tag: Option<String>,
) -> Question {
    Question {
        id: Uuid::new_v4(),
        skill: skill.to_string(),
        depth,
        prompt_text: generated.prompt_text,
        options: generated.options,
        correct_option_index: generated.correct_option_index,
        misconception_tag,
        parent_question_id: parent,
    }
}

fn record(question: &Question, chosen: usize, correct: bool) -> AnswerRecord {
    AnswerRecord {
        question_id: question.id,
        skill: question.skill.clone(),
        depth: question.depth,
        chosen_option_index: chosen,
        correct,
        answered_at: Utc::now(),
    }
}
