//! recque-core: a stack-based recursive questioning engine.
//!
//! When a learner answers incorrectly, the engine pushes a simpler
//! question targeting the apparent misconception; answering correctly pops
//! back to the question that spawned it. Completing the root question of a
//! skill advances an ordered skill track until the topic is done.
//!
//! This crate contains the state machine, data model, and collaborator
//! traits only. Concrete LLM providers live in `recque-providers` and
//! persistence backends in `recque-store`.

pub mod engine;
pub mod error;
pub mod model;
pub mod stack;
pub mod statistics;
pub mod traits;

pub use engine::{AnswerOutcome, EngineState, QuestioningEngine};
pub use error::{EngineError, ProviderError, StoreError};
pub use model::{
    AnswerRecord, Question, SessionState, SessionStatus, SessionSummary, Skill, SkillAdvance,
    SkillStatus, SkillTrack,
};
pub use stack::QuestionStack;
pub use statistics::{SessionStats, SkillStats};
pub use traits::{
    extract_json_from_markdown, GeneratedQuestion, MisconceptionContext, QuestionProvider,
    QuestionRequest, SessionStore,
};
