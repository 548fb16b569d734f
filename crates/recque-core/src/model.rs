//! Core data model for recque sessions.
//!
//! These are the types the engine owns and the store persists: questions,
//! skills, the ordered skill track for a topic, and the session snapshot.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::stack::QuestionStack;

/// A multiple-choice question, immutable once pushed onto the stack.
///
/// `depth` equals the question's position from the bottom of the stack at
/// the moment it was created: 0 is the root question for a skill, N was
/// spawned after N consecutive unresolved misconceptions on this branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique within a session.
    pub id: Uuid,
    /// Name of the owning skill.
    pub skill: String,
    /// Distance from the root question of this branch.
    pub depth: u32,
    /// The question stem, without answer alternatives.
    pub prompt_text: String,
    /// Ordered answer options; length >= 2, no duplicate text.
    pub options: Vec<String>,
    /// Index of the correct option, in `[0, options.len())`.
    pub correct_option_index: usize,
    /// Opaque description of the learner error that produced this
    /// question; `None` at depth 0.
    #[serde(default)]
    pub misconception_tag: Option<String>,
    /// Id of the question immediately below this one in the stack at push
    /// time; `None` at depth 0.
    #[serde(default)]
    pub parent_question_id: Option<Uuid>,
}

impl Question {
    /// Whether this is the root question for its skill.
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }
}

/// Lifecycle of a skill within a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillStatus {
    Pending,
    Active,
    Complete,
}

impl fmt::Display for SkillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillStatus::Pending => write!(f, "pending"),
            SkillStatus::Active => write!(f, "active"),
            SkillStatus::Complete => write!(f, "complete"),
        }
    }
}

/// One of the ordered sub-topics comprising a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// 0-based position within the topic.
    pub order: usize,
    pub status: SkillStatus,
}

/// Result of completing the active skill.
#[derive(Debug, Clone)]
pub enum SkillAdvance {
    /// The next pending skill became active.
    AdvancedTo(Skill),
    /// No pending skills remain; the topic is finished.
    TrackComplete,
}

/// Ordered list of skills for a topic with a cursor to the active one.
///
/// Invariant: exactly one skill is `Active` while the track is
/// non-terminal; everything before it is `Complete`, everything after it
/// `Pending`. Skills are traversed strictly by ascending order, no
/// reordering or skipping mid-topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillTrack {
    topic_name: String,
    skills: Vec<Skill>,
    /// Equal to `skills.len()` once the track is complete.
    active_index: usize,
}

impl SkillTrack {
    /// Build a track from an ordered skill list; the first skill becomes
    /// active. Fails if the list is empty.
    pub fn new(topic_name: &str, skill_names: Vec<String>) -> Result<Self, EngineError> {
        if skill_names.is_empty() {
            return Err(EngineError::InvariantViolation(format!(
                "topic '{topic_name}' has no skills"
            )));
        }
        let skills = skill_names
            .into_iter()
            .enumerate()
            .map(|(order, name)| Skill {
                name,
                order,
                status: if order == 0 {
                    SkillStatus::Active
                } else {
                    SkillStatus::Pending
                },
            })
            .collect();
        Ok(Self {
            topic_name: topic_name.to_string(),
            skills,
            active_index: 0,
        })
    }

    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    /// The active skill; `None` once every skill is complete.
    pub fn active_skill(&self) -> Option<&Skill> {
        self.skills.get(self.active_index)
    }

    /// Mark the active skill complete and advance the cursor.
    pub fn complete_active_and_advance(&mut self) -> Result<SkillAdvance, EngineError> {
        let Some(skill) = self.skills.get_mut(self.active_index) else {
            return Err(EngineError::InvariantViolation(
                "no active skill to complete".into(),
            ));
        };
        skill.status = SkillStatus::Complete;
        self.active_index += 1;

        match self.skills.get_mut(self.active_index) {
            Some(next) => {
                next.status = SkillStatus::Active;
                Ok(SkillAdvance::AdvancedTo(next.clone()))
            }
            None => Ok(SkillAdvance::TrackComplete),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.active_index >= self.skills.len()
    }

    /// Number of completed skills.
    pub fn completed_count(&self) -> usize {
        self.active_index
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

/// One entry of the append-only answer history.
///
/// `skill` and `depth` are denormalized from the question at answer time so
/// statistics never need the (possibly popped) question itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: Uuid,
    pub skill: String,
    pub depth: u32,
    pub chosen_option_index: usize,
    pub correct: bool,
    pub answered_at: DateTime<Utc>,
}

/// Lifecycle of a learning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Abandoned,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// The persisted unit: everything needed to resume a session after a
/// process restart, including the stack mid-recursion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub skill_track: SkillTrack,
    /// Unresolved questions for the active skill.
    pub stack: QuestionStack,
    /// Append-only; one entry per submitted answer.
    pub answer_history: Vec<AnswerRecord>,
}

impl SessionState {
    /// Create a fresh session for a newly started topic.
    pub fn new(skill_track: SkillTrack) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            status: SessionStatus::Active,
            skill_track,
            stack: QuestionStack::new(),
            answer_history: Vec::new(),
        }
    }

    /// Derived listing row for session stores.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            topic: self.skill_track.topic_name().to_string(),
            status: self.status,
            skills_complete: self.skill_track.completed_count(),
            skills_total: self.skill_track.len(),
            questions_answered: self.answer_history.len(),
            questions_correct: self.answer_history.iter().filter(|r| r.correct).count(),
            updated_at: self.updated_at,
        }
    }
}

/// Compact description of a stored session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub topic: String,
    pub status: SessionStatus,
    pub skills_complete: usize,
    pub skills_total: usize,
    pub questions_answered: usize,
    pub questions_correct: usize,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> SkillTrack {
        SkillTrack::new(
            "basic math",
            vec!["counting".into(), "addition".into(), "subtraction".into()],
        )
        .unwrap()
    }

    #[test]
    fn new_track_activates_first_skill() {
        let track = track();
        let active = track.active_skill().unwrap();
        assert_eq!(active.name, "counting");
        assert_eq!(active.order, 0);
        assert_eq!(active.status, SkillStatus::Active);
        assert_eq!(track.skills()[1].status, SkillStatus::Pending);
        assert!(!track.is_complete());
    }

    #[test]
    fn empty_skill_list_rejected() {
        let err = SkillTrack::new("void", vec![]).unwrap_err();
        assert!(matches!(err, EngineError::InvariantViolation(_)));
    }

    #[test]
    fn advance_walks_skills_in_order() {
        let mut track = track();

        match track.complete_active_and_advance().unwrap() {
            SkillAdvance::AdvancedTo(skill) => assert_eq!(skill.name, "addition"),
            SkillAdvance::TrackComplete => panic!("track should not be complete"),
        }
        assert_eq!(track.skills()[0].status, SkillStatus::Complete);
        assert_eq!(track.active_skill().unwrap().name, "addition");

        track.complete_active_and_advance().unwrap();
        match track.complete_active_and_advance().unwrap() {
            SkillAdvance::TrackComplete => {}
            SkillAdvance::AdvancedTo(skill) => panic!("unexpected advance to {}", skill.name),
        }
        assert!(track.is_complete());
        assert!(track.active_skill().is_none());
        assert_eq!(track.completed_count(), 3);
    }

    #[test]
    fn advance_past_end_is_an_error() {
        let mut track = SkillTrack::new("t", vec!["only".into()]).unwrap();
        track.complete_active_and_advance().unwrap();
        assert!(track.complete_active_and_advance().is_err());
    }

    #[test]
    fn complete_skills_form_contiguous_prefix() {
        let mut track = track();
        track.complete_active_and_advance().unwrap();
        track.complete_active_and_advance().unwrap();

        let statuses: Vec<_> = track.skills().iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![
                SkillStatus::Complete,
                SkillStatus::Complete,
                SkillStatus::Active
            ]
        );
        // Active skill is always the lowest-order non-complete one.
        let active = track.active_skill().unwrap();
        assert_eq!(
            active.order,
            track
                .skills()
                .iter()
                .filter(|s| s.status != SkillStatus::Complete)
                .map(|s| s.order)
                .min()
                .unwrap()
        );
    }

    #[test]
    fn session_state_serde_roundtrip() {
        let session = SessionState::new(track());
        let json = serde_json::to_string(&session).unwrap();
        let restored: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.id, session.id);
        assert_eq!(restored.status, SessionStatus::Active);
        assert_eq!(restored.skill_track.topic_name(), "basic math");
        assert!(restored.stack.is_empty());
    }

    #[test]
    fn summary_reflects_progress() {
        let mut session = SessionState::new(track());
        session.skill_track.complete_active_and_advance().unwrap();
        let summary = session.summary();
        assert_eq!(summary.topic, "basic math");
        assert_eq!(summary.skills_complete, 1);
        assert_eq!(summary.skills_total, 3);
        assert_eq!(summary.questions_answered, 0);
        assert_eq!(summary.questions_correct, 0);
    }
}
