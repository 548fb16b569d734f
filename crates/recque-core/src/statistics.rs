//! Session statistics derived from the answer history.
//!
//! Everything here is computed on demand from `SessionState`; nothing is
//! accumulated separately, so statistics can never drift from the history.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::SessionState;

/// Aggregate counters for one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    /// Total answers submitted, correct and incorrect.
    pub total_answers: usize,
    pub correct_answers: usize,
    /// Fraction in `[0, 1]`; 0.0 when nothing was answered.
    pub accuracy: f64,
    /// Deepest question depth ever answered. `None` before any answer.
    pub max_depth_reached: Option<u32>,
    /// Per-skill breakdown, ordered by skill name.
    pub per_skill: BTreeMap<String, SkillStats>,
}

/// Counters for a single skill.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SkillStats {
    pub total_answers: usize,
    pub correct_answers: usize,
    /// How many simpler questions this skill needed (answers at depth > 0).
    pub subquestion_answers: usize,
}

impl SkillStats {
    pub fn accuracy(&self) -> f64 {
        if self.total_answers == 0 {
            0.0
        } else {
            self.correct_answers as f64 / self.total_answers as f64
        }
    }
}

impl SessionStats {
    /// Compute statistics for a session from its answer history.
    pub fn for_session(session: &SessionState) -> Self {
        let history = &session.answer_history;
        let total_answers = history.len();
        let correct_answers = history.iter().filter(|r| r.correct).count();
        let max_depth_reached = history.iter().map(|r| r.depth).max();

        let mut per_skill: BTreeMap<String, SkillStats> = BTreeMap::new();
        for record in history {
            let entry = per_skill.entry(record.skill.clone()).or_default();
            entry.total_answers += 1;
            if record.correct {
                entry.correct_answers += 1;
            }
            if record.depth > 0 {
                entry.subquestion_answers += 1;
            }
        }

        let accuracy = if total_answers == 0 {
            0.0
        } else {
            correct_answers as f64 / total_answers as f64
        };

        Self {
            total_answers,
            correct_answers,
            accuracy,
            max_depth_reached,
            per_skill,
        }
    }
}
