//! Prompt construction and wire payloads shared by the HTTP providers.
//!
//! All providers speak the same JSON dialect: a `skills` object for skill
//! lists and a `question_text`/`correct_answer`/`incorrect_answers` object
//! for questions. Answer order is decided here, after parsing, so models
//! never learn a positional bias toward the correct option.

use rand::seq::SliceRandom;
use serde::Deserialize;

use recque_core::error::ProviderError;
use recque_core::traits::{extract_json_from_markdown, GeneratedQuestion, QuestionRequest};

/// Appended to every question prompt so all providers get identical
/// formatting instructions.
const QUESTION_FORMAT: &str = "\
Respond with a JSON object with exactly three fields:
question_text: the question stem as a single string, without any answer alternatives.
correct_answer: the correct answer as a string.
incorrect_answers: an array of 3 plausible but incorrect answer strings.
Respond only with the JSON object and no additional commentary.";

/// Prompt for the ordered skill list of a topic.
pub fn skill_list_prompt(topic: &str) -> String {
    format!(
        "Task:
Generate a list of skills for the topic: {topic}.
The list should contain 3 concepts in a natural progression that are \
important to understand the topic, ordered from foundational to advanced.
Respond with a JSON object with a single field:
skills: an array of skill name strings in learning order, without numbering.
Respond only with the JSON object and no additional commentary."
    )
}

/// Prompt for a question at the requested depth. Depth 0 asks for a
/// challenging root question; deeper requests target the misconception
/// revealed by the previous wrong answer.
pub fn question_prompt(request: &QuestionRequest) -> String {
    match &request.misconception {
        None => format!(
            "Task:
Create an insightful and challenging multiple choice question focused on \
this skill: {skill}.
The learner is studying the topic: {topic}.
It should test genuine understanding of the skill, not trivia.
{QUESTION_FORMAT}",
            skill = request.skill,
            topic = request.topic,
        ),
        Some(ctx) => format!(
            "Task:
Generate a simpler question about {skill} based on this question: {prior}
The learner answered \"{chosen}\", which is incorrect.
The new question should address the misconception revealed by that answer \
and test a more fundamental piece of the same skill.
{QUESTION_FORMAT}",
            skill = request.skill,
            prior = ctx.prior_prompt,
            chosen = ctx.chosen_answer,
        ),
    }
}

/// Prompt asking the model to review a question it just generated.
pub fn review_prompt(payload: &QuestionPayload) -> String {
    format!(
        "Task:
Review this multiple choice question for correctness.
Question: {question}
Stated correct answer: {correct}
Incorrect answers: {incorrect:?}
Verify that the stated correct answer is actually correct and that every \
incorrect answer is actually wrong.
Respond with a JSON object with two fields:
valid: true if the question is sound as stated, false otherwise.
corrected_answer: the actually-correct answer as a string if the stated \
one is wrong, otherwise null.
Respond only with the JSON object and no additional commentary.",
        question = payload.question_text,
        correct = payload.correct_answer,
        incorrect = payload.incorrect_answers,
    )
}

/// Wire payload for a skill list response.
#[derive(Debug, Deserialize)]
pub struct SkillsPayload {
    pub skills: Vec<String>,
}

/// Wire payload for a question response.
#[derive(Debug, Deserialize)]
pub struct QuestionPayload {
    pub question_text: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

/// Wire payload for a question review response.
#[derive(Debug, Deserialize)]
pub struct ReviewPayload {
    pub valid: bool,
    #[serde(default)]
    pub corrected_answer: Option<String>,
}

/// Parse a model response into a typed payload, tolerating markdown
/// fences around the JSON.
pub fn parse_payload<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, ProviderError> {
    let json = extract_json_from_markdown(content);
    serde_json::from_str(json)
        .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse model output: {e}")))
}

/// Shuffle the correct and incorrect answers into a single option list and
/// track where the correct one landed.
pub fn assemble_question(payload: QuestionPayload) -> GeneratedQuestion {
    let mut options = Vec::with_capacity(payload.incorrect_answers.len() + 1);
    options.push(payload.correct_answer.clone());
    options.extend(payload.incorrect_answers);
    options.shuffle(&mut rand::rng());

    // The correct answer was pushed above, so it is always found.
    let correct_option_index = options
        .iter()
        .position(|o| *o == payload.correct_answer)
        .unwrap_or(0);

    GeneratedQuestion {
        prompt_text: payload.question_text,
        options,
        correct_option_index,
    }
}
