//! OpenAI API provider implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use recque_core::error::ProviderError;
use recque_core::traits::{GeneratedQuestion, QuestionProvider, QuestionRequest};

use crate::prompts::{
    self, parse_payload, QuestionPayload, ReviewPayload, SkillsPayload,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const TEMPERATURE: f64 = 0.7;

/// OpenAI-compatible chat completions provider.
///
/// Uses JSON mode so responses are guaranteed to be a single JSON object.
/// With `verify` enabled, every generated question is sent back to the
/// model for review and the correct answer is repaired if the review
/// disagrees with it.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    model: String,
    org_id: Option<String>,
    verify: bool,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, base_url: Option<String>, model: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            org_id: None,
            verify: false,
            client,
        }
    }

    pub fn with_org_id(mut self, org_id: Option<String>) -> Self {
        self.org_id = org_id;
        self
    }

    /// Enable the verify-and-repair pass on generated questions.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// One chat completion round trip; returns the assistant message text.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = OpenAiRequest {
            model: self.model.clone(),
            temperature: TEMPERATURE,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
            messages: vec![OpenAiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");

        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(DEFAULT_TIMEOUT_SECS)
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            });
        }

        let api_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse response: {e}")))?;

        api_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("response contained no choices".into()))
    }

    /// Ask the model to review its own question; replace the correct
    /// answer when the review provides a correction.
    async fn verify_question(
        &self,
        mut payload: QuestionPayload,
    ) -> Result<QuestionPayload, ProviderError> {
        let content = self.complete(&prompts::review_prompt(&payload)).await?;
        let review: ReviewPayload = parse_payload(&content)?;
        if !review.valid {
            if let Some(corrected) = review.corrected_answer {
                tracing::warn!(
                    question = %payload.question_text,
                    %corrected,
                    "review corrected the answer"
                );
                payload.correct_answer = corrected;
            }
        }
        Ok(payload)
    }
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    temperature: f64,
    response_format: ResponseFormat,
    messages: Vec<OpenAiMessage>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    content: String,
}

#[async_trait]
impl QuestionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn generate_skills(&self, topic: &str) -> Result<Vec<String>, ProviderError> {
        let content = self.complete(&prompts::skill_list_prompt(topic)).await?;
        let payload: SkillsPayload = parse_payload(&content)?;
        Ok(payload.skills)
    }

    #[instrument(skip(self, request), fields(model = %self.model, skill = %request.skill, depth = request.depth))]
    async fn generate_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<GeneratedQuestion, ProviderError> {
        let content = self.complete(&prompts::question_prompt(request)).await?;
        let mut payload: QuestionPayload = parse_payload(&content)?;
        if self.verify {
            payload = self.verify_question(payload).await?;
        }
        Ok(prompts::assemble_question(payload))
    }
}
