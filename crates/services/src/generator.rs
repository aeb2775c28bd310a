use std::env;

use quiz_core::model::QuestionDraft;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::GeneratorError;

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GeneratorConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("QUIZ_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("QUIZ_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("QUIZ_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Generates multiple-choice question drafts for a topic via a
/// chat-completions endpoint. Drafts still pass through core validation
/// before they can become quiz questions.
#[derive(Clone)]
pub struct QuizGeneratorService {
    client: Client,
    config: Option<GeneratorConfig>,
}

impl QuizGeneratorService {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeneratorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Generate question drafts for a topic.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError` when the service is disabled, the request
    /// fails, or the response cannot be parsed into question drafts.
    pub async fn generate_questions(
        &self,
        topic: &str,
        count: usize,
    ) -> Result<Vec<QuestionDraft>, GeneratorError> {
        let config = self.config.as_ref().ok_or(GeneratorError::Disabled)?;

        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: question_prompt(topic, count),
            }],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeneratorError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GeneratorError::EmptyResponse)?;

        parse_question_drafts(&content)
    }
}

fn question_prompt(topic: &str, count: usize) -> String {
    format!(
        "Write {count} multiple-choice questions about \"{topic}\". \
         Respond with a JSON array only, each element an object with keys \
         \"prompt\" (string), \"options\" (array of 2-6 strings), \
         \"correct_option\" (zero-based index into options) and an optional \
         \"explanation\" (string)."
    )
}

/// Parse the model's reply into drafts. Models often wrap JSON in a
/// markdown code fence, so one is stripped if present.
fn parse_question_drafts(content: &str) -> Result<Vec<QuestionDraft>, GeneratorError> {
    let trimmed = strip_code_fence(content.trim());
    if trimmed.is_empty() {
        return Err(GeneratorError::EmptyResponse);
    }
    let drafts: Vec<QuestionDraft> =
        serde_json::from_str(trimmed).map_err(|e| GeneratorError::Malformed(e.to_string()))?;
    if drafts.is_empty() {
        return Err(GeneratorError::EmptyResponse);
    }
    Ok(drafts)
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches('\n')
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
