//! Gemini REST client implementing [`QuizGateway`].
//!
//! Every call asks for a JSON response constrained by a response schema, extracts the
//! first candidate's text, and decodes it through the validating decoders in
//! [`super::gateway`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::domain::{Axis, InterpretationDetail, PersonalityType, Question};
use super::gateway::{
    decode_interpretation, decode_question, decode_question_set, decode_suggestions,
    GatewayError, QuizGateway,
};
use crate::config::GatewayConfig;

#[derive(Clone)]
pub struct GeminiGateway {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGateway")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiGateway {
    pub fn new(api_key: impl Into<String>, config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn generate(&self, prompt: String, schema: Value) -> Result<String, GatewayError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| GatewayError::Malformed(format!("Gemini envelope: {err}")))?;
        extract_text(parsed)
    }
}

#[async_trait]
impl QuizGateway for GeminiGateway {
    async fn suggest_topics(
        &self,
        keyword: &str,
        style: Option<&str>,
    ) -> Result<Vec<String>, GatewayError> {
        let text = self
            .generate(suggestion_prompt(keyword, style), suggestion_schema())
            .await?;
        decode_suggestions(&text).inspect_err(|err| warn!(%err, "suggestion payload rejected"))
    }

    async fn generate_questions(&self, topic: &str) -> Result<Vec<Question>, GatewayError> {
        let text = self
            .generate(question_set_prompt(topic), question_set_schema())
            .await?;
        decode_question_set(&text).inspect_err(|err| warn!(%err, "question payload rejected"))
    }

    async fn generate_tie_breaker(
        &self,
        topic: &str,
        axis: Axis,
    ) -> Result<Question, GatewayError> {
        let text = self
            .generate(tie_breaker_prompt(topic, axis), question_schema())
            .await?;
        decode_question(&text).inspect_err(|err| warn!(%err, "tie-breaker payload rejected"))
    }

    async fn generate_interpretation(
        &self,
        topic: &str,
        personality_type: &PersonalityType,
    ) -> Result<InterpretationDetail, GatewayError> {
        let text = self
            .generate(
                interpretation_prompt(topic, personality_type),
                interpretation_schema(),
            )
            .await?;
        debug!(bytes = text.len(), "interpretation payload received");
        decode_interpretation(&text)
    }
}

pub(crate) fn suggestion_prompt(keyword: &str, style: Option<&str>) -> String {
    let style_instruction = match style.map(str::trim).filter(|s| !s.is_empty()) {
        Some(style) => format!(" The topics should have a '{style}' style."),
        None => String::new(),
    };
    format!(
        "You are a creative copywriter. Based on the keyword \"{keyword}\", generate 3 creative, \
         fun, and intriguing MBTI test topics.{style_instruction} The topics should be in Korean. \
         Respond with a JSON array of strings only."
    )
}

pub(crate) fn question_set_prompt(topic: &str) -> String {
    format!(
        "You are an expert MBTI test creator. Based on the topic \"{topic}\", generate a set of 12 \
         balanced MBTI questionnaire questions with exactly 3 questions for each of the four \
         dimensions E/I, S/N, T/F, J/P. Give every question a single relevant emoji in `icon`, a \
         unique id like \"q1\", \"q2\", and a weight of 1. Each question has two choices with ids \
         \"L\" and \"R\", each scoring toward one letter of the question's dimension. Questions \
         and choices must be in Korean and contextual to the topic."
    )
}

pub(crate) fn tie_breaker_prompt(topic: &str, axis: Axis) -> String {
    let (left, right) = axis.dimensions();
    format!(
        "You are an expert MBTI test creator. Generate exactly ONE insightful tie-breaker \
         question to determine the preference between {left} and {right} for the topic \
         \"{topic}\". Give it a single relevant emoji in `icon`, an id like \"q_tie_{code}\", a \
         weight of 2, and the dimension \"{code}\". Choice \"L\" scores toward {left} and choice \
         \"R\" toward {right}. The question and choices must be in Korean.",
        code = axis.code()
    )
}

pub(crate) fn interpretation_prompt(topic: &str, personality_type: &PersonalityType) -> String {
    format!(
        "You are a helpful personality analyst. Provide a detailed personality analysis for \
         someone with the MBTI type {personality_type}, specifically in the context of \
         \"{topic}\". Include a creative character-like title, one emoji, a 2-3 line summary, \
         the best matching type with a short reason, 2-3 strengths, 2-3 weaknesses and 3-4 \
         characteristic keywords. The entire response must be in Korean."
    )
}

fn suggestion_schema() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

fn question_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "id": { "type": "STRING" },
            "text": { "type": "STRING" },
            "icon": { "type": "STRING" },
            "dimension": { "type": "STRING", "enum": ["EI", "SN", "TF", "JP"] },
            "weight": { "type": "INTEGER" },
            "choices": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING", "enum": ["L", "R"] },
                        "label": { "type": "STRING" },
                        "polarity": {
                            "type": "STRING",
                            "enum": ["E", "I", "S", "N", "T", "F", "J", "P"]
                        }
                    },
                    "required": ["id", "label", "polarity"]
                }
            }
        },
        "required": ["id", "text", "icon", "dimension", "weight", "choices"]
    })
}

fn question_set_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "questions": { "type": "ARRAY", "items": question_schema() }
        },
        "required": ["questions"]
    })
}

fn interpretation_schema() -> Value {
    let string_list = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "emoji": { "type": "STRING" },
            "summary": { "type": "STRING" },
            "match": {
                "type": "OBJECT",
                "properties": {
                    "type": { "type": "STRING" },
                    "description": { "type": "STRING" }
                },
                "required": ["type", "description"]
            },
            "strengths": string_list.clone(),
            "weaknesses": string_list.clone(),
            "characteristics": string_list
        },
        "required": [
            "title", "emoji", "summary", "match", "strengths", "weaknesses", "characteristics"
        ]
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Option<Vec<PartResponse>>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text(response: GenerateContentResponse) -> Result<String, GatewayError> {
    let text: String = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .map(|parts| parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GatewayError::EmptyResponse);
    }
    Ok(text)
}

fn map_http_error(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            match wrapper.error.status {
                Some(status_text) if !status_text.is_empty() => format!("{status_text}: {msg}"),
                _ => msg,
            }
        })
        .unwrap_or_else(|_| body.to_string());

    GatewayError::Status {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_concatenated_candidate_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "[\"a\"," }, { "text": "\"b\"]" }] } }
            ]
        }))
        .expect("envelope parses");

        let text = extract_text(response).expect("text present");
        assert_eq!(decode_suggestions(&text).expect("decodes"), vec!["a", "b"]);
    }

    #[test]
    fn missing_candidates_is_an_empty_response() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [] })).expect("envelope parses");
        assert_eq!(extract_text(response), Err(GatewayError::EmptyResponse));
    }

    #[test]
    fn http_errors_carry_the_service_message() {
        let body = r#"{"error": {"code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            map_http_error(StatusCode::TOO_MANY_REQUESTS, body),
            GatewayError::Status {
                status: 429,
                message: "RESOURCE_EXHAUSTED: quota exceeded".to_string(),
            }
        );
        assert_eq!(
            map_http_error(StatusCode::BAD_GATEWAY, "upstream down"),
            GatewayError::Status {
                status: 502,
                message: "upstream down".to_string(),
            }
        );
    }

    #[test]
    fn prompts_carry_the_inputs() {
        assert!(suggestion_prompt("여행", Some("재미있게")).contains("'재미있게' style"));
        assert!(!suggestion_prompt("여행", Some("  ")).contains("style."));
        let tie = tie_breaker_prompt("여행 스타일 테스트", Axis::TF);
        assert!(tie.contains("between T and F"));
        assert!(tie.contains("\"TF\""));
    }
}
