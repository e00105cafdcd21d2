//! Request/response shapes spoken by provider endpoints.
//!
//! A [`Dialect`] turns a [`GenerationRequest`] into the JSON body an endpoint
//! expects, and pulls the generated text back out of its response. This is
//! the only provider-specific logic; transport, retry and quota handling are
//! shared by every provider.

use serde::{Deserialize, Serialize};

use crate::types::GenerationRequest;
use crate::{RelayError, Result};

/// Sampling defaults applied when a request leaves a parameter unset.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_TOP_K: u32 = 40;

/// Wire format of a provider endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialect {
    /// Google Gemini `generateContent`.
    Gemini,
    /// OpenAI-style `/chat/completions` (DeepSeek, OpenRouter, Ollama, ...).
    ChatCompletions { model: String },
}

impl Dialect {
    /// Shorthand for [`Dialect::ChatCompletions`].
    pub fn chat_completions(model: impl Into<String>) -> Self {
        Dialect::ChatCompletions {
            model: model.into(),
        }
    }

    /// Build the JSON request body.
    pub fn build_payload(&self, request: &GenerationRequest) -> Result<serde_json::Value> {
        let temperature = request.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        let max_tokens = request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        let top_p = request.top_p.unwrap_or(DEFAULT_TOP_P);

        let payload = match self {
            Dialect::Gemini => serde_json::to_value(GeminiRequest {
                contents: vec![GeminiContent {
                    parts: vec![GeminiPart {
                        text: Some(request.prompt.clone()),
                    }],
                }],
                generation_config: GenerationConfig {
                    temperature,
                    max_output_tokens: max_tokens,
                    top_p,
                    top_k: request.top_k.unwrap_or(DEFAULT_TOP_K),
                },
            }),
            // Chat completions have no top-k knob; it is dropped.
            Dialect::ChatCompletions { model } => serde_json::to_value(ChatRequest {
                model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: &request.prompt,
                }],
                temperature,
                max_tokens,
                top_p,
                stream: false,
            }),
        };
        Ok(payload?)
    }

    /// Extract the generated text from a response body.
    pub fn parse_content(&self, body: &str) -> Result<String> {
        match self {
            Dialect::Gemini => {
                let response: GeminiResponse = serde_json::from_str(body)
                    .map_err(|e| RelayError::MalformedResponse(e.to_string()))?;
                let candidate = response.candidates.into_iter().next().ok_or_else(|| {
                    RelayError::MalformedResponse("response has no candidates".to_string())
                })?;
                Ok(candidate
                    .content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect())
            }
            Dialect::ChatCompletions { .. } => {
                let response: ChatResponse = serde_json::from_str(body)
                    .map_err(|e| RelayError::MalformedResponse(e.to_string()))?;
                let choice = response.choices.into_iter().next().ok_or_else(|| {
                    RelayError::MalformedResponse("response has no choices".to_string())
                })?;
                Ok(choice.message.content.unwrap_or_default())
            }
        }
    }
}

// ============================================================================
// Gemini wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    top_k: u32,
}

#[derive(Default, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    // absent on safety-blocked candidates
    #[serde(default)]
    content: GeminiContent,
}

// ============================================================================
// Chat completions wire types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}
