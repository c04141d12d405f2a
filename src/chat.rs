//! Chat proxy for exercise advice
//!
//! Prepends the exercise-specialist system prompt (with the user's mobility
//! profile when known) to the conversation and forwards it to an
//! OpenAI-compatible chat-completion endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::ChatConfig;
use crate::models::MobilityProfile;

const SYSTEM_PROMPT: &str = include_str!("prompts/exercise_specialist.txt");
const NONE_PROVIDED: &str = "None provided";

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Serialize)]
pub enum ChatError {
  #[error("API key not configured")]
  MissingApiKey,

  #[error("Request failed: {0}")]
  Request(String),

  #[error("API error: {0}")]
  Api(String),

  #[error("Parse error: {0}")]
  Parse(String),

  #[error("No reply in response")]
  EmptyResponse,
}

/// ---------------------------------------------------------------------------
/// Conversation Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
  System,
  User,
  Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role: ChatRole,
  pub content: String,
}

impl ChatMessage {
  pub fn user(content: impl Into<String>) -> Self {
    Self {
      role: ChatRole::User,
      content: content.into(),
    }
  }

  pub fn assistant(content: impl Into<String>) -> Self {
    Self {
      role: ChatRole::Assistant,
      content: content.into(),
    }
  }
}

/// What the assistant is told about the user. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileContext {
  pub mobility_condition: Option<String>,
  pub condition_details: Option<String>,
  pub movement_limitations: Vec<String>,
  pub assistive_devices: Vec<String>,
  pub exercise_goals: Vec<String>,
  pub preferred_exercise_types: Vec<String>,
  pub pain_areas: Vec<String>,
}

impl From<&MobilityProfile> for ProfileContext {
  fn from(profile: &MobilityProfile) -> Self {
    let text = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
    Self {
      mobility_condition: text(&profile.mobility_condition),
      condition_details: text(&profile.condition_details),
      movement_limitations: profile.movement_limitations.clone(),
      assistive_devices: profile.assistive_devices.clone(),
      exercise_goals: profile.exercise_goals.clone(),
      preferred_exercise_types: profile.preferred_exercise_types.clone(),
      pain_areas: profile.pain_areas.clone(),
    }
  }
}

impl ProfileContext {
  /// One bullet per questionnaire field
  pub fn summary(&self) -> String {
    let text = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| NONE_PROVIDED.to_string());
    let list = |v: &[String]| if v.is_empty() { NONE_PROVIDED.to_string() } else { v.join(", ") };

    [
      format!("- Mobility condition: {}", text(&self.mobility_condition)),
      format!("- Condition details: {}", text(&self.condition_details)),
      format!("- Movement limitations: {}", list(&self.movement_limitations)),
      format!("- Assistive devices: {}", list(&self.assistive_devices)),
      format!("- Exercise goals: {}", list(&self.exercise_goals)),
      format!("- Preferred exercise types: {}", list(&self.preferred_exercise_types)),
      format!("- Pain areas: {}", list(&self.pain_areas)),
    ]
    .join("\n")
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
  pub messages: Vec<ChatMessage>,
  #[serde(default)]
  pub profile: Option<ProfileContext>,
  /// Falls back to the configured limit
  #[serde(default)]
  pub max_tokens: Option<u32>,
  /// Falls back to the configured model
  #[serde(default)]
  pub model: Option<String>,
}

impl ChatRequest {
  pub fn new(messages: Vec<ChatMessage>) -> Self {
    Self {
      messages,
      profile: None,
      max_tokens: None,
      model: None,
    }
  }

  pub fn with_profile(mut self, profile: Option<ProfileContext>) -> Self {
    self.profile = profile;
    self
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
  pub message: ChatMessage,
}

/// The system message opening every conversation
pub fn system_message(profile: Option<&ProfileContext>) -> ChatMessage {
  let content = match profile {
    Some(profile) => format!(
      "{}\n\nUser has the following mobility profile:\n{}",
      SYSTEM_PROMPT.trim(),
      profile.summary()
    ),
    None => SYSTEM_PROMPT.trim().to_string(),
  };
  ChatMessage {
    role: ChatRole::System,
    content,
  }
}

/// ---------------------------------------------------------------------------
/// Completion API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
  model: &'a str,
  max_tokens: u32,
  messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
  content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
  error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// Chat Client
/// ---------------------------------------------------------------------------

pub struct ChatClient {
  client: Client,
  config: ChatConfig,
}

impl ChatClient {
  pub fn new(config: ChatConfig) -> Self {
    Self {
      client: Client::new(),
      config,
    }
  }

  /// Send the conversation and return the assistant's reply
  pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
    let api_key = self.config.api_key.as_deref().ok_or(ChatError::MissingApiKey)?;
    let url = self
      .config
      .api_base
      .join("chat/completions")
      .map_err(|e| ChatError::Request(e.to_string()))?;

    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    messages.push(system_message(request.profile.as_ref()));
    messages.extend(request.messages.iter().cloned());

    let body = CompletionRequest {
      model: request.model.as_deref().unwrap_or(&self.config.model),
      max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
      messages,
    };
    debug!(model = body.model, turns = request.messages.len(), "Sending chat completion");

    let response = self
      .client
      .post(url)
      .bearer_auth(api_key)
      .json(&body)
      .send()
      .await
      .map_err(|e| ChatError::Request(e.to_string()))?;

    let status = response.status();
    let text = response
      .text()
      .await
      .map_err(|e| ChatError::Request(e.to_string()))?;

    if !status.is_success() {
      error!(status = %status, "Chat completion failed");
      if let Ok(error_resp) = serde_json::from_str::<ApiErrorResponse>(&text) {
        return Err(ChatError::Api(error_resp.error.message));
      }
      return Err(ChatError::Api(format!("HTTP {}: {}", status, text)));
    }

    let completion: CompletionResponse =
      serde_json::from_str(&text).map_err(|e| ChatError::Parse(e.to_string()))?;

    let content = completion
      .choices
      .into_iter()
      .next()
      .and_then(|choice| choice.message.content)
      .ok_or(ChatError::EmptyResponse)?;

    Ok(ChatResponse {
      message: ChatMessage::assistant(content),
    })
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
