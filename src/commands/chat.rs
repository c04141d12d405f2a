//! Chat and recommendation feedback commands

use tracing::warn;

use crate::chat::{ChatClient, ChatRequest, ChatResponse, ProfileContext};
use crate::db::AppState;
use crate::feedback;
use crate::models::{Feedback, StoredFeedback};
use crate::profile;

/// Forward a conversation to the assistant. When the request carries no
/// profile and a user is given, the stored questionnaire is attached.
pub async fn send_chat(
  state: &AppState,
  user_id: Option<String>,
  mut request: ChatRequest,
) -> Result<ChatResponse, String> {
  if request.messages.is_empty() {
    return Err("A chat needs at least one message".to_string());
  }

  if request.profile.is_none() {
    if let Some(user_id) = user_id.as_deref() {
      match profile::get_profile(&state.db, user_id).await {
        Ok(stored) => request.profile = stored.as_ref().map(ProfileContext::from),
        Err(e) => warn!(user_id = %user_id, error = %e, "Sending chat without profile"),
      }
    }
  }

  ChatClient::new(state.config.chat.clone())
    .complete(&request)
    .await
    .map_err(|e| format!("Failed to get AI response: {}", e))
}

pub async fn submit_feedback(state: &AppState, feedback: Feedback) -> Result<i64, String> {
  feedback::submit_feedback(&state.db, &feedback)
    .await
    .map_err(|e| format!("Failed to submit feedback: {}", e))
}

pub async fn get_feedback(state: &AppState, user_id: String) -> Result<Vec<StoredFeedback>, String> {
  feedback::list_feedback(&state.db, &user_id)
    .await
    .map_err(|e| format!("Failed to load feedback: {}", e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::chat::ChatMessage;
  use crate::config::ChatConfig;
  use crate::models::{FeedbackKind, FeedbackValue};
  use crate::test_utils::*;
  use mockito::Matcher;

  #[tokio::test]
  async fn test_send_chat_attaches_stored_profile() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/chat/completions")
      .match_body(Matcher::Regex("Mobility condition: Wheelchair user".to_string()))
      .with_status(200)
      .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "Try arm circles."}}]}"#)
      .create_async()
      .await;

    let mut config = test_config();
    config.chat = ChatConfig::with_base(Some("sk-test".into()), &server.url()).unwrap();
    let state = AppState::new(setup_test_db().await, config);
    crate::profile::upsert_profile(&state.db, &create_mock_profile("user-1")).await.unwrap();

    let request = ChatRequest::new(vec![ChatMessage::user("Any ideas for today?")]);
    let response = send_chat(&state, Some("user-1".into()), request).await.unwrap();
    assert_eq!(response.message.content, "Try arm circles.");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_send_chat_without_key_or_messages() {
    let state = setup_test_state().await;

    let err = send_chat(&state, None, ChatRequest::new(vec![])).await.unwrap_err();
    assert_eq!(err, "A chat needs at least one message");

    let err = send_chat(&state, None, ChatRequest::new(vec![ChatMessage::user("Hi")]))
      .await
      .unwrap_err();
    assert_eq!(err, "Failed to get AI response: API key not configured");
  }

  #[tokio::test]
  async fn test_feedback_roundtrip() {
    let state = setup_test_state().await;
    let feedback = Feedback {
      user_id: "user-1".into(),
      exercise_name: "Seated Marching".into(),
      recommendation_text: "March for two minutes".into(),
      kind: FeedbackKind::Difficulty,
      value: FeedbackValue::TooEasy,
    };

    submit_feedback(&state, feedback.clone()).await.unwrap();
    let stored = get_feedback(&state, "user-1".into()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].feedback, feedback);

    let bad = Feedback {
      value: FeedbackValue::Helpful,
      ..feedback
    };
    assert!(submit_feedback(&state, bad).await.unwrap_err().contains("not a difficulty answer"));
  }
}
