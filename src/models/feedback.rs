use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
  Helpfulness,
  Difficulty,
}

impl FeedbackKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Helpfulness => "helpfulness",
      Self::Difficulty => "difficulty",
    }
  }
}

impl std::str::FromStr for FeedbackKind {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "helpfulness" => Ok(Self::Helpfulness),
      "difficulty" => Ok(Self::Difficulty),
      _ => Err(format!("Unknown feedback kind: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackValue {
  Helpful,
  NotHelpful,
  TooEasy,
  JustRight,
  TooHard,
}

impl FeedbackValue {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Helpful => "helpful",
      Self::NotHelpful => "not_helpful",
      Self::TooEasy => "too_easy",
      Self::JustRight => "just_right",
      Self::TooHard => "too_hard",
    }
  }

  /// The kind of question this answer belongs to
  pub fn kind(&self) -> FeedbackKind {
    match self {
      Self::Helpful | Self::NotHelpful => FeedbackKind::Helpfulness,
      Self::TooEasy | Self::JustRight | Self::TooHard => FeedbackKind::Difficulty,
    }
  }
}

impl std::str::FromStr for FeedbackValue {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "helpful" => Ok(Self::Helpful),
      "not_helpful" => Ok(Self::NotHelpful),
      "too_easy" => Ok(Self::TooEasy),
      "just_right" => Ok(Self::JustRight),
      "too_hard" => Ok(Self::TooHard),
      _ => Err(format!("Unknown feedback value: {}", s)),
    }
  }
}

/// A user's reaction to a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
  pub user_id: String,
  pub exercise_name: String,
  pub recommendation_text: String,
  pub kind: FeedbackKind,
  pub value: FeedbackValue,
}

/// A recorded feedback entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFeedback {
  pub id: i64,
  #[serde(flatten)]
  pub feedback: Feedback,
  pub created_at: DateTime<Utc>,
}
