use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// How the user felt about a whole session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverallFeeling {
  Great,
  #[default]
  Good,
  Okay,
  Tired,
  Pain,
}

impl OverallFeeling {
  pub const ALL: [OverallFeeling; 5] = [
    OverallFeeling::Great,
    OverallFeeling::Good,
    OverallFeeling::Okay,
    OverallFeeling::Tired,
    OverallFeeling::Pain,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Great => "great",
      Self::Good => "good",
      Self::Okay => "okay",
      Self::Tired => "tired",
      Self::Pain => "pain",
    }
  }

  /// Display label
  pub fn label(&self) -> &'static str {
    match self {
      Self::Great => "Great",
      Self::Good => "Good",
      Self::Okay => "Okay",
      Self::Tired => "Tired",
      Self::Pain => "In Pain",
    }
  }
}

impl std::fmt::Display for OverallFeeling {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for OverallFeeling {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "great" => Ok(Self::Great),
      "good" => Ok(Self::Good),
      "okay" => Ok(Self::Okay),
      "tired" => Ok(Self::Tired),
      "pain" => Ok(Self::Pain),
      other => Err(format!("Unknown feeling: {}", other)),
    }
  }
}

/// A logged session, as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutLog {
  pub id: String,
  pub user_id: String,
  pub date: DateTime<Utc>,
  pub exercises: Vec<ExerciseLog>,
  pub notes: Option<String>,
  #[serde(default)]
  pub overall_feeling: OverallFeeling,
  pub created_at: Option<DateTime<Utc>>,
  pub updated_at: Option<DateTime<Utc>>,
}

/// For inserting new workout logs (id is assigned when absent)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkoutLog {
  pub id: Option<String>,
  pub user_id: String,
  pub date: DateTime<Utc>,
  pub exercises: Vec<ExerciseLog>,
  pub notes: Option<String>,
  #[serde(default)]
  pub overall_feeling: OverallFeeling,
}

/// Partial edit of an existing log; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkoutLogChanges {
  pub date: Option<DateTime<Utc>>,
  pub exercises: Option<Vec<ExerciseLog>>,
  pub notes: Option<String>,
  pub overall_feeling: Option<OverallFeeling>,
}

/// One exercise performed within a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLog {
  pub exercise_id: String,
  pub exercise_name: String,
  #[serde(default)]
  pub sets: Vec<ExerciseSet>,
  pub notes: Option<String>,
  /// 1-5 rating
  #[serde(default, deserialize_with = "lenient_rating")]
  pub difficulty: Option<u8>,
  /// 0-10 rating
  #[serde(default, deserialize_with = "lenient_rating")]
  pub pain_level: Option<u8>,
  pub modifications: Option<String>,
}

impl ExerciseLog {
  pub fn new(exercise_id: impl Into<String>, exercise_name: impl Into<String>) -> Self {
    Self {
      exercise_id: exercise_id.into(),
      exercise_name: exercise_name.into(),
      sets: Vec::new(),
      notes: None,
      difficulty: None,
      pain_level: None,
      modifications: None,
    }
  }
}

/// One performed set. Every numeric field is optional and counts as zero
/// when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
  #[serde(default, deserialize_with = "lenient_number")]
  pub reps: Option<f64>,
  /// lbs or kg, whichever the user logs in
  #[serde(default, deserialize_with = "lenient_number")]
  pub weight: Option<f64>,
  /// minutes, as entered on the log form and plotted on the chart
  #[serde(default, deserialize_with = "lenient_number")]
  pub duration: Option<f64>,
  /// meters
  #[serde(default, deserialize_with = "lenient_number")]
  pub distance: Option<f64>,
  /// bands, machines
  #[serde(default, deserialize_with = "lenient_number")]
  pub resistance_level: Option<f64>,
  #[serde(default)]
  pub completed: bool,
}

/// Accepts numbers, numeric strings and null. Anything else (including
/// non-finite values) is read as unset rather than rejected.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  let number = match value {
    Some(serde_json::Value::Number(n)) => n.as_f64(),
    Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
    _ => None,
  };
  Ok(number.filter(|n| n.is_finite()))
}

/// Ratings go through `lenient_number` and are rounded. Values outside the
/// 0-10 scale are read as unset.
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
  D: Deserializer<'de>,
{
  let number = lenient_number(deserializer)?;
  Ok(number.map(f64::round).filter(|n| (0.0..=10.0).contains(n)).map(|n| n as u8))
}
