use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which mobility situation an exercise is adapted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobilityType {
  Wheelchair,
  LimitedStanding,
  Seated,
  LimitedRangeOfMotion,
  AmbulatoryAidUsers,
  BalanceConcerns,
  All,
}

impl MobilityType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Wheelchair => "wheelchair",
      Self::LimitedStanding => "limited_standing",
      Self::Seated => "seated",
      Self::LimitedRangeOfMotion => "limited_range_of_motion",
      Self::AmbulatoryAidUsers => "ambulatory_aid_users",
      Self::BalanceConcerns => "balance_concerns",
      Self::All => "all",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Self::Wheelchair => "Wheelchair Users",
      Self::LimitedStanding => "Limited Standing",
      Self::Seated => "Seated Exercises",
      Self::LimitedRangeOfMotion => "Limited Range of Motion",
      Self::AmbulatoryAidUsers => "Ambulatory Aid Users",
      Self::BalanceConcerns => "Balance Concerns",
      Self::All => "All Mobility Types",
    }
  }
}

impl std::fmt::Display for MobilityType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for MobilityType {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match normalize_key(s).as_str() {
      "wheelchair" => Ok(Self::Wheelchair),
      "limited_standing" => Ok(Self::LimitedStanding),
      "seated" => Ok(Self::Seated),
      "limited_range_of_motion" => Ok(Self::LimitedRangeOfMotion),
      "ambulatory_aid_users" => Ok(Self::AmbulatoryAidUsers),
      "balance_concerns" => Ok(Self::BalanceConcerns),
      "all" => Ok(Self::All),
      other => Err(format!("Unknown mobility type: {}", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Easy => "easy",
      Self::Medium => "medium",
      Self::Hard => "hard",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Self::Easy => "Easy",
      Self::Medium => "Medium",
      Self::Hard => "Challenging",
    }
  }
}

impl std::fmt::Display for Difficulty {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for Difficulty {
  type Err = String;
  /// Also accepts the level names used by imported catalogs
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match normalize_key(s).as_str() {
      "easy" | "beginner" => Ok(Self::Easy),
      "medium" | "intermediate" => Ok(Self::Medium),
      "hard" | "challenging" | "advanced" | "expert" => Ok(Self::Hard),
      other => Err(format!("Unknown difficulty: {}", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetArea {
  UpperBody,
  Core,
  LowerBody,
  Cardiovascular,
  Flexibility,
  Balance,
  Strength,
  Dexterity,
}

impl TargetArea {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::UpperBody => "upper_body",
      Self::Core => "core",
      Self::LowerBody => "lower_body",
      Self::Cardiovascular => "cardiovascular",
      Self::Flexibility => "flexibility",
      Self::Balance => "balance",
      Self::Strength => "strength",
      Self::Dexterity => "dexterity",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Self::UpperBody => "Upper Body",
      Self::Core => "Core",
      Self::LowerBody => "Lower Body",
      Self::Cardiovascular => "Cardiovascular",
      Self::Flexibility => "Flexibility",
      Self::Balance => "Balance",
      Self::Strength => "Strength",
      Self::Dexterity => "Dexterity",
    }
  }
}

impl std::fmt::Display for TargetArea {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for TargetArea {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match normalize_key(s).as_str() {
      "upper_body" => Ok(Self::UpperBody),
      "core" => Ok(Self::Core),
      "lower_body" => Ok(Self::LowerBody),
      "cardiovascular" => Ok(Self::Cardiovascular),
      "flexibility" => Ok(Self::Flexibility),
      "balance" => Ok(Self::Balance),
      "strength" => Ok(Self::Strength),
      "dexterity" => Ok(Self::Dexterity),
      other => Err(format!("Unknown target area: {}", other)),
    }
  }
}

/// Lowercase, with spaces and hyphens folded to underscores
/// ("Upper Body" and "upper-body" both become "upper_body").
pub fn normalize_key(s: &str) -> String {
  s.trim()
    .chars()
    .map(|c| match c {
      ' ' | '-' => '_',
      c => c.to_ascii_lowercase(),
    })
    .collect()
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
  pub id: String,
  pub name: String,
  pub description: String,
  pub benefits: String,
  pub mobility_types: Vec<MobilityType>,
  pub difficulty: Option<Difficulty>,
  pub equipment: Vec<String>,
  pub modifications: String,
  /// Free text; canonical values are the snake_case `TargetArea` names
  pub target_areas: Vec<String>,
  pub exercise_type: Option<String>,
  pub image_url: Option<String>,
  pub video_url: String,
  pub created_at: Option<DateTime<Utc>>,
}

/// For inserting new catalog entries (without id, created_at)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewExercise {
  pub name: String,
  pub description: String,
  pub benefits: String,
  pub mobility_types: Vec<MobilityType>,
  pub difficulty: Option<Difficulty>,
  pub equipment: Vec<String>,
  pub modifications: String,
  pub target_areas: Vec<String>,
  pub exercise_type: Option<String>,
  pub image_url: Option<String>,
  pub video_url: String,
}

/// Catalog filter. Every field is optional and all present fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseFilter {
  pub mobility_type: Option<MobilityType>,
  pub difficulty: Option<Difficulty>,
  pub target_area: Option<TargetArea>,
  pub search_term: Option<String>,
  pub exercise_type: Option<String>,
}

impl ExerciseFilter {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }

  /// New filter with every field present in `partial` taking precedence
  pub fn merge(&self, partial: ExerciseFilter) -> ExerciseFilter {
    ExerciseFilter {
      mobility_type: partial.mobility_type.or(self.mobility_type),
      difficulty: partial.difficulty.or(self.difficulty),
      target_area: partial.target_area.or(self.target_area),
      search_term: partial.search_term.or_else(|| self.search_term.clone()),
      exercise_type: partial.exercise_type.or_else(|| self.exercise_type.clone()),
    }
  }

  pub fn matches(&self, exercise: &Exercise) -> bool {
    if let Some(mobility) = self.mobility_type {
      if mobility != MobilityType::All && !exercise.mobility_types.contains(&mobility) {
        return false;
      }
    }

    if let Some(difficulty) = self.difficulty {
      if exercise.difficulty != Some(difficulty) {
        return false;
      }
    }

    if let Some(area) = self.target_area {
      let wanted = area.as_str();
      if !exercise.target_areas.iter().any(|a| normalize_key(a) == wanted) {
        return false;
      }
    }

    if let Some(kind) = self.exercise_type.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
      let matches_type = exercise
        .exercise_type
        .as_deref()
        .is_some_and(|t| t.trim().eq_ignore_ascii_case(kind));
      if !matches_type {
        return false;
      }
    }

    if let Some(term) = self.search_term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
      let term = term.to_lowercase();
      if !exercise.name.to_lowercase().contains(&term)
        && !exercise.description.to_lowercase().contains(&term)
      {
        return false;
      }
    }

    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn chair_press() -> Exercise {
    Exercise {
      id: "ex-1".to_string(),
      name: "Seated Chest Press".to_string(),
      description: "Press a resistance band forward from a chair".to_string(),
      benefits: String::new(),
      mobility_types: vec![MobilityType::Wheelchair, MobilityType::Seated],
      difficulty: Some(Difficulty::Easy),
      equipment: vec!["Resistance band".to_string()],
      modifications: String::new(),
      target_areas: vec!["Upper Body".to_string(), "strength".to_string()],
      exercise_type: Some("strength".to_string()),
      image_url: None,
      video_url: String::new(),
      created_at: None,
    }
  }

  #[test]
  fn test_empty_filter_matches_everything() {
    assert!(ExerciseFilter::default().is_empty());
    assert!(ExerciseFilter::default().matches(&chair_press()));
  }

  #[test]
  fn test_mobility_all_imposes_no_constraint() {
    let filter = ExerciseFilter {
      mobility_type: Some(MobilityType::All),
      ..Default::default()
    };
    let mut exercise = chair_press();
    exercise.mobility_types.clear();
    assert!(filter.matches(&exercise));

    let filter = ExerciseFilter {
      mobility_type: Some(MobilityType::BalanceConcerns),
      ..Default::default()
    };
    assert!(!filter.matches(&chair_press()));
  }

  #[test]
  fn test_fields_are_and_combined() {
    let filter = ExerciseFilter {
      mobility_type: Some(MobilityType::Seated),
      difficulty: Some(Difficulty::Easy),
      target_area: Some(TargetArea::UpperBody),
      search_term: Some("BAND".to_string()),
      exercise_type: Some("Strength".to_string()),
    };
    assert!(filter.matches(&chair_press()));

    let harder = ExerciseFilter {
      difficulty: Some(Difficulty::Hard),
      ..filter.clone()
    };
    assert!(!harder.matches(&chair_press()));
  }

  #[test]
  fn test_search_checks_name_and_description() {
    let by_name = ExerciseFilter {
      search_term: Some("chest".to_string()),
      ..Default::default()
    };
    let by_description = ExerciseFilter {
      search_term: Some("chair".to_string()),
      ..Default::default()
    };
    let miss = ExerciseFilter {
      search_term: Some("squat".to_string()),
      ..Default::default()
    };
    assert!(by_name.matches(&chair_press()));
    assert!(by_description.matches(&chair_press()));
    assert!(!miss.matches(&chair_press()));
  }

  #[test]
  fn test_merge_overrides_only_present_fields() {
    let base = ExerciseFilter {
      difficulty: Some(Difficulty::Easy),
      search_term: Some("press".to_string()),
      ..Default::default()
    };
    let merged = base.merge(ExerciseFilter {
      difficulty: Some(Difficulty::Medium),
      target_area: Some(TargetArea::Core),
      ..Default::default()
    });
    assert_eq!(merged.difficulty, Some(Difficulty::Medium));
    assert_eq!(merged.target_area, Some(TargetArea::Core));
    assert_eq!(merged.search_term.as_deref(), Some("press"));
    assert_eq!(base.difficulty, Some(Difficulty::Easy));
  }

  #[test]
  fn test_difficulty_accepts_level_names() {
    assert_eq!("Intermediate".parse::<Difficulty>().unwrap(), Difficulty::Medium);
    assert_eq!("beginner".parse::<Difficulty>().unwrap(), Difficulty::Easy);
    assert_eq!("Expert".parse::<Difficulty>().unwrap(), Difficulty::Hard);
    assert_eq!(Difficulty::Hard.label(), "Challenging");
  }

  #[test]
  fn test_normalize_key() {
    assert_eq!(normalize_key(" Upper Body "), "upper_body");
    assert_eq!(normalize_key("lower-body"), "lower_body");
    assert_eq!("Limited Range of Motion".parse::<MobilityType>().unwrap(), MobilityType::LimitedRangeOfMotion);
  }
}
