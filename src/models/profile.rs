use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MOBILITY_CONDITIONS: &[&str] = &[
  "Wheelchair user",
  "Amputation",
  "Cerebral palsy",
  "Multiple sclerosis",
  "Stroke",
  "Spinal cord injury",
  "Arthritis",
  "Muscular dystrophy",
  "Parkinson's disease",
  "Temporary injury",
  "Other",
];

pub const MOVEMENT_LIMITATIONS: &[&str] = &[
  "Limited arm mobility",
  "Limited leg mobility",
  "Limited trunk/core mobility",
  "Balance issues",
  "Coordination difficulties",
  "Reduced grip strength",
  "Limited range of motion",
  "Fatigue with movement",
  "Pain with certain movements",
];

pub const ASSISTIVE_DEVICES: &[&str] = &[
  "Wheelchair (manual)",
  "Wheelchair (electric)",
  "Walker",
  "Cane",
  "Crutches",
  "Prosthetic limb",
  "Orthotic device",
  "None",
  "Other",
];

pub const EXERCISE_GOALS: &[&str] = &[
  "Improve cardiovascular health",
  "Increase strength",
  "Improve flexibility",
  "Increase endurance",
  "Weight management",
  "Pain reduction",
  "Improve balance",
  "Improve coordination",
  "Maintain current abilities",
  "Rehabilitation from injury",
];

pub const EXERCISE_TYPES: &[&str] = &[
  "Seated exercises",
  "Water exercises/swimming",
  "Resistance training",
  "Stretching/flexibility",
  "Cardiovascular training",
  "Balance exercises",
  "Yoga/modified yoga",
  "Tai chi",
  "Physical therapy exercises",
];

pub const PAIN_AREAS: &[&str] = &[
  "Neck",
  "Shoulders",
  "Back (upper)",
  "Back (lower)",
  "Arms",
  "Elbows",
  "Wrists/hands",
  "Hips",
  "Knees",
  "Ankles/feet",
  "Joints (general)",
  "Legs",
];

/// Answers to the mobility questionnaire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MobilityProfile {
  pub user_id: String,
  pub mobility_condition: String,
  #[serde(default)]
  pub condition_details: String,
  #[serde(default)]
  pub movement_limitations: Vec<String>,
  #[serde(default)]
  pub assistive_devices: Vec<String>,
  #[serde(default)]
  pub exercise_goals: Vec<String>,
  #[serde(default)]
  pub preferred_exercise_types: Vec<String>,
  #[serde(default)]
  pub pain_areas: Vec<String>,
  pub created_at: Option<DateTime<Utc>>,
  pub updated_at: Option<DateTime<Utc>>,
}
