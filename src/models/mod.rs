pub mod exercise;
pub mod feedback;
pub mod profile;
pub mod workout;

pub use exercise::{Difficulty, Exercise, ExerciseFilter, MobilityType, NewExercise, TargetArea};
pub use feedback::{Feedback, FeedbackKind, FeedbackValue, StoredFeedback};
pub use profile::MobilityProfile;
pub use workout::{
  ExerciseLog, ExerciseSet, NewWorkoutLog, OverallFeeling, WorkoutLog, WorkoutLogChanges,
};
