use std::error::Error;
use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;

use mobility_coach_lib::catalog::CatalogRecord;
use mobility_coach_lib::chat::{ChatMessage, ChatRequest};
use mobility_coach_lib::commands::{self, catalog, chat, favorites, profile};
use mobility_coach_lib::db::AppState;
use mobility_coach_lib::draft::{DraftDetails, WorkoutDraft};
use mobility_coach_lib::models::{
  Difficulty, ExerciseFilter, ExerciseLog, ExerciseSet, Feedback, FeedbackValue, MobilityProfile, MobilityType,
  OverallFeeling, TargetArea,
};
use mobility_coach_lib::progress::Metric;

pub type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "mobility-coach", version, about = "Mobility-adapted exercise tracking")]
#[command(arg_required_else_help = true)]
pub struct Cli {
  /// Emit machine-readable JSON instead of colorful text.
  #[arg(global = true, long)]
  pub json: bool,

  /// User whose data is read and written
  #[arg(global = true, long, short, default_value = "local")]
  pub user: String,

  #[command(subcommand)]
  pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
  /// Streaks and per-exercise improvement
  Stats,

  /// Progress of one exercise over time
  Chart {
    /// Exercise name as logged
    #[arg(short, long)]
    exercise: Option<String>,

    /// reps, weight, duration or distance
    #[arg(short, long, default_value = "weight")]
    metric: Metric,
  },

  /// Workout log management
  #[command(subcommand)]
  Log(LogCmd),

  /// Exercise library
  #[command(subcommand, visible_alias = "ex")]
  Exercise(ExerciseCmd),

  /// Favorite exercises
  #[command(subcommand, visible_alias = "fav")]
  Favorite(FavoriteCmd),

  /// Mobility questionnaire
  #[command(subcommand)]
  Profile(ProfileCmd),

  /// Rate a recommendation
  Feedback {
    /// Exercise the recommendation was about
    #[arg(short, long)]
    exercise: String,

    /// Recommendation text being rated
    #[arg(short, long)]
    text: String,

    /// helpful, not_helpful, too_easy, just_right or too_hard
    #[arg(short, long)]
    value: FeedbackValue,
  },

  /// Ask the exercise specialist
  Chat {
    /// Question to ask
    #[arg(required = true, trailing_var_arg = true)]
    message: Vec<String>,
  },
}

#[derive(Subcommand)]
pub enum LogCmd {
  /// List logged sessions, newest first
  #[command(visible_alias = "ls")]
  List,

  /// Show one session
  Show { id: String },

  /// Delete a session permanently
  #[command(visible_alias = "rm")]
  Delete { id: String },

  /// Log a single-exercise session
  Add(AddLogArgs),
}

#[derive(Args)]
pub struct AddLogArgs {
  /// Catalog id of the exercise
  #[arg(long)]
  pub exercise_id: String,

  /// Exercise name as it should appear in the log
  #[arg(long)]
  pub name: String,

  /// Number of identical sets
  #[arg(long, default_value_t = 1)]
  pub sets: usize,

  #[arg(long)]
  pub reps: Option<f64>,

  #[arg(long)]
  pub weight: Option<f64>,

  /// Minutes
  #[arg(long)]
  pub duration: Option<f64>,

  /// Meters
  #[arg(long)]
  pub distance: Option<f64>,

  /// 0-10
  #[arg(long)]
  pub pain: Option<u8>,

  #[arg(long, default_value = "good")]
  pub feeling: OverallFeeling,

  #[arg(long)]
  pub notes: Option<String>,

  /// Session date (YYYY-MM-DD), defaults to now
  #[arg(long)]
  pub date: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum ExerciseCmd {
  /// List exercises matching the given filters
  #[command(visible_alias = "ls")]
  List(FilterArgs),

  /// Show one exercise
  Show { id: String },

  /// Load the starter catalog into an empty library
  Seed,

  /// Replace the library with a JSON dataset
  Import { file: PathBuf },
}

#[derive(Args)]
pub struct FilterArgs {
  #[arg(long)]
  pub mobility: Option<MobilityType>,

  #[arg(long)]
  pub difficulty: Option<Difficulty>,

  #[arg(long)]
  pub area: Option<TargetArea>,

  #[arg(long, short)]
  pub search: Option<String>,

  #[arg(long = "type")]
  pub exercise_type: Option<String>,
}

impl From<FilterArgs> for ExerciseFilter {
  fn from(args: FilterArgs) -> Self {
    ExerciseFilter {
      mobility_type: args.mobility,
      difficulty: args.difficulty,
      target_area: args.area,
      search_term: args.search,
      exercise_type: args.exercise_type,
    }
  }
}

#[derive(Subcommand)]
pub enum FavoriteCmd {
  /// List favorite exercises
  #[command(visible_alias = "ls")]
  List,

  /// Add or remove an exercise
  Toggle { exercise_id: String },
}

#[derive(Subcommand)]
pub enum ProfileCmd {
  /// Show the stored questionnaire
  Show,

  /// Save the questionnaire
  Set(ProfileArgs),

  /// Print the available answers
  Options,
}

#[derive(Args)]
pub struct ProfileArgs {
  #[arg(long)]
  pub condition: String,

  #[arg(long, default_value = "")]
  pub details: String,

  /// Repeat for several goals
  #[arg(long = "goal")]
  pub goals: Vec<String>,

  #[arg(long = "limitation")]
  pub limitations: Vec<String>,

  #[arg(long = "device")]
  pub devices: Vec<String>,

  #[arg(long = "prefers")]
  pub preferred_types: Vec<String>,

  #[arg(long = "pain")]
  pub pain_areas: Vec<String>,
}

//
// Dispatch
//

pub async fn run(cli: Cli, state: &AppState) -> CliResult {
  let out = Output { json: cli.json };
  let user = cli.user;

  match cli.cmd {
    Commands::Stats => {
      let stats = commands::get_progress_stats(state, user).await?;
      if out.json {
        return out.emit(&stats);
      }
      println!("{} {} days", "Current streak:".bold(), stats.current_streak.to_string().green());
      println!("{} {} days", "Longest streak:".bold(), stats.longest_streak);
      println!("{} {}", "Total workouts:".bold(), stats.total_workouts);
      if let Some(last) = stats.last_workout_date {
        println!("{} {}", "Last workout:".bold(), last.with_timezone(&Local).format("%b %-d, %Y"));
      }
      for progress in &stats.exercise_progress {
        println!();
        println!("{}", progress.exercise_name.cyan().bold());
        for metric in Metric::ALL {
          let first = progress.first_log.value(metric);
          let last = progress.last_log.value(metric);
          if first == 0.0 && last == 0.0 {
            continue;
          }
          println!(
            "  {:<9} {} -> {} {}  ({})",
            metric.as_str(),
            first,
            last,
            metric.unit(),
            signed_percent(progress.improvement.value(metric))
          );
        }
      }
    }

    Commands::Chart { exercise, metric } => {
      let points = commands::get_chart_series(state, user, exercise, metric.to_string()).await?;
      if out.json {
        return out.emit(&points);
      }
      if points.is_empty() {
        out.info("No data to chart");
        return Ok(());
      }
      let max = points.iter().map(|p| p.value).fold(0.0, f64::max);
      for point in &points {
        let width = ((point.value / max) * 40.0).round() as usize;
        println!("{:>7} {} {} {}", point.label, "█".repeat(width.max(1)).green(), point.value, metric.unit());
      }
    }

    Commands::Log(cmd) => handle_log(cmd, state, user, &out).await?,
    Commands::Exercise(cmd) => handle_exercise(cmd, state, &out).await?,
    Commands::Favorite(cmd) => handle_favorite(cmd, state, user, &out).await?,
    Commands::Profile(cmd) => handle_profile(cmd, state, user, &out).await?,

    Commands::Feedback { exercise, text, value } => {
      let feedback = Feedback {
        user_id: user,
        exercise_name: exercise,
        recommendation_text: text,
        kind: value.kind(),
        value,
      };
      let id = chat::submit_feedback(state, feedback).await?;
      out.info(&format!("Feedback #{} recorded", id));
    }

    Commands::Chat { message } => {
      let request = ChatRequest::new(vec![ChatMessage::user(message.join(" "))]);
      let response = chat::send_chat(state, Some(user), request).await?;
      if out.json {
        return out.emit(&response);
      }
      println!("{}", response.message.content);
    }
  }

  Ok(())
}

async fn handle_log(cmd: LogCmd, state: &AppState, user: String, out: &Output) -> CliResult {
  match cmd {
    LogCmd::List => {
      let logs = commands::get_workout_logs(state, user).await?;
      if out.json {
        return out.emit(&logs);
      }
      if logs.is_empty() {
        out.info("No workouts logged yet");
      }
      for log in &logs {
        let names: Vec<&str> = log.exercises.iter().map(|e| e.exercise_name.as_str()).collect();
        println!(
          "{}  {}  {:<8} {}",
          log.id.dimmed(),
          log.date.with_timezone(&Local).format("%Y-%m-%d"),
          log.overall_feeling.label(),
          names.join(", ")
        );
      }
    }

    LogCmd::Show { id } => {
      let log = commands::get_workout_log(state, user, id).await?;
      if out.json {
        return out.emit(&log);
      }
      println!("{} {}", "Date:".bold(), log.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
      println!("{} {}", "Feeling:".bold(), log.overall_feeling.label());
      if let Some(notes) = &log.notes {
        println!("{} {}", "Notes:".bold(), notes);
      }
      for exercise in &log.exercises {
        println!("{}", exercise.exercise_name.cyan().bold());
        for (i, set) in exercise.sets.iter().enumerate() {
          println!("  set {}: {}", i + 1, describe_set(set));
        }
      }
    }

    LogCmd::Delete { id } => {
      commands::delete_workout(state, user, id.clone()).await?;
      out.info(&format!("Workout {} deleted", id));
    }

    LogCmd::Add(args) => {
      let set = ExerciseSet {
        reps: args.reps,
        weight: args.weight,
        duration: args.duration,
        distance: args.distance,
        completed: true,
        ..Default::default()
      };
      let exercise = ExerciseLog {
        sets: vec![set; args.sets.max(1)],
        pain_level: args.pain,
        ..ExerciseLog::new(args.exercise_id, args.name)
      };
      let date = args.date.map(local_noon).transpose()?;

      let draft = WorkoutDraft::new()
        .with_details(DraftDetails {
          date,
          notes: args.notes,
          overall_feeling: Some(args.feeling),
        })
        .with_exercise(exercise);

      let id = commands::save_workout_draft(state, draft, Some(user)).await?;
      if out.json {
        return out.emit(&serde_json::json!({ "id": id }));
      }
      out.info(&format!("Workout {} saved", id));
    }
  }
  Ok(())
}

async fn handle_exercise(cmd: ExerciseCmd, state: &AppState, out: &Output) -> CliResult {
  match cmd {
    ExerciseCmd::List(args) => {
      let exercises = catalog::list_exercises(state, args.into()).await?;
      if out.json {
        return out.emit(&exercises);
      }
      for exercise in &exercises {
        let difficulty = exercise.difficulty.map(|d| d.label()).unwrap_or("-");
        println!("{}  {:<32} {}", exercise.id.dimmed(), exercise.name.bold(), difficulty);
      }
      out.info(&format!("{} exercises", exercises.len()));
    }

    ExerciseCmd::Show { id } => {
      let exercise = catalog::get_exercise(state, id).await?;
      if out.json {
        return out.emit(&exercise);
      }
      println!("{}", exercise.name.cyan().bold());
      println!("{}", exercise.description);
      if !exercise.benefits.is_empty() {
        println!("{} {}", "Benefits:".bold(), exercise.benefits);
      }
      if !exercise.modifications.is_empty() {
        println!("{} {}", "Modifications:".bold(), exercise.modifications);
      }
      let mobility: Vec<&str> = exercise.mobility_types.iter().map(|m| m.label()).collect();
      println!("{} {}", "Suitable for:".bold(), mobility.join(", "));
      println!("{} {}", "Targets:".bold(), exercise.target_areas.join(", "));
      if !exercise.equipment.is_empty() {
        println!("{} {}", "Equipment:".bold(), exercise.equipment.join(", "));
      }
    }

    ExerciseCmd::Seed => {
      let inserted = catalog::seed_exercises(state).await?;
      if inserted == 0 {
        out.warn("Library already has exercises, nothing seeded");
      } else {
        out.info(&format!("Seeded {} exercises", inserted));
      }
    }

    ExerciseCmd::Import { file } => {
      let raw = tokio::fs::read_to_string(&file)
        .await
        .map_err(|e| format!("Could not read file `{}`: {}", file.display(), e))?;
      let records: Vec<CatalogRecord> = serde_json::from_str(&raw)?;
      let report = catalog::import_exercises(state, records).await?;
      if out.json {
        return out.emit(&report);
      }
      out.info(&format!(
        "Cleared {} exercises and imported {} ({} skipped)",
        report.deleted, report.inserted, report.skipped
      ));
    }
  }
  Ok(())
}

async fn handle_favorite(cmd: FavoriteCmd, state: &AppState, user: String, out: &Output) -> CliResult {
  favorites::load_favorites(state, user.clone()).await?;

  match cmd {
    FavoriteCmd::List => {
      let exercises = favorites::get_favorite_exercises(state).await?;
      if out.json {
        return out.emit(&exercises);
      }
      if exercises.is_empty() {
        out.info("No favorites yet");
      }
      for exercise in &exercises {
        println!("{} {}  {}", "★".yellow(), exercise.name.bold(), exercise.id.dimmed());
      }
    }

    FavoriteCmd::Toggle { exercise_id } => {
      let ids = favorites::toggle_favorite(state, user, exercise_id.clone()).await?;
      if out.json {
        return out.emit(&ids);
      }
      if ids.contains(&exercise_id) {
        out.info("Added to favorites");
      } else {
        out.info("Removed from favorites");
      }
    }
  }

  favorites::clear_favorites(state).await?;
  Ok(())
}

async fn handle_profile(cmd: ProfileCmd, state: &AppState, user: String, out: &Output) -> CliResult {
  match cmd {
    ProfileCmd::Show => match profile::get_profile(state, user).await? {
      Some(stored) if out.json => out.emit(&stored)?,
      Some(stored) => println!("{}", stored.context_summary()),
      None => out.warn("No profile saved yet; use `profile set`"),
    },

    ProfileCmd::Set(args) => {
      let saved = profile::save_profile(
        state,
        MobilityProfile {
          user_id: user,
          mobility_condition: args.condition,
          condition_details: args.details,
          movement_limitations: args.limitations,
          assistive_devices: args.devices,
          exercise_goals: args.goals,
          preferred_exercise_types: args.preferred_types,
          pain_areas: args.pain_areas,
          created_at: None,
          updated_at: None,
        },
      )
      .await?;
      if out.json {
        return out.emit(&saved);
      }
      out.info("Profile saved");
    }

    ProfileCmd::Options => {
      let options = profile::get_profile_options();
      if out.json {
        return out.emit(&options);
      }
      for (title, values) in [
        ("Mobility conditions", options.mobility_conditions),
        ("Movement limitations", options.movement_limitations),
        ("Assistive devices", options.assistive_devices),
        ("Exercise goals", options.exercise_goals),
        ("Exercise types", options.exercise_types),
        ("Pain areas", options.pain_areas),
      ] {
        println!("{}", title.bold());
        for value in values {
          println!("  {}", value);
        }
      }
    }
  }
  Ok(())
}

//
// Output helpers
//

struct Output {
  json: bool,
}

impl Output {
  fn emit<T: Serialize>(&self, value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
  }

  fn info(&self, message: &str) {
    if !self.json {
      println!("{} {}", "info:".blue().bold(), message);
    }
  }

  fn warn(&self, message: &str) {
    if !self.json {
      println!("{} {}", "warning:".yellow().bold(), message);
    }
  }
}

fn signed_percent(value: f64) -> String {
  let text = format!("{:+.1}%", value);
  if value > 0.0 {
    text.green().to_string()
  } else if value < 0.0 {
    text.red().to_string()
  } else {
    text.dimmed().to_string()
  }
}

fn describe_set(set: &ExerciseSet) -> String {
  let mut parts = Vec::new();
  if let Some(reps) = set.reps {
    parts.push(format!("{} reps", reps));
  }
  if let Some(weight) = set.weight {
    parts.push(format!("{} lbs", weight));
  }
  if let Some(duration) = set.duration {
    parts.push(format!("{} min", duration));
  }
  if let Some(distance) = set.distance {
    parts.push(format!("{}m", distance));
  }
  if parts.is_empty() {
    parts.push("no values".to_string());
  }
  if set.completed {
    parts.join(", ")
  } else {
    format!("{} (not completed)", parts.join(", "))
  }
}

/// Midday on `date` in the local zone, so the calendar day survives the
/// conversion to UTC
fn local_noon(date: NaiveDate) -> Result<DateTime<Utc>, String> {
  date
    .and_hms_opt(12, 0, 0)
    .and_then(|naive| Local.from_local_datetime(&naive).single())
    .map(|local| local.with_timezone(&Utc))
    .ok_or_else(|| format!("Invalid local date: {}", date))
}
