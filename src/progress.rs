//! Progress Analytics Engine
//!
//! Derives streaks, per-exercise first/last snapshots, improvement
//! percentages and chart series from a user's workout history.
//!
//! Key properties:
//! - Pure: no I/O, no clock access except in the `Local` convenience entry points
//! - Total: absent or malformed set values count as zero, nothing here can fail
//! - Order-independent: input logs may arrive in any order
//! - Derived values are rebuilt wholesale on every call, never patched

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ExerciseLog, ExerciseSet, WorkoutLog};

// ---------------------------------------------------------------------------
/// Metric: which per-set value to aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Reps,
    Weight,
    Duration,
    Distance,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Weight, Metric::Reps, Metric::Duration, Metric::Distance];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reps => "reps",
            Self::Weight => "weight",
            Self::Duration => "duration",
            Self::Distance => "distance",
        }
    }

    /// Unit shown next to plotted values
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Reps => "reps",
            Self::Weight => "lbs",
            Self::Duration => "minutes",
            Self::Distance => "m",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Metric {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reps" => Ok(Self::Reps),
            "weight" => Ok(Self::Weight),
            "duration" => Ok(Self::Duration),
            "distance" => Ok(Self::Distance),
            other => Err(format!("Unknown metric: {}", other)),
        }
    }
}

impl ExerciseSet {
    /// Value of `metric` for this set, zero when unset
    pub fn metric(&self, metric: Metric) -> f64 {
        let value = match metric {
            Metric::Reps => self.reps,
            Metric::Weight => self.weight,
            Metric::Duration => self.duration,
            Metric::Distance => self.distance,
        };
        value.filter(|v| v.is_finite()).unwrap_or(0.0)
    }
}

impl ExerciseLog {
    /// Highest value of `metric` across this exercise's sets (0 with no sets)
    pub fn max_metric(&self, metric: Metric) -> f64 {
        self.sets.iter().map(|set| set.metric(metric)).fold(0.0, f64::max)
    }
}

/// Calendar day of an instant as seen in `tz`
pub fn calendar_day<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

// ---------------------------------------------------------------------------
/// Streaks: consecutive calendar days with at least one log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
}

impl Streaks {
    /// Streaks in the system time zone, relative to the local date today
    pub fn compute(logs: &[WorkoutLog]) -> Self {
        Self::compute_at(logs, &Local, Local::now().date_naive())
    }

    pub fn compute_at<Tz: TimeZone>(logs: &[WorkoutLog], tz: &Tz, today: NaiveDate) -> Self {
        let unique_days: BTreeSet<NaiveDate> =
            logs.iter().map(|log| calendar_day(&log.date, tz)).collect();
        let days_desc: Vec<NaiveDate> = unique_days.into_iter().rev().collect();
        Self::from_days_desc(&days_desc, today)
    }

    /// `days` must be distinct and sorted most recent first
    fn from_days_desc(days: &[NaiveDate], today: NaiveDate) -> Self {
        let Some(&latest) = days.first() else {
            return Self::default();
        };

        let is_next_day = |newer: NaiveDate, older: NaiveDate| (newer - older).num_days() == 1;

        // Active only when anchored at today or yesterday
        let mut current = 0;
        if latest == today || today.pred_opt() == Some(latest) {
            current = 1;
            for pair in days.windows(2) {
                if is_next_day(pair[0], pair[1]) {
                    current += 1;
                } else {
                    break;
                }
            }
        }

        let mut longest = 1;
        let mut run = 1;
        for pair in days.windows(2) {
            if is_next_day(pair[0], pair[1]) {
                run += 1;
            } else {
                longest = longest.max(run);
                run = 1;
            }
        }
        longest = longest.max(run);

        Self {
            current: current.min(longest),
            longest,
        }
    }
}

// ---------------------------------------------------------------------------
/// Exercise Progress: first vs last performance per exercise
// ---------------------------------------------------------------------------

/// Per-metric maxima of one exercise within one log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogSnapshot {
    pub date: DateTime<Utc>,
    pub max_weight: f64,
    pub max_reps: f64,
    pub max_duration: f64,
    pub max_distance: f64,
}

impl LogSnapshot {
    pub fn from_exercise(date: DateTime<Utc>, exercise: &ExerciseLog) -> Self {
        Self {
            date,
            max_weight: exercise.max_metric(Metric::Weight),
            max_reps: exercise.max_metric(Metric::Reps),
            max_duration: exercise.max_metric(Metric::Duration),
            max_distance: exercise.max_metric(Metric::Distance),
        }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Weight => self.max_weight,
            Metric::Reps => self.max_reps,
            Metric::Duration => self.max_duration,
            Metric::Distance => self.max_distance,
        }
    }
}

/// Percentage change from first to last snapshot, per metric
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Improvement {
    pub weight: f64,
    pub reps: f64,
    pub duration: f64,
    pub distance: f64,
}

impl Improvement {
    pub fn between(first: &LogSnapshot, last: &LogSnapshot) -> Self {
        Self {
            weight: percent_change(first.max_weight, last.max_weight),
            reps: percent_change(first.max_reps, last.max_reps),
            duration: percent_change(first.max_duration, last.max_duration),
            distance: percent_change(first.max_distance, last.max_distance),
        }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Weight => self.weight,
            Metric::Reps => self.reps,
            Metric::Duration => self.duration,
            Metric::Distance => self.distance,
        }
    }
}

/// `(last - first) / first * 100` rounded to one decimal; 0 when `first` is 0
pub fn percent_change(first: f64, last: f64) -> f64 {
    if first == 0.0 || !first.is_finite() || !last.is_finite() {
        return 0.0;
    }
    let pct = (last - first) / first * 100.0;
    (pct * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProgress {
    pub exercise_id: String,
    pub exercise_name: String,
    pub first_log: LogSnapshot,
    pub last_log: LogSnapshot,
    pub improvement: Improvement,
}

/// Logs sorted newest first, ties broken by id so the visit order never
/// depends on the caller's ordering
fn newest_first(logs: &[WorkoutLog]) -> Vec<&WorkoutLog> {
    let mut ordered: Vec<&WorkoutLog> = logs.iter().collect();
    ordered.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
    ordered
}

/// One entry per distinct exercise id, in first-encounter order when the
/// history is read newest first
pub fn aggregate_exercise_progress(logs: &[WorkoutLog]) -> Vec<ExerciseProgress> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<ExerciseProgress> = Vec::new();

    for log in newest_first(logs) {
        for exercise in &log.exercises {
            let snapshot = LogSnapshot::from_exercise(log.date, exercise);

            match positions.get(exercise.exercise_id.as_str()) {
                None => {
                    positions.insert(exercise.exercise_id.as_str(), entries.len());
                    entries.push(ExerciseProgress {
                        exercise_id: exercise.exercise_id.clone(),
                        exercise_name: exercise.exercise_name.clone(),
                        first_log: snapshot,
                        last_log: snapshot,
                        improvement: Improvement::default(),
                    });
                }
                Some(&idx) => {
                    let entry = &mut entries[idx];
                    // Equal dates keep the snapshot already held
                    if snapshot.date > entry.last_log.date {
                        entry.last_log = snapshot;
                    }
                    if snapshot.date < entry.first_log.date {
                        entry.first_log = snapshot;
                    }
                }
            }
        }
    }

    for entry in &mut entries {
        entry.improvement = Improvement::between(&entry.first_log, &entry.last_log);
    }

    entries
}

// ---------------------------------------------------------------------------
/// Progress Stats: everything the progress view shows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_workouts: usize,
    pub last_workout_date: Option<DateTime<Utc>>,
    pub exercise_progress: Vec<ExerciseProgress>,
}

impl ProgressStats {
    /// Stats in the system time zone, relative to the local date today
    pub fn compute(logs: &[WorkoutLog]) -> Self {
        Self::compute_at(logs, &Local, Local::now().date_naive())
    }

    pub fn compute_at<Tz: TimeZone>(logs: &[WorkoutLog], tz: &Tz, today: NaiveDate) -> Self {
        if logs.is_empty() {
            return Self::default();
        }

        let streaks = Streaks::compute_at(logs, tz, today);

        Self {
            current_streak: streaks.current,
            longest_streak: streaks.longest,
            total_workouts: logs.len(),
            last_workout_date: logs.iter().map(|log| log.date).max(),
            exercise_progress: aggregate_exercise_progress(logs),
        }
    }

    pub fn progress_for(&self, exercise_id: &str) -> Option<&ExerciseProgress> {
        self.exercise_progress
            .iter()
            .find(|p| p.exercise_id == exercise_id)
    }
}

// ---------------------------------------------------------------------------
/// Chart Series: one point per log containing the exercise
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Label format for chart points, e.g. "Oct 9"
const CHART_LABEL_FORMAT: &str = "%b %-d";

/// Chart series in the system time zone
pub fn chart_series(
    logs: &[WorkoutLog],
    metric: Metric,
    exercise_name: Option<&str>,
) -> Vec<ChartPoint> {
    chart_series_in(logs, metric, exercise_name, &Local)
}

/// Oldest to newest. Each point is the max of `metric` over every set of
/// every entry named `exercise_name` in one log; logs where that max is not
/// positive are left out.
pub fn chart_series_in<Tz: TimeZone>(
    logs: &[WorkoutLog],
    metric: Metric,
    exercise_name: Option<&str>,
    tz: &Tz,
) -> Vec<ChartPoint> {
    let Some(name) = exercise_name.filter(|n| !n.is_empty()) else {
        return Vec::new();
    };

    let mut ordered = newest_first(logs);
    ordered.reverse();

    ordered
        .into_iter()
        .filter_map(|log| {
            let mut relevant = log
                .exercises
                .iter()
                .filter(|exercise| exercise.exercise_name == name)
                .peekable();
            relevant.peek()?;

            let value = relevant
                .map(|exercise| exercise.max_metric(metric))
                .fold(0.0, f64::max);

            (value > 0.0).then(|| ChartPoint {
                label: calendar_day(&log.date, tz).format(CHART_LABEL_FORMAT).to_string(),
                value,
            })
        })
        .collect()
}

/// Distinct exercise names across the history, most recently logged first
pub fn logged_exercise_names(logs: &[WorkoutLog]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut names = Vec::new();
    for log in newest_first(logs) {
        for exercise in &log.exercises {
            if seen.insert(exercise.exercise_name.as_str()) {
                names.push(exercise.exercise_name.clone());
            }
        }
    }
    names
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
