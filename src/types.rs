use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SchedulerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeId(pub Uuid);

impl OutcomeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OutcomeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OutcomeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One practice attempt. Append-only; never mutated after recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub learner_id: String,
    pub exercise_id: String,
    pub skill_code: String,
    pub is_correct: bool,
    pub hints_used: i64,
    pub time_spent_seconds: i64,
    pub quality: f64,
    #[serde(default)]
    pub error_tags: HashSet<String>,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    NotStarted,
    InProgress,
    Mastered,
}

/// Aggregated learner state on one skill, recomputed from the recency
/// window on every new outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub learner_id: String,
    pub skill_code: String,
    pub progress_percent: f64,
    pub mastery_level: MasteryLevel,
    pub total_attempts: i64,
    pub successful_attempts: i64,
    pub average_quality: f64,
    pub total_time_spent: i64,
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Sticky: set on the first transition into mastered, never cleared.
    pub mastered_at: Option<DateTime<Utc>>,
    pub needs_review: bool,
}

impl Progress {
    pub fn not_started(learner_id: &str, skill_code: &str) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            skill_code: skill_code.to_string(),
            progress_percent: 0.0,
            mastery_level: MasteryLevel::NotStarted,
            total_attempts: 0,
            successful_attempts: 0,
            average_quality: 0.0,
            total_time_spent: 0,
            last_attempt_at: None,
            mastered_at: None,
            needs_review: false,
        }
    }
}

/// SM-2 scheduling state for one (learner, skill) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
    pub learner_id: String,
    pub skill_code: String,
    pub easiness_factor: f64,
    pub repetition_number: i64,
    pub interval_days: i64,
    pub last_review_at: Option<DateTime<Utc>>,
    pub next_review_at: DateTime<Utc>,
    pub last_quality: Option<f64>,
}

impl ReviewCard {
    pub fn fresh(
        learner_id: &str,
        skill_code: &str,
        now: DateTime<Utc>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            skill_code: skill_code.to_string(),
            easiness_factor: config.initial_easiness,
            repetition_number: 0,
            interval_days: config.first_interval_days,
            last_review_at: None,
            next_review_at: now + chrono::Duration::days(config.first_interval_days),
            last_quality: None,
        }
    }
}

/// Per-(learner, skill, tag) error counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPattern {
    pub learner_id: String,
    pub skill_code: String,
    pub tag: String,
    pub occurrences: i64,
    pub last_seen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 2,
            Priority::Medium => 1,
            Priority::Low => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Review,
    New,
    Remediation,
    Prerequisite,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: Priority,
    pub skill_code: String,
    pub reason: String,
    pub kind: RecommendationKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterySnapshot {
    pub percent: f64,
    pub level: MasteryLevel,
    pub average_quality: f64,
    pub needs_review: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    pub easiness_factor: f64,
    pub repetition_number: i64,
    pub interval_days: i64,
    pub next_review_at: DateTime<Utc>,
}

impl ScheduleResult {
    pub fn from_card(card: &ReviewCard) -> Self {
        Self {
            easiness_factor: card.easiness_factor,
            repetition_number: card.repetition_number,
            interval_days: card.interval_days,
            next_review_at: card.next_review_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingStatus {
    pub is_blocked: bool,
    pub blocking_prerequisites: Vec<String>,
    pub missing_prerequisites: Vec<String>,
}

impl BlockingStatus {
    pub fn unblocked() -> Self {
        Self {
            is_blocked: false,
            blocking_prerequisites: Vec::new(),
            missing_prerequisites: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StruggleStatus {
    pub is_struggling: bool,
    pub recent_failures: usize,
    pub window: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationSuggestion {
    pub action: String,
    pub reason: String,
    pub skill_code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerequisiteRemediation {
    pub action: String,
    pub prerequisite_code: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathEntry {
    pub skill_code: String,
    pub progress: Progress,
    pub is_blocked: bool,
    pub missing_prerequisites: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSummary {
    pub total_skills: usize,
    pub mastered: usize,
    pub in_progress: usize,
    pub not_started: usize,
    pub blocked: usize,
    pub overall_progress: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub learner_id: String,
    pub level: String,
    pub entries: Vec<LearningPathEntry>,
    pub recommendations: Vec<Recommendation>,
    pub summary: PathSummary,
}

/// Result of the composed per-attempt pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptUpdate {
    pub outcome_id: OutcomeId,
    pub mastery: MasterySnapshot,
    pub spaced_repetition: ScheduleResult,
    pub blocked: BlockingStatus,
    pub remediation: Vec<PrerequisiteRemediation>,
}
