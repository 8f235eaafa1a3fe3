//! Mastery estimation over a bounded recency window.
//!
//! Aggregates are always recomputed from the most recent outcomes rather
//! than patched incrementally; replaying the same window reproduces the
//! same Progress row, which keeps the per-attempt pipeline idempotent.

use chrono::{DateTime, Utc};

use crate::config::MasteryConfig;
use crate::error::CoreError;
use crate::store::LearningStore;
use crate::types::{MasteryLevel, MasterySnapshot, Outcome, Progress};

#[derive(Debug, Clone, PartialEq)]
pub struct WindowAggregate {
    pub total_attempts: i64,
    pub successful_attempts: i64,
    pub average_quality: f64,
    pub total_time_spent: i64,
    pub progress_percent: f64,
    pub mastery_level: MasteryLevel,
    pub needs_review: bool,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// Recompute aggregates from the outcome window, newest first.
pub fn aggregate_window(window: &[Outcome], config: &MasteryConfig) -> WindowAggregate {
    let count = window.len() as i64;
    let total_attempts = count.max(1);
    let successful_attempts = window.iter().filter(|o| o.is_correct).count() as i64;
    let average_quality = if count > 0 {
        window.iter().map(|o| o.quality).sum::<f64>() / count as f64
    } else {
        0.0
    };
    let total_time_spent = window.iter().map(|o| o.time_spent_seconds).sum();

    let raw_percent = 100.0 * successful_attempts as f64 / total_attempts as f64;
    let hints_latest = window.first().map(|o| o.hints_used).unwrap_or(0) as f64;
    let hint_penalty = (config.hint_penalty_per_hint * hints_latest).min(config.hint_penalty_cap);
    let progress_percent = (raw_percent - hint_penalty).clamp(0.0, 100.0);

    let mastery_level = if progress_percent >= config.mastered_percent
        && average_quality >= config.mastered_quality
    {
        MasteryLevel::Mastered
    } else if progress_percent >= config.in_progress_percent {
        MasteryLevel::InProgress
    } else {
        MasteryLevel::NotStarted
    };

    let needs_review =
        progress_percent < config.review_percent || average_quality < config.review_quality;

    WindowAggregate {
        total_attempts,
        successful_attempts,
        average_quality,
        total_time_spent,
        progress_percent,
        mastery_level,
        needs_review,
        last_attempt_at: window.first().map(|o| o.attempted_at),
    }
}

/// Recompute and upsert the Progress row for the pair. `mastered_at` is
/// sticky: set on the first transition into mastered, never cleared by a
/// later regression.
pub async fn update_mastery(
    store: &LearningStore,
    config: &MasteryConfig,
    learner_id: &str,
    skill_code: &str,
    now: DateTime<Utc>,
) -> Result<MasterySnapshot, CoreError> {
    let window = store
        .recent_outcomes(learner_id, skill_code, config.window_size)
        .await;
    if window.is_empty() {
        return Err(CoreError::not_found(format!(
            "no outcomes recorded for {learner_id}/{skill_code}"
        )));
    }

    let aggregate = aggregate_window(&window, config);
    let existing = store.get_progress(learner_id, skill_code).await;

    let mastered_at = match (&existing, aggregate.mastery_level) {
        (Some(row), MasteryLevel::Mastered) => row.mastered_at.or(Some(now)),
        (Some(row), _) => row.mastered_at,
        (None, MasteryLevel::Mastered) => Some(now),
        (None, _) => None,
    };

    let row = Progress {
        learner_id: learner_id.to_string(),
        skill_code: skill_code.to_string(),
        progress_percent: aggregate.progress_percent,
        mastery_level: aggregate.mastery_level,
        total_attempts: aggregate.total_attempts,
        successful_attempts: aggregate.successful_attempts,
        average_quality: aggregate.average_quality,
        total_time_spent: aggregate.total_time_spent,
        last_attempt_at: aggregate.last_attempt_at,
        mastered_at,
        needs_review: aggregate.needs_review,
    };
    store.put_progress(row).await;

    tracing::debug!(
        learner_id,
        skill_code,
        percent = aggregate.progress_percent,
        level = ?aggregate.mastery_level,
        "mastery recomputed"
    );

    Ok(MasterySnapshot {
        percent: aggregate.progress_percent,
        level: aggregate.mastery_level,
        average_quality: aggregate.average_quality,
        needs_review: aggregate.needs_review,
    })
}
