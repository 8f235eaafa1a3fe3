//! Outcome recording and error-pattern aggregation.

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::store::LearningStore;
use crate::types::{ErrorPattern, Outcome, OutcomeId, RemediationSuggestion};

/// Patterns considered when suggesting remedial practice.
const REMEDIATION_PATTERN_LIMIT: usize = 3;

pub fn validate_outcome(outcome: &Outcome) -> Result<(), CoreError> {
    if outcome.learner_id.trim().is_empty() {
        return Err(CoreError::validation("learnerId must not be empty"));
    }
    if outcome.skill_code.trim().is_empty() {
        return Err(CoreError::validation("skillCode must not be empty"));
    }
    if outcome.exercise_id.trim().is_empty() {
        return Err(CoreError::validation("exerciseId must not be empty"));
    }
    if !outcome.quality.is_finite() || outcome.quality < 0.0 || outcome.quality > 5.0 {
        return Err(CoreError::validation(format!(
            "quality must be within [0, 5], got {}",
            outcome.quality
        )));
    }
    if outcome.hints_used < 0 {
        return Err(CoreError::validation("hintsUsed must be non-negative"));
    }
    if outcome.time_spent_seconds < 0 {
        return Err(CoreError::validation("timeSpentSeconds must be non-negative"));
    }
    Ok(())
}

/// Validates and appends one outcome, then bumps the error-pattern counter
/// for each tag it carries. Nothing is persisted on validation failure.
pub async fn record(
    store: &LearningStore,
    outcome: Outcome,
    now: DateTime<Utc>,
) -> Result<OutcomeId, CoreError> {
    validate_outcome(&outcome)?;

    let id = OutcomeId::new();
    let learner_id = outcome.learner_id.clone();
    let skill_code = outcome.skill_code.clone();
    let tags: Vec<String> = outcome.error_tags.iter().cloned().collect();

    store.append_outcome(outcome).await;
    for tag in &tags {
        store
            .upsert_error_pattern(&learner_id, &skill_code, tag, now)
            .await;
    }

    tracing::debug!(
        %id,
        %learner_id,
        %skill_code,
        tag_count = tags.len(),
        "outcome recorded"
    );
    Ok(id)
}

/// Learner's error patterns, descending by occurrences.
pub async fn top_error_patterns(
    store: &LearningStore,
    learner_id: &str,
    limit: usize,
) -> Vec<ErrorPattern> {
    let mut patterns = store.error_patterns_for(learner_id).await;
    patterns.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then(b.last_seen_at.cmp(&a.last_seen_at))
            .then(a.tag.cmp(&b.tag))
    });
    patterns.truncate(limit);
    patterns
}

/// Maps the learner's dominant error patterns into remedial practice
/// suggestions, worst first.
pub async fn suggest_remediation(
    store: &LearningStore,
    learner_id: &str,
) -> Vec<RemediationSuggestion> {
    top_error_patterns(store, learner_id, REMEDIATION_PATTERN_LIMIT)
        .await
        .into_iter()
        .map(|pattern| RemediationSuggestion {
            action: "Remedial practice".to_string(),
            reason: format!(
                "error pattern '{}' seen {} times",
                pattern.tag, pattern.occurrences
            ),
            skill_code: pattern.skill_code,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn tagged_outcome(skill: &str, quality: f64, tags: &[&str]) -> Outcome {
        Outcome {
            learner_id: "l1".to_string(),
            exercise_id: "ex-9".to_string(),
            skill_code: skill.to_string(),
            is_correct: false,
            hints_used: 0,
            time_spent_seconds: 20,
            quality,
            error_tags: tags.iter().map(|t| t.to_string()).collect(),
            attempted_at: Utc::now(),
        }
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let mut bad = tagged_outcome("s1", 5.5, &[]);
        assert!(matches!(
            validate_outcome(&bad),
            Err(CoreError::Validation(_))
        ));

        bad.quality = 3.0;
        bad.hints_used = -1;
        assert!(matches!(
            validate_outcome(&bad),
            Err(CoreError::Validation(_))
        ));

        bad.hints_used = 0;
        bad.time_spent_seconds = -5;
        assert!(matches!(
            validate_outcome(&bad),
            Err(CoreError::Validation(_))
        ));

        bad.time_spent_seconds = 5;
        bad.learner_id = String::new();
        assert!(matches!(
            validate_outcome(&bad),
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn invalid_outcome_persists_nothing() {
        let store = LearningStore::new();
        let bad = tagged_outcome("s1", 9.0, &["sign-error"]);
        assert!(record(&store, bad, Utc::now()).await.is_err());
        assert_eq!(store.outcome_count("l1", "s1").await, 0);
        assert!(store.error_patterns_for("l1").await.is_empty());
    }

    #[tokio::test]
    async fn top_patterns_sorted_by_occurrences() {
        let store = LearningStore::new();
        let now = Utc::now();
        for _ in 0..3 {
            record(&store, tagged_outcome("s1", 1.0, &["sign-error"]), now)
                .await
                .unwrap();
        }
        record(&store, tagged_outcome("s2", 1.0, &["carry"]), now)
            .await
            .unwrap();

        let top = top_error_patterns(&store, "l1", 5).await;
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].tag, "sign-error");
        assert_eq!(top[0].occurrences, 3);
        assert_eq!(top[1].tag, "carry");

        let limited = top_error_patterns(&store, "l1", 1).await;
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn remediation_maps_top_patterns() {
        let store = LearningStore::new();
        let now = Utc::now();
        for _ in 0..2 {
            record(&store, tagged_outcome("s1", 0.5, &["fraction-inversion"]), now)
                .await
                .unwrap();
        }

        let suggestions = suggest_remediation(&store, "l1").await;
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].action, "Remedial practice");
        assert_eq!(suggestions[0].skill_code, "s1");
        assert!(suggestions[0].reason.contains("fraction-inversion"));
    }

    #[tokio::test]
    async fn multiple_tags_on_one_outcome() {
        let store = LearningStore::new();
        let outcome = tagged_outcome("s1", 1.0, &["a", "b"]);
        let tags: HashSet<String> = outcome.error_tags.clone();
        record(&store, outcome, Utc::now()).await.unwrap();

        let patterns = store.error_patterns_for("l1").await;
        assert_eq!(patterns.len(), tags.len());
    }
}
