//! Prerequisite resolution and blocking checks.
//!
//! Two deliberately separate notions of "blocked" live here:
//! [`is_blocked_by_prerequisites`] walks the skill graph and answers
//! whether unmet prerequisites gate the skill, while
//! [`is_struggling_on_skill`] looks only at recent failures on the target
//! skill itself. Callers pick the question they mean.

use crate::config::StruggleConfig;
use crate::curriculum::CurriculumRegistry;
use crate::error::CoreError;
use crate::store::LearningStore;
use crate::types::{BlockingStatus, MasteryLevel, PrerequisiteRemediation, StruggleStatus};

/// Union of curriculum-declared prerequisites and explicit override edges.
/// Overrides come first; duplicates are removed.
pub async fn prerequisites_of(
    registry: &CurriculumRegistry,
    store: &LearningStore,
    skill_code: &str,
) -> Result<Vec<String>, CoreError> {
    if !registry.contains(skill_code) {
        return Err(CoreError::not_found(format!("unknown skill {skill_code}")));
    }

    let mut merged = store.overrides_for(skill_code).await;
    let mut declared: Vec<String> = registry
        .prerequisites_declared_for(skill_code)
        .into_iter()
        .collect();
    declared.sort();
    for code in declared {
        if !merged.contains(&code) {
            merged.push(code);
        }
    }
    Ok(merged)
}

/// Skill-graph view: blocked if any prerequisite's Progress row is missing
/// or not mastered. All such prerequisites are reported as both blocking
/// and missing.
pub async fn is_blocked_by_prerequisites(
    registry: &CurriculumRegistry,
    store: &LearningStore,
    learner_id: &str,
    skill_code: &str,
) -> Result<BlockingStatus, CoreError> {
    let prerequisites = prerequisites_of(registry, store, skill_code).await?;

    let mut blocking = Vec::new();
    for code in prerequisites {
        let mastered = store
            .get_progress(learner_id, &code)
            .await
            .map(|row| row.mastery_level == MasteryLevel::Mastered)
            .unwrap_or(false);
        if !mastered {
            blocking.push(code);
        }
    }

    Ok(BlockingStatus {
        is_blocked: !blocking.is_empty(),
        blocking_prerequisites: blocking.clone(),
        missing_prerequisites: blocking,
    })
}

/// Performance view: struggling iff enough of the most recent outcomes on
/// the target skill itself are failures.
pub async fn is_struggling_on_skill(
    store: &LearningStore,
    config: &StruggleConfig,
    learner_id: &str,
    skill_code: &str,
) -> StruggleStatus {
    let recent = store
        .recent_outcomes(learner_id, skill_code, config.window)
        .await;
    let recent_failures = recent.iter().filter(|o| !o.is_correct).count();

    StruggleStatus {
        is_struggling: recent_failures >= config.failure_threshold,
        recent_failures,
        window: config.window,
    }
}

/// One remediation action per blocking prerequisite; empty when unblocked.
pub async fn remediation_for(
    registry: &CurriculumRegistry,
    store: &LearningStore,
    learner_id: &str,
    skill_code: &str,
) -> Result<Vec<PrerequisiteRemediation>, CoreError> {
    let status = is_blocked_by_prerequisites(registry, store, learner_id, skill_code).await?;

    Ok(status
        .blocking_prerequisites
        .into_iter()
        .map(|code| PrerequisiteRemediation {
            action: "Review prerequisite".to_string(),
            reason: format!("{code} must be mastered before {skill_code}"),
            prerequisite_code: code,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::Skill;
    use crate::types::Progress;
    use chrono::Utc;

    fn skill(code: &str, prereqs: &[&str]) -> Skill {
        Skill {
            code: code.to_string(),
            level: "A1".to_string(),
            domain: "algebra".to_string(),
            subdomain: String::new(),
            prerequisite_codes: prereqs.iter().map(|c| c.to_string()).collect(),
            qualitative_leap: false,
        }
    }

    fn registry() -> CurriculumRegistry {
        CurriculumRegistry::from_skills(vec![
            skill("A1.M.ALG.1", &[]),
            skill("A1.M.ALG.2", &["A1.M.ALG.1"]),
            skill("A1.M.ALG.3", &["A1.M.ALG.1", "A1.M.ALG.2"]),
        ])
    }

    async fn mark_mastered(store: &LearningStore, learner: &str, code: &str) {
        let mut row = Progress::not_started(learner, code);
        row.mastery_level = MasteryLevel::Mastered;
        row.progress_percent = 95.0;
        row.average_quality = 4.0;
        row.mastered_at = Some(Utc::now());
        store.put_progress(row).await;
    }

    #[tokio::test]
    async fn missing_progress_blocks() {
        let registry = registry();
        let store = LearningStore::new();

        let status = is_blocked_by_prerequisites(&registry, &store, "l1", "A1.M.ALG.2")
            .await
            .unwrap();
        assert!(status.is_blocked);
        assert_eq!(status.missing_prerequisites, vec!["A1.M.ALG.1"]);
        assert_eq!(status.blocking_prerequisites, status.missing_prerequisites);
    }

    #[tokio::test]
    async fn mastered_prerequisites_unblock() {
        let registry = registry();
        let store = LearningStore::new();
        mark_mastered(&store, "l1", "A1.M.ALG.1").await;
        mark_mastered(&store, "l1", "A1.M.ALG.2").await;

        let status = is_blocked_by_prerequisites(&registry, &store, "l1", "A1.M.ALG.3")
            .await
            .unwrap();
        assert!(!status.is_blocked);
        assert!(status.missing_prerequisites.is_empty());
    }

    #[tokio::test]
    async fn in_progress_prerequisite_still_blocks() {
        let registry = registry();
        let store = LearningStore::new();
        let mut row = Progress::not_started("l1", "A1.M.ALG.1");
        row.mastery_level = MasteryLevel::InProgress;
        row.progress_percent = 70.0;
        store.put_progress(row).await;

        let status = is_blocked_by_prerequisites(&registry, &store, "l1", "A1.M.ALG.2")
            .await
            .unwrap();
        assert!(status.is_blocked);
    }

    #[tokio::test]
    async fn overrides_merge_ahead_of_declared() {
        let registry = registry();
        let store = LearningStore::new();
        store.record_override("A1.M.ALG.2", "A1.M.ALG.3").await;
        // Duplicate of a declared edge stays deduplicated.
        store.record_override("A1.M.ALG.2", "A1.M.ALG.1").await;

        let merged = prerequisites_of(&registry, &store, "A1.M.ALG.2")
            .await
            .unwrap();
        assert_eq!(merged, vec!["A1.M.ALG.3", "A1.M.ALG.1"]);
    }

    #[tokio::test]
    async fn unknown_skill_is_not_found() {
        let registry = registry();
        let store = LearningStore::new();
        let result = prerequisites_of(&registry, &store, "A1.M.ALG.99").await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn struggling_counts_recent_failures_only() {
        let store = LearningStore::new();
        let config = StruggleConfig::default();

        let mk = |correct: bool| crate::types::Outcome {
            learner_id: "l1".to_string(),
            exercise_id: "ex".to_string(),
            skill_code: "A1.M.ALG.1".to_string(),
            is_correct: correct,
            hints_used: 0,
            time_spent_seconds: 10,
            quality: if correct { 4.0 } else { 1.0 },
            error_tags: Default::default(),
            attempted_at: Utc::now(),
        };

        // Old failures pushed out of the window by later successes.
        for _ in 0..3 {
            store.append_outcome(mk(false)).await;
        }
        for _ in 0..5 {
            store.append_outcome(mk(true)).await;
        }
        let status = is_struggling_on_skill(&store, &config, "l1", "A1.M.ALG.1").await;
        assert!(!status.is_struggling);
        assert_eq!(status.recent_failures, 0);

        for _ in 0..3 {
            store.append_outcome(mk(false)).await;
        }
        let status = is_struggling_on_skill(&store, &config, "l1", "A1.M.ALG.1").await;
        assert!(status.is_struggling);
        assert_eq!(status.recent_failures, 3);
    }

    #[tokio::test]
    async fn remediation_lists_each_blocking_prerequisite() {
        let registry = registry();
        let store = LearningStore::new();

        let actions = remediation_for(&registry, &store, "l1", "A1.M.ALG.3")
            .await
            .unwrap();
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| a.action == "Review prerequisite"));
        assert_eq!(actions[0].prerequisite_code, "A1.M.ALG.1");

        mark_mastered(&store, "l1", "A1.M.ALG.1").await;
        mark_mastered(&store, "l1", "A1.M.ALG.2").await;
        let none = remediation_for(&registry, &store, "l1", "A1.M.ALG.3")
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
