//! Recommendation assembly and per-level learning paths.

use std::cmp::Reverse;

use futures::future::join_all;

use crate::curriculum::CurriculumRegistry;
use crate::error::CoreError;
use crate::prereq;
use crate::store::LearningStore;
use crate::types::{
    LearningPath, LearningPathEntry, MasteryLevel, PathSummary, Priority, Progress,
    Recommendation, RecommendationKind,
};

fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Prioritized action list for one learner over one curriculum level.
pub async fn recommendations_for(
    registry: &CurriculumRegistry,
    store: &LearningStore,
    learner_id: &str,
    level: &str,
) -> Result<Vec<Recommendation>, CoreError> {
    if !registry.has_level(level) {
        return Err(CoreError::not_found(format!("unknown level {level}")));
    }

    let skills = registry.skills_of(level);
    let progress_rows = join_all(
        skills
            .iter()
            .map(|skill| store.get_progress(learner_id, &skill.code)),
    )
    .await;

    let mut recommendations = Vec::new();

    // Review anything with weak recent performance.
    for (skill, progress) in skills.iter().zip(progress_rows.iter()) {
        if progress.as_ref().is_some_and(|row| row.needs_review) {
            recommendations.push(Recommendation {
                priority: Priority::High,
                skill_code: skill.code.clone(),
                reason: "needs review: low performance".to_string(),
                kind: RecommendationKind::Review,
            });
        }
    }

    // Unstarted skills: new when reachable, prerequisite work otherwise.
    for (skill, progress) in skills.iter().zip(progress_rows.iter()) {
        if progress.is_some() {
            continue;
        }
        let blocking =
            prereq::is_blocked_by_prerequisites(registry, store, learner_id, &skill.code).await?;
        if blocking.is_blocked {
            recommendations.push(Recommendation {
                priority: Priority::Low,
                skill_code: skill.code.clone(),
                reason: format!(
                    "missing prerequisites: {}",
                    blocking.missing_prerequisites.join(", ")
                ),
                kind: RecommendationKind::Prerequisite,
            });
        } else {
            recommendations.push(Recommendation {
                priority: Priority::Medium,
                skill_code: skill.code.clone(),
                reason: "not started yet".to_string(),
                kind: RecommendationKind::New,
            });
        }
    }

    // Qualitative leaps in flight get extra attention.
    for (skill, progress) in skills.iter().zip(progress_rows.iter()) {
        let in_progress = progress
            .as_ref()
            .is_some_and(|row| row.mastery_level == MasteryLevel::InProgress);
        if skill.qualitative_leap && in_progress {
            recommendations.push(Recommendation {
                priority: Priority::High,
                skill_code: skill.code.clone(),
                reason: "qualitative leap: elevated priority".to_string(),
                kind: RecommendationKind::Remediation,
            });
        }
    }

    // Stable, so construction order breaks ties within a priority.
    recommendations.sort_by_key(|r| Reverse(r.priority.rank()));
    Ok(recommendations)
}

/// Full per-learner snapshot of one level: every skill's progress (zeroed
/// when unseen), blocking state, recommendations and summary counts.
pub async fn learning_path(
    registry: &CurriculumRegistry,
    store: &LearningStore,
    learner_id: &str,
    level: &str,
) -> Result<LearningPath, CoreError> {
    if !registry.has_level(level) {
        return Err(CoreError::not_found(format!("unknown level {level}")));
    }

    let skills = registry.skills_of(level);
    let mut entries = Vec::with_capacity(skills.len());
    for skill in &skills {
        let progress = store
            .get_progress(learner_id, &skill.code)
            .await
            .unwrap_or_else(|| Progress::not_started(learner_id, &skill.code));
        let blocking =
            prereq::is_blocked_by_prerequisites(registry, store, learner_id, &skill.code).await?;
        entries.push(LearningPathEntry {
            skill_code: skill.code.clone(),
            progress,
            is_blocked: blocking.is_blocked,
            missing_prerequisites: blocking.missing_prerequisites,
        });
    }

    let total_skills = entries.len();
    let mastered = entries
        .iter()
        .filter(|e| e.progress.mastery_level == MasteryLevel::Mastered)
        .count();
    let in_progress = entries
        .iter()
        .filter(|e| e.progress.mastery_level == MasteryLevel::InProgress)
        .count();
    let not_started = entries
        .iter()
        .filter(|e| e.progress.mastery_level == MasteryLevel::NotStarted)
        .count();
    let blocked = entries.iter().filter(|e| e.is_blocked).count();
    let overall_progress = if total_skills > 0 {
        round_two_decimals(100.0 * mastered as f64 / total_skills as f64)
    } else {
        0.0
    };

    let recommendations = recommendations_for(registry, store, learner_id, level).await?;

    Ok(LearningPath {
        learner_id: learner_id.to_string(),
        level: level.to_string(),
        entries,
        recommendations,
        summary: PathSummary {
            total_skills,
            mastered,
            in_progress,
            not_started,
            blocked,
            overall_progress,
        },
    })
}
