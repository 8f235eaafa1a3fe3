//! Composed per-attempt pipeline and caller-facing API.

use std::sync::Arc;

use chrono::Utc;

use crate::config::CoreConfig;
use crate::curriculum::CurriculumRegistry;
use crate::error::CoreError;
use crate::store::LearningStore;
use crate::types::{
    AttemptUpdate, BlockingStatus, ErrorPattern, LearningPath, Outcome, PrerequisiteRemediation,
    Recommendation, RemediationSuggestion, ReviewCard, ScheduleResult, StruggleStatus,
};
use crate::{mastery, prereq, recommend, recorder, scheduler};

pub struct LearningEngine {
    config: CoreConfig,
    curriculum: Arc<CurriculumRegistry>,
    store: Arc<LearningStore>,
}

impl LearningEngine {
    pub fn new(config: CoreConfig, curriculum: Arc<CurriculumRegistry>) -> Self {
        Self {
            config,
            curriculum,
            store: Arc::new(LearningStore::new()),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn store(&self) -> &LearningStore {
        &self.store
    }

    pub fn curriculum(&self) -> &CurriculumRegistry {
        &self.curriculum
    }

    /// The per-attempt pipeline: validate, record, recompute mastery,
    /// reschedule, then annotate blocking state. Record through schedule
    /// runs under the pair lock; the attempt timestamp is authoritative
    /// for every write the pipeline makes, so replaying an attempt
    /// reproduces the same state.
    pub async fn record_outcome_and_update(
        &self,
        outcome: Outcome,
    ) -> Result<AttemptUpdate, CoreError> {
        recorder::validate_outcome(&outcome)?;
        if self.curriculum.get_skill(&outcome.skill_code).is_none() {
            return Err(CoreError::not_found(format!(
                "unknown skill {}",
                outcome.skill_code
            )));
        }

        let learner_id = outcome.learner_id.clone();
        let skill_code = outcome.skill_code.clone();
        let quality = outcome.quality;
        let now = outcome.attempted_at;

        let outcome_id;
        let mastery_snapshot;
        let schedule;
        {
            let _guard = self
                .store
                .acquire_pair(&learner_id, &skill_code, &self.config.lock)
                .await?;

            outcome_id = recorder::record(&self.store, outcome, now).await?;
            mastery_snapshot =
                mastery::update_mastery(&self.store, &self.config.mastery, &learner_id, &skill_code, now)
                    .await?;

            let card = match self.store.get_card(&learner_id, &skill_code).await {
                Some(card) => card,
                None => ReviewCard::fresh(&learner_id, &skill_code, now, &self.config.scheduler),
            };
            let updated = scheduler::sm2_schedule(&card, quality, now, &self.config.scheduler);
            schedule = ScheduleResult::from_card(&updated);
            self.store.put_card(updated).await;
        }

        let blocked =
            prereq::is_blocked_by_prerequisites(&self.curriculum, &self.store, &learner_id, &skill_code)
                .await?;
        let remediation = if blocked.is_blocked {
            prereq::remediation_for(&self.curriculum, &self.store, &learner_id, &skill_code).await?
        } else {
            Vec::new()
        };

        tracing::info!(
            %learner_id,
            %skill_code,
            percent = mastery_snapshot.percent,
            level = ?mastery_snapshot.level,
            interval_days = schedule.interval_days,
            is_blocked = blocked.is_blocked,
            "attempt processed"
        );

        Ok(AttemptUpdate {
            outcome_id,
            mastery: mastery_snapshot,
            spaced_repetition: schedule,
            blocked,
            remediation,
        })
    }

    pub async fn get_due_reviews(&self, learner_id: &str, limit: usize) -> Vec<ReviewCard> {
        self.store.due_cards(learner_id, Utc::now(), limit).await
    }

    pub async fn get_recommendations(
        &self,
        learner_id: &str,
        level: &str,
    ) -> Result<Vec<Recommendation>, CoreError> {
        recommend::recommendations_for(&self.curriculum, &self.store, learner_id, level).await
    }

    pub async fn get_learning_path(
        &self,
        learner_id: &str,
        level: &str,
    ) -> Result<LearningPath, CoreError> {
        recommend::learning_path(&self.curriculum, &self.store, learner_id, level).await
    }

    pub async fn top_error_patterns(&self, learner_id: &str, limit: usize) -> Vec<ErrorPattern> {
        recorder::top_error_patterns(&self.store, learner_id, limit).await
    }

    pub async fn suggest_remediation(&self, learner_id: &str) -> Vec<RemediationSuggestion> {
        recorder::suggest_remediation(&self.store, learner_id).await
    }

    pub async fn prerequisites_of(&self, skill_code: &str) -> Result<Vec<String>, CoreError> {
        prereq::prerequisites_of(&self.curriculum, &self.store, skill_code).await
    }

    pub async fn record_override(
        &self,
        skill_code: &str,
        prerequisite_code: &str,
    ) -> Result<(), CoreError> {
        for code in [skill_code, prerequisite_code] {
            if !self.curriculum.contains(code) {
                return Err(CoreError::not_found(format!("unknown skill {code}")));
            }
        }
        self.store.record_override(skill_code, prerequisite_code).await;
        Ok(())
    }

    pub async fn is_blocked_by_prerequisites(
        &self,
        learner_id: &str,
        skill_code: &str,
    ) -> Result<BlockingStatus, CoreError> {
        prereq::is_blocked_by_prerequisites(&self.curriculum, &self.store, learner_id, skill_code)
            .await
    }

    pub async fn is_struggling_on_skill(
        &self,
        learner_id: &str,
        skill_code: &str,
    ) -> StruggleStatus {
        prereq::is_struggling_on_skill(&self.store, &self.config.struggle, learner_id, skill_code)
            .await
    }

    pub async fn remediation_for(
        &self,
        learner_id: &str,
        skill_code: &str,
    ) -> Result<Vec<PrerequisiteRemediation>, CoreError> {
        prereq::remediation_for(&self.curriculum, &self.store, learner_id, skill_code).await
    }
}
