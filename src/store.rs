//! In-memory reference store for per-learner learning state.
//!
//! Four keyed tables (outcomes, progress, review cards, error patterns)
//! plus runtime prerequisite override edges. Per-(learner, skill) writes
//! are serialized through a lock registry; reads may run against the
//! current snapshot without locking.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::config::LockConfig;
use crate::error::CoreError;
use crate::types::{ErrorPattern, Outcome, Progress, ReviewCard};

type PairKey = (String, String);

fn pair_key(learner_id: &str, skill_code: &str) -> PairKey {
    (learner_id.to_string(), skill_code.to_string())
}

#[derive(Default)]
pub struct LearningStore {
    outcomes: RwLock<HashMap<PairKey, Vec<Outcome>>>,
    progress: RwLock<HashMap<PairKey, Progress>>,
    cards: RwLock<HashMap<PairKey, ReviewCard>>,
    error_patterns: RwLock<HashMap<PairKey, HashMap<String, ErrorPattern>>>,
    /// Explicit prerequisite override edges, in recording order.
    overrides: RwLock<HashMap<String, Vec<String>>>,
    pair_locks: parking_lot::Mutex<HashMap<PairKey, Arc<Mutex<()>>>>,
}

impl LearningStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes the read-aggregate-write sequence for one pair. Gives up
    /// after the configured try-lock budget instead of queueing forever so
    /// duplicate submissions surface as a conflict the caller can retry.
    pub async fn acquire_pair(
        &self,
        learner_id: &str,
        skill_code: &str,
        config: &LockConfig,
    ) -> Result<OwnedMutexGuard<()>, CoreError> {
        let lock = {
            let mut registry = self.pair_locks.lock();
            Arc::clone(
                registry
                    .entry(pair_key(learner_id, skill_code))
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let attempts = config.attempts.max(1);
        for attempt in 0..attempts {
            match Arc::clone(&lock).try_lock_owned() {
                Ok(guard) => return Ok(guard),
                Err(_) if attempt + 1 < attempts => {
                    tokio::time::sleep(std::time::Duration::from_millis(config.backoff_ms)).await;
                }
                Err(_) => break,
            }
        }

        Err(CoreError::ConcurrencyConflict {
            learner_id: learner_id.to_string(),
            skill_code: skill_code.to_string(),
        })
    }

    pub async fn append_outcome(&self, outcome: Outcome) {
        let key = pair_key(&outcome.learner_id, &outcome.skill_code);
        let mut outcomes = self.outcomes.write().await;
        outcomes.entry(key).or_default().push(outcome);
    }

    /// Most recent outcomes for the pair, newest first.
    pub async fn recent_outcomes(
        &self,
        learner_id: &str,
        skill_code: &str,
        limit: usize,
    ) -> Vec<Outcome> {
        let outcomes = self.outcomes.read().await;
        match outcomes.get(&pair_key(learner_id, skill_code)) {
            Some(all) => all.iter().rev().take(limit).cloned().collect(),
            None => Vec::new(),
        }
    }

    pub async fn outcome_count(&self, learner_id: &str, skill_code: &str) -> usize {
        let outcomes = self.outcomes.read().await;
        outcomes
            .get(&pair_key(learner_id, skill_code))
            .map(|all| all.len())
            .unwrap_or(0)
    }

    pub async fn get_progress(&self, learner_id: &str, skill_code: &str) -> Option<Progress> {
        let progress = self.progress.read().await;
        progress.get(&pair_key(learner_id, skill_code)).cloned()
    }

    pub async fn put_progress(&self, row: Progress) {
        let key = pair_key(&row.learner_id, &row.skill_code);
        let mut progress = self.progress.write().await;
        progress.insert(key, row);
    }

    pub async fn get_card(&self, learner_id: &str, skill_code: &str) -> Option<ReviewCard> {
        let cards = self.cards.read().await;
        cards.get(&pair_key(learner_id, skill_code)).cloned()
    }

    pub async fn put_card(&self, card: ReviewCard) {
        let key = pair_key(&card.learner_id, &card.skill_code);
        let mut cards = self.cards.write().await;
        cards.insert(key, card);
    }

    /// Cards due before `now` for the learner, ascending by due date.
    pub async fn due_cards(
        &self,
        learner_id: &str,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Vec<ReviewCard> {
        let cards = self.cards.read().await;
        let mut due: Vec<ReviewCard> = cards
            .iter()
            .filter(|((learner, _), card)| learner == learner_id && card.next_review_at < now)
            .map(|(_, card)| card.clone())
            .collect();
        due.sort_by_key(|card| card.next_review_at);
        due.truncate(limit);
        due
    }

    pub async fn upsert_error_pattern(
        &self,
        learner_id: &str,
        skill_code: &str,
        tag: &str,
        seen_at: DateTime<Utc>,
    ) {
        let mut patterns = self.error_patterns.write().await;
        let per_pair = patterns.entry(pair_key(learner_id, skill_code)).or_default();
        per_pair
            .entry(tag.to_string())
            .and_modify(|pattern| {
                pattern.occurrences += 1;
                pattern.last_seen_at = seen_at;
            })
            .or_insert_with(|| ErrorPattern {
                learner_id: learner_id.to_string(),
                skill_code: skill_code.to_string(),
                tag: tag.to_string(),
                occurrences: 1,
                last_seen_at: seen_at,
            });
    }

    pub async fn error_patterns_for(&self, learner_id: &str) -> Vec<ErrorPattern> {
        let patterns = self.error_patterns.read().await;
        patterns
            .iter()
            .filter(|((learner, _), _)| learner == learner_id)
            .flat_map(|(_, per_pair)| per_pair.values().cloned())
            .collect()
    }

    pub async fn record_override(&self, skill_code: &str, prerequisite_code: &str) {
        let mut overrides = self.overrides.write().await;
        let edges = overrides.entry(skill_code.to_string()).or_default();
        if !edges.iter().any(|code| code == prerequisite_code) {
            edges.push(prerequisite_code.to_string());
        }
    }

    pub async fn overrides_for(&self, skill_code: &str) -> Vec<String> {
        let overrides = self.overrides.read().await;
        overrides.get(skill_code).cloned().unwrap_or_default()
    }
}
