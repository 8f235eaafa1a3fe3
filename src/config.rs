use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasteryConfig {
    /// Number of most recent outcomes the estimator recomputes from.
    pub window_size: usize,
    /// Percent deducted per hint used on the latest attempt.
    pub hint_penalty_per_hint: f64,
    /// Cap on the total hint penalty.
    pub hint_penalty_cap: f64,
    /// Minimum percent for the mastered classification.
    pub mastered_percent: f64,
    /// Minimum average quality for the mastered classification.
    pub mastered_quality: f64,
    /// Minimum percent for the in-progress classification.
    pub in_progress_percent: f64,
    /// Below this percent the skill needs review.
    pub review_percent: f64,
    /// Below this average quality the skill needs review.
    pub review_quality: f64,
}

impl Default for MasteryConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            hint_penalty_per_hint: 2.0,
            hint_penalty_cap: 10.0,
            mastered_percent: 90.0,
            mastered_quality: 3.0,
            in_progress_percent: 50.0,
            review_percent: 80.0,
            review_quality: 2.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub initial_easiness: f64,
    /// Floor for the easiness factor.
    pub min_easiness: f64,
    /// Interval after the first successful repetition, in days.
    pub first_interval_days: i64,
    /// Interval after the second successful repetition, in days.
    pub second_interval_days: i64,
    /// Quality below this counts as a lapse.
    pub lapse_quality: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_easiness: 2.5,
            min_easiness: 1.3,
            first_interval_days: 1,
            second_interval_days: 6,
            lapse_quality: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StruggleConfig {
    /// Number of most recent outcomes on the target skill to inspect.
    pub window: usize,
    /// Failures within the window at or above which the learner is struggling.
    pub failure_threshold: usize,
}

impl Default for StruggleConfig {
    fn default() -> Self {
        Self {
            window: 5,
            failure_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Try-lock attempts before a per-pair update gives up.
    pub attempts: u32,
    /// Backoff between attempts, in milliseconds.
    pub backoff_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            attempts: 8,
            backoff_ms: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    pub mastery: MasteryConfig,
    pub scheduler: SchedulerConfig,
    pub struggle: StruggleConfig,
    pub lock: LockConfig,
}

impl CoreConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CORE_MASTERY_WINDOW") {
            if let Ok(parsed) = val.parse::<usize>() {
                config.mastery.window_size = parsed.max(1);
            }
        }
        if let Ok(val) = std::env::var("CORE_MASTERY_HINT_PENALTY_CAP") {
            if let Ok(parsed) = val.parse::<f64>() {
                config.mastery.hint_penalty_cap = parsed.max(0.0);
            }
        }
        if let Ok(val) = std::env::var("CORE_MASTERED_PERCENT") {
            if let Ok(parsed) = val.parse::<f64>() {
                config.mastery.mastered_percent = parsed.clamp(0.0, 100.0);
            }
        }
        if let Ok(val) = std::env::var("CORE_IN_PROGRESS_PERCENT") {
            if let Ok(parsed) = val.parse::<f64>() {
                config.mastery.in_progress_percent = parsed.clamp(0.0, 100.0);
            }
        }
        if let Ok(val) = std::env::var("CORE_MIN_EASINESS") {
            if let Ok(parsed) = val.parse::<f64>() {
                config.scheduler.min_easiness = parsed;
            }
        }
        if let Ok(val) = std::env::var("CORE_STRUGGLE_WINDOW") {
            if let Ok(parsed) = val.parse::<usize>() {
                config.struggle.window = parsed.max(1);
            }
        }
        if let Ok(val) = std::env::var("CORE_STRUGGLE_THRESHOLD") {
            if let Ok(parsed) = val.parse::<usize>() {
                config.struggle.failure_threshold = parsed.max(1);
            }
        }
        if let Ok(val) = std::env::var("CORE_LOCK_ATTEMPTS") {
            if let Ok(parsed) = val.parse::<u32>() {
                config.lock.attempts = parsed.max(1);
            }
        }

        config
    }
}
