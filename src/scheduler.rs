//! SM-2 family spaced-repetition scheduling.
//!
//! One card per (learner, skill) pair. Quality is graded on the 0-5 scale;
//! anything below the lapse threshold resets the repetition streak and
//! drops the interval back to one day, while the easiness factor keeps
//! absorbing the grade so chronically hard skills grow slower afterwards.

use chrono::{DateTime, Duration, Utc};

use crate::config::SchedulerConfig;
use crate::types::ReviewCard;

/// One scheduling step. Returns the updated card; the caller persists it.
pub fn sm2_schedule(
    card: &ReviewCard,
    quality: f64,
    now: DateTime<Utc>,
    config: &SchedulerConfig,
) -> ReviewCard {
    let quality = quality.clamp(0.0, 5.0);

    let spread = 5.0 - quality;
    let new_ef = (card.easiness_factor + (0.1 - spread * (0.08 + spread * 0.02)))
        .max(config.min_easiness);

    let (repetition_number, interval_days) = if quality < config.lapse_quality {
        (0, config.first_interval_days)
    } else {
        let rep = card.repetition_number + 1;
        let interval = if rep == 1 {
            config.first_interval_days
        } else if rep == 2 {
            config.second_interval_days
        } else {
            ((card.interval_days as f64) * new_ef).round() as i64
        };
        (rep, interval.max(1))
    };

    ReviewCard {
        learner_id: card.learner_id.clone(),
        skill_code: card.skill_code.clone(),
        easiness_factor: new_ef,
        repetition_number,
        interval_days,
        last_review_at: Some(now),
        next_review_at: now + Duration::days(interval_days),
        last_quality: Some(quality),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(now: DateTime<Utc>) -> ReviewCard {
        ReviewCard::fresh("l1", "s1", now, &SchedulerConfig::default())
    }

    #[test]
    fn fresh_card_defaults() {
        let now = Utc::now();
        let card = fresh(now);
        assert_eq!(card.easiness_factor, 2.5);
        assert_eq!(card.repetition_number, 0);
        assert_eq!(card.interval_days, 1);
        assert_eq!(card.next_review_at, now + Duration::days(1));
    }

    #[test]
    fn low_quality_is_a_lapse() {
        let config = SchedulerConfig::default();
        let now = Utc::now();
        let mut card = fresh(now);
        card.repetition_number = 4;
        card.interval_days = 30;

        let updated = sm2_schedule(&card, 2.0, now, &config);
        assert_eq!(updated.repetition_number, 0);
        assert_eq!(updated.interval_days, 1);
        assert_eq!(updated.next_review_at, now + Duration::days(1));
        assert_eq!(updated.last_quality, Some(2.0));
        // The easiness factor still takes the hit.
        assert!(updated.easiness_factor < card.easiness_factor);
    }

    #[test]
    fn interval_growth_over_successful_reviews() {
        let config = SchedulerConfig::default();
        let mut now = Utc::now();
        let mut card = fresh(now);

        let mut reps = Vec::new();
        let mut intervals = Vec::new();
        for _ in 0..5 {
            card = sm2_schedule(&card, 4.0, now, &config);
            reps.push(card.repetition_number);
            intervals.push(card.interval_days);
            now = card.next_review_at;
        }

        assert_eq!(reps, vec![1, 2, 3, 4, 5]);
        assert_eq!(intervals[0], 1);
        assert_eq!(intervals[1], 6);
        for pair in intervals.windows(2) {
            assert!(pair[1] >= pair[0], "intervals must grow: {intervals:?}");
        }
        assert!(card.easiness_factor >= config.min_easiness);
    }

    #[test]
    fn easiness_never_drops_below_floor() {
        let config = SchedulerConfig::default();
        let now = Utc::now();
        let mut card = fresh(now);
        for _ in 0..50 {
            card = sm2_schedule(&card, 0.0, now, &config);
            assert!(card.easiness_factor >= config.min_easiness);
        }
        assert_eq!(card.easiness_factor, config.min_easiness);
    }

    #[test]
    fn perfect_quality_raises_easiness() {
        let config = SchedulerConfig::default();
        let now = Utc::now();
        let card = fresh(now);
        let updated = sm2_schedule(&card, 5.0, now, &config);
        assert!(updated.easiness_factor > card.easiness_factor);
    }
}
