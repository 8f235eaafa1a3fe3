//! Adaptive-learning core: mastery estimation, SM-2 spaced repetition,
//! prerequisite blocking and recommendation assembly over per-learner
//! skill state.
//!
//! The crate is storage- and transport-agnostic. Callers feed practice
//! outcomes into [`engine::LearningEngine`] and read back mastery
//! snapshots, review schedules, blocking state and recommendations.

pub mod config;
pub mod curriculum;
pub mod engine;
pub mod error;
pub mod logging;
pub mod mastery;
pub mod prereq;
pub mod recommend;
pub mod recorder;
pub mod scheduler;
pub mod store;
pub mod types;

pub use config::CoreConfig;
pub use curriculum::{CurriculumRegistry, Skill};
pub use engine::LearningEngine;
pub use error::CoreError;
