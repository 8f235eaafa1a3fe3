//! Immutable curriculum registry.
//!
//! Skill definitions and prerequisite edges are reference data owned by the
//! curriculum collaborator. They are loaded once at process start and never
//! mutated afterwards; curriculum updates mean rebuilding the registry.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// An atomic curriculum unit identified by a hierarchical code
/// (`LEVEL.SUBJECT.DOMAIN.N`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub code: String,
    pub level: String,
    pub domain: String,
    #[serde(default)]
    pub subdomain: String,
    #[serde(default)]
    pub prerequisite_codes: HashSet<String>,
    /// Marks a major difficulty jump warranting elevated priority.
    #[serde(default)]
    pub qualitative_leap: bool,
}

#[derive(Debug, Default)]
pub struct CurriculumRegistry {
    skills: HashMap<String, Skill>,
    /// Skill codes per level, in curriculum declaration order.
    level_index: HashMap<String, Vec<String>>,
}

impl CurriculumRegistry {
    pub fn from_skills(skills: Vec<Skill>) -> Self {
        let mut registry = Self::default();
        for skill in skills {
            registry
                .level_index
                .entry(skill.level.clone())
                .or_default()
                .push(skill.code.clone());
            registry.skills.insert(skill.code.clone(), skill);
        }
        registry
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CoreError> {
        let skills: Vec<Skill> = serde_json::from_str(raw)
            .map_err(|err| CoreError::validation(format!("invalid curriculum json: {err}")))?;
        Ok(Self::from_skills(skills))
    }

    pub fn get_skill(&self, code: &str) -> Option<&Skill> {
        self.skills.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.skills.contains_key(code)
    }

    pub fn prerequisites_declared_for(&self, code: &str) -> HashSet<String> {
        self.skills
            .get(code)
            .map(|skill| skill.prerequisite_codes.clone())
            .unwrap_or_default()
    }

    pub fn skills_of(&self, level: &str) -> Vec<&Skill> {
        self.level_index
            .get(level)
            .map(|codes| {
                codes
                    .iter()
                    .filter_map(|code| self.skills.get(code))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_level(&self, level: &str) -> bool {
        self.level_index.contains_key(level)
    }

    pub fn is_qualitative_leap(&self, code: &str) -> bool {
        self.skills
            .get(code)
            .map(|skill| skill.qualitative_leap)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
