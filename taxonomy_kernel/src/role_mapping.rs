/// Taxonomy Kernel: Role Skill Mappings
///
/// Maps skills onto job roles, job variants and positions, each with a
/// required proficiency level and a criticality tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::Forest;
use crate::error::CatalogError;
use crate::ids::{new_record_id, NodeId};
use crate::relationships::{ensure_skill, required};
use crate::tree::find_node_by_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    JobRole,
    JobVariant,
    Position,
}

/// What a skill is mapped onto: a kind plus a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingTarget {
    pub kind: TargetKind,
    pub name: String,
}

impl MappingTarget {
    pub fn job_role(name: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::JobRole,
            name: name.into(),
        }
    }

    pub fn job_variant(name: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::JobVariant,
            name: name.into(),
        }
    }

    pub fn position(name: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Position,
            name: name.into(),
        }
    }

    /// Same kind, names equal ignoring case and surrounding space.
    pub fn matches(&self, other: &MappingTarget) -> bool {
        self.kind == other.kind && self.name.trim().eq_ignore_ascii_case(other.name.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    High,
    Medium,
    Low,
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Criticality::High => "High",
            Criticality::Medium => "Medium",
            Criticality::Low => "Low",
        })
    }
}

impl FromStr for Criticality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Criticality::High),
            "medium" => Ok(Criticality::Medium),
            "low" => Ok(Criticality::Low),
            other => Err(format!("unknown criticality level {:?}", other)),
        }
    }
}

/// One skill requirement of a role, variant or position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleSkillMapping {
    pub id: String,
    pub target: MappingTarget,
    pub skill_id: NodeId,
    /// Title of one of the skill's proficiency levels.
    pub proficiency_level: String,
    pub criticality: Criticality,
}

/// In-memory registry of role skill mappings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleSkillRegistry {
    mappings: Vec<RoleSkillMapping>,
}

impl RoleSkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &[RoleSkillMapping] {
        &self.mappings
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Map `skill_id` onto `target`. One mapping per (target, skill).
    pub fn add(
        &mut self,
        forest: &Forest,
        target: MappingTarget,
        skill_id: &str,
        proficiency_level: &str,
        criticality: Criticality,
    ) -> Result<&RoleSkillMapping, CatalogError> {
        let target_name = required("target_name", &target.name)?.to_string();
        let skill_id = required("skill_id", skill_id)?;
        ensure_skill(forest, skill_id)?;
        let level = resolve_level(forest, skill_id, proficiency_level)?;

        let target = MappingTarget {
            kind: target.kind,
            name: target_name,
        };
        if self
            .mappings
            .iter()
            .any(|m| m.skill_id == skill_id && m.target.matches(&target))
        {
            return Err(CatalogError::Duplicate(format!(
                "{} already mapped to {:?}",
                skill_id, target.name
            )));
        }

        self.mappings.push(RoleSkillMapping {
            id: new_record_id("map"),
            target,
            skill_id: skill_id.to_string(),
            proficiency_level: level,
            criticality,
        });
        Ok(&self.mappings[self.mappings.len() - 1])
    }

    /// Change the level and/or criticality of an existing mapping.
    pub fn update(
        &mut self,
        forest: &Forest,
        id: &str,
        proficiency_level: Option<&str>,
        criticality: Option<Criticality>,
    ) -> Result<&RoleSkillMapping, CatalogError> {
        let pos = self.position(id)?;
        let level = match proficiency_level {
            Some(level) => Some(resolve_level(forest, &self.mappings[pos].skill_id, level)?),
            None => None,
        };

        let mapping = &mut self.mappings[pos];
        if let Some(level) = level {
            mapping.proficiency_level = level;
        }
        if let Some(criticality) = criticality {
            mapping.criticality = criticality;
        }
        Ok(&self.mappings[pos])
    }

    pub fn remove(&mut self, id: &str) -> Result<RoleSkillMapping, CatalogError> {
        let pos = self.position(id)?;
        Ok(self.mappings.remove(pos))
    }

    pub fn for_target(&self, target: &MappingTarget) -> Vec<&RoleSkillMapping> {
        self.mappings.iter().filter(|m| m.target.matches(target)).collect()
    }

    pub fn for_skill(&self, skill_id: &str) -> Vec<&RoleSkillMapping> {
        self.mappings.iter().filter(|m| m.skill_id == skill_id).collect()
    }

    fn position(&self, id: &str) -> Result<usize, CatalogError> {
        self.mappings
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }
}

/// Match `level` against the skill's level titles, returning the stored
/// title. Skills without levels accept any non-empty title.
fn resolve_level(forest: &Forest, skill_id: &str, level: &str) -> Result<String, CatalogError> {
    let level = required("proficiency_level", level)?;
    let levels = find_node_by_id(forest, skill_id).and_then(|n| n.proficiency_levels.as_ref());
    match levels {
        Some(levels) => levels
            .iter()
            .find(|l| l.title.eq_ignore_ascii_case(level))
            .map(|l| l.title.clone())
            .ok_or_else(|| CatalogError::UnknownLevel {
                skill_id: skill_id.to_string(),
                level: level.to_string(),
            }),
        None => Ok(level.to_string()),
    }
}
