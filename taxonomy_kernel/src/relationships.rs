/// Taxonomy Kernel: Skill Relationships
///
/// Undirected "related skill" pairs between skill nodes. A pair is stored
/// once regardless of the order it was given in.

use serde::{Deserialize, Serialize};

use crate::domain::{Forest, NodeType};
use crate::error::CatalogError;
use crate::ids::{new_record_id, NodeId};
use crate::tree::find_node_by_id;

/// One related-skill pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillRelationship {
    pub id: String,
    pub skill_id: NodeId,
    pub related_skill_id: NodeId,
}

impl SkillRelationship {
    /// True if this pair joins `a` and `b`, in either order.
    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.skill_id == a && self.related_skill_id == b)
            || (self.skill_id == b && self.related_skill_id == a)
    }

    /// The other end of the pair, if `skill_id` is one end.
    pub fn other_end(&self, skill_id: &str) -> Option<&str> {
        if self.skill_id == skill_id {
            Some(&self.related_skill_id)
        } else if self.related_skill_id == skill_id {
            Some(&self.skill_id)
        } else {
            None
        }
    }
}

/// In-memory registry of relationships.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillRelationshipRegistry {
    relationships: Vec<SkillRelationship>,
}

impl SkillRelationshipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &[SkillRelationship] {
        &self.relationships
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// Relate two skills. Both must be skill nodes present in `forest`.
    pub fn add(
        &mut self,
        forest: &Forest,
        skill_id: &str,
        related_skill_id: &str,
    ) -> Result<&SkillRelationship, CatalogError> {
        let skill_id = required("skill_id", skill_id)?;
        let related_skill_id = required("related_skill_id", related_skill_id)?;
        if skill_id == related_skill_id {
            return Err(CatalogError::SelfRelation(skill_id.to_string()));
        }
        ensure_skill(forest, skill_id)?;
        ensure_skill(forest, related_skill_id)?;
        if self.relationships.iter().any(|r| r.joins(skill_id, related_skill_id)) {
            return Err(CatalogError::Duplicate(format!(
                "{} <-> {}",
                skill_id, related_skill_id
            )));
        }

        self.relationships.push(SkillRelationship {
            id: new_record_id("rel"),
            skill_id: skill_id.to_string(),
            related_skill_id: related_skill_id.to_string(),
        });
        Ok(&self.relationships[self.relationships.len() - 1])
    }

    /// Remove a relationship by record id.
    pub fn remove(&mut self, id: &str) -> Result<SkillRelationship, CatalogError> {
        let pos = self
            .relationships
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        Ok(self.relationships.remove(pos))
    }

    /// Ids of every skill related to `skill_id`, in insertion order.
    pub fn related_to(&self, skill_id: &str) -> Vec<&str> {
        self.relationships
            .iter()
            .filter_map(|r| r.other_end(skill_id))
            .collect()
    }
}

pub(crate) fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, CatalogError> {
    let value = value.trim();
    if value.is_empty() {
        Err(CatalogError::MissingField(field))
    } else {
        Ok(value)
    }
}

/// `skill_id` must name an active skill, as name lookups on import do.
pub(crate) fn ensure_skill(forest: &Forest, skill_id: &str) -> Result<(), CatalogError> {
    match find_node_by_id(forest, skill_id) {
        Some(node) if node.node_type == NodeType::Skill && node.is_active => Ok(()),
        Some(node) if node.node_type == NodeType::Skill => {
            Err(CatalogError::InactiveSkill(skill_id.to_string()))
        }
        _ => Err(CatalogError::UnknownSkill(skill_id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::sample_forest;
    use chrono::{TimeZone, Utc};

    fn forest() -> Forest {
        sample_forest(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn add_and_query_both_directions() {
        let f = forest();
        let mut reg = SkillRelationshipRegistry::new();
        reg.add(&f, "skill-rust", "skill-kotlin").unwrap();
        assert_eq!(reg.related_to("skill-rust"), vec!["skill-kotlin"]);
        assert_eq!(reg.related_to("skill-kotlin"), vec!["skill-rust"]);
    }

    #[test]
    fn reversed_pair_is_a_duplicate() {
        let f = forest();
        let mut reg = SkillRelationshipRegistry::new();
        reg.add(&f, "skill-rust", "skill-kotlin").unwrap();
        let err = reg.add(&f, "skill-kotlin", "skill-rust").unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate(_)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn rejects_self_relation_missing_fields_and_non_skills() {
        let f = forest();
        let mut reg = SkillRelationshipRegistry::new();
        assert_eq!(
            reg.add(&f, "skill-rust", "skill-rust").unwrap_err(),
            CatalogError::SelfRelation("skill-rust".to_string())
        );
        assert_eq!(
            reg.add(&f, "  ", "skill-rust").unwrap_err(),
            CatalogError::MissingField("skill_id")
        );
        assert_eq!(
            reg.add(&f, "skill-rust", "group-programming").unwrap_err(),
            CatalogError::UnknownSkill("group-programming".to_string())
        );
    }

    #[test]
    fn inactive_skills_cannot_be_related() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let (f, _) = crate::operations::inactivate_subtree(&forest(), "group-cloud", at).unwrap();
        let mut reg = SkillRelationshipRegistry::new();
        assert_eq!(
            reg.add(&f, "skill-rust", "skill-aws").unwrap_err(),
            CatalogError::InactiveSkill("skill-aws".to_string())
        );
        assert!(reg.is_empty());
    }

    #[test]
    fn remove_by_record_id() {
        let f = forest();
        let mut reg = SkillRelationshipRegistry::new();
        let id = reg.add(&f, "skill-rust", "skill-kotlin").unwrap().id.clone();
        assert!(reg.remove(&id).is_ok());
        assert!(reg.is_empty());
        assert_eq!(reg.remove(&id).unwrap_err(), CatalogError::NotFound(id));
    }
}
