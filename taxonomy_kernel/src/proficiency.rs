/// Taxonomy Kernel: Proficiency Levels
///
/// Score bands attached to skill nodes. Scores are 0..=100 inclusive.
/// Overlapping bands are allowed; `overlapping_levels` reports them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::domain::{Forest, NodeType, ProficiencyLevel};
use crate::error::TaxonomyError;
use crate::tree::find_node_mut;

/// Highest score a band may reach.
pub const MAX_SCORE: u8 = 100;

/// Beginner / Intermediate / Advanced / Expert, covering 0..=100.
pub fn default_proficiency_levels() -> Vec<ProficiencyLevel> {
    [
        ("beginner", "Beginner", "Basic understanding, needs guidance", 0, 25),
        ("intermediate", "Intermediate", "Works independently on routine tasks", 26, 50),
        ("advanced", "Advanced", "Handles complex work and mentors others", 51, 75),
        ("expert", "Expert", "Recognised authority, sets direction", 76, 100),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (id, title, description, min_score, max_score))| ProficiencyLevel {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        min_score,
        max_score,
        order: i as u32 + 1,
    })
    .collect()
}

/// Check titles, ids and score ranges of a level set.
pub fn validate_levels(levels: &[ProficiencyLevel]) -> Result<(), TaxonomyError> {
    let mut titles = BTreeSet::new();
    let mut ids = BTreeSet::new();
    for level in levels {
        let title = level.title.trim();
        if title.is_empty() {
            return Err(TaxonomyError::InvalidProficiency(
                "level title must not be empty".to_string(),
            ));
        }
        if !titles.insert(title.to_lowercase()) {
            return Err(TaxonomyError::InvalidProficiency(format!(
                "duplicate level title {:?}",
                title
            )));
        }
        if level.id.trim().is_empty() || !ids.insert(level.id.as_str()) {
            return Err(TaxonomyError::InvalidProficiency(format!(
                "level {:?} needs a unique, non-empty id",
                title
            )));
        }
        if level.max_score > MAX_SCORE {
            return Err(TaxonomyError::InvalidProficiency(format!(
                "level {:?} max_score {} exceeds {}",
                title, level.max_score, MAX_SCORE
            )));
        }
        if level.min_score > level.max_score {
            return Err(TaxonomyError::InvalidProficiency(format!(
                "level {:?} min_score {} > max_score {}",
                title, level.min_score, level.max_score
            )));
        }
    }
    Ok(())
}

/// Pairs of titles whose score ranges intersect.
pub fn overlapping_levels(levels: &[ProficiencyLevel]) -> Vec<(String, String)> {
    let mut overlaps = Vec::new();
    for (i, a) in levels.iter().enumerate() {
        for b in &levels[i + 1..] {
            if a.min_score <= b.max_score && b.min_score <= a.max_score {
                overlaps.push((a.title.clone(), b.title.clone()));
            }
        }
    }
    overlaps
}

/// Sort levels by `order`, ties broken by `min_score`.
pub fn sorted_levels(mut levels: Vec<ProficiencyLevel>) -> Vec<ProficiencyLevel> {
    levels.sort_by(|a, b| a.order.cmp(&b.order).then(a.min_score.cmp(&b.min_score)));
    levels
}

/// Replace the levels of skill `skill_id`. Returns the new forest.
pub fn set_proficiency_levels(
    forest: &Forest,
    skill_id: &str,
    levels: Vec<ProficiencyLevel>,
    now: DateTime<Utc>,
) -> Result<Forest, TaxonomyError> {
    validate_levels(&levels)?;

    let mut new_forest = forest.clone();
    let node = find_node_mut(&mut new_forest.roots, skill_id)
        .ok_or_else(|| TaxonomyError::NodeNotFound(skill_id.to_string()))?;

    if node.node_type != NodeType::Skill {
        return Err(TaxonomyError::InvalidProficiency(format!(
            "{} {:?} is not a skill",
            node.node_type, node.id
        )));
    }

    node.proficiency_levels = Some(sorted_levels(levels));
    node.touch(now);
    Ok(new_forest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(id: &str, title: &str, min: u8, max: u8, order: u32) -> ProficiencyLevel {
        ProficiencyLevel {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            min_score: min,
            max_score: max,
            order,
        }
    }

    #[test]
    fn defaults_cover_full_range_without_overlap() {
        let levels = default_proficiency_levels();
        assert_eq!(levels.len(), 4);
        assert_eq!(levels[0].min_score, 0);
        assert_eq!(levels[3].max_score, 100);
        assert!(validate_levels(&levels).is_ok());
        assert!(overlapping_levels(&levels).is_empty());
    }

    #[test]
    fn rejects_inverted_range() {
        let err = validate_levels(&[level("a", "A", 60, 40, 1)]).unwrap_err();
        assert!(matches!(err, TaxonomyError::InvalidProficiency(_)));
    }

    #[test]
    fn rejects_score_above_hundred() {
        assert!(validate_levels(&[level("a", "A", 90, 101, 1)]).is_err());
    }

    #[test]
    fn rejects_duplicate_titles_case_insensitive() {
        let levels = vec![level("a", "Expert", 0, 50, 1), level("b", "expert", 51, 100, 2)];
        assert!(validate_levels(&levels).is_err());
    }

    #[test]
    fn reports_overlaps_but_accepts_them() {
        let levels = vec![level("a", "Low", 0, 50, 1), level("b", "High", 40, 100, 2)];
        assert!(validate_levels(&levels).is_ok());
        assert_eq!(
            overlapping_levels(&levels),
            vec![("Low".to_string(), "High".to_string())]
        );
    }

    #[test]
    fn sorted_by_order() {
        let levels = sorted_levels(vec![level("b", "B", 51, 100, 2), level("a", "A", 0, 50, 1)]);
        assert_eq!(levels[0].id, "a");
    }
}
