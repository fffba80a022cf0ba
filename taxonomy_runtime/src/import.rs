//! Bulk import of already-parsed rows into the side registries.
//!
//! Skills are resolved by name against the active part of the forest.
//! A bad row is skipped with a reason; it never aborts the batch.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use taxonomy_kernel::domain::Forest;
use taxonomy_kernel::error::CatalogError;
use taxonomy_kernel::relationships::SkillRelationshipRegistry;
use taxonomy_kernel::role_mapping::{Criticality, MappingTarget, RoleSkillRegistry};
use taxonomy_kernel::tree::find_skill_by_name;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("rows could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Why a single row (or one pair within a row) was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("column {0} is empty")]
    EmptyColumn(&'static str),

    #[error("no active skill named {0:?}")]
    UnknownSkill(String),

    #[error("unknown criticality {0:?}")]
    InvalidCriticality(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// `related_skills` holds one or more skill names separated by commas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRow {
    pub skill: String,
    pub related_skills: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSkillRow {
    pub job_role_name: String,
    pub skill_name: String,
    pub proficiency_level: String,
    pub criticality_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// Zero-based position in the input.
    pub row: usize,
    pub reason: RowError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
}

impl ImportReport {
    fn skip(&mut self, row: usize, reason: RowError) {
        debug!(row, reason = %reason, "import.row.skipped");
        self.skipped.push(SkippedRow { row, reason });
    }
}

/// Parse a JSON array of rows.
pub fn parse_rows<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, ImportError> {
    Ok(serde_json::from_str(json)?)
}

fn resolve_skill(forest: &Forest, column: &'static str, name: &str) -> Result<String, RowError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RowError::EmptyColumn(column));
    }
    find_skill_by_name(forest, name)
        .map(|n| n.id.clone())
        .ok_or_else(|| RowError::UnknownSkill(name.to_string()))
}

/// Add one relationship per (skill, related skill) pair.
/// `imported` counts pairs, so one row can add several.
pub fn import_relationships(
    forest: &Forest,
    registry: &mut SkillRelationshipRegistry,
    rows: &[RelationshipRow],
) -> ImportReport {
    let mut report = ImportReport::default();
    for (index, row) in rows.iter().enumerate() {
        let skill_id = match resolve_skill(forest, "skill", &row.skill) {
            Ok(id) => id,
            Err(reason) => {
                report.skip(index, reason);
                continue;
            }
        };

        let names: Vec<&str> = row
            .related_skills
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if names.is_empty() {
            report.skip(index, RowError::EmptyColumn("related_skills"));
            continue;
        }

        for name in names {
            let added = resolve_skill(forest, "related_skills", name).and_then(|related_id| {
                registry
                    .add(forest, &skill_id, &related_id)
                    .map(|_| ())
                    .map_err(RowError::from)
            });
            match added {
                Ok(()) => report.imported += 1,
                Err(reason) => report.skip(index, reason),
            }
        }
    }
    info!(
        imported = report.imported,
        skipped = report.skipped.len(),
        "import.relationships"
    );
    report
}

/// Map each row's skill onto a job role.
pub fn import_role_skills(
    forest: &Forest,
    registry: &mut RoleSkillRegistry,
    rows: &[RoleSkillRow],
) -> ImportReport {
    let mut report = ImportReport::default();
    for (index, row) in rows.iter().enumerate() {
        match import_role_skill(forest, registry, row) {
            Ok(()) => report.imported += 1,
            Err(reason) => report.skip(index, reason),
        }
    }
    info!(
        imported = report.imported,
        skipped = report.skipped.len(),
        "import.role_skills"
    );
    report
}

fn import_role_skill(
    forest: &Forest,
    registry: &mut RoleSkillRegistry,
    row: &RoleSkillRow,
) -> Result<(), RowError> {
    let role = row.job_role_name.trim();
    if role.is_empty() {
        return Err(RowError::EmptyColumn("job_role_name"));
    }
    let skill_id = resolve_skill(forest, "skill_name", &row.skill_name)?;
    let criticality: Criticality = row
        .criticality_level
        .parse()
        .map_err(|_| RowError::InvalidCriticality(row.criticality_level.clone()))?;
    registry.add(
        forest,
        MappingTarget::job_role(role),
        &skill_id,
        &row.proficiency_level,
        criticality,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use taxonomy_kernel::operations::inactivate_subtree;
    use taxonomy_kernel::seed::sample_forest;

    fn forest() -> Forest {
        sample_forest(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn rel(skill: &str, related: &str) -> RelationshipRow {
        RelationshipRow {
            skill: skill.to_string(),
            related_skills: related.to_string(),
        }
    }

    fn role(role: &str, skill: &str, level: &str, criticality: &str) -> RoleSkillRow {
        RoleSkillRow {
            job_role_name: role.to_string(),
            skill_name: skill.to_string(),
            proficiency_level: level.to_string(),
            criticality_level: criticality.to_string(),
        }
    }

    #[test]
    fn relationship_rows_split_names_and_skip_unknowns() {
        let f = forest();
        let mut registry = SkillRelationshipRegistry::new();
        let rows = vec![
            rel("rust", "Kotlin, TypeScript ,"),
            rel("Rust", "kotlin"),
            rel("Cobol", "Rust"),
            rel("AWS", "Fortran"),
            rel("AWS", "  "),
        ];
        let report = import_relationships(&f, &mut registry, &rows);

        assert_eq!(report.imported, 2);
        assert_eq!(registry.len(), 2);
        let reasons: Vec<(usize, &RowError)> =
            report.skipped.iter().map(|s| (s.row, &s.reason)).collect();
        assert!(matches!(reasons[0], (1, RowError::Catalog(CatalogError::Duplicate(_)))));
        assert_eq!(reasons[1], (2, &RowError::UnknownSkill("Cobol".to_string())));
        assert_eq!(reasons[2], (3, &RowError::UnknownSkill("Fortran".to_string())));
        assert_eq!(reasons[3], (4, &RowError::EmptyColumn("related_skills")));
    }

    #[test]
    fn inactive_skills_do_not_resolve() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let (f, _) = inactivate_subtree(&forest(), "group-cloud", at).unwrap();
        let mut registry = SkillRelationshipRegistry::new();
        let report = import_relationships(&f, &mut registry, &[rel("Rust", "AWS")]);
        assert_eq!(report.imported, 0);
        assert_eq!(report.skipped[0].reason, RowError::UnknownSkill("AWS".to_string()));
    }

    #[test]
    fn role_skill_rows_validate_each_column() {
        let f = forest();
        let mut registry = RoleSkillRegistry::new();
        let rows = vec![
            role("Backend Engineer", "rust", "expert", "High"),
            role("Backend Engineer", "Rust", "beginner", "low"),
            role("", "Rust", "expert", "High"),
            role("Data Engineer", "Rust", "wizard", "High"),
            role("Data Engineer", "Rust", "expert", "urgent"),
            role("Data Engineer", "Kotlin", "intermediate", "medium"),
        ];
        let report = import_role_skills(&f, &mut registry, &rows);

        assert_eq!(report.imported, 2);
        assert_eq!(registry.list()[0].proficiency_level, "Expert");
        assert_eq!(registry.list()[1].criticality, Criticality::Medium);
        let rows_skipped: Vec<usize> = report.skipped.iter().map(|s| s.row).collect();
        assert_eq!(rows_skipped, vec![1, 2, 3, 4]);
        assert_eq!(report.skipped[1].reason, RowError::EmptyColumn("job_role_name"));
        assert!(matches!(
            report.skipped[2].reason,
            RowError::Catalog(CatalogError::UnknownLevel { .. })
        ));
        assert_eq!(
            report.skipped[3].reason,
            RowError::InvalidCriticality("urgent".to_string())
        );
    }

    #[test]
    fn parses_rows_from_json() {
        let rows: Vec<RoleSkillRow> = parse_rows(
            r#"[{"job_role_name":"SRE","skill_name":"AWS","proficiency_level":"Advanced","criticality_level":"High"}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].skill_name, "AWS");
        assert!(parse_rows::<RelationshipRow>("[{]").is_err());
    }
}
