//! Integration tests for taxonomy_runtime: a console session driven end to
//! end, then replayed, snapshotted and compared.

use chrono::{Duration, TimeZone, Utc};

use taxonomy_kernel::domain::{NodeDraft, NodePatch, NodeType, ProficiencyLevel};
use taxonomy_kernel::error::{CatalogError, EngineError, TaxonomyError};
use taxonomy_kernel::role_mapping::{Criticality, MappingTarget};
use taxonomy_kernel::seed::sample_forest;
use taxonomy_kernel::tree::find_node_by_id;

use taxonomy_runtime::config::ConsoleConfig;
use taxonomy_runtime::drift::compare_forests;
use taxonomy_runtime::import::{RelationshipRow, RoleSkillRow};
use taxonomy_runtime::replay::{parse_command_log, rebuild_forest, verify_determinism};
use taxonomy_runtime::session::ConsoleSession;
use taxonomy_runtime::snapshot_codec::{encode_snapshot, SnapshotError};

fn config() -> ConsoleConfig {
    ConsoleConfig::from_toml_str("default_actor = \"hr-ops\"\nretention_days = 14\n").unwrap()
}

/// Build a small taxonomy from scratch, then inactivate part of it.
fn scripted_session() -> ConsoleSession {
    let mut session = ConsoleSession::open("test-session", config());
    session
        .insert(NodeDraft::new("Engineering", NodeType::Cluster).with_id("C1"))
        .unwrap();
    session
        .insert(NodeDraft::new("Backend", NodeType::Group).with_id("G1").under("C1"))
        .unwrap();
    session
        .insert(NodeDraft::new("Java", NodeType::Skill).with_id("S1").under("G1"))
        .unwrap();
    session
        .insert(NodeDraft::new("Kotlin", NodeType::Skill).under("G1"))
        .unwrap();
    session
        .insert(NodeDraft::new("Frontend", NodeType::Group).with_id("G2").under("C1"))
        .unwrap();
    session
        .insert(NodeDraft::new("React", NodeType::Skill).with_id("S3").under("G2"))
        .unwrap();
    session.inactivate("G2", None).unwrap();
    session
}

#[test]
fn session_history_replays_to_the_live_hash() {
    let session = scripted_session();
    let live_hash = session.current_hash();

    let json = serde_json::to_string(session.history()).unwrap();
    let envelopes = parse_command_log(&json).unwrap();
    let (forest, hash) = rebuild_forest(&envelopes, config().engine_policy()).unwrap();

    assert_eq!(hash, live_hash);
    assert_eq!(&forest, session.forest());
    assert_eq!(verify_determinism(&envelopes, config().engine_policy()).unwrap(), live_hash);
}

#[test]
fn configured_actor_and_retention_apply() {
    let session = scripted_session();
    let item = session.inactive().get("S3").unwrap();
    assert_eq!(item.inactivated_by, "hr-ops");
    assert_eq!(item.parent_name.as_deref(), Some("Frontend"));

    let at = item.inactivated_at;
    assert!(session.expired_items(at + Duration::days(13)).is_empty());
    assert_eq!(session.expired_items(at + Duration::days(14)).len(), 2);
}

#[test]
fn purge_then_restore_keeps_bin_consistent() {
    let mut session = scripted_session();
    let at = session.inactive().get("G2").unwrap().inactivated_at;
    let purged = session.purge_expired(at + Duration::days(30));
    assert_eq!(purged.len(), 2);
    assert!(session.inactive().is_empty());

    // Purging only drops audit records; the nodes can still be restored.
    session.restore("G2").unwrap();
    assert!(find_node_by_id(session.forest(), "S3").unwrap().is_active);
    assert!(session.inactive().is_empty());
}

#[test]
fn rejected_mutations_leave_the_session_untouched() {
    let mut session = scripted_session();
    let hash = session.current_hash();
    let sequence = session.current_sequence();

    assert_eq!(
        session
            .insert(NodeDraft::new("Orphan", NodeType::Skill).under("missing"))
            .unwrap_err(),
        EngineError::Taxonomy(TaxonomyError::ParentNotFound("missing".to_string()))
    );
    assert!(matches!(
        session.insert(NodeDraft::new("Vue", NodeType::Skill).under("G2")),
        Err(EngineError::Taxonomy(TaxonomyError::InactiveAncestor(_)))
    ));
    assert!(matches!(
        session.update(NodePatch {
            name: Some("  ".to_string()),
            ..NodePatch::new("S1")
        }),
        Err(EngineError::Taxonomy(TaxonomyError::InvalidName))
    ));
    assert!(matches!(
        session.move_node("S1", Some("C1")),
        Err(EngineError::Taxonomy(TaxonomyError::InvalidPlacement { .. }))
    ));

    assert_eq!(session.current_hash(), hash);
    assert_eq!(session.current_sequence(), sequence);
}

#[test]
fn impact_counts_descendants_and_usage() {
    let config = ConsoleConfig::default();
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let session = ConsoleSession::open_with_forest("impact", config, sample_forest(at)).unwrap();

    let impact = session.impact("cluster-technology").unwrap();
    assert_eq!(impact.clusters, 1);
    assert_eq!(impact.groups, 2);
    assert_eq!(impact.skills, 4);
    assert_eq!(impact.usage.usage_count, 120 + 80 + 200 + 150);
    assert!(session.impact("nope").is_none());
}

#[test]
fn registries_validate_against_the_forest() {
    let mut session = scripted_session();
    let kotlin_id = session
        .forest()
        .iter()
        .find(|n| n.name == "Kotlin")
        .map(|n| n.id.clone())
        .unwrap();

    let rel = session.relate_skills("S1", &kotlin_id).unwrap();
    assert!(matches!(
        session.relate_skills(&kotlin_id, "S1"),
        Err(CatalogError::Duplicate(_))
    ));
    assert!(matches!(
        session.relate_skills("S1", "G1"),
        Err(CatalogError::UnknownSkill(_))
    ));
    // S3 sits under the inactive Frontend group.
    assert_eq!(
        session.relate_skills("S1", "S3").unwrap_err(),
        CatalogError::InactiveSkill("S3".to_string())
    );
    assert!(matches!(
        session.map_skill(MappingTarget::job_role("Frontend Dev"), "S3", "Expert", Criticality::Low),
        Err(CatalogError::InactiveSkill(_))
    ));
    assert_eq!(session.relationships().related_to("S1"), vec![kotlin_id.as_str()]);
    session.unrelate_skills(&rel.id).unwrap();
    assert!(session.relationships().is_empty());

    let mapping = session
        .map_skill(MappingTarget::position("Staff Engineer"), "S1", "expert", Criticality::High)
        .unwrap();
    assert_eq!(mapping.proficiency_level, "Expert");
    let updated = session
        .update_mapping(&mapping.id, Some("Advanced"), Some(Criticality::Low))
        .unwrap();
    assert_eq!(updated.criticality, Criticality::Low);
    assert_eq!(updated.proficiency_level, "Advanced");
    session.unmap_skill(&mapping.id).unwrap();
    assert!(matches!(
        session.unmap_skill(&mapping.id),
        Err(CatalogError::NotFound(_))
    ));
}

#[test]
fn custom_levels_drive_role_mapping_titles() {
    let mut session = scripted_session();
    let levels = vec![
        ProficiencyLevel {
            id: "aware".to_string(),
            title: "Aware".to_string(),
            description: String::new(),
            min_score: 0,
            max_score: 49,
            order: 1,
        },
        ProficiencyLevel {
            id: "fluent".to_string(),
            title: "Fluent".to_string(),
            description: String::new(),
            min_score: 50,
            max_score: 100,
            order: 2,
        },
    ];
    session.set_levels("S1", levels).unwrap();

    let target = MappingTarget::job_variant("Backend II");
    assert!(matches!(
        session.map_skill(target.clone(), "S1", "Expert", Criticality::Medium),
        Err(CatalogError::UnknownLevel { .. })
    ));
    let mapping = session
        .map_skill(target, "S1", "fluent", Criticality::Medium)
        .unwrap();
    assert_eq!(mapping.proficiency_level, "Fluent");
}

#[test]
fn bulk_import_through_the_session() {
    let mut session = scripted_session();
    let relationships = session.import_relationships(&[
        RelationshipRow {
            skill: "java".to_string(),
            related_skills: "Kotlin, React".to_string(),
        },
    ]);
    // React sits under the inactive Frontend group.
    assert_eq!(relationships.imported, 1);
    assert_eq!(relationships.skipped.len(), 1);

    let roles = session.import_role_skills(&[
        RoleSkillRow {
            job_role_name: "Backend Engineer".to_string(),
            skill_name: "Kotlin".to_string(),
            proficiency_level: "Intermediate".to_string(),
            criticality_level: "HIGH".to_string(),
        },
    ]);
    assert_eq!(roles.imported, 1);
    assert_eq!(
        session
            .role_skills()
            .for_target(&MappingTarget::job_role("backend engineer"))
            .len(),
        1
    );
}

#[test]
fn snapshot_reopens_an_equivalent_session() {
    let mut session = scripted_session();
    let kotlin_id = session.history()[3].command.target_id().map(str::to_string).unwrap();
    session.relate_skills("S1", &kotlin_id).unwrap();
    let json = encode_snapshot(&session.snapshot()).unwrap();

    let reopened = ConsoleSession::open_from_snapshot("reopened", config(), &json).unwrap();
    assert_eq!(reopened.current_hash(), session.current_hash());
    assert_eq!(reopened.inactive(), session.inactive());
    assert_eq!(reopened.relationships(), session.relationships());
    assert!(compare_forests(session.forest(), reopened.forest()).is_empty());
    // A reopened session starts a fresh command sequence.
    assert_eq!(reopened.current_sequence(), 0);

    let err = ConsoleSession::open_from_snapshot("bad", config(), "{}").err().unwrap();
    assert!(matches!(err, SnapshotError::Decode(_)));
}

#[test]
fn close_reports_final_figures() {
    let mut session = scripted_session();
    let kotlin_id = session.history()[3].command.target_id().map(str::to_string).unwrap();
    session.relate_skills("S1", &kotlin_id).unwrap();
    let hash = session.current_hash();

    let summary = session.close();
    assert_eq!(summary.session_id, "test-session");
    assert_eq!(summary.last_sequence, 7);
    assert_eq!(summary.node_count, 6);
    assert_eq!(summary.active_count, 4);
    assert_eq!(summary.inactive_items, 2);
    assert_eq!(summary.relationships, 1);
    assert_eq!(summary.role_skill_mappings, 0);
    assert_eq!(summary.canonical_hash, hash);
}

#[test]
fn longest_retention_keeps_items_without_overflow() {
    let config = ConsoleConfig::from_toml_str("retention_days = 36500").unwrap();
    let mut session = ConsoleSession::open("long-retention", config);
    session
        .insert(NodeDraft::new("Archive", NodeType::Cluster).with_id("C9"))
        .unwrap();
    session.inactivate("C9", None).unwrap();

    let now = Utc::now() + Duration::days(365);
    assert!(session.expired_items(now).is_empty());
    assert!(session.purge_expired(now).is_empty());
    assert_eq!(session.inactive().len(), 1);
}
