//! Widget Editing Integration Tests
//!
//! Exercises the mutation layer against the shipped fixtures:
//! - Aggregate recomputation
//! - Insertion order and id uniqueness
//! - Structural sharing after edits
//! - Cascading removal of dependent items

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use playbook_core::{
    resolve, Catalog, FieldValue, ItemId, Lang, LocalizedText, MutationOutcome, Patch,
    WidgetFixture, WidgetRecord,
};
use proptest::prelude::*;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../fixtures")
        .join(format!("{name}.json"))
}

/// Load a shipped fixture as a record.
fn fixture_record(name: &str) -> WidgetRecord {
    let fixture = WidgetFixture::load(fixture_path(name)).expect("fixture");
    let widget = fixture
        .mount(&Catalog::builtin(), Lang::Zh, false)
        .expect("mount");
    widget.record().clone()
}

fn number_patch(key: &str, value: f64) -> Patch {
    let mut patch = Patch::new();
    patch.insert(key.to_string(), FieldValue::Number(value));
    patch
}

fn date(raw: &str) -> FieldValue {
    FieldValue::Date(chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("date"))
}

#[test]
fn test_every_fixture_mounts() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../fixtures");
    let fixtures = WidgetFixture::load_dir(dir).expect("fixtures");
    assert_eq!(fixtures.len(), 8);

    let catalog = Catalog::builtin();
    for fixture in &fixtures {
        let widget = fixture
            .mount(&catalog, Lang::En, false)
            .unwrap_or_else(|e| panic!("{} failed to mount: {e}", fixture.widget_id));
        assert!(widget.record().item_count() > 0);
    }
}

#[test]
fn test_dysfunction_score_moves_aggregate() {
    let record = fixture_record("five-dysfunctions");
    assert_eq!(record.aggregate(), Some(3.0));

    let next = record
        .updated("dysfunctions", &ItemId::from("trust"), &number_patch("score", 5.0))
        .expect("update")
        .applied()
        .expect("applied");

    assert_eq!(next.aggregate(), Some(3.4));
    assert_eq!(next.view(Lang::En).aggregate.expect("aggregate").display, "3.4");
    assert_eq!(record.aggregate(), Some(3.0));
}

#[test]
fn test_new_gantt_task_has_no_progress_or_dependencies() {
    let record = fixture_record("gantt");
    let mut seed = Patch::new();
    seed.insert("start_date".into(), date("2024-01-01"));
    seed.insert("end_date".into(), date("2024-01-08"));

    let (next, id) = record.added("tasks", &seed).expect("add");
    let tasks = next.collection("tasks").expect("tasks");
    assert_eq!(tasks.items().last().map(|t| t.id()), Some(&id));

    let view = next.view(Lang::En);
    let tasks = view.collection("tasks").expect("tasks");
    assert_eq!(tasks.cell(id.as_str(), "progress"), Some("0%"));
    assert_eq!(tasks.cell(id.as_str(), "dependencies"), Some(""));
    assert_eq!(tasks.cell(id.as_str(), "name"), Some("New item"));
}

#[test]
fn test_remove_pestle_factor() {
    let record = fixture_record("pestle");
    let before = record.collection("factors").expect("factors").len();

    let next = record
        .removed("factors", &ItemId::from("social-1"))
        .expect("remove")
        .applied()
        .expect("applied");

    let factors = next.collection("factors").expect("factors");
    assert_eq!(factors.len(), before - 1);
    assert!(!factors.contains(&ItemId::from("social-1")));
}

#[test]
fn test_english_label_falls_back_to_base() {
    let record = fixture_record("gantt");
    let mut patch = Patch::new();
    patch.insert(
        "name".into(),
        FieldValue::Text(LocalizedText::new("上线准备")),
    );
    let next = record
        .updated("tasks", &ItemId::from("task-4"), &patch)
        .expect("update")
        .applied()
        .expect("applied");

    let task = next
        .find("tasks", &ItemId::from("task-4"))
        .expect("task");
    assert_eq!(task.text("name", Lang::En), Some("上线准备"));
    assert_eq!(resolve(Lang::En, "上线准备", None), "上线准备");
}

#[test]
fn test_update_shares_untouched_items() {
    let record = fixture_record("gantt");
    let next = record
        .updated("tasks", &ItemId::from("task-2"), &number_patch("progress", 80.0))
        .expect("update")
        .applied()
        .expect("applied");

    let old_tasks = record.collection("tasks").expect("tasks");
    let new_tasks = next.collection("tasks").expect("tasks");
    assert!(!old_tasks.ptr_eq(new_tasks));
    for (old, new) in old_tasks.items().iter().zip(new_tasks.items()) {
        assert_eq!(Arc::ptr_eq(old, new), old.id().as_str() != "task-2");
    }

    let old_milestones = record.collection("milestones").expect("milestones");
    let new_milestones = next.collection("milestones").expect("milestones");
    assert!(old_milestones.ptr_eq(new_milestones));
    assert_eq!(
        record.find("tasks", &ItemId::from("task-2")).and_then(|t| t.number("progress")),
        Some(60.0)
    );
}

#[test]
fn test_removing_task_cascades() {
    let record = fixture_record("gantt");
    let next = record
        .removed("tasks", &ItemId::from("task-2"))
        .expect("remove")
        .applied()
        .expect("applied");

    let task_4 = next.find("tasks", &ItemId::from("task-4")).expect("task-4");
    assert_eq!(task_4.references("dependencies"), [ItemId::from("task-3")]);
    let task_3 = next.find("tasks", &ItemId::from("task-3")).expect("task-3");
    assert!(task_3.references("dependencies").is_empty());

    let milestones = next.collection("milestones").expect("milestones");
    assert_eq!(milestones.len(), 1);
    assert!(milestones.contains(&ItemId::from("milestone-2")));
}

#[test]
fn test_removing_issue_node_removes_subtree() {
    let record = fixture_record("issue-tree");
    let next = record
        .removed("nodes", &ItemId::from("revenue"))
        .expect("remove")
        .applied()
        .expect("applied");

    let ids: Vec<&str> = next
        .collection("nodes")
        .expect("nodes")
        .iter()
        .map(|n| n.id().as_str())
        .collect();
    assert_eq!(ids, ["root", "cost", "materials"]);
}

#[test]
fn test_removing_role_removes_its_assignments() {
    let record = fixture_record("raci");
    let next = record
        .removed("roles", &ItemId::from("role-pm"))
        .expect("remove")
        .applied()
        .expect("applied");

    let assignments = next.collection("assignments").expect("assignments");
    assert_eq!(assignments.len(), 3);
    assert!(assignments
        .iter()
        .all(|a| a.reference("role") != Some(&ItemId::from("role-pm"))));
}

#[test]
fn test_remove_unknown_id_is_silent() {
    let mut widget = WidgetFixture::load(fixture_path("pestle"))
        .expect("fixture")
        .mount(&Catalog::builtin(), Lang::Zh, false)
        .expect("mount");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    widget.set_on_change(move |record| {
        sink.lock().expect("lock").push(record.item_count());
    });

    let outcome = widget
        .remove("factors", &ItemId::from("social-99"))
        .expect("remove");
    assert_eq!(outcome, MutationOutcome::Unchanged);
    assert!(seen.lock().expect("lock").is_empty());

    widget
        .remove("factors", &ItemId::from("social-1"))
        .expect("remove");
    assert_eq!(*seen.lock().expect("lock"), [5]);
}

#[test]
fn test_unknown_field_in_patch_rejected() {
    let record = fixture_record("swot");
    let err = record
        .updated("entries", &ItemId::from("entry-s1"), &number_patch("wieght", 2.0))
        .expect_err("unknown field");
    assert!(err.to_string().contains("wieght"));
}

#[derive(Debug, Clone)]
enum ScoreEdit {
    Set(usize, u8),
    Add(u8),
    Remove(usize),
}

fn arb_edit() -> impl Strategy<Value = ScoreEdit> {
    prop_oneof![
        (0usize..10, 1u8..=5).prop_map(|(i, s)| ScoreEdit::Set(i, s)),
        (1u8..=5).prop_map(ScoreEdit::Add),
        (0usize..10).prop_map(ScoreEdit::Remove),
    ]
}

proptest! {
    #[test]
    fn prop_aggregate_tracks_rounded_mean(edits in prop::collection::vec(arb_edit(), 0..30)) {
        let mut record = fixture_record("five-dysfunctions");
        for edit in edits {
            let ids: Vec<ItemId> = record
                .collection("dysfunctions")
                .expect("dysfunctions")
                .iter()
                .map(|i| i.id().clone())
                .collect();
            record = match edit {
                ScoreEdit::Set(i, score) if !ids.is_empty() => record
                    .updated("dysfunctions", &ids[i % ids.len()], &number_patch("score", f64::from(score)))
                    .expect("update")
                    .applied()
                    .expect("applied"),
                ScoreEdit::Add(score) => record
                    .added("dysfunctions", &number_patch("score", f64::from(score)))
                    .expect("add")
                    .0,
                ScoreEdit::Remove(i) if !ids.is_empty() => record
                    .removed("dysfunctions", &ids[i % ids.len()])
                    .expect("remove")
                    .applied()
                    .expect("applied"),
                _ => record,
            };

            let scores: Vec<f64> = record
                .collection("dysfunctions")
                .expect("dysfunctions")
                .iter()
                .filter_map(|i| i.number("score"))
                .collect();
            let expected = if scores.is_empty() {
                None
            } else {
                #[allow(clippy::cast_precision_loss)]
                let mean = scores.iter().sum::<f64>() / scores.len() as f64;
                Some((mean * 10.0).round() / 10.0)
            };
            prop_assert_eq!(record.aggregate(), expected);
        }
    }

    #[test]
    fn prop_added_ids_unique(count in 1usize..40) {
        let mut record = fixture_record("swot");
        for _ in 0..count {
            record = record.added("entries", &Patch::new()).expect("add").0;
        }
        let entries = record.collection("entries").expect("entries");
        let ids: HashSet<&ItemId> = entries.iter().map(|e| e.id()).collect();
        prop_assert_eq!(ids.len(), entries.len());
        prop_assert_eq!(entries.len(), 4 + count);
    }

    #[test]
    fn prop_english_fallback(base in "[a-z\u{4e00}-\u{4e20}]{1,12}", en in proptest::option::of("[A-Za-z ]{0,12}")) {
        let text = match &en {
            Some(o) => LocalizedText::new(base.clone()).with_en(o.clone()),
            None => LocalizedText::new(base.clone()),
        };
        let expected = match &en {
            Some(o) if !o.is_empty() => o.as_str(),
            _ => base.as_str(),
        };
        prop_assert_eq!(text.resolve(Lang::En), expected);
        prop_assert_eq!(text.resolve(Lang::Zh), base.as_str());
    }
}
