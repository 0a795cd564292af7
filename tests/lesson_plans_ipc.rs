mod common;

use common::{id_of, seed_class, Sidecar};
use serde_json::{json, Value};
use std::collections::BTreeSet;

fn class_set(plan: &Value) -> BTreeSet<String> {
    plan["lessonPlan"]["classIds"]
        .as_array()
        .expect("classIds")
        .iter()
        .map(|v| v.as_str().expect("id").to_string())
        .collect()
}

#[test]
fn update_replaces_linked_classes() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    let a = seed_class(&mut sc, "A");
    let b = seed_class(&mut sc, "B");
    let c = seed_class(&mut sc, "C");

    let created = sc.ok(
        "lessonPlans.create",
        json!({ "title": "Photosynthesis", "date": "2024-03-04", "classIds": [a, b] }),
    );
    let plan_id = id_of(&created, "lessonPlan");

    sc.ok(
        "lessonPlans.update",
        json!({ "id": plan_id, "patch": { "classIds": [b, c] } }),
    );
    let got = sc.ok("lessonPlans.get", json!({ "id": plan_id }));
    let expected: BTreeSet<String> = [b.clone(), c.clone()].into_iter().collect();
    assert_eq!(class_set(&got), expected);
    assert_eq!(got["lessonPlan"]["classIds"].as_array().map(|v| v.len()), Some(2));

    let for_a = sc.ok("lessonPlans.list", json!({ "classId": a }));
    assert_eq!(for_a["lessonPlans"].as_array().map(|v| v.len()), Some(0));
    let for_c = sc.ok("lessonPlans.list", json!({ "classId": c }));
    assert_eq!(for_c["lessonPlans"][0]["id"], plan_id.as_str());
}

#[test]
fn list_returns_summaries_and_get_returns_links() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    let a = seed_class(&mut sc, "A");
    let material = sc.ok(
        "materials.create",
        json!({ "title": "Leaf slides", "url": "s3://b/leaf.pdf" }),
    );
    let material_id = id_of(&material, "material");
    let evaluation = sc.ok(
        "evaluations.create",
        json!({ "name": "Quiz", "classId": a, "weight": 1, "maxGrade": 5 }),
    );
    let evaluation_id = id_of(&evaluation, "evaluation");

    let created = sc.ok(
        "lessonPlans.create",
        json!({
            "title": "Leaves",
            "objectives": "identify parts",
            "classIds": [a],
            "materialIds": [material_id],
            "evaluationIds": [evaluation_id]
        }),
    );
    let plan_id = id_of(&created, "lessonPlan");

    let listed = sc.ok("lessonPlans.list", json!({}));
    let summary = &listed["lessonPlans"][0];
    assert_eq!(summary["title"], "Leaves");
    assert!(summary.get("objectives").is_none());
    assert!(summary.get("classIds").is_none());

    let full = sc.ok("lessonPlans.get", json!({ "id": plan_id }));
    assert_eq!(full["lessonPlan"]["materialIds"], json!([material_id]));
    assert_eq!(full["lessonPlan"]["evaluationIds"], json!([evaluation_id]));
}

#[test]
fn duplicate_and_delete() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    let a = seed_class(&mut sc, "A");
    let created = sc.ok(
        "lessonPlans.create",
        json!({ "title": "Volcanoes", "classIds": [a] }),
    );
    let plan_id = id_of(&created, "lessonPlan");

    let copy = sc.ok("lessonPlans.duplicate", json!({ "id": plan_id }));
    assert_eq!(copy["lessonPlan"]["title"], "Volcanoes (Copy)");
    assert_eq!(class_set(&copy), class_set(&created));

    sc.ok("lessonPlans.delete", json!({ "id": plan_id }));
    assert_eq!(sc.err_code("lessonPlans.get", json!({ "id": plan_id })), "not_found");
    let listed = sc.ok("lessonPlans.list", json!({}));
    assert_eq!(listed["lessonPlans"].as_array().map(|v| v.len()), Some(1));
}

#[test]
fn unknown_link_target_is_not_found() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    assert_eq!(
        sc.err_code(
            "lessonPlans.create",
            json!({ "title": "Orphan", "materialIds": ["missing"] })
        ),
        "not_found"
    );
    let listed = sc.ok("lessonPlans.list", json!({}));
    assert_eq!(listed["lessonPlans"].as_array().map(|v| v.len()), Some(0));
}
