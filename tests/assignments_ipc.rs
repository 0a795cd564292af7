mod common;

use common::{id_of, seed_class, Sidecar};
use serde_json::json;

#[test]
fn assignments_list_by_class_and_mark_all_graded() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    let class_a = seed_class(&mut sc, "6A");
    let class_b = seed_class(&mut sc, "6B");

    let essay = sc.ok(
        "assignments.create",
        json!({ "classId": class_a, "title": "Essay", "dueDate": "2024-04-20" }),
    );
    assert_eq!(essay["assignment"]["status"], "pending");
    sc.ok(
        "assignments.create",
        json!({ "classId": class_a, "title": "Poster", "dueDate": "2024-04-02", "description": "A3 size" }),
    );
    sc.ok(
        "assignments.create",
        json!({ "classId": class_b, "title": "Essay", "dueDate": "2024-04-20" }),
    );

    let listed = sc.ok("assignments.list", json!({ "classId": class_a }));
    let titles: Vec<&str> = listed["assignments"]
        .as_array()
        .expect("assignments")
        .iter()
        .map(|a| a["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, vec!["Poster", "Essay"]);

    let marked = sc.ok("assignments.markAllGraded", json!({ "classId": class_a }));
    assert_eq!(marked["updated"], 2);
    assert_eq!(marked["anyUpdated"], true);
    let again = sc.ok("assignments.markAllGraded", json!({ "classId": class_a }));
    assert_eq!(again["anyUpdated"], false);

    let other = sc.ok("assignments.list", json!({ "classId": class_b }));
    assert_eq!(other["assignments"][0]["status"], "pending");
    let all = sc.ok("assignments.list", json!({}));
    assert_eq!(all["assignments"].as_array().map(|a| a.len()), Some(3));

    let essay_id = id_of(&essay, "assignment");
    let reopened = sc.ok(
        "assignments.update",
        json!({ "id": essay_id, "patch": { "status": "pending", "description": "Two pages" } }),
    );
    assert_eq!(reopened["assignment"]["status"], "pending");
    assert_eq!(reopened["assignment"]["description"], "Two pages");
}

#[test]
fn assignment_errors_map_to_wire_codes() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    let class_id = seed_class(&mut sc, "5C");

    assert_eq!(
        sc.err_code(
            "assignments.create",
            json!({ "classId": class_id, "title": "Lab", "dueDate": "20/04/2024" })
        ),
        "bad_params"
    );
    assert_eq!(
        sc.err_code(
            "assignments.create",
            json!({ "classId": "missing", "title": "Lab", "dueDate": "2024-04-20" })
        ),
        "not_found"
    );
    assert_eq!(
        sc.err_code(
            "assignments.create",
            json!({ "classId": class_id, "title": "Lab", "dueDate": "2024-04-20", "status": "late" })
        ),
        "bad_params"
    );

    let created = sc.ok(
        "assignments.create",
        json!({ "classId": class_id, "title": "Lab", "dueDate": "2024-04-20" }),
    );
    assert_eq!(
        sc.err_code("classes.delete", json!({ "id": class_id })),
        "conflict"
    );
    let id = id_of(&created, "assignment");
    sc.ok("assignments.delete", json!({ "id": id }));
    assert_eq!(sc.err_code("assignments.get", json!({ "id": id })), "not_found");
    sc.ok("classes.delete", json!({ "id": class_id }));
}
