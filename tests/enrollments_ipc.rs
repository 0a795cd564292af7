mod common;

use common::{id_of, seed_class, seed_student, Sidecar};
use serde_json::json;

#[test]
fn enroll_twice_is_duplicate_and_roster_has_no_repeats() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    let class_id = seed_class(&mut sc, "6A");
    let student_id = seed_student(&mut sc, "Rui", 3);

    let pair = json!({ "classId": class_id, "studentId": student_id });
    sc.ok("enrollments.enroll", pair.clone());
    assert_eq!(sc.err_code("enrollments.enroll", pair), "duplicate");

    let roster = sc.ok("enrollments.studentsForClass", json!({ "classId": class_id }));
    assert_eq!(roster["students"].as_array().map(|a| a.len()), Some(1));

    let classes = sc.ok(
        "enrollments.classesForStudent",
        json!({ "studentId": student_id }),
    );
    assert_eq!(classes["classes"][0]["id"], class_id.as_str());
}

#[test]
fn unenroll_of_missing_pair_is_not_found() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    let class_id = seed_class(&mut sc, "6A");
    let student_id = seed_student(&mut sc, "Rui", 3);
    let pair = json!({ "classId": class_id, "studentId": student_id });

    assert_eq!(sc.err_code("enrollments.unenroll", pair.clone()), "not_found");
    sc.ok("enrollments.enroll", pair.clone());
    sc.ok("enrollments.unenroll", pair.clone());
    assert_eq!(sc.err_code("enrollments.unenroll", pair), "not_found");
}

#[test]
fn enroll_with_unknown_ids_is_not_found() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    let class_id = seed_class(&mut sc, "6A");
    assert_eq!(
        sc.err_code(
            "enrollments.enroll",
            json!({ "classId": class_id, "studentId": "ghost" })
        ),
        "not_found"
    );
}

#[test]
fn subject_delete_blocked_until_classes_are_gone() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    let subject = sc.ok("subjects.create", json!({ "name": "Physics", "code": "PHY" }));
    let subject_id = id_of(&subject, "subject");
    let class = sc.ok(
        "classes.create",
        json!({ "name": "1F", "subjectId": subject_id, "yearSemester": "2024/2" }),
    );
    let class_id = id_of(&class, "class");

    assert_eq!(sc.err_code("subjects.delete", json!({ "id": subject_id })), "conflict");
    sc.ok("classes.delete", json!({ "id": class_id }));
    sc.ok("subjects.delete", json!({ "id": subject_id }));
    assert_eq!(sc.err_code("subjects.get", json!({ "id": subject_id })), "not_found");
}

#[test]
fn duplicate_subject_and_class_are_rejected() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    let subject = sc.ok("subjects.create", json!({ "name": "Physics", "code": "PHY" }));
    assert_eq!(
        sc.err_code("subjects.create", json!({ "name": "Physics", "code": "PH2" })),
        "duplicate"
    );
    let class = json!({ "name": "1F", "subjectId": id_of(&subject, "subject"), "yearSemester": "2024/2" });
    sc.ok("classes.create", class.clone());
    assert_eq!(sc.err_code("classes.create", class), "duplicate");
}

#[test]
fn student_delete_blocked_while_enrolled() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    let class_id = seed_class(&mut sc, "6A");
    let student_id = seed_student(&mut sc, "Rui", 3);
    let pair = json!({ "classId": class_id, "studentId": student_id });
    sc.ok("enrollments.enroll", pair.clone());

    assert_eq!(sc.err_code("students.delete", json!({ "id": student_id })), "conflict");
    sc.ok("enrollments.unenroll", pair);
    sc.ok("students.delete", json!({ "id": student_id }));
}

#[test]
fn create_in_class_enrolls_and_guards_call_number() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    let class_id = seed_class(&mut sc, "6A");

    let created = sc.ok(
        "students.createInClass",
        json!({ "classId": class_id, "student": { "name": "Ana", "callNumber": 1 } }),
    );
    let student_id = id_of(&created, "student");
    assert_eq!(
        sc.err_code(
            "students.createInClass",
            json!({ "classId": class_id, "student": { "name": "Bia", "callNumber": 1 } })
        ),
        "duplicate"
    );

    let roster = sc.ok("enrollments.studentsForClass", json!({ "classId": class_id }));
    let ids: Vec<&str> = roster["students"]
        .as_array()
        .expect("students")
        .iter()
        .filter_map(|s| s["id"].as_str())
        .collect();
    assert_eq!(ids, vec![student_id.as_str()]);
}
