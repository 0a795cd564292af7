mod common;

use common::{id_of, Sidecar};
use serde_json::{json, Value};

fn seed_question(sc: &mut Sidecar, text: &str, difficulty: &str, answer: &str) -> String {
    let created = sc.ok(
        "questions.create",
        json!({
            "text": text,
            "subject": "math",
            "difficulty": difficulty,
            "options": ["2", "3", "4"],
            "answer": answer
        }),
    );
    id_of(&created, "question")
}

fn ids(v: &Value) -> Vec<String> {
    v["quiz"]["questionIds"]
        .as_array()
        .expect("questionIds")
        .iter()
        .map(|x| x.as_str().expect("id").to_string())
        .collect()
}

#[test]
fn generated_quiz_hides_answers_and_scores_submission() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    let a = seed_question(&mut sc, "1+1", "easy", "2");
    let b = seed_question(&mut sc, "1+2", "easy", "3");
    seed_question(&mut sc, "2^2", "hard", "4");

    let generated = sc.ok(
        "quizzes.generate",
        json!({ "name": "Easy round", "subject": "math", "difficulty": "easy", "count": 5 }),
    );
    let mut picked = ids(&generated);
    picked.sort();
    let mut expected = vec![a.clone(), b.clone()];
    expected.sort();
    assert_eq!(picked, expected);
    for q in generated["questions"].as_array().expect("questions") {
        assert!(q.get("answer").is_none());
        assert_eq!(q["options"], json!(["2", "3", "4"]));
    }

    let quiz_id = id_of(&generated, "quiz");
    let submitted = sc.ok(
        "quizzes.submit",
        json!({ "id": quiz_id, "answers": { a.clone(): "2", b.clone(): "4" } }),
    );
    assert_eq!(submitted["score"], 1);
    assert_eq!(submitted["totalQuestions"], 2);
    let wrong = submitted["results"]
        .as_array()
        .expect("results")
        .iter()
        .find(|r| r["questionId"] == b.as_str())
        .expect("result for b");
    assert_eq!(wrong["isCorrect"], false);
    assert_eq!(wrong["correctAnswer"], "3");
    assert_eq!(wrong["userAnswer"], "4");

    let history = sc.ok("quizzes.attempts", json!({ "id": quiz_id }));
    assert_eq!(history["attempts"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(history["attempts"][0]["answers"][a.as_str()], "2");
}

#[test]
fn saved_quiz_keeps_order_and_delete_removes_attempts() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    let a = seed_question(&mut sc, "1+1", "easy", "2");
    let b = seed_question(&mut sc, "1+2", "easy", "3");

    let created = sc.ok(
        "quizzes.create",
        json!({ "name": "Fixed", "questionIds": [b, a, b] }),
    );
    assert_eq!(ids(&created), vec![b.clone(), a.clone()]);
    let quiz_id = id_of(&created, "quiz");

    let got = sc.ok("quizzes.get", json!({ "id": quiz_id }));
    assert_eq!(got["questions"][0]["text"], "1+2");
    assert_eq!(got["questions"][1]["text"], "1+1");

    assert_eq!(
        sc.err_code(
            "quizzes.submit",
            json!({ "id": quiz_id, "answers": { "not-in-quiz": "2" } })
        ),
        "bad_params"
    );
    sc.ok("quizzes.submit", json!({ "id": quiz_id, "answers": {} }));

    let listed = sc.ok("quizzes.list", json!({}));
    assert_eq!(listed["quizzes"].as_array().map(|q| q.len()), Some(1));

    sc.ok("quizzes.delete", json!({ "id": quiz_id }));
    assert_eq!(sc.err_code("quizzes.attempts", json!({ "id": quiz_id })), "not_found");

    let conn = rusqlite::Connection::open(workspace.path().join("planbook.sqlite3"))
        .expect("open store");
    let left: i64 = conn
        .query_row("SELECT COUNT(*) FROM quiz_attempts", [], |r| r.get(0))
        .expect("count attempts");
    assert_eq!(left, 0);
}

#[test]
fn generate_without_matches_is_rejected() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let mut sc = Sidecar::open(workspace.path());
    seed_question(&mut sc, "1+1", "easy", "2");
    assert_eq!(
        sc.err_code("quizzes.generate", json!({ "subject": "history" })),
        "bad_params"
    );
    assert_eq!(
        sc.err_code("quizzes.create", json!({ "questionIds": ["missing"] })),
        "not_found"
    );
    let listed = sc.ok("quizzes.list", json!({}));
    assert!(listed["quizzes"].as_array().expect("quizzes").is_empty());
}
