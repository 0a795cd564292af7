//! Quizzes drawn from the question bank and the attempts scored against them.
//!
//! A quiz only stores question ids. Questions removed from the bank after the
//! quiz was built are skipped when the quiz is shown or scored.

use super::{new_id, optional_text, questions};
use crate::db::{self, in_transaction};
use crate::error::{StoreError, StoreResult};
use crate::model::{
    NewQuiz, Question, QuestionOutcome, Quiz, QuizAttempt, QuizItem, QuizRequest, QuizResult,
};
use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument, warn};

const COLUMNS: &str = "id, name, question_ids_json, created_at";
const ATTEMPT_COLUMNS: &str = "id, quiz_id, answers_json, score, total, attempted_at";

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Quiz> {
    let id: String = row.get(0)?;
    let ids_json: String = row.get(2)?;
    let question_ids = match serde_json::from_str::<Vec<String>>(&ids_json) {
        Ok(v) => v,
        Err(e) => {
            warn!(quiz_id = %id, error = %e, "unreadable question ids; treating as empty");
            Vec::new()
        }
    };
    Ok(Quiz {
        id,
        name: row.get(1)?,
        question_ids,
        created_at: row.get(3)?,
    })
}

fn attempt_from_row(row: &Row<'_>) -> rusqlite::Result<QuizAttempt> {
    let id: String = row.get(0)?;
    let answers_json: String = row.get(2)?;
    let answers = match serde_json::from_str::<BTreeMap<String, String>>(&answers_json) {
        Ok(v) => v,
        Err(e) => {
            warn!(attempt_id = %id, error = %e, "unreadable answers; treating as empty");
            BTreeMap::new()
        }
    };
    Ok(QuizAttempt {
        id,
        quiz_id: row.get(1)?,
        answers,
        score: row.get(3)?,
        total: row.get(4)?,
        attempted_at: row.get(5)?,
    })
}

fn insert(conn: &Connection, quiz: &Quiz) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO quizzes(id, name, question_ids_json, created_at) VALUES(?, ?, ?, ?)",
        (
            &quiz.id,
            &quiz.name,
            serde_json::to_string(&quiz.question_ids)?,
            &quiz.created_at,
        ),
    )?;
    Ok(())
}

/// Ids are trimmed and deduplicated (first wins). Every id must name a bank
/// question.
#[instrument(skip(conn, input))]
pub fn create(conn: &Connection, input: NewQuiz) -> StoreResult<Quiz> {
    let mut ids: Vec<String> = Vec::with_capacity(input.question_ids.len());
    for raw in input.question_ids {
        let id = raw.trim().to_string();
        if !id.is_empty() && !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Err(StoreError::validation_with(
            "a quiz needs at least one question",
            json!({ "field": "questionIds" }),
        ));
    }
    for id in &ids {
        if !db::row_exists(conn, "questions", id)? {
            return Err(StoreError::not_found("question", id.clone()));
        }
    }

    let quiz = Quiz {
        id: new_id(),
        name: optional_text(input.name),
        question_ids: ids,
        created_at: now(),
    };
    insert(conn, &quiz)?;
    info!(quiz_id = %quiz.id, questions = quiz.question_ids.len(), "quiz created");
    Ok(quiz)
}

/// Samples matching bank questions at random and saves the selection.
#[instrument(skip(conn, req))]
pub fn generate(conn: &Connection, req: QuizRequest) -> StoreResult<Quiz> {
    let subject = optional_text(req.subject);
    let difficulty = optional_text(req.difficulty);
    // SQLite reads a negative LIMIT as "no limit".
    let limit: i64 = match req.count {
        Some(n) if n > 0 => i64::from(n),
        _ => -1,
    };
    let name = optional_text(req.name);

    let quiz = in_transaction(conn, |tx| {
        let mut stmt = tx.prepare(
            "SELECT id FROM questions
             WHERE (?1 IS NULL OR subject = ?1)
               AND (?2 IS NULL OR difficulty = ?2)
             ORDER BY random()
             LIMIT ?3",
        )?;
        let ids = stmt
            .query_map((&subject, &difficulty, limit), |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        if ids.is_empty() {
            return Err(StoreError::validation_with(
                "no questions match the requested subject and difficulty",
                json!({ "subject": subject, "difficulty": difficulty }),
            ));
        }
        let quiz = Quiz {
            id: new_id(),
            name,
            question_ids: ids,
            created_at: now(),
        };
        insert(tx, &quiz)?;
        Ok(quiz)
    })?;
    info!(quiz_id = %quiz.id, questions = quiz.question_ids.len(), "quiz generated");
    Ok(quiz)
}

pub fn get(conn: &Connection, id: &str) -> StoreResult<Quiz> {
    let sql = format!("SELECT {} FROM quizzes WHERE id = ?", COLUMNS);
    conn.query_row(&sql, [id], from_row)
        .optional()?
        .ok_or_else(|| StoreError::not_found("quiz", id))
}

/// Newest first.
pub fn list(conn: &Connection) -> StoreResult<Vec<Quiz>> {
    let sql = format!(
        "SELECT {} FROM quizzes ORDER BY created_at DESC, rowid DESC",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Attempts go with the quiz (schema cascade).
#[instrument(skip(conn))]
pub fn delete(conn: &Connection, id: &str) -> StoreResult<()> {
    let n = conn.execute("DELETE FROM quizzes WHERE id = ?", [id])?;
    if n == 0 {
        return Err(StoreError::not_found("quiz", id));
    }
    info!(quiz_id = %id, "quiz deleted");
    Ok(())
}

/// The quiz's questions that still exist, in quiz order.
fn live_questions(conn: &Connection, quiz: &Quiz) -> StoreResult<Vec<Question>> {
    let sql = format!(
        "SELECT {} FROM questions WHERE id IN (SELECT value FROM json_each(?))",
        questions::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut found: HashMap<String, Question> = stmt
        .query_map([serde_json::to_string(&quiz.question_ids)?], questions::from_row)?
        .map(|r| r.map(|q| (q.id.clone(), q)))
        .collect::<Result<_, _>>()?;
    let ordered: Vec<Question> = quiz
        .question_ids
        .iter()
        .filter_map(|id| found.remove(id))
        .collect();
    if ordered.len() < quiz.question_ids.len() {
        debug!(
            quiz_id = %quiz.id,
            missing = quiz.question_ids.len() - ordered.len(),
            "quiz references removed questions"
        );
    }
    Ok(ordered)
}

/// Questions as presented to a student, without answers.
pub fn paper(conn: &Connection, quiz_id: &str) -> StoreResult<Vec<QuizItem>> {
    let quiz = get(conn, quiz_id)?;
    Ok(live_questions(conn, &quiz)?
        .into_iter()
        .map(|q| QuizItem {
            id: q.id,
            text: q.text,
            options: q.options,
        })
        .collect())
}

/// Scores `answers` (question id to chosen answer) and records the attempt.
/// An exact match after trimming counts as correct; unanswered questions
/// count as wrong.
#[instrument(skip(conn, answers))]
pub fn submit(
    conn: &Connection,
    quiz_id: &str,
    answers: BTreeMap<String, String>,
) -> StoreResult<QuizResult> {
    let quiz = get(conn, quiz_id)?;
    let asked = live_questions(conn, &quiz)?;
    if asked.is_empty() {
        return Err(StoreError::Conflict(
            "quiz has no remaining questions".to_string(),
        ));
    }

    let answers: BTreeMap<String, String> = answers
        .into_iter()
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    if let Some(stray) = answers.keys().find(|k| !asked.iter().any(|q| &q.id == *k)) {
        return Err(StoreError::validation_with(
            "answer given for a question that is not in this quiz",
            json!({ "field": "answers", "questionId": stray }),
        ));
    }

    let results: Vec<QuestionOutcome> = asked
        .into_iter()
        .map(|q| {
            let user_answer = answers.get(&q.id).cloned();
            let is_correct = user_answer.as_deref() == Some(q.answer.as_str());
            QuestionOutcome {
                question_id: q.id,
                text: q.text,
                options: q.options,
                user_answer,
                correct_answer: q.answer,
                is_correct,
            }
        })
        .collect();

    let attempt = QuizAttempt {
        id: new_id(),
        quiz_id: quiz.id,
        score: results.iter().filter(|r| r.is_correct).count() as u32,
        total: results.len() as u32,
        answers,
        attempted_at: now(),
    };
    in_transaction(conn, |tx| {
        tx.execute(
            "INSERT INTO quiz_attempts(id, quiz_id, answers_json, score, total, attempted_at)
             VALUES(?, ?, ?, ?, ?, ?)",
            (
                &attempt.id,
                &attempt.quiz_id,
                serde_json::to_string(&attempt.answers)?,
                attempt.score,
                attempt.total,
                &attempt.attempted_at,
            ),
        )?;
        Ok(())
    })?;
    info!(
        quiz_id = %attempt.quiz_id,
        score = attempt.score,
        total = attempt.total,
        "quiz attempt recorded"
    );
    Ok(QuizResult { attempt, results })
}

/// Oldest first.
pub fn attempts(conn: &Connection, quiz_id: &str) -> StoreResult<Vec<QuizAttempt>> {
    get(conn, quiz_id)?;
    let sql = format!(
        "SELECT {} FROM quiz_attempts WHERE quiz_id = ? ORDER BY attempted_at, rowid",
        ATTEMPT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([quiz_id], attempt_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;
    use crate::model::NewQuestion;

    fn question(conn: &Connection, text: &str, subject: &str, difficulty: &str) -> String {
        questions::create(
            conn,
            NewQuestion {
                text: text.into(),
                subject: Some(subject.into()),
                difficulty: Some(difficulty.into()),
                options: vec!["3".into(), "4".into(), "5".into()],
                answer: "4".into(),
            },
        )
        .expect("question")
        .id
    }

    #[test]
    fn create_dedupes_and_checks_questions() {
        let conn = test_conn();
        let a = question(&conn, "2+2", "math", "easy");
        let b = question(&conn, "8/2", "math", "easy");
        let quiz = create(
            &conn,
            NewQuiz {
                name: Some("Warm-up".into()),
                question_ids: vec![b.clone(), a.clone(), b.clone()],
            },
        )
        .expect("create");
        assert_eq!(quiz.question_ids, vec![b, a]);
        assert_eq!(get(&conn, &quiz.id).expect("get"), quiz);

        assert!(matches!(
            create(
                &conn,
                NewQuiz {
                    name: None,
                    question_ids: vec!["nope".into()],
                }
            ),
            Err(StoreError::NotFound { entity: "question", .. })
        ));
        assert!(matches!(
            create(
                &conn,
                NewQuiz {
                    name: None,
                    question_ids: vec!["  ".into()],
                }
            ),
            Err(StoreError::Validation { .. })
        ));
    }

    #[test]
    fn generate_respects_filters_and_count() {
        let conn = test_conn();
        for i in 0..4 {
            question(&conn, &format!("easy {}", i), "math", "easy");
        }
        let hard = question(&conn, "hard one", "math", "hard");

        let two = generate(
            &conn,
            QuizRequest {
                subject: Some("math".into()),
                difficulty: Some("easy".into()),
                count: Some(2),
                ..Default::default()
            },
        )
        .expect("generate");
        assert_eq!(two.question_ids.len(), 2);
        assert!(!two.question_ids.contains(&hard));

        let all = generate(
            &conn,
            QuizRequest {
                subject: Some("math".into()),
                ..Default::default()
            },
        )
        .expect("generate all");
        assert_eq!(all.question_ids.len(), 5);

        let none = generate(
            &conn,
            QuizRequest {
                subject: Some("bio".into()),
                ..Default::default()
            },
        );
        assert!(matches!(none, Err(StoreError::Validation { .. })));
        assert_eq!(list(&conn).expect("list").len(), 2);
    }

    #[test]
    fn submit_scores_and_records_attempt() {
        let conn = test_conn();
        let a = question(&conn, "2+2", "math", "easy");
        let b = question(&conn, "1+3", "math", "easy");
        let c = question(&conn, "5-1", "math", "easy");
        let quiz = create(
            &conn,
            NewQuiz {
                name: None,
                question_ids: vec![a.clone(), b.clone(), c.clone()],
            },
        )
        .expect("create");

        let answers = BTreeMap::from([(a.clone(), " 4 ".to_string()), (b.clone(), "5".to_string())]);
        let result = submit(&conn, &quiz.id, answers).expect("submit");
        assert_eq!((result.attempt.score, result.attempt.total), (1, 3));
        assert!(result.results[0].is_correct);
        assert_eq!(result.results[1].user_answer.as_deref(), Some("5"));
        assert_eq!(result.results[2].user_answer, None);
        assert!(!result.results[2].is_correct);

        let stray = BTreeMap::from([("other".to_string(), "4".to_string())]);
        assert!(matches!(
            submit(&conn, &quiz.id, stray),
            Err(StoreError::Validation { .. })
        ));
        let recorded = attempts(&conn, &quiz.id).expect("attempts");
        assert_eq!(recorded, vec![result.attempt]);
    }

    #[test]
    fn removed_questions_are_skipped_and_attempts_cascade() {
        let conn = test_conn();
        let a = question(&conn, "2+2", "math", "easy");
        let b = question(&conn, "1+3", "math", "easy");
        let quiz = create(
            &conn,
            NewQuiz {
                name: None,
                question_ids: vec![a.clone(), b.clone()],
            },
        )
        .expect("create");
        questions::delete(&conn, &a).expect("delete question");

        let items = paper(&conn, &quiz.id).expect("paper");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, b);
        let result = submit(
            &conn,
            &quiz.id,
            BTreeMap::from([(b.clone(), "4".to_string())]),
        )
        .expect("submit");
        assert_eq!((result.attempt.score, result.attempt.total), (1, 1));

        delete(&conn, &quiz.id).expect("delete quiz");
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM quiz_attempts", [], |r| r.get(0))
            .expect("count");
        assert_eq!(left, 0);
        assert!(matches!(
            attempts(&conn, &quiz.id),
            Err(StoreError::NotFound { .. })
        ));
    }
}
