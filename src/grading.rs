//! Grade sets per evaluation, evaluation removal, and the weighted class
//! report.

use crate::db::{self, in_transaction};
use crate::enrollment;
use crate::error::{StoreError, StoreResult};
use crate::model::{Evaluation, Grade, GradeEntry, Student};
use crate::repo::evaluations;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument, warn};

fn reject(student_id: &str, message: String, value: f64, max_grade: f64) -> StoreError {
    warn!(student_id, value, max_grade, "grade batch rejected");
    StoreError::validation_with(
        message,
        json!({ "studentId": student_id, "value": value, "maxGrade": max_grade }),
    )
}

/// Checks every entry up front; the first offending entry aborts the batch
/// before anything is written.
fn validate(conn: &Connection, evaluation: &Evaluation, entries: &[GradeEntry]) -> StoreResult<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        let sid = entry.student_id.as_str();
        if !seen.insert(sid) {
            return Err(StoreError::validation_with(
                "student appears more than once in the grade batch",
                json!({ "studentId": sid }),
            ));
        }
        if !entry.value.is_finite() || entry.value < 0.0 {
            return Err(reject(
                sid,
                format!("grade for student {} must be a number >= 0", sid),
                entry.value,
                evaluation.max_grade,
            ));
        }
        if entry.value > evaluation.max_grade {
            return Err(reject(
                sid,
                format!(
                    "grade {} for student {} exceeds max grade {}",
                    entry.value, sid, evaluation.max_grade
                ),
                entry.value,
                evaluation.max_grade,
            ));
        }
        if !db::row_exists(conn, "students", sid)? {
            return Err(StoreError::not_found("student", sid));
        }
    }
    Ok(())
}

/// Replaces the whole grade set of an evaluation. On any failure the prior
/// set is left untouched.
#[instrument(skip(conn, entries), fields(count = entries.len()))]
pub fn replace_grades(
    conn: &Connection,
    evaluation_id: &str,
    entries: &[GradeEntry],
) -> StoreResult<Vec<Grade>> {
    let evaluation = evaluations::get(conn, evaluation_id)?;
    validate(conn, &evaluation, entries)?;

    in_transaction(conn, |tx| {
        let removed = tx.execute("DELETE FROM grades WHERE evaluation_id = ?", [evaluation_id])?;
        debug!(removed, "previous grades cleared");
        let mut stmt =
            tx.prepare("INSERT INTO grades(student_id, evaluation_id, value) VALUES(?, ?, ?)")?;
        for entry in entries {
            stmt.execute((&entry.student_id, evaluation_id, entry.value))?;
        }
        Ok(())
    })?;

    info!(evaluation_id, count = entries.len(), "grades replaced");
    get_grades(conn, evaluation_id)
}

pub fn get_grades(conn: &Connection, evaluation_id: &str) -> StoreResult<Vec<Grade>> {
    if !db::row_exists(conn, "evaluations", evaluation_id)? {
        return Err(StoreError::not_found("evaluation", evaluation_id));
    }
    let mut stmt = conn.prepare(
        "SELECT student_id, evaluation_id, value FROM grades
         WHERE evaluation_id = ?
         ORDER BY student_id",
    )?;
    let rows = stmt
        .query_map([evaluation_id], |r| {
            Ok(Grade {
                student_id: r.get(0)?,
                evaluation_id: r.get(1)?,
                value: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Removes the evaluation and every grade recorded for it in one
/// transaction.
#[instrument(skip(conn))]
pub fn delete_evaluation(conn: &Connection, evaluation_id: &str) -> StoreResult<()> {
    if !db::row_exists(conn, "evaluations", evaluation_id)? {
        return Err(StoreError::not_found("evaluation", evaluation_id));
    }
    let grades = in_transaction(conn, |tx| {
        let grades = tx.execute("DELETE FROM grades WHERE evaluation_id = ?", [evaluation_id])?;
        tx.execute("DELETE FROM evaluations WHERE id = ?", [evaluation_id])?;
        Ok(grades)
    })?;
    info!(evaluation_id, grades, "evaluation deleted");
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub student: Student,
    /// Keyed by evaluation id; evaluations without a grade are absent.
    pub grades: BTreeMap<String, f64>,
    pub final_grade: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassReport {
    pub class_id: String,
    pub evaluations: Vec<Evaluation>,
    pub students: Vec<ReportRow>,
}

/// Weighted mean over the evaluations the student has a grade for.
pub fn weighted_final(grades: &BTreeMap<String, f64>, evaluations: &[Evaluation]) -> Option<f64> {
    let (mut sum, mut weights) = (0.0, 0.0);
    for e in evaluations {
        if let Some(v) = grades.get(&e.id) {
            sum += v * e.weight;
            weights += e.weight;
        }
    }
    if weights > 0.0 {
        Some(sum / weights)
    } else {
        None
    }
}

pub fn class_report(conn: &Connection, class_id: &str) -> StoreResult<ClassReport> {
    let roster = enrollment::students_for_class(conn, class_id)?;
    let evals = evaluations::list(conn, Some(class_id))?;

    let mut by_student: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    let mut stmt = conn.prepare(
        "SELECT g.student_id, g.evaluation_id, g.value FROM grades g
         JOIN evaluations e ON e.id = g.evaluation_id
         WHERE e.class_id = ?",
    )?;
    let mut rows = stmt.query([class_id])?;
    while let Some(r) = rows.next()? {
        let sid: String = r.get(0)?;
        let eid: String = r.get(1)?;
        let v: f64 = r.get(2)?;
        by_student.entry(sid).or_default().insert(eid, v);
    }

    let students = roster
        .into_iter()
        .map(|student| {
            let grades = by_student.remove(&student.id).unwrap_or_default();
            let final_grade = weighted_final(&grades, &evals);
            ReportRow {
                student,
                grades,
                final_grade,
            }
        })
        .collect();

    Ok(ClassReport {
        class_id: class_id.to_string(),
        evaluations: evals,
        students,
    })
}
