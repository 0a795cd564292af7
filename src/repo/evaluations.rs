use super::{new_id, optional_date, required_text};
use crate::db;
use crate::error::{StoreError, StoreResult};
use crate::model::{Evaluation, EvaluationPatch, NewEvaluation};
use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::json;
use tracing::{info, instrument};

const COLUMNS: &str = "id, name, class_id, weight, max_grade, date";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Evaluation> {
    Ok(Evaluation {
        id: row.get(0)?,
        name: row.get(1)?,
        class_id: row.get(2)?,
        weight: row.get(3)?,
        max_grade: row.get(4)?,
        date: row.get(5)?,
    })
}

fn positive(field: &str, v: f64) -> StoreResult<f64> {
    if !v.is_finite() || v <= 0.0 {
        return Err(StoreError::validation_with(
            format!("{} must be > 0", field),
            json!({ "field": field, "value": v }),
        ));
    }
    Ok(v)
}

#[instrument(skip(conn, input))]
pub fn create(conn: &Connection, input: NewEvaluation) -> StoreResult<Evaluation> {
    let evaluation = Evaluation {
        id: new_id(),
        name: required_text("name", &input.name)?,
        class_id: required_text("classId", &input.class_id)?,
        weight: positive("weight", input.weight)?,
        max_grade: positive("maxGrade", input.max_grade)?,
        date: optional_date("date", input.date)?,
    };
    if !db::row_exists(conn, "classes", &evaluation.class_id)? {
        return Err(StoreError::not_found("class", &evaluation.class_id));
    }

    conn.execute(
        "INSERT INTO evaluations(id, name, class_id, weight, max_grade, date)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &evaluation.id,
            &evaluation.name,
            &evaluation.class_id,
            evaluation.weight,
            evaluation.max_grade,
            &evaluation.date,
        ),
    )?;
    info!(evaluation_id = %evaluation.id, class_id = %evaluation.class_id, "evaluation created");
    Ok(evaluation)
}

pub fn get(conn: &Connection, id: &str) -> StoreResult<Evaluation> {
    let sql = format!("SELECT {} FROM evaluations WHERE id = ?", COLUMNS);
    conn.query_row(&sql, [id], from_row)
        .optional()?
        .ok_or_else(|| StoreError::not_found("evaluation", id))
}

pub fn list(conn: &Connection, class_id: Option<&str>) -> StoreResult<Vec<Evaluation>> {
    let sql = format!(
        "SELECT {} FROM evaluations
         WHERE (?1 IS NULL OR class_id = ?1)
         ORDER BY date IS NULL, date, name",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([class_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Partial update. The owning class is fixed at creation. Lowering
/// `maxGrade` under an already recorded grade is rejected.
#[instrument(skip(conn, patch))]
pub fn update(conn: &Connection, id: &str, patch: EvaluationPatch) -> StoreResult<Evaluation> {
    if patch.is_empty() {
        return Err(StoreError::validation("no fields to update"));
    }
    let mut evaluation = get(conn, id)?;
    patch.apply(&mut evaluation);
    evaluation.name = required_text("name", &evaluation.name)?;
    evaluation.weight = positive("weight", evaluation.weight)?;
    evaluation.max_grade = positive("maxGrade", evaluation.max_grade)?;
    evaluation.date = optional_date("date", evaluation.date)?;

    let top: Option<f64> = conn.query_row(
        "SELECT MAX(value) FROM grades WHERE evaluation_id = ?",
        [id],
        |r| r.get(0),
    )?;
    if let Some(top) = top {
        if top > evaluation.max_grade {
            return Err(StoreError::validation_with(
                "maxGrade is below an existing grade",
                json!({ "maxGrade": evaluation.max_grade, "highestGrade": top }),
            ));
        }
    }

    conn.execute(
        "UPDATE evaluations SET name = ?, weight = ?, max_grade = ?, date = ? WHERE id = ?",
        (
            &evaluation.name,
            evaluation.weight,
            evaluation.max_grade,
            &evaluation.date,
            id,
        ),
    )?;
    info!(evaluation_id = %id, "evaluation updated");
    Ok(evaluation)
}
