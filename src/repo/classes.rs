use super::{new_id, optional_text, required_text};
use crate::db;
use crate::error::{map_unique, StoreError, StoreResult};
use crate::model::{Class, ClassPatch, NewClass};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{info, instrument, warn};

pub(crate) const COLUMNS: &str = "id, name, subject_id, year_semester, teacher";

pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Class> {
    Ok(Class {
        id: row.get(0)?,
        name: row.get(1)?,
        subject_id: row.get(2)?,
        year_semester: row.get(3)?,
        teacher: row.get(4)?,
    })
}

fn ensure_subject(conn: &Connection, subject_id: &str) -> StoreResult<()> {
    if db::row_exists(conn, "subjects", subject_id)? {
        Ok(())
    } else {
        Err(StoreError::not_found("subject", subject_id))
    }
}

// `IS` so that two classes without a year/semester still collide.
fn ensure_unique(conn: &Connection, class: &Class) -> StoreResult<()> {
    let taken = conn
        .query_row(
            "SELECT 1 FROM classes
             WHERE name = ? AND subject_id = ? AND year_semester IS ? AND id != ?",
            (&class.name, &class.subject_id, &class.year_semester, &class.id),
            |_r| Ok(()),
        )
        .optional()?;
    if taken.is_some() {
        return Err(StoreError::Duplicate(
            "a class with this name, subject and year/semester already exists".to_string(),
        ));
    }
    Ok(())
}

#[instrument(skip(conn, input))]
pub fn create(conn: &Connection, input: NewClass) -> StoreResult<Class> {
    let class = Class {
        id: new_id(),
        name: required_text("name", &input.name)?,
        subject_id: required_text("subjectId", &input.subject_id)?,
        year_semester: optional_text(input.year_semester),
        teacher: optional_text(input.teacher),
    };
    ensure_subject(conn, &class.subject_id)?;
    ensure_unique(conn, &class)?;

    conn.execute(
        "INSERT INTO classes(id, name, subject_id, year_semester, teacher) VALUES(?, ?, ?, ?, ?)",
        (
            &class.id,
            &class.name,
            &class.subject_id,
            &class.year_semester,
            &class.teacher,
        ),
    )
    .map_err(|e| map_unique(e, "class already exists"))?;

    info!(class_id = %class.id, subject_id = %class.subject_id, "class created");
    Ok(class)
}

pub fn get(conn: &Connection, id: &str) -> StoreResult<Class> {
    let sql = format!("SELECT {} FROM classes WHERE id = ?", COLUMNS);
    conn.query_row(&sql, [id], from_row)
        .optional()?
        .ok_or_else(|| StoreError::not_found("class", id))
}

pub fn list(conn: &Connection, subject_id: Option<&str>) -> StoreResult<Vec<Class>> {
    let sql = format!(
        "SELECT {} FROM classes
         WHERE (?1 IS NULL OR subject_id = ?1)
         ORDER BY name, year_semester",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([subject_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[instrument(skip(conn, patch))]
pub fn update(conn: &Connection, id: &str, patch: ClassPatch) -> StoreResult<Class> {
    if patch.is_empty() {
        return Err(StoreError::validation("no fields to update"));
    }
    let mut class = get(conn, id)?;
    patch.apply(&mut class);
    class.name = required_text("name", &class.name)?;
    class.subject_id = required_text("subjectId", &class.subject_id)?;
    class.year_semester = optional_text(class.year_semester);
    class.teacher = optional_text(class.teacher);
    ensure_subject(conn, &class.subject_id)?;
    ensure_unique(conn, &class)?;

    conn.execute(
        "UPDATE classes SET name = ?, subject_id = ?, year_semester = ?, teacher = ? WHERE id = ?",
        (
            &class.name,
            &class.subject_id,
            &class.year_semester,
            &class.teacher,
            id,
        ),
    )
    .map_err(|e| map_unique(e, "class already exists"))?;

    info!(class_id = %id, "class updated");
    Ok(class)
}

/// Refuses while students are enrolled or evaluations or assignments exist.
/// Lesson-plan links to the class go away with it (schema cascade).
#[instrument(skip(conn))]
pub fn delete(conn: &Connection, id: &str) -> StoreResult<()> {
    get(conn, id)?;
    let (enrolled, evaluations, assignments): (i64, i64, i64) = conn.query_row(
        "SELECT
           (SELECT COUNT(*) FROM enrollments WHERE class_id = ?1),
           (SELECT COUNT(*) FROM evaluations WHERE class_id = ?1),
           (SELECT COUNT(*) FROM assignments WHERE class_id = ?1)",
        [id],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )?;
    if enrolled > 0 || evaluations > 0 || assignments > 0 {
        warn!(class_id = %id, enrolled, evaluations, assignments, "class delete blocked");
        return Err(StoreError::Conflict(format!(
            "class has {} enrolled student(s), {} evaluation(s) and {} assignment(s)",
            enrolled, evaluations, assignments
        )));
    }
    conn.execute("DELETE FROM classes WHERE id = ?", [id])?;
    info!(class_id = %id, "class deleted");
    Ok(())
}
