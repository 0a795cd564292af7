use super::{new_id, optional_text, parse_iso_date, required_text};
use crate::db;
use crate::error::{StoreError, StoreResult};
use crate::model::{Assignment, AssignmentPatch, AssignmentStatus, NewAssignment};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{info, instrument};

const COLUMNS: &str = "id, class_id, title, description, due_date, status";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Assignment> {
    let status: String = row.get(5)?;
    Ok(Assignment {
        id: row.get(0)?,
        class_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        due_date: row.get(4)?,
        status: AssignmentStatus::parse(&status).unwrap_or_default(),
    })
}

fn ensure_class(conn: &Connection, class_id: &str) -> StoreResult<()> {
    if db::row_exists(conn, "classes", class_id)? {
        Ok(())
    } else {
        Err(StoreError::not_found("class", class_id))
    }
}

fn normalize(a: &mut Assignment) -> StoreResult<()> {
    a.title = required_text("title", &a.title)?;
    a.description = optional_text(a.description.take());
    a.due_date = parse_iso_date("dueDate", &a.due_date)?
        .format("%Y-%m-%d")
        .to_string();
    Ok(())
}

#[instrument(skip(conn, input))]
pub fn create(conn: &Connection, input: NewAssignment) -> StoreResult<Assignment> {
    let mut a = Assignment {
        id: new_id(),
        class_id: required_text("classId", &input.class_id)?,
        title: input.title,
        description: input.description,
        due_date: input.due_date,
        status: input.status,
    };
    normalize(&mut a)?;
    ensure_class(conn, &a.class_id)?;

    conn.execute(
        "INSERT INTO assignments(id, class_id, title, description, due_date, status)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &a.id,
            &a.class_id,
            &a.title,
            &a.description,
            &a.due_date,
            a.status.as_str(),
        ),
    )?;
    info!(assignment_id = %a.id, class_id = %a.class_id, "assignment created");
    Ok(a)
}

pub fn get(conn: &Connection, id: &str) -> StoreResult<Assignment> {
    let sql = format!("SELECT {} FROM assignments WHERE id = ?", COLUMNS);
    conn.query_row(&sql, [id], from_row)
        .optional()?
        .ok_or_else(|| StoreError::not_found("assignment", id))
}

/// Earliest due date first. Filtering on a class that does not exist is
/// `NotFound` rather than an empty list.
pub fn list(conn: &Connection, class_id: Option<&str>) -> StoreResult<Vec<Assignment>> {
    if let Some(cid) = class_id {
        ensure_class(conn, cid)?;
    }
    let sql = format!(
        "SELECT {} FROM assignments
         WHERE (?1 IS NULL OR class_id = ?1)
         ORDER BY due_date, title",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([class_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[instrument(skip(conn, patch))]
pub fn update(conn: &Connection, id: &str, patch: AssignmentPatch) -> StoreResult<Assignment> {
    if patch.is_empty() {
        return Err(StoreError::validation("no fields to update"));
    }
    let mut a = get(conn, id)?;
    patch.apply(&mut a);
    normalize(&mut a)?;

    conn.execute(
        "UPDATE assignments SET title = ?, description = ?, due_date = ?, status = ? WHERE id = ?",
        (&a.title, &a.description, &a.due_date, a.status.as_str(), id),
    )?;
    info!(assignment_id = %id, status = a.status.as_str(), "assignment updated");
    Ok(a)
}

#[instrument(skip(conn))]
pub fn delete(conn: &Connection, id: &str) -> StoreResult<()> {
    let n = conn.execute("DELETE FROM assignments WHERE id = ?", [id])?;
    if n == 0 {
        return Err(StoreError::not_found("assignment", id));
    }
    info!(assignment_id = %id, "assignment deleted");
    Ok(())
}

/// Flips every pending assignment of the class to graded in one statement.
/// Returns how many rows changed; zero means nothing was pending.
#[instrument(skip(conn))]
pub fn mark_all_graded(conn: &Connection, class_id: &str) -> StoreResult<usize> {
    ensure_class(conn, class_id)?;
    let n = conn.execute(
        "UPDATE assignments SET status = ?1 WHERE class_id = ?2 AND status != ?1",
        (AssignmentStatus::Graded.as_str(), class_id),
    )?;
    info!(class_id, updated = n, "assignments marked graded");
    Ok(n)
}
