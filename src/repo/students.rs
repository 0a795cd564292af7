use super::{new_id, optional_date, optional_text, required_text};
use crate::error::{StoreError, StoreResult};
use crate::model::{NewStudent, Student, StudentPatch};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{info, instrument, warn};

pub(crate) const COLUMNS: &str = "id, name, call_number, registration, birth_date";

pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        call_number: row.get(2)?,
        registration: row.get(3)?,
        birth_date: row.get(4)?,
    })
}

pub(crate) fn normalize(input: NewStudent) -> StoreResult<Student> {
    Ok(Student {
        id: new_id(),
        name: required_text("name", &input.name)?,
        call_number: input.call_number,
        registration: optional_text(input.registration),
        birth_date: optional_date("birthDate", input.birth_date)?,
    })
}

pub(crate) fn insert(conn: &Connection, s: &Student) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO students(id, name, call_number, registration, birth_date)
         VALUES(?, ?, ?, ?, ?)",
        (&s.id, &s.name, s.call_number, &s.registration, &s.birth_date),
    )?;
    Ok(())
}

#[instrument(skip(conn, input))]
pub fn create(conn: &Connection, input: NewStudent) -> StoreResult<Student> {
    let student = normalize(input)?;
    insert(conn, &student)?;
    info!(student_id = %student.id, "student created");
    Ok(student)
}

pub fn get(conn: &Connection, id: &str) -> StoreResult<Student> {
    let sql = format!("SELECT {} FROM students WHERE id = ?", COLUMNS);
    conn.query_row(&sql, [id], from_row)
        .optional()?
        .ok_or_else(|| StoreError::not_found("student", id))
}

pub fn list(conn: &Connection) -> StoreResult<Vec<Student>> {
    let sql = format!("SELECT {} FROM students ORDER BY name, id", COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[instrument(skip(conn, patch))]
pub fn update(conn: &Connection, id: &str, patch: StudentPatch) -> StoreResult<Student> {
    if patch.is_empty() {
        return Err(StoreError::validation("no fields to update"));
    }
    let mut student = get(conn, id)?;
    patch.apply(&mut student);
    student.name = required_text("name", &student.name)?;
    student.registration = optional_text(student.registration);
    student.birth_date = optional_date("birthDate", student.birth_date)?;

    conn.execute(
        "UPDATE students SET name = ?, call_number = ?, registration = ?, birth_date = ?
         WHERE id = ?",
        (
            &student.name,
            student.call_number,
            &student.registration,
            &student.birth_date,
            id,
        ),
    )?;
    info!(student_id = %id, "student updated");
    Ok(student)
}

/// Refuses while the student is enrolled anywhere. Grades go with the
/// student.
#[instrument(skip(conn))]
pub fn delete(conn: &Connection, id: &str) -> StoreResult<()> {
    get(conn, id)?;
    let enrolled: i64 = conn.query_row(
        "SELECT COUNT(*) FROM enrollments WHERE student_id = ?",
        [id],
        |r| r.get(0),
    )?;
    if enrolled > 0 {
        warn!(student_id = %id, enrolled, "student delete blocked by enrollments");
        return Err(StoreError::Conflict(format!(
            "student is enrolled in {} class(es)",
            enrolled
        )));
    }
    crate::db::in_transaction(conn, |tx| {
        tx.execute("DELETE FROM grades WHERE student_id = ?", [id])?;
        tx.execute("DELETE FROM students WHERE id = ?", [id])?;
        Ok(())
    })?;
    info!(student_id = %id, "student deleted");
    Ok(())
}
