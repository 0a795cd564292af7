//! Many-to-many ledger between students and classes.
//!
//! The `(student_id, class_id)` primary key is the duplicate guard; a second
//! enroll of the same pair surfaces as `Duplicate`.

use crate::db::{self, in_transaction};
use crate::error::{map_unique, StoreError, StoreResult};
use crate::model::{Class, NewStudent, Student};
use crate::repo::{classes, students};
use rusqlite::Connection;
use tracing::{info, instrument, warn};

fn require(conn: &Connection, class_id: &str, student_id: &str) -> StoreResult<()> {
    if !db::row_exists(conn, "classes", class_id)? {
        return Err(StoreError::not_found("class", class_id));
    }
    if !db::row_exists(conn, "students", student_id)? {
        return Err(StoreError::not_found("student", student_id));
    }
    Ok(())
}

#[instrument(skip(conn))]
pub fn enroll(conn: &Connection, class_id: &str, student_id: &str) -> StoreResult<()> {
    require(conn, class_id, student_id)?;
    conn.execute(
        "INSERT INTO enrollments(student_id, class_id) VALUES(?, ?)",
        (student_id, class_id),
    )
    .map_err(|e| map_unique(e, "student is already enrolled in this class"))?;
    info!(class_id, student_id, "student enrolled");
    Ok(())
}

/// Strict: removing a pair that is not enrolled is `NotFound`.
#[instrument(skip(conn))]
pub fn unenroll(conn: &Connection, class_id: &str, student_id: &str) -> StoreResult<()> {
    let n = conn.execute(
        "DELETE FROM enrollments WHERE student_id = ? AND class_id = ?",
        (student_id, class_id),
    )?;
    if n == 0 {
        warn!(class_id, student_id, "unenroll of a pair that is not enrolled");
        return Err(StoreError::not_found(
            "enrollment",
            format!("{}/{}", class_id, student_id),
        ));
    }
    info!(class_id, student_id, "student unenrolled");
    Ok(())
}

fn prefixed(columns: &str, alias: &str) -> String {
    columns
        .split(", ")
        .map(|c| format!("{}.{}", alias, c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ordered by call number (unnumbered last), then name.
pub fn students_for_class(conn: &Connection, class_id: &str) -> StoreResult<Vec<Student>> {
    if !db::row_exists(conn, "classes", class_id)? {
        return Err(StoreError::not_found("class", class_id));
    }
    let cols = prefixed(students::COLUMNS, "s");
    let sql = format!(
        "SELECT {} FROM students s
         JOIN enrollments e ON e.student_id = s.id
         WHERE e.class_id = ?
         ORDER BY s.call_number IS NULL, s.call_number, s.name",
        cols
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([class_id], students::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn classes_for_student(conn: &Connection, student_id: &str) -> StoreResult<Vec<Class>> {
    if !db::row_exists(conn, "students", student_id)? {
        return Err(StoreError::not_found("student", student_id));
    }
    let sql = format!(
        "SELECT {} FROM classes c
         JOIN enrollments e ON e.class_id = c.id
         WHERE e.student_id = ?
         ORDER BY c.name, c.year_semester",
        prefixed(classes::COLUMNS, "c")
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([student_id], classes::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Creates a student and enrolls them in `class_id` as one unit. A call
/// number already used inside the class is rejected.
#[instrument(skip(conn, input))]
pub fn create_in_class(conn: &Connection, class_id: &str, input: NewStudent) -> StoreResult<Student> {
    if !db::row_exists(conn, "classes", class_id)? {
        return Err(StoreError::not_found("class", class_id));
    }
    let student = students::normalize(input)?;
    if let Some(n) = student.call_number {
        let taken: i64 = conn.query_row(
            "SELECT COUNT(*) FROM students s
             JOIN enrollments e ON e.student_id = s.id
             WHERE e.class_id = ? AND s.call_number = ?",
            (class_id, n),
            |r| r.get(0),
        )?;
        if taken > 0 {
            warn!(class_id, call_number = n, "call number already used in class");
            return Err(StoreError::Duplicate(format!(
                "call number {} is already used in this class",
                n
            )));
        }
    }

    in_transaction(conn, |tx| {
        students::insert(tx, &student)?;
        tx.execute(
            "INSERT INTO enrollments(student_id, class_id) VALUES(?, ?)",
            (&student.id, class_id),
        )?;
        Ok(())
    })?;
    info!(student_id = %student.id, class_id, "student created in class");
    Ok(student)
}
