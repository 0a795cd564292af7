use super::{new_id, optional_text, required_text};
use crate::error::{map_unique, StoreError, StoreResult};
use crate::model::{NewSubject, Subject, SubjectPatch};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{info, instrument, warn};

const COLUMNS: &str = "id, name, code, description";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        description: row.get(3)?,
    })
}

fn ensure_unique(conn: &Connection, name: &str, code: &str, except_id: &str) -> StoreResult<()> {
    let name_taken = conn
        .query_row(
            "SELECT 1 FROM subjects WHERE name = ? AND id != ?",
            (name, except_id),
            |_r| Ok(()),
        )
        .optional()?;
    if name_taken.is_some() {
        return Err(StoreError::Duplicate(format!(
            "a subject named '{}' already exists",
            name
        )));
    }
    let code_taken = conn
        .query_row(
            "SELECT 1 FROM subjects WHERE code = ? AND id != ?",
            (code, except_id),
            |_r| Ok(()),
        )
        .optional()?;
    if code_taken.is_some() {
        return Err(StoreError::Duplicate(format!(
            "a subject with code '{}' already exists",
            code
        )));
    }
    Ok(())
}

#[instrument(skip(conn, input))]
pub fn create(conn: &Connection, input: NewSubject) -> StoreResult<Subject> {
    let subject = Subject {
        id: new_id(),
        name: required_text("name", &input.name)?,
        code: required_text("code", &input.code)?,
        description: optional_text(input.description),
    };
    ensure_unique(conn, &subject.name, &subject.code, "")?;

    conn.execute(
        "INSERT INTO subjects(id, name, code, description) VALUES(?, ?, ?, ?)",
        (&subject.id, &subject.name, &subject.code, &subject.description),
    )
    .map_err(|e| map_unique(e, "subject name or code already exists"))?;

    info!(subject_id = %subject.id, "subject created");
    Ok(subject)
}

pub fn get(conn: &Connection, id: &str) -> StoreResult<Subject> {
    let sql = format!("SELECT {} FROM subjects WHERE id = ?", COLUMNS);
    conn.query_row(&sql, [id], from_row)
        .optional()?
        .ok_or_else(|| StoreError::not_found("subject", id))
}

pub fn list(conn: &Connection) -> StoreResult<Vec<Subject>> {
    let sql = format!("SELECT {} FROM subjects ORDER BY name", COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[instrument(skip(conn, patch))]
pub fn update(conn: &Connection, id: &str, patch: SubjectPatch) -> StoreResult<Subject> {
    if patch.is_empty() {
        return Err(StoreError::validation("no fields to update"));
    }
    let mut subject = get(conn, id)?;
    patch.apply(&mut subject);
    subject.name = required_text("name", &subject.name)?;
    subject.code = required_text("code", &subject.code)?;
    subject.description = optional_text(subject.description);
    ensure_unique(conn, &subject.name, &subject.code, id)?;

    conn.execute(
        "UPDATE subjects SET name = ?, code = ?, description = ? WHERE id = ?",
        (&subject.name, &subject.code, &subject.description, id),
    )
    .map_err(|e| map_unique(e, "subject name or code already exists"))?;

    info!(subject_id = %id, "subject updated");
    Ok(subject)
}

#[instrument(skip(conn))]
pub fn delete(conn: &Connection, id: &str) -> StoreResult<()> {
    get(conn, id)?;
    let class_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM classes WHERE subject_id = ?",
        [id],
        |r| r.get(0),
    )?;
    if class_count > 0 {
        warn!(subject_id = %id, class_count, "subject delete blocked by classes");
        return Err(StoreError::Conflict(format!(
            "subject is referenced by {} class(es)",
            class_count
        )));
    }
    conn.execute("DELETE FROM subjects WHERE id = ?", [id])?;
    info!(subject_id = %id, "subject deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;
    use crate::model::NewClass;
    use crate::repo::classes;

    fn math() -> NewSubject {
        NewSubject {
            name: "Mathematics".into(),
            code: "MAT".into(),
            description: None,
        }
    }

    #[test]
    fn duplicate_name_or_code_is_rejected() {
        let conn = test_conn();
        create(&conn, math()).expect("create");

        let same_name = NewSubject {
            code: "MAT2".into(),
            ..math()
        };
        assert!(matches!(
            create(&conn, same_name),
            Err(StoreError::Duplicate(_))
        ));

        let same_code = NewSubject {
            name: "Maths".into(),
            ..math()
        };
        assert!(matches!(
            create(&conn, same_code),
            Err(StoreError::Duplicate(_))
        ));
    }

    #[test]
    fn update_is_partial_and_keeps_uniqueness() {
        let conn = test_conn();
        let m = create(&conn, math()).expect("create");
        let p = create(
            &conn,
            NewSubject {
                name: "Physics".into(),
                code: "PHY".into(),
                description: Some("labs".into()),
            },
        )
        .expect("create physics");

        let updated = update(
            &conn,
            &m.id,
            SubjectPatch {
                description: Some(Some("algebra".into())),
                ..Default::default()
            },
        )
        .expect("update");
        assert_eq!(updated.name, "Mathematics");
        assert_eq!(updated.description.as_deref(), Some("algebra"));

        let clash = update(
            &conn,
            &p.id,
            SubjectPatch {
                code: Some("MAT".into()),
                ..Default::default()
            },
        );
        assert!(matches!(clash, Err(StoreError::Duplicate(_))));

        let empty = update(&conn, &p.id, SubjectPatch::default());
        assert!(matches!(empty, Err(StoreError::Validation { .. })));
    }

    #[test]
    fn delete_blocked_while_classes_reference_subject() {
        let conn = test_conn();
        let s = create(&conn, math()).expect("create");
        let c = classes::create(
            &conn,
            NewClass {
                name: "7A".into(),
                subject_id: s.id.clone(),
                year_semester: Some("2024/1".into()),
                teacher: None,
            },
        )
        .expect("class");

        assert!(matches!(delete(&conn, &s.id), Err(StoreError::Conflict(_))));
        classes::delete(&conn, &c.id).expect("delete class");
        delete(&conn, &s.id).expect("delete subject");
        assert!(matches!(
            get(&conn, &s.id),
            Err(StoreError::NotFound { .. })
        ));
    }
}
