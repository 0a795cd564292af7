use crate::error::{StoreError, StoreResult};
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::path::Path;
use tracing::{debug, info};

pub const DB_FILE: &str = "planbook.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace.to_string_lossy()
        )
    })?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;
    init_schema(&conn).context("failed to provision schema")?;
    info!(path = %db_path.to_string_lossy(), "workspace database ready");
    Ok(conn)
}

/// Creates every table and index that is missing and adds columns that older
/// stores lack. Safe to run on every open.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            code TEXT NOT NULL UNIQUE,
            description TEXT
        )",
        [],
    )?;

    // Delete of a subject is blocked, not cascaded.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            year_semester TEXT,
            teacher TEXT,
            FOREIGN KEY(subject_id) REFERENCES subjects(id),
            UNIQUE(name, subject_id, year_semester)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_classes_subject ON classes(subject_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            call_number INTEGER,
            registration TEXT,
            birth_date TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS enrollments(
            student_id TEXT NOT NULL,
            class_id TEXT NOT NULL,
            PRIMARY KEY(student_id, class_id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(class_id) REFERENCES classes(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_enrollments_class ON enrollments(class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS evaluations(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            class_id TEXT NOT NULL,
            weight REAL NOT NULL,
            max_grade REAL NOT NULL,
            date TEXT,
            FOREIGN KEY(class_id) REFERENCES classes(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_evaluations_class ON evaluations(class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS grades(
            student_id TEXT NOT NULL,
            evaluation_id TEXT NOT NULL,
            value REAL NOT NULL,
            PRIMARY KEY(student_id, evaluation_id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(evaluation_id) REFERENCES evaluations(id) ON DELETE CASCADE
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grades_evaluation ON grades(evaluation_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events(
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            date TEXT NOT NULL,
            start_time TEXT,
            end_time TEXT,
            description TEXT,
            category TEXT NOT NULL DEFAULT 'General',
            recurrence_id TEXT,
            reminders_json TEXT NOT NULL DEFAULT '[]'
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_date ON events(date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_recurrence ON events(recurrence_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS tasks(
            id TEXT PRIMARY KEY,
            text TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            priority TEXT NOT NULL DEFAULT 'medium',
            due_date TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS questions(
            id TEXT PRIMARY KEY,
            text TEXT NOT NULL,
            subject TEXT,
            difficulty TEXT,
            options_json TEXT NOT NULL DEFAULT '[]',
            answer TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS materials(
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            kind TEXT,
            tags_json TEXT NOT NULL DEFAULT '[]',
            url TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS lesson_plans(
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            date TEXT,
            objectives TEXT,
            activities TEXT,
            assessment TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS lesson_plan_classes(
            lesson_plan_id TEXT NOT NULL,
            class_id TEXT NOT NULL,
            PRIMARY KEY(lesson_plan_id, class_id),
            FOREIGN KEY(lesson_plan_id) REFERENCES lesson_plans(id) ON DELETE CASCADE,
            FOREIGN KEY(class_id) REFERENCES classes(id) ON DELETE CASCADE
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS lesson_plan_materials(
            lesson_plan_id TEXT NOT NULL,
            material_id TEXT NOT NULL,
            PRIMARY KEY(lesson_plan_id, material_id),
            FOREIGN KEY(lesson_plan_id) REFERENCES lesson_plans(id) ON DELETE CASCADE,
            FOREIGN KEY(material_id) REFERENCES materials(id) ON DELETE CASCADE
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS lesson_plan_evaluations(
            lesson_plan_id TEXT NOT NULL,
            evaluation_id TEXT NOT NULL,
            PRIMARY KEY(lesson_plan_id, evaluation_id),
            FOREIGN KEY(lesson_plan_id) REFERENCES lesson_plans(id) ON DELETE CASCADE,
            FOREIGN KEY(evaluation_id) REFERENCES evaluations(id) ON DELETE CASCADE
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lesson_plan_classes_class ON lesson_plan_classes(class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS quizzes(
            id TEXT PRIMARY KEY,
            name TEXT,
            question_ids_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS quiz_attempts(
            id TEXT PRIMARY KEY,
            quiz_id TEXT NOT NULL,
            answers_json TEXT NOT NULL,
            score INTEGER NOT NULL,
            total INTEGER NOT NULL,
            attempted_at TEXT NOT NULL,
            FOREIGN KEY(quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_quiz_attempts_quiz ON quiz_attempts(quiz_id)",
        [],
    )?;

    // Class delete is blocked while assignments exist.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS assignments(
            id TEXT PRIMARY KEY,
            class_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            due_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            FOREIGN KEY(class_id) REFERENCES classes(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_assignments_class ON assignments(class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    ensure_events_reminders(conn)?;

    debug!("schema provisioned");
    Ok(())
}

fn ensure_events_reminders(conn: &Connection) -> rusqlite::Result<()> {
    if table_has_column(conn, "events", "reminders_json")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE events ADD COLUMN reminders_json TEXT NOT NULL DEFAULT '[]'",
        [],
    )?;
    info!("events.reminders_json column added");
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Runs `f` inside one transaction on `conn`. Commits on `Ok`; any error rolls
/// the whole unit back. Store failures raised inside become `Transaction`.
pub fn in_transaction<T, F>(conn: &Connection, f: F) -> StoreResult<T>
where
    F: FnOnce(&Transaction<'_>) -> StoreResult<T>,
{
    let tx = conn.unchecked_transaction().map_err(StoreError::Transaction)?;
    match f(&tx) {
        Ok(v) => {
            tx.commit().map_err(StoreError::Transaction)?;
            Ok(v)
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(match e {
                StoreError::Db(inner) => StoreError::Transaction(inner),
                other => other,
            })
        }
    }
}

pub fn row_exists(conn: &Connection, table: &str, id: &str) -> rusqlite::Result<bool> {
    // `table` is always one of our own literal table names.
    let sql = format!("SELECT 1 FROM {} WHERE id = ? LIMIT 1", table);
    Ok(conn
        .query_row(&sql, [id], |_r| Ok(()))
        .optional()?
        .is_some())
}

pub fn settings_get_json(
    conn: &Connection,
    key: &str,
) -> rusqlite::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    // A corrupt value reads as absent so callers fall back to defaults.
    Ok(raw.and_then(|s| serde_json::from_str(&s).ok()))
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, value.to_string()),
    )?;
    Ok(())
}

#[cfg(test)]
pub fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    init_schema(&conn).expect("init schema");
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_schema_is_idempotent() {
        let conn = test_conn();
        init_schema(&conn).expect("second init");
        let n: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'lesson_plan_materials'",
                [],
                |r| r.get(0),
            )
            .expect("count");
        assert_eq!(n, 1);
    }

    #[test]
    fn older_events_table_gains_reminders_column() {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute(
            "CREATE TABLE events(
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                date TEXT NOT NULL,
                start_time TEXT,
                end_time TEXT,
                description TEXT,
                category TEXT NOT NULL DEFAULT 'General',
                recurrence_id TEXT
            )",
            [],
        )
        .expect("legacy events");
        conn.execute(
            "INSERT INTO events(id, title, date) VALUES('e1', 'Old', '2023-05-01')",
            [],
        )
        .expect("legacy row");

        init_schema(&conn).expect("init");
        assert!(table_has_column(&conn, "events", "reminders_json").expect("pragma"));
        let stored: String = conn
            .query_row("SELECT reminders_json FROM events WHERE id = 'e1'", [], |r| r.get(0))
            .expect("read");
        assert_eq!(stored, "[]");
        init_schema(&conn).expect("second init");
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let conn = test_conn();
        let res = conn.execute(
            "INSERT INTO classes(id, name, subject_id) VALUES('c1', 'A', 'missing')",
            [],
        );
        assert!(res.is_err());
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let conn = test_conn();
        let res: StoreResult<()> = in_transaction(&conn, |tx| {
            tx.execute("INSERT INTO tasks(id, text) VALUES('t1', 'x')", [])?;
            tx.execute("INSERT INTO tasks(id, text) VALUES('t1', 'dup')", [])?;
            Ok(())
        });
        assert!(matches!(res, Err(StoreError::Transaction(_))));
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |r| r.get(0))
            .expect("count");
        assert_eq!(n, 0);
    }

    #[test]
    fn settings_upsert_keeps_one_row() {
        let conn = test_conn();
        settings_set_json(&conn, "k", &serde_json::json!({ "a": 1 })).expect("set");
        settings_set_json(&conn, "k", &serde_json::json!({ "a": 2 })).expect("set again");
        let v = settings_get_json(&conn, "k").expect("get").expect("present");
        assert_eq!(v["a"], 2);
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM settings", [], |r| r.get(0))
            .expect("count");
        assert_eq!(n, 1);
    }
}
