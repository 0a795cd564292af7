use super::{new_id, optional_date, required_text};
use crate::error::{StoreError, StoreResult};
use crate::model::{NewTask, Priority, Task, TaskFilter, TaskPatch};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{info, instrument};

const COLUMNS: &str = "id, text, completed, priority, due_date";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let priority: String = row.get(3)?;
    Ok(Task {
        id: row.get(0)?,
        text: row.get(1)?,
        completed: row.get::<_, i64>(2)? != 0,
        priority: Priority::parse(&priority).unwrap_or_default(),
        due_date: row.get(4)?,
    })
}

#[instrument(skip(conn, input))]
pub fn create(conn: &Connection, input: NewTask) -> StoreResult<Task> {
    let task = Task {
        id: new_id(),
        text: required_text("text", &input.text)?,
        completed: input.completed,
        priority: input.priority,
        due_date: optional_date("dueDate", input.due_date)?,
    };
    conn.execute(
        "INSERT INTO tasks(id, text, completed, priority, due_date) VALUES(?, ?, ?, ?, ?)",
        (
            &task.id,
            &task.text,
            task.completed as i64,
            task.priority.as_str(),
            &task.due_date,
        ),
    )?;
    info!(task_id = %task.id, "task created");
    Ok(task)
}

pub fn get(conn: &Connection, id: &str) -> StoreResult<Task> {
    let sql = format!("SELECT {} FROM tasks WHERE id = ?", COLUMNS);
    conn.query_row(&sql, [id], from_row)
        .optional()?
        .ok_or_else(|| StoreError::not_found("task", id))
}

/// Open tasks first, then by due date (undated last).
pub fn list(conn: &Connection, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
    let sql = format!(
        "SELECT {} FROM tasks
         WHERE (?1 IS NULL OR completed = ?1)
           AND (?2 IS NULL OR priority = ?2)
         ORDER BY completed, due_date IS NULL, due_date, rowid",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            (
                filter.completed.map(|c| c as i64),
                filter.priority.map(|p| p.as_str()),
            ),
            from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[instrument(skip(conn, patch))]
pub fn update(conn: &Connection, id: &str, patch: TaskPatch) -> StoreResult<Task> {
    if patch.is_empty() {
        return Err(StoreError::validation("no fields to update"));
    }
    let mut task = get(conn, id)?;
    patch.apply(&mut task);
    task.text = required_text("text", &task.text)?;
    task.due_date = optional_date("dueDate", task.due_date)?;

    conn.execute(
        "UPDATE tasks SET text = ?, completed = ?, priority = ?, due_date = ? WHERE id = ?",
        (
            &task.text,
            task.completed as i64,
            task.priority.as_str(),
            &task.due_date,
            id,
        ),
    )?;
    info!(task_id = %id, completed = task.completed, "task updated");
    Ok(task)
}

#[instrument(skip(conn))]
pub fn delete(conn: &Connection, id: &str) -> StoreResult<()> {
    let n = conn.execute("DELETE FROM tasks WHERE id = ?", [id])?;
    if n == 0 {
        return Err(StoreError::not_found("task", id));
    }
    info!(task_id = %id, "task deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;

    fn task(text: &str, priority: Priority) -> NewTask {
        NewTask {
            text: text.into(),
            completed: false,
            priority,
            due_date: None,
        }
    }

    #[test]
    fn filters_by_completed_and_priority() {
        let conn = test_conn();
        let a = create(&conn, task("grade essays", Priority::High)).expect("a");
        create(&conn, task("order chalk", Priority::Low)).expect("b");
        create(&conn, task("call parents", Priority::High)).expect("c");
        update(
            &conn,
            &a.id,
            TaskPatch {
                completed: Some(true),
                ..Default::default()
            },
        )
        .expect("complete");

        let open_high = list(
            &conn,
            &TaskFilter {
                completed: Some(false),
                priority: Some(Priority::High),
            },
        )
        .expect("list");
        assert_eq!(open_high.len(), 1);
        assert_eq!(open_high[0].text, "call parents");

        let done = list(
            &conn,
            &TaskFilter {
                completed: Some(true),
                priority: None,
            },
        )
        .expect("list");
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, a.id);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let conn = test_conn();
        assert!(matches!(
            delete(&conn, "nope"),
            Err(StoreError::NotFound { .. })
        ));
    }
}
