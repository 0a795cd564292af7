use super::{new_id, optional_text, required_text, string_list};
use crate::error::{StoreError, StoreResult};
use crate::model::{NewQuestion, Question, QuestionFilter, QuestionPatch, QuestionSummary};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{info, instrument, warn};

pub(crate) const COLUMNS: &str = "id, text, subject, difficulty, options_json, answer";

pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Question> {
    let id: String = row.get(0)?;
    let options_json: String = row.get(4)?;
    let options = match serde_json::from_str::<Vec<String>>(&options_json) {
        Ok(v) => v,
        Err(e) => {
            warn!(question_id = %id, error = %e, "unreadable options; treating as empty");
            Vec::new()
        }
    };
    Ok(Question {
        id,
        text: row.get(1)?,
        subject: row.get(2)?,
        difficulty: row.get(3)?,
        options,
        answer: row.get(5)?,
    })
}

fn write_columns(q: &mut Question) -> StoreResult<String> {
    q.text = required_text("text", &q.text)?;
    q.answer = required_text("answer", &q.answer)?;
    q.subject = optional_text(q.subject.take());
    q.difficulty = optional_text(q.difficulty.take());
    q.options = string_list(std::mem::take(&mut q.options));
    Ok(serde_json::to_string(&q.options)?)
}

#[instrument(skip(conn, input))]
pub fn create(conn: &Connection, input: NewQuestion) -> StoreResult<Question> {
    let mut q = Question {
        id: new_id(),
        text: input.text,
        subject: input.subject,
        difficulty: input.difficulty,
        options: input.options,
        answer: input.answer,
    };
    let options_json = write_columns(&mut q)?;
    conn.execute(
        "INSERT INTO questions(id, text, subject, difficulty, options_json, answer)
         VALUES(?, ?, ?, ?, ?, ?)",
        (&q.id, &q.text, &q.subject, &q.difficulty, &options_json, &q.answer),
    )?;
    info!(question_id = %q.id, "question created");
    Ok(q)
}

pub fn get(conn: &Connection, id: &str) -> StoreResult<Question> {
    let sql = format!("SELECT {} FROM questions WHERE id = ?", COLUMNS);
    conn.query_row(&sql, [id], from_row)
        .optional()?
        .ok_or_else(|| StoreError::not_found("question", id))
}

/// Bank listing; options and answer are only returned by `get`.
pub fn list(conn: &Connection, filter: &QuestionFilter) -> StoreResult<Vec<QuestionSummary>> {
    let sql = format!(
        "SELECT {} FROM questions
         WHERE (?1 IS NULL OR subject = ?1)
           AND (?2 IS NULL OR difficulty = ?2)
         ORDER BY subject, rowid",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            (filter.subject.as_deref(), filter.difficulty.as_deref()),
            from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows.iter().map(QuestionSummary::from).collect())
}

#[instrument(skip(conn, patch))]
pub fn update(conn: &Connection, id: &str, patch: QuestionPatch) -> StoreResult<Question> {
    if patch.is_empty() {
        return Err(StoreError::validation("no fields to update"));
    }
    let mut q = get(conn, id)?;
    patch.apply(&mut q);
    let options_json = write_columns(&mut q)?;
    conn.execute(
        "UPDATE questions SET text = ?, subject = ?, difficulty = ?, options_json = ?, answer = ?
         WHERE id = ?",
        (&q.text, &q.subject, &q.difficulty, &options_json, &q.answer, id),
    )?;
    info!(question_id = %id, "question updated");
    Ok(q)
}

#[instrument(skip(conn))]
pub fn delete(conn: &Connection, id: &str) -> StoreResult<()> {
    let n = conn.execute("DELETE FROM questions WHERE id = ?", [id])?;
    if n == 0 {
        return Err(StoreError::not_found("question", id));
    }
    info!(question_id = %id, "question deleted");
    Ok(())
}
