//! Calendar events and recurrence groups.
//!
//! A recurring create expands into concrete rows that share one
//! `recurrence_id`; deletes can then target one row, the rest of the group
//! from a date on, or the whole group.

use crate::db::in_transaction;
use crate::error::{StoreError, StoreResult};
use crate::model::{Event, EventFilter, EventPatch, Frequency, NewEvent, Reminder};
use crate::repo::{new_id, optional_text, parse_iso_date, required_text};
use chrono::{Days, Months, NaiveDate, NaiveTime};
use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

/// Upper bound on rows produced by one recurring create.
pub const MAX_OCCURRENCES: usize = 1000;

const DEFAULT_CATEGORY: &str = "General";

const COLUMNS: &str =
    "id, title, date, start_time, end_time, description, category, recurrence_id, reminders_json";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    let id: String = row.get(0)?;
    let reminders_json: String = row.get(8)?;
    let reminders = match serde_json::from_str::<Vec<Reminder>>(&reminders_json) {
        Ok(v) => v,
        Err(e) => {
            warn!(event_id = %id, error = %e, "unreadable reminders; treating as empty");
            Vec::new()
        }
    };
    Ok(Event {
        id,
        title: row.get(1)?,
        date: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        description: row.get(5)?,
        category: row.get(6)?,
        recurrence_id: row.get(7)?,
        reminders,
    })
}

/// The `n`-th occurrence after `start`. Monthly steps keep the original
/// day of month and clamp to the month's last day when it is shorter
/// (Jan 31 -> Feb 29 -> Mar 31).
fn nth(start: NaiveDate, frequency: Frequency, n: u32) -> Option<NaiveDate> {
    match frequency {
        Frequency::None => (n == 0).then_some(start),
        Frequency::Daily => start.checked_add_days(Days::new(u64::from(n))),
        Frequency::Weekly => start.checked_add_days(Days::new(7 * u64::from(n))),
        Frequency::Monthly => start.checked_add_months(Months::new(n)),
    }
}

/// Occurrence dates from `start` through `end` inclusive.
pub fn expand(
    start: NaiveDate,
    frequency: Frequency,
    end: Option<NaiveDate>,
) -> StoreResult<Vec<NaiveDate>> {
    if frequency == Frequency::None {
        return Ok(vec![start]);
    }
    let Some(end) = end else {
        return Err(StoreError::validation_with(
            "recurrenceEndDate is required for a recurring event",
            json!({ "field": "recurrenceEndDate" }),
        ));
    };
    if end < start {
        return Err(StoreError::validation_with(
            "recurrenceEndDate is before date",
            json!({ "date": start.to_string(), "recurrenceEndDate": end.to_string() }),
        ));
    }

    let mut dates = Vec::new();
    let mut n = 0u32;
    while let Some(d) = nth(start, frequency, n) {
        if d > end {
            break;
        }
        if dates.len() == MAX_OCCURRENCES {
            return Err(StoreError::validation_with(
                format!("recurrence expands to more than {} events", MAX_OCCURRENCES),
                json!({ "max": MAX_OCCURRENCES }),
            ));
        }
        dates.push(d);
        n += 1;
    }
    Ok(dates)
}

fn optional_time(field: &str, value: Option<String>) -> StoreResult<Option<String>> {
    let Some(raw) = optional_text(value) else {
        return Ok(None);
    };
    let t = NaiveTime::parse_from_str(&raw, "%H:%M").map_err(|_| {
        StoreError::validation_with(
            format!("{} must be a HH:MM time", field),
            json!({ "field": field, "value": raw }),
        )
    })?;
    Ok(Some(t.format("%H:%M").to_string()))
}

fn check_range(start: &Option<String>, end: &Option<String>) -> StoreResult<()> {
    if let (Some(s), Some(e)) = (start, end) {
        if e < s {
            return Err(StoreError::validation_with(
                "endTime is before startTime",
                json!({ "startTime": s, "endTime": e }),
            ));
        }
    }
    Ok(())
}

/// Zero offsets are rejected; repeats of the same offset collapse to one.
fn check_reminders(reminders: Vec<Reminder>) -> StoreResult<Vec<Reminder>> {
    let mut out: Vec<Reminder> = Vec::with_capacity(reminders.len());
    for r in reminders {
        if r.value == 0 {
            return Err(StoreError::validation_with(
                "reminder value must be > 0",
                json!({ "field": "reminders", "value": r.value }),
            ));
        }
        if !out.contains(&r) {
            out.push(r);
        }
    }
    Ok(out)
}

fn category(value: Option<String>) -> String {
    optional_text(value).unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// Inserts one row, or the whole recurrence group in one transaction.
/// Returns the created rows in date order.
#[instrument(skip(conn, input), fields(frequency = ?input.frequency))]
pub fn create(conn: &Connection, input: NewEvent) -> StoreResult<Vec<Event>> {
    let title = required_text("title", &input.title)?;
    let start = parse_iso_date("date", &input.date)?;
    let end = match optional_text(input.recurrence_end_date) {
        Some(raw) => Some(parse_iso_date("recurrenceEndDate", &raw)?),
        None => None,
    };
    let start_time = optional_time("startTime", input.start_time)?;
    let end_time = optional_time("endTime", input.end_time)?;
    check_range(&start_time, &end_time)?;
    let reminders = check_reminders(input.reminders)?;

    let dates = expand(start, input.frequency, end)?;
    let recurrence_id = (input.frequency != Frequency::None).then(new_id);
    debug!(occurrences = dates.len(), "recurrence expanded");

    let template = Event {
        id: String::new(),
        title,
        date: String::new(),
        start_time,
        end_time,
        description: optional_text(input.description),
        category: category(input.category),
        recurrence_id,
        reminders,
    };
    let reminders_json = serde_json::to_string(&template.reminders)?;
    let events: Vec<Event> = dates
        .into_iter()
        .map(|d| Event {
            id: new_id(),
            date: d.format("%Y-%m-%d").to_string(),
            ..template.clone()
        })
        .collect();

    in_transaction(conn, |tx| {
        let mut stmt = tx.prepare(
            "INSERT INTO events(id, title, date, start_time, end_time, description, category, recurrence_id, reminders_json)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        for e in &events {
            stmt.execute((
                &e.id,
                &e.title,
                &e.date,
                &e.start_time,
                &e.end_time,
                &e.description,
                &e.category,
                &e.recurrence_id,
                &reminders_json,
            ))?;
        }
        Ok(())
    })?;

    info!(
        count = events.len(),
        recurrence_id = events.first().and_then(|e| e.recurrence_id.as_deref()),
        "events created"
    );
    Ok(events)
}

pub fn get(conn: &Connection, id: &str) -> StoreResult<Event> {
    let sql = format!("SELECT {} FROM events WHERE id = ?", COLUMNS);
    conn.query_row(&sql, [id], from_row)
        .optional()?
        .ok_or_else(|| StoreError::not_found("event", id))
}

/// `date` selects one day; otherwise `from`/`to` bound an inclusive range.
pub fn list(conn: &Connection, filter: &EventFilter) -> StoreResult<Vec<Event>> {
    let norm = |field: &str, v: &Option<String>| -> StoreResult<Option<String>> {
        match v {
            Some(raw) => Ok(Some(parse_iso_date(field, raw)?.format("%Y-%m-%d").to_string())),
            None => Ok(None),
        }
    };
    let (from, to) = match norm("date", &filter.date)? {
        Some(day) => (Some(day.clone()), Some(day)),
        None => (norm("from", &filter.from)?, norm("to", &filter.to)?),
    };
    let sql = format!(
        "SELECT {} FROM events
         WHERE (?1 IS NULL OR date >= ?1)
           AND (?2 IS NULL OR date <= ?2)
         ORDER BY date, start_time IS NULL, start_time, title",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map((from, to), from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Edits this occurrence only; the rest of its group is untouched.
#[instrument(skip(conn, patch))]
pub fn update(conn: &Connection, id: &str, patch: EventPatch) -> StoreResult<Event> {
    if patch.is_empty() {
        return Err(StoreError::validation("no fields to update"));
    }
    let mut event = get(conn, id)?;
    patch.apply(&mut event);
    event.title = required_text("title", &event.title)?;
    event.date = parse_iso_date("date", &event.date)?
        .format("%Y-%m-%d")
        .to_string();
    event.start_time = optional_time("startTime", event.start_time)?;
    event.end_time = optional_time("endTime", event.end_time)?;
    check_range(&event.start_time, &event.end_time)?;
    event.description = optional_text(event.description);
    event.category = category(Some(event.category));
    event.reminders = check_reminders(event.reminders)?;
    let reminders_json = serde_json::to_string(&event.reminders)?;

    conn.execute(
        "UPDATE events SET title = ?, date = ?, start_time = ?, end_time = ?, description = ?, category = ?,
                reminders_json = ?
         WHERE id = ?",
        (
            &event.title,
            &event.date,
            &event.start_time,
            &event.end_time,
            &event.description,
            &event.category,
            &reminders_json,
            id,
        ),
    )?;
    info!(event_id = %id, "event updated");
    Ok(event)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteScope {
    This,
    Future,
    All,
}

impl DeleteScope {
    pub fn parse(raw: &str) -> StoreResult<DeleteScope> {
        match raw {
            "this" => Ok(DeleteScope::This),
            "future" => Ok(DeleteScope::Future),
            "all" => Ok(DeleteScope::All),
            other => Err(StoreError::validation_with(
                "scope must be one of this, future, all",
                json!({ "field": "scope", "value": other }),
            )),
        }
    }
}

/// Deletes per `scope` relative to the target row and returns the ids that
/// were removed. A row outside any group only ever deletes itself.
#[instrument(skip(conn))]
pub fn delete(conn: &Connection, id: &str, scope: DeleteScope) -> StoreResult<Vec<String>> {
    let target = get(conn, id)?;
    let effective = match (&target.recurrence_id, scope) {
        (None, s) if s != DeleteScope::This => {
            warn!(event_id = %id, ?scope, "event has no recurrence group; deleting only this row");
            DeleteScope::This
        }
        _ => scope,
    };

    let removed = in_transaction(conn, |tx| {
        let ids: Vec<String> = match (effective, target.recurrence_id.as_deref()) {
            (DeleteScope::Future, Some(group)) => {
                let mut stmt = tx.prepare(
                    "SELECT id FROM events WHERE recurrence_id = ? AND date >= ? ORDER BY date",
                )?;
                let ids = stmt
                    .query_map((group, &target.date), |r| r.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                ids
            }
            (DeleteScope::All, Some(group)) => {
                let mut stmt =
                    tx.prepare("SELECT id FROM events WHERE recurrence_id = ? ORDER BY date")?;
                let ids = stmt
                    .query_map([group], |r| r.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                ids
            }
            _ => vec![target.id.clone()],
        };
        let mut del = tx.prepare("DELETE FROM events WHERE id = ?")?;
        for eid in &ids {
            del.execute([eid])?;
        }
        Ok(ids)
    })?;

    info!(event_id = %id, scope = ?effective, count = removed.len(), "events deleted");
    Ok(removed)
}
