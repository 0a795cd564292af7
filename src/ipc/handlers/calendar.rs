use super::{with_db, DbHandler};
use crate::calendar::{self, DeleteScope};
use crate::ipc::error::HandlerErr;
use crate::ipc::params::{body, field, opt_str, str_param};
use crate::ipc::types::{AppState, Request};
use crate::model::{EventFilter, EventPatch, NewEvent};
use rusqlite::Connection;
use serde_json::{json, Value};

fn events_list(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let filter = EventFilter {
        date: opt_str(params, "date")?.map(str::to_string),
        from: opt_str(params, "from")?.map(str::to_string),
        to: opt_str(params, "to")?.map(str::to_string),
    };
    Ok(json!({ "events": calendar::list(conn, &filter)? }))
}

fn events_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    Ok(json!({ "event": calendar::get(conn, id)? }))
}

fn events_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let input: NewEvent = body(params)?;
    let events = calendar::create(conn, input)?;
    let recurrence_id = events.first().and_then(|e| e.recurrence_id.clone());
    Ok(json!({ "events": events, "recurrenceId": recurrence_id }))
}

fn events_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    let patch: EventPatch = field(params, "patch")?;
    Ok(json!({ "event": calendar::update(conn, id, patch)? }))
}

/// `scope` defaults to `this` when omitted.
fn events_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    let scope = match opt_str(params, "scope")? {
        Some(raw) => DeleteScope::parse(raw)?,
        None => DeleteScope::This,
    };
    let deleted = calendar::delete(conn, id, scope)?;
    Ok(json!({ "deletedIds": deleted, "count": deleted.len() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let f: DbHandler = match req.method.as_str() {
        "events.list" => events_list,
        "events.get" => events_get,
        "events.create" => events_create,
        "events.update" => events_update,
        "events.delete" => events_delete,
        _ => return None,
    };
    Some(with_db(state, req, f))
}
