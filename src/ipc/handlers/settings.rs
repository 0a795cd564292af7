use super::{with_db, DbHandler};
use crate::ipc::error::HandlerErr;
use crate::ipc::params::str_param;
use crate::ipc::types::{AppState, Request};
use crate::settings;
use rusqlite::Connection;
use serde_json::{json, Value};

fn settings_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let key = str_param(params, "key")?;
    Ok(json!({ "key": key, "value": settings::get(conn, key)? }))
}

fn settings_set(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let key = str_param(params, "key")?;
    let Some(value) = params.get("value") else {
        return Err(HandlerErr::bad_params("missing params.value"));
    };
    Ok(json!({ "key": key, "value": settings::set(conn, key, value.clone())? }))
}

fn settings_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let key = str_param(params, "key")?;
    let Some(patch) = params.get("patch") else {
        return Err(HandlerErr::bad_params("missing params.patch"));
    };
    Ok(json!({ "key": key, "value": settings::update(conn, key, patch.clone())? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let f: DbHandler = match req.method.as_str() {
        "settings.get" => settings_get,
        "settings.set" => settings_set,
        "settings.update" => settings_update,
        _ => return None,
    };
    Some(with_db(state, req, f))
}
