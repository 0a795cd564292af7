use super::{with_db, DbHandler};
use crate::ipc::error::HandlerErr;
use crate::ipc::params::{body, field, opt_str, str_param};
use crate::ipc::types::{AppState, Request};
use crate::model::{ClassPatch, NewClass, NewSubject, SubjectPatch};
use crate::repo::{classes, subjects};
use rusqlite::Connection;
use serde_json::{json, Value};

fn subjects_list(conn: &Connection, _params: &Value) -> Result<Value, HandlerErr> {
    Ok(json!({ "subjects": subjects::list(conn)? }))
}

fn subjects_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    Ok(json!({ "subject": subjects::get(conn, id)? }))
}

fn subjects_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let input: NewSubject = body(params)?;
    Ok(json!({ "subject": subjects::create(conn, input)? }))
}

fn subjects_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    let patch: SubjectPatch = field(params, "patch")?;
    Ok(json!({ "subject": subjects::update(conn, id, patch)? }))
}

fn subjects_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    subjects::delete(conn, id)?;
    Ok(json!({ "deleted": id }))
}

fn classes_list(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let subject_id = opt_str(params, "subjectId")?;
    Ok(json!({ "classes": classes::list(conn, subject_id)? }))
}

fn classes_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    Ok(json!({ "class": classes::get(conn, id)? }))
}

fn classes_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let input: NewClass = body(params)?;
    Ok(json!({ "class": classes::create(conn, input)? }))
}

fn classes_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    let patch: ClassPatch = field(params, "patch")?;
    Ok(json!({ "class": classes::update(conn, id, patch)? }))
}

fn classes_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    classes::delete(conn, id)?;
    Ok(json!({ "deleted": id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let f: DbHandler = match req.method.as_str() {
        "subjects.list" => subjects_list,
        "subjects.get" => subjects_get,
        "subjects.create" => subjects_create,
        "subjects.update" => subjects_update,
        "subjects.delete" => subjects_delete,
        "classes.list" => classes_list,
        "classes.get" => classes_get,
        "classes.create" => classes_create,
        "classes.update" => classes_update,
        "classes.delete" => classes_delete,
        _ => return None,
    };
    Some(with_db(state, req, f))
}
