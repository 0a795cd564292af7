use super::{with_db, DbHandler};
use crate::grading;
use crate::ipc::error::HandlerErr;
use crate::ipc::params::{body, field, opt_str, str_param};
use crate::ipc::types::{AppState, Request};
use crate::model::{EvaluationPatch, GradeEntry, NewEvaluation};
use crate::repo::evaluations;
use rusqlite::Connection;
use serde_json::{json, Value};

fn evaluations_list(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let class_id = opt_str(params, "classId")?;
    Ok(json!({ "evaluations": evaluations::list(conn, class_id)? }))
}

fn evaluations_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    Ok(json!({ "evaluation": evaluations::get(conn, id)? }))
}

fn evaluations_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let input: NewEvaluation = body(params)?;
    Ok(json!({ "evaluation": evaluations::create(conn, input)? }))
}

fn evaluations_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    let patch: EvaluationPatch = field(params, "patch")?;
    Ok(json!({ "evaluation": evaluations::update(conn, id, patch)? }))
}

fn evaluations_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    grading::delete_evaluation(conn, id)?;
    Ok(json!({ "deleted": id }))
}

fn grades_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let evaluation_id = str_param(params, "evaluationId")?;
    Ok(json!({ "grades": grading::get_grades(conn, evaluation_id)? }))
}

fn grades_replace(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let evaluation_id = str_param(params, "evaluationId")?;
    let entries: Vec<GradeEntry> = field(params, "grades")?;
    Ok(json!({ "grades": grading::replace_grades(conn, evaluation_id, &entries)? }))
}

fn grades_class_report(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let class_id = str_param(params, "classId")?;
    Ok(json!({ "report": grading::class_report(conn, class_id)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let f: DbHandler = match req.method.as_str() {
        "evaluations.list" => evaluations_list,
        "evaluations.get" => evaluations_get,
        "evaluations.create" => evaluations_create,
        "evaluations.update" => evaluations_update,
        "evaluations.delete" => evaluations_delete,
        "grades.get" => grades_get,
        "grades.replace" => grades_replace,
        "grades.classReport" => grades_class_report,
        _ => return None,
    };
    Some(with_db(state, req, f))
}
