use super::{with_db, DbHandler};
use crate::ipc::error::HandlerErr;
use crate::ipc::params::{body, field, opt_bool, opt_str, str_param};
use crate::ipc::types::{AppState, Request};
use crate::lesson_plans;
use crate::model::{
    AssignmentPatch, LessonPlanPatch, NewAssignment, NewLessonPlan, NewTask, Priority, TaskFilter,
    TaskPatch,
};
use crate::repo::{assignments, tasks};
use rusqlite::Connection;
use serde_json::{json, Value};

fn lesson_plans_list(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let class_id = opt_str(params, "classId")?;
    Ok(json!({ "lessonPlans": lesson_plans::list(conn, class_id)? }))
}

fn lesson_plans_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    Ok(json!({ "lessonPlan": lesson_plans::get(conn, id)? }))
}

fn lesson_plans_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let input: NewLessonPlan = body(params)?;
    Ok(json!({ "lessonPlan": lesson_plans::create(conn, input)? }))
}

fn lesson_plans_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    let patch: LessonPlanPatch = field(params, "patch")?;
    Ok(json!({ "lessonPlan": lesson_plans::update(conn, id, patch)? }))
}

fn lesson_plans_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    lesson_plans::delete(conn, id)?;
    Ok(json!({ "deleted": id }))
}

fn lesson_plans_duplicate(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    Ok(json!({ "lessonPlan": lesson_plans::duplicate(conn, id)? }))
}

fn tasks_list(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let priority = match opt_str(params, "priority")? {
        Some(raw) => Some(Priority::parse(raw).ok_or_else(|| {
            HandlerErr::bad_params("params.priority must be one of low, medium, high")
        })?),
        None => None,
    };
    let filter = TaskFilter {
        completed: opt_bool(params, "completed")?,
        priority,
    };
    Ok(json!({ "tasks": tasks::list(conn, &filter)? }))
}

fn tasks_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    Ok(json!({ "task": tasks::get(conn, id)? }))
}

fn tasks_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let input: NewTask = body(params)?;
    Ok(json!({ "task": tasks::create(conn, input)? }))
}

fn tasks_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    let patch: TaskPatch = field(params, "patch")?;
    Ok(json!({ "task": tasks::update(conn, id, patch)? }))
}

fn tasks_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    tasks::delete(conn, id)?;
    Ok(json!({ "deleted": id }))
}

fn assignments_list(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let class_id = opt_str(params, "classId")?;
    Ok(json!({ "assignments": assignments::list(conn, class_id)? }))
}

fn assignments_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    Ok(json!({ "assignment": assignments::get(conn, id)? }))
}

fn assignments_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let input: NewAssignment = body(params)?;
    Ok(json!({ "assignment": assignments::create(conn, input)? }))
}

fn assignments_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    let patch: AssignmentPatch = field(params, "patch")?;
    Ok(json!({ "assignment": assignments::update(conn, id, patch)? }))
}

fn assignments_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    assignments::delete(conn, id)?;
    Ok(json!({ "deleted": id }))
}

fn assignments_mark_all_graded(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let class_id = str_param(params, "classId")?;
    let updated = assignments::mark_all_graded(conn, class_id)?;
    Ok(json!({ "updated": updated, "anyUpdated": updated > 0 }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let f: DbHandler = match req.method.as_str() {
        "lessonPlans.list" => lesson_plans_list,
        "lessonPlans.get" => lesson_plans_get,
        "lessonPlans.create" => lesson_plans_create,
        "lessonPlans.update" => lesson_plans_update,
        "lessonPlans.delete" => lesson_plans_delete,
        "lessonPlans.duplicate" => lesson_plans_duplicate,
        "tasks.list" => tasks_list,
        "tasks.get" => tasks_get,
        "tasks.create" => tasks_create,
        "tasks.update" => tasks_update,
        "tasks.delete" => tasks_delete,
        "assignments.list" => assignments_list,
        "assignments.get" => assignments_get,
        "assignments.create" => assignments_create,
        "assignments.update" => assignments_update,
        "assignments.delete" => assignments_delete,
        "assignments.markAllGraded" => assignments_mark_all_graded,
        _ => return None,
    };
    Some(with_db(state, req, f))
}
