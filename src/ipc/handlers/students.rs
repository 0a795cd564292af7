use super::{with_db, DbHandler};
use crate::enrollment;
use crate::ipc::error::HandlerErr;
use crate::ipc::params::{body, field, str_param};
use crate::ipc::types::{AppState, Request};
use crate::model::{NewStudent, StudentPatch};
use crate::repo::students;
use rusqlite::Connection;
use serde_json::{json, Value};

fn students_list(conn: &Connection, _params: &Value) -> Result<Value, HandlerErr> {
    Ok(json!({ "students": students::list(conn)? }))
}

fn students_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    Ok(json!({ "student": students::get(conn, id)? }))
}

fn students_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let input: NewStudent = body(params)?;
    Ok(json!({ "student": students::create(conn, input)? }))
}

fn students_create_in_class(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let class_id = str_param(params, "classId")?;
    let input: NewStudent = field(params, "student")?;
    let student = enrollment::create_in_class(conn, class_id, input)?;
    Ok(json!({ "student": student, "classId": class_id }))
}

fn students_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    let patch: StudentPatch = field(params, "patch")?;
    Ok(json!({ "student": students::update(conn, id, patch)? }))
}

fn students_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    students::delete(conn, id)?;
    Ok(json!({ "deleted": id }))
}

fn enrollments_enroll(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let class_id = str_param(params, "classId")?;
    let student_id = str_param(params, "studentId")?;
    enrollment::enroll(conn, class_id, student_id)?;
    Ok(json!({ "classId": class_id, "studentId": student_id }))
}

fn enrollments_unenroll(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let class_id = str_param(params, "classId")?;
    let student_id = str_param(params, "studentId")?;
    enrollment::unenroll(conn, class_id, student_id)?;
    Ok(json!({ "classId": class_id, "studentId": student_id }))
}

fn enrollments_students_for_class(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let class_id = str_param(params, "classId")?;
    Ok(json!({ "students": enrollment::students_for_class(conn, class_id)? }))
}

fn enrollments_classes_for_student(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = str_param(params, "studentId")?;
    Ok(json!({ "classes": enrollment::classes_for_student(conn, student_id)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let f: DbHandler = match req.method.as_str() {
        "students.list" => students_list,
        "students.get" => students_get,
        "students.create" => students_create,
        "students.createInClass" => students_create_in_class,
        "students.update" => students_update,
        "students.delete" => students_delete,
        "enrollments.enroll" => enrollments_enroll,
        "enrollments.unenroll" => enrollments_unenroll,
        "enrollments.studentsForClass" => enrollments_students_for_class,
        "enrollments.classesForStudent" => enrollments_classes_for_student,
        _ => return None,
    };
    Some(with_db(state, req, f))
}
