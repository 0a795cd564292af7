use super::{with_db, DbHandler};
use crate::ipc::error::HandlerErr;
use crate::ipc::params::{body, field, opt_str, str_param};
use crate::ipc::types::{AppState, Request};
use crate::model::{
    MaterialPatch, NewMaterial, NewQuestion, NewQuiz, QuestionFilter, QuestionPatch, QuizRequest,
};
use crate::repo::{materials, questions, quizzes};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::collections::BTreeMap;

fn questions_list(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let filter = QuestionFilter {
        subject: opt_str(params, "subject")?.map(str::to_string),
        difficulty: opt_str(params, "difficulty")?.map(str::to_string),
    };
    Ok(json!({ "questions": questions::list(conn, &filter)? }))
}

fn questions_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    Ok(json!({ "question": questions::get(conn, id)? }))
}

fn questions_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let input: NewQuestion = body(params)?;
    Ok(json!({ "question": questions::create(conn, input)? }))
}

fn questions_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    let patch: QuestionPatch = field(params, "patch")?;
    Ok(json!({ "question": questions::update(conn, id, patch)? }))
}

fn questions_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    questions::delete(conn, id)?;
    Ok(json!({ "deleted": id }))
}

fn materials_list(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let tag = opt_str(params, "tag")?;
    Ok(json!({ "materials": materials::list(conn, tag)? }))
}

fn materials_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    Ok(json!({ "material": materials::get(conn, id)? }))
}

fn materials_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let input: NewMaterial = body(params)?;
    Ok(json!({ "material": materials::create(conn, input)? }))
}

fn materials_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    let patch: MaterialPatch = field(params, "patch")?;
    Ok(json!({ "material": materials::update(conn, id, patch)? }))
}

fn materials_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    materials::delete(conn, id)?;
    Ok(json!({ "deleted": id }))
}

fn quizzes_list(conn: &Connection, _params: &Value) -> Result<Value, HandlerErr> {
    Ok(json!({ "quizzes": quizzes::list(conn)? }))
}

fn quizzes_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    Ok(json!({
        "quiz": quizzes::get(conn, id)?,
        "questions": quizzes::paper(conn, id)?,
    }))
}

fn quizzes_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let input: NewQuiz = body(params)?;
    Ok(json!({ "quiz": quizzes::create(conn, input)? }))
}

fn quizzes_generate(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let req: QuizRequest = body(params)?;
    let quiz = quizzes::generate(conn, req)?;
    let paper = quizzes::paper(conn, &quiz.id)?;
    Ok(json!({ "quiz": quiz, "questions": paper }))
}

fn quizzes_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    quizzes::delete(conn, id)?;
    Ok(json!({ "deleted": id }))
}

fn quizzes_submit(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    let answers: BTreeMap<String, String> = field(params, "answers")?;
    let result = quizzes::submit(conn, id, answers)?;
    let (score, total) = (result.attempt.score, result.attempt.total);
    Ok(json!({
        "attempt": result.attempt,
        "score": score,
        "totalQuestions": total,
        "results": result.results,
    }))
}

fn quizzes_attempts(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = str_param(params, "id")?;
    Ok(json!({ "attempts": quizzes::attempts(conn, id)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let f: DbHandler = match req.method.as_str() {
        "questions.list" => questions_list,
        "questions.get" => questions_get,
        "questions.create" => questions_create,
        "questions.update" => questions_update,
        "questions.delete" => questions_delete,
        "materials.list" => materials_list,
        "materials.get" => materials_get,
        "materials.create" => materials_create,
        "materials.update" => materials_update,
        "materials.delete" => materials_delete,
        "quizzes.list" => quizzes_list,
        "quizzes.get" => quizzes_get,
        "quizzes.create" => quizzes_create,
        "quizzes.generate" => quizzes_generate,
        "quizzes.delete" => quizzes_delete,
        "quizzes.submit" => quizzes_submit,
        "quizzes.attempts" => quizzes_attempts,
        _ => return None,
    };
    Some(with_db(state, req, f))
}
