pub mod backup_exchange;
pub mod calendar;
pub mod classes;
pub mod core;
pub mod grading;
pub mod library;
pub mod planner;
pub mod settings;
pub mod students;

use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::Value;

/// A method that only needs the open workspace connection and the params.
pub type DbHandler = fn(&Connection, &Value) -> Result<Value, HandlerErr>;

pub fn with_db(state: &AppState, req: &Request, f: DbHandler) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(conn, &req.params) {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}
