//! Per-entity CRUD. Uniqueness and dependency checks run before any write so
//! callers get a typed outcome rather than a raw constraint failure.

pub mod assignments;
pub mod classes;
pub mod evaluations;
pub mod materials;
pub mod questions;
pub mod quizzes;
pub mod students;
pub mod subjects;
pub mod tasks;

use crate::error::{StoreError, StoreResult};
use chrono::NaiveDate;
use serde_json::json;

pub(crate) fn required_text(field: &str, value: &str) -> StoreResult<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(StoreError::validation_with(
            format!("{} must not be empty", field),
            json!({ "field": field }),
        ));
    }
    Ok(v.to_string())
}

pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub(crate) fn parse_iso_date(field: &str, raw: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        StoreError::validation_with(
            format!("{} must be a YYYY-MM-DD date", field),
            json!({ "field": field, "value": raw }),
        )
    })
}

pub(crate) fn optional_date(field: &str, value: Option<String>) -> StoreResult<Option<String>> {
    match optional_text(value) {
        Some(raw) => Ok(Some(parse_iso_date(field, &raw)?.format("%Y-%m-%d").to_string())),
        None => Ok(None),
    }
}

pub(crate) fn string_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
