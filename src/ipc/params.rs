//! Accessors for `req.params`. Every failure is a `bad_params` response.

use crate::ipc::error::HandlerErr;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

pub fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, HandlerErr> {
    match opt_str(params, key)? {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(missing(key)),
    }
}

/// Absent and `null` both read as `None`; any other non-string is rejected.
pub fn opt_str<'a>(params: &'a Value, key: &str) -> Result<Option<&'a str>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(wrong_type(key, "a string")),
    }
}

pub fn opt_bool(params: &Value, key: &str) -> Result<Option<bool>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(wrong_type(key, "a boolean")),
    }
}

/// Decodes the whole params object as `T`.
pub fn body<T: DeserializeOwned>(params: &Value) -> Result<T, HandlerErr> {
    decode(params.clone(), "params")
}

/// Decodes the required member `key` as `T`.
pub fn field<T: DeserializeOwned>(params: &Value, key: &str) -> Result<T, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Err(missing(key)),
        Some(v) => decode(v.clone(), key),
    }
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, HandlerErr> {
    serde_json::from_value(value).map_err(|e| HandlerErr {
        code: "bad_params",
        message: format!("invalid {}: {}", what, e),
        details: Some(json!({ "field": what })),
    })
}

fn missing(key: &str) -> HandlerErr {
    HandlerErr {
        code: "bad_params",
        message: format!("missing params.{}", key),
        details: Some(json!({ "field": key })),
    }
}

fn wrong_type(key: &str, expected: &str) -> HandlerErr {
    HandlerErr {
        code: "bad_params",
        message: format!("params.{} must be {}", key, expected),
        details: Some(json!({ "field": key })),
    }
}
