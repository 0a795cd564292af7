//! Key/value settings with per-key defaults.

use crate::db;
use crate::error::{StoreError, StoreResult};
use rusqlite::Connection;
use serde_json::{json, Map, Value};
use tracing::{info, instrument};

pub const PREFERENCES: &str = "preferences";

/// Value reported for `key` when nothing is stored.
pub fn default_for(key: &str) -> Value {
    match key {
        PREFERENCES => json!({
            "theme": "light",
            "language": "pt-BR",
            "notifications": {
                "enabled": true,
                "reminders": [10, 30],
                "enableSound": false
            }
        }),
        _ => Value::Null,
    }
}

fn check_key(key: &str) -> StoreResult<&str> {
    let k = key.trim();
    if k.is_empty() {
        return Err(StoreError::validation("key must not be empty"));
    }
    Ok(k)
}

pub fn get(conn: &Connection, key: &str) -> StoreResult<Value> {
    let key = check_key(key)?;
    Ok(db::settings_get_json(conn, key)?.unwrap_or_else(|| default_for(key)))
}

#[instrument(skip(conn, value))]
pub fn set(conn: &Connection, key: &str, value: Value) -> StoreResult<Value> {
    let key = check_key(key)?;
    db::settings_set_json(conn, key, &value)?;
    info!(key, "setting replaced");
    Ok(value)
}

/// Merges `patch` over the current value (stored or default). Nested
/// objects merge recursively; a `null` member removes that member.
#[instrument(skip(conn, patch))]
pub fn update(conn: &Connection, key: &str, patch: Value) -> StoreResult<Value> {
    let key = check_key(key)?;
    if !patch.is_object() {
        return Err(StoreError::validation_with(
            "patch must be an object",
            json!({ "field": "patch" }),
        ));
    }
    let mut current = get(conn, key)?;
    merge(&mut current, patch);
    db::settings_set_json(conn, key, &current)?;
    info!(key, "setting updated");
    Ok(current)
}

fn merge(target: &mut Value, patch: Value) {
    let Value::Object(patch) = patch else {
        *target = patch;
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        for (k, v) in patch {
            if v.is_null() {
                map.remove(&k);
            } else {
                merge(map.entry(k).or_insert(Value::Null), v);
            }
        }
    }
}
