use crate::backup;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::{error, info, warn};

fn path_param(req: &Request, key: &str) -> Option<PathBuf> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(out_path) = path_param(req, "outPath") else {
        return err(&req.id, "bad_params", "missing params.outPath", None);
    };

    match backup::export_workspace_bundle(&workspace, &out_path) {
        Ok(summary) => {
            info!(out = %out_path.to_string_lossy(), sha256 = %summary.db_sha256, "workspace exported");
            ok(
                &req.id,
                json!({
                    "path": out_path.to_string_lossy(),
                    "bundleFormat": summary.bundle_format,
                    "entryCount": summary.entry_count,
                    "dbSha256": summary.db_sha256,
                }),
            )
        }
        Err(e) => {
            warn!(error = ?e, "workspace export failed");
            err(&req.id, "io_failed", format!("{e:#}"), None)
        }
    }
}

/// Closes the live connection, swaps the database in, and reopens. If the
/// import fails the previous database is reopened unchanged.
fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(in_path) = path_param(req, "inPath") else {
        return err(&req.id, "bad_params", "missing params.inPath", None);
    };

    state.db = None;
    let imported = backup::import_workspace_bundle(&in_path, &workspace);

    match db::open_db(&workspace) {
        Ok(conn) => state.db = Some(conn),
        Err(e) => {
            error!(error = ?e, "workspace reopen after import failed");
            state.workspace = None;
            return err(&req.id, "db_open_failed", format!("{e:#}"), None);
        }
    }

    match imported {
        Ok(summary) => {
            info!(source = %in_path.to_string_lossy(), format = %summary.bundle_format_detected, "workspace imported");
            ok(
                &req.id,
                json!({
                    "workspacePath": workspace.to_string_lossy(),
                    "bundleFormatDetected": summary.bundle_format_detected,
                    "dbSha256": summary.db_sha256,
                }),
            )
        }
        Err(e) => {
            warn!(error = ?e, "workspace import failed");
            err(&req.id, "io_failed", format!("{e:#}"), None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.export" => Some(handle_backup_export(state, req)),
        "backup.import" => Some(handle_backup_import(state, req)),
        _ => None,
    }
}
