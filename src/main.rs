mod backup;
mod calendar;
mod config;
mod db;
mod enrollment;
mod error;
mod grading;
mod ipc;
mod lesson_plans;
mod model;
mod repo;
mod settings;

use std::io::{self, BufRead, Write};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(filter: &str) {
    // stdout carries responses; logs go to stderr only.
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false),
        )
        .init();
}

fn main() {
    let cfg = config::Config::from_env();
    init_tracing(&cfg.log_filter);

    let mut state = ipc::AppState {
        workspace: None,
        db: None,
    };

    if let Some(path) = cfg.workspace.as_ref() {
        match db::open_db(path) {
            Ok(conn) => {
                state.workspace = Some(path.clone());
                state.db = Some(conn);
            }
            Err(e) => {
                error!(path = %path.to_string_lossy(), error = ?e, "cannot open startup workspace");
                std::process::exit(1);
            }
        }
    }
    info!(version = env!("CARGO_PKG_VERSION"), "planbookd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "stdin closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to answer to.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
