#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

/// A running `planbookd` driven over its stdin/stdout line protocol.
pub struct Sidecar {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    next_id: u64,
}

impl Sidecar {
    pub fn spawn() -> Sidecar {
        Sidecar::spawn_with_env(&[])
    }

    pub fn spawn_with_env(env: &[(&str, &str)]) -> Sidecar {
        let exe = env!("CARGO_BIN_EXE_planbookd");
        let mut cmd = Command::new(exe);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .env_remove("PLANBOOKD_WORKSPACE");
        for (k, v) in env {
            cmd.env(k, v);
        }
        let mut child = cmd.spawn().expect("spawn planbookd");
        let stdin = child.stdin.take().expect("child stdin");
        let stdout = child.stdout.take().expect("child stdout");
        Sidecar {
            child,
            stdin,
            reader: BufReader::new(stdout),
            next_id: 0,
        }
    }

    /// Spawns and selects `workspace`.
    pub fn open(workspace: &Path) -> Sidecar {
        let mut sc = Sidecar::spawn();
        sc.ok(
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        sc
    }

    pub fn request(&mut self, method: &str, params: Value) -> Value {
        self.next_id += 1;
        let id = self.next_id.to_string();
        let payload = json!({ "id": id, "method": method, "params": params });
        writeln!(self.stdin, "{}", payload).expect("write request");
        self.stdin.flush().expect("flush request");

        let line = self.read_line();
        let value: Value = serde_json::from_str(line.trim()).expect("parse response json");
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id.as_str()));
        value
    }

    pub fn send_raw(&mut self, line: &str) -> Value {
        writeln!(self.stdin, "{}", line).expect("write raw line");
        self.stdin.flush().expect("flush raw line");
        let line = self.read_line();
        serde_json::from_str(line.trim()).expect("parse response json")
    }

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .expect("read response line");
        assert!(!line.trim().is_empty(), "empty response line");
        line
    }

    /// Sends the request and returns `result`, failing the test on an error
    /// response.
    pub fn ok(&mut self, method: &str, params: Value) -> Value {
        let resp = self.request(method, params);
        assert_eq!(
            resp.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            resp
        );
        resp.get("result").cloned().unwrap_or(Value::Null)
    }

    /// Sends the request, expects an error response, and returns its code.
    pub fn err_code(&mut self, method: &str, params: Value) -> String {
        let resp = self.request(method, params);
        assert_eq!(
            resp.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "{} unexpectedly succeeded: {}",
            method,
            resp
        );
        resp["error"]["code"]
            .as_str()
            .expect("error code")
            .to_string()
    }
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn id_of(v: &Value, key: &str) -> String {
    v[key]["id"]
        .as_str()
        .unwrap_or_else(|| panic!("missing {}.id in {}", key, v))
        .to_string()
}

/// Subject + class; returns the class id.
pub fn seed_class(sc: &mut Sidecar, name: &str) -> String {
    let subject = sc.ok(
        "subjects.create",
        json!({ "name": format!("{} subject", name), "code": format!("{}-S", name) }),
    );
    let class = sc.ok(
        "classes.create",
        json!({ "name": name, "subjectId": id_of(&subject, "subject") }),
    );
    id_of(&class, "class")
}

pub fn seed_student(sc: &mut Sidecar, name: &str, call_number: i64) -> String {
    let created = sc.ok(
        "students.create",
        json!({ "name": name, "callNumber": call_number }),
    );
    id_of(&created, "student")
}
