#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("data").join("tasks.json")
    }

    pub fn run(&self, args: &[&str]) -> Output {
        let exe = env!("CARGO_BIN_EXE_task-tracker");
        Command::new(exe)
            .args(args)
            .env("TASK_TRACKER_STORE_PATH", self.store_path())
            .env_remove("TASK_TRACKER_LOG")
            .current_dir(self.dir.path())
            .output()
            .expect("failed to run task-tracker")
    }

    pub fn write_store(&self, content: &str) {
        write_file(&self.store_path(), content);
    }

    pub fn stored(&self) -> serde_json::Value {
        let content = std::fs::read_to_string(self.store_path()).expect("read store");
        serde_json::from_str(&content).expect("store is valid JSON")
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create store dir");
    }
    std::fs::write(path, content).expect("write store");
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
