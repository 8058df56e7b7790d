//! Shared test infrastructure for integration tests.

use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// A throwaway workspace plus a way to run `ispec` against it.
pub struct Workspace {
    dir: TempDir,
    lm_command: Option<String>,
}

/// Outcome of one `ispec` invocation.
pub struct Run {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Run {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout).unwrap_or_else(|err| {
            panic!(
                "stdout is not JSON ({err}):\n{}\nstderr:\n{}",
                self.stdout, self.stderr
            )
        })
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp workspace"),
            lm_command: None,
        }
    }

    /// Answer every prompt with a local command (e.g. `cat` echoes the prompt).
    #[allow(dead_code)]
    pub fn with_lm(mut self, command: &str) -> Self {
        self.lm_command = Some(command.to_string());
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn run(&self, args: &[&str]) -> Run {
        self.run_with_stdin(args, None)
    }

    pub fn run_with_stdin(&self, args: &[&str], stdin: Option<&str>) -> Run {
        let mut command = Command::new(env!("CARGO_BIN_EXE_ispec"));
        command
            .args(args)
            .env("ISPEC_WORKSPACE", self.root())
            .env_remove("ISPEC_LM_COMMAND")
            .env_remove("GEMINI_API_KEY")
            .env_remove("OPENAI_API_KEY")
            .env_remove("GEMINI_MODEL")
            .env_remove("RUST_LOG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(lm) = &self.lm_command {
            command.env("ISPEC_LM_COMMAND", lm);
        }
        let mut child = command.spawn().expect("spawn ispec");
        {
            let mut pipe = child.stdin.take().expect("stdin pipe");
            if let Some(text) = stdin {
                pipe.write_all(text.as_bytes()).expect("write stdin");
            }
        }
        let output: Output = child.wait_with_output().expect("wait for ispec");
        Run {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Run and require success, returning stdout parsed as JSON.
    pub fn json(&self, args: &[&str]) -> Value {
        let run = self.run(args);
        assert_eq!(
            run.code, 0,
            "ispec {args:?} failed:\nstdout:\n{}\nstderr:\n{}",
            run.stdout, run.stderr
        );
        run.json()
    }

    /// Create a row and return its id.
    pub fn create(&self, args: &[&str]) -> String {
        self.json(args)["id"]
            .as_str()
            .expect("created row has an id")
            .to_string()
    }
}

/// True when `program` can be found on PATH.
#[allow(dead_code)]
pub fn have(program: &str) -> bool {
    which::which(program).is_ok()
}
