//! Local LM command backend.
//!
//! Any tool that reads a prompt on stdin and writes its answer to stdout works
//! (`llm`, `ollama run <model>`, `claude -p`, a wrapper script).
use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;

use super::TextGenerator;

#[derive(Debug, Clone)]
pub struct CommandClient {
    command: String,
}

impl CommandClient {
    pub fn new(command: String) -> Self {
        Self { command }
    }
}

impl TextGenerator for CommandClient {
    fn generate_text(&self, prompt: &str) -> Result<String> {
        let args = shell_words::split(&self.command)
            .with_context(|| format!("parse LM command: {}", self.command))?;
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| anyhow!("LM command is empty"))?;
        let resolved = which::which(program)
            .with_context(|| format!("LM command not found on PATH: {program}"))?;

        let start = Instant::now();
        let mut child = Command::new(&resolved)
            .args(rest)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawn LM command: {program}"))?;

        // Stdin is written on its own thread so stdout keeps draining.
        let stdin = child.stdin.take();
        let output = std::thread::scope(|scope| -> Result<_> {
            let writer = stdin.map(|mut stdin| {
                scope.spawn(move || stdin.write_all(prompt.as_bytes()))
            });
            let output = child.wait_with_output().context("wait for LM command")?;
            if let Some(writer) = writer {
                // A command may exit without reading all of its input.
                match writer.join() {
                    Ok(Err(err)) if err.kind() != std::io::ErrorKind::BrokenPipe => {
                        return Err(err).context("write prompt to LM stdin");
                    }
                    Ok(_) => {}
                    Err(_) => return Err(anyhow!("LM stdin writer panicked")),
                }
            }
            Ok(output)
        })?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            prompt_bytes = prompt.len(),
            response_bytes = output.stdout.len(),
            "lm command complete"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "LM command failed with status {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        let text = String::from_utf8(output.stdout).context("decode LM stdout as UTF-8")?;
        Ok(text.trim().to_string())
    }
}
