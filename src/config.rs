//! Workspace configuration.
//!
//! `config.json` is optional; environment variables fill in secrets and
//! per-machine choices so the file can be shared between users.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::WorkbenchError;
use crate::store::WorkspacePaths;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

pub const WORKSPACE_ENV: &str = "ISPEC_WORKSPACE";
pub const LM_COMMAND_ENV: &str = "ISPEC_LM_COMMAND";
pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GEMINI_KEY_FALLBACK_ENV: &str = "OPENAI_API_KEY";
pub const GEMINI_MODEL_ENV: &str = "GEMINI_MODEL";

const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 30_000;

/// Contents of `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub schema_version: u32,
    #[serde(default)]
    pub lm: LmConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            lm: LmConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LmConfig {
    /// Local command that reads a prompt on stdin and answers on stdout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            command: None,
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

/// Which text-generation service answers prompts.
#[derive(Debug, Clone, PartialEq)]
pub enum LmBackend {
    /// Local command, argv split shell-style.
    Command { command: String },
    /// Gemini REST API. The key is checked when a prompt is sent, so commands
    /// that never call the model work without one.
    Gemini {
        api_key: Option<String>,
        model: Option<String>,
        temperature: f32,
        max_output_tokens: u32,
    },
}

/// Everything a command needs, resolved once and passed down explicitly.
#[derive(Debug, Clone)]
pub struct WorkbenchConfig {
    pub paths: WorkspacePaths,
    pub file: ConfigFile,
    pub lm: LmBackend,
}

impl WorkbenchConfig {
    /// Resolve the workspace, read its config and pick the LM backend.
    pub fn load(workspace: Option<&Path>, lm_override: Option<&str>) -> Result<Self> {
        let root = resolve_workspace_root(workspace, |key| env::var(key).ok())?;
        let paths = WorkspacePaths::new(root);
        let file = load_config(&paths)?;
        let lm = resolve_lm_backend(lm_override, &file.lm, |key| env::var(key).ok());
        Ok(Self { paths, file, lm })
    }
}

/// Workspace root: explicit flag, then `ISPEC_WORKSPACE`, then the user data dir.
pub fn resolve_workspace_root<F>(explicit: Option<&Path>, lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = lookup(WORKSPACE_ENV).filter(|value| !value.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let data_dir = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(data_dir.join("ispec").join("workspace"))
}

/// LM backend: `--lm` flag, config command, `ISPEC_LM_COMMAND`, else Gemini.
pub fn resolve_lm_backend<F>(lm_override: Option<&str>, config: &LmConfig, lookup: F) -> LmBackend
where
    F: Fn(&str) -> Option<String>,
{
    let command = lm_override
        .map(str::to_string)
        .or_else(|| config.command.clone())
        .or_else(|| lookup(LM_COMMAND_ENV))
        .filter(|command| !command.trim().is_empty());
    if let Some(command) = command {
        return LmBackend::Command { command };
    }
    let api_key = lookup(GEMINI_KEY_ENV)
        .filter(|key| !key.is_empty())
        .or_else(|| lookup(GEMINI_KEY_FALLBACK_ENV).filter(|key| !key.is_empty()));
    let model = lookup(GEMINI_MODEL_ENV)
        .filter(|model| !model.trim().is_empty())
        .or_else(|| config.model.clone());
    LmBackend::Gemini {
        api_key,
        model,
        temperature: config.temperature,
        max_output_tokens: config.max_output_tokens,
    }
}

/// Load `config.json`, falling back to defaults when it does not exist.
pub fn load_config(paths: &WorkspacePaths) -> Result<ConfigFile> {
    let path = paths.config_path();
    if !path.is_file() {
        return Ok(ConfigFile::default());
    }
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: ConfigFile =
        serde_json::from_slice(&bytes).context("parse workspace config JSON")?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &ConfigFile) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if config.probe.timeout_ms == 0 {
        return Err(anyhow!("probe.timeout_ms must be greater than zero"));
    }
    if !(0.0..=2.0).contains(&config.lm.temperature) {
        return Err(anyhow!(
            "lm.temperature must be between 0 and 2 (got {})",
            config.lm.temperature
        ));
    }
    Ok(())
}

/// Write the default config stub; refuses to clobber an existing file unless
/// `force` is set.
pub fn write_default_config(paths: &WorkspacePaths, force: bool) -> Result<PathBuf> {
    let path = paths.config_path();
    if path.exists() && !force {
        return Err(WorkbenchError::Invalid(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ))
        .into());
    }
    fs::create_dir_all(paths.root())
        .with_context(|| format!("create {}", paths.root().display()))?;
    let text = serde_json::to_string_pretty(&ConfigFile::default())
        .context("serialize workspace config")?;
    fs::write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
