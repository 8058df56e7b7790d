//! Text-generation collaborators.
//!
//! A prompt goes in, a string comes out. Two backends exist: the Gemini REST
//! API and any local command that reads the prompt on stdin. Callers never
//! care which one answered.
mod command;
mod gemini;
pub(crate) mod log;
mod response;

pub use command::CommandClient;
pub use gemini::{resolve_model, GeminiClient};
pub use log::{append_lm_log, LmInvocationKind, LmLogBuilder, LmOutcome};
pub use response::parse_json_from_text;

use anyhow::Result;

use crate::config::{LmBackend, WorkbenchConfig};

/// Something that answers a prompt with free text.
pub trait TextGenerator {
    fn generate_text(&self, prompt: &str) -> Result<String>;
}

/// Build the configured backend. `model` is a per-request Gemini model
/// override, ignored unless it names a known model.
pub fn client_for(config: &WorkbenchConfig, model: Option<&str>) -> Box<dyn TextGenerator> {
    match &config.lm {
        LmBackend::Command { command } => Box::new(CommandClient::new(command.clone())),
        LmBackend::Gemini {
            api_key,
            model: configured,
            temperature,
            max_output_tokens,
        } => Box::new(GeminiClient {
            api_key: api_key.clone(),
            model: resolve_model(model, configured.as_deref()),
            temperature: *temperature,
            max_output_tokens: *max_output_tokens,
        }),
    }
}
