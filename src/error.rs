use thiserror::Error;

/// Caller-facing failures that map to distinct exit codes.
///
/// Everything else travels as a plain `anyhow::Error` and exits with status 1.
#[derive(Debug, Error)]
pub enum WorkbenchError {
    /// Missing or malformed user input.
    #[error("{0}")]
    Invalid(String),
    /// A referenced record does not exist.
    #[error("{0}")]
    NotFound(String),
}

impl WorkbenchError {
    pub fn not_found(what: &str) -> Self {
        WorkbenchError::NotFound(format!("{what} not found"))
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            WorkbenchError::Invalid(_) => 2,
            WorkbenchError::NotFound(_) => 3,
        }
    }
}

/// Exit code for an error bubbled up to `main`.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<WorkbenchError>()
        .map(WorkbenchError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn exit_codes_survive_context_layers() {
        let err = Err::<(), _>(WorkbenchError::not_found("Scenario"))
            .context("load scenario")
            .unwrap_err();
        assert_eq!(exit_code_for(&err), 3);
        assert_eq!(exit_code_for(&anyhow::anyhow!("disk full")), 1);
    }
}
