use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// An error raised by code running inside the execution context.
///
/// `trace` holds the exception lines first, followed by stack frames innermost first.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationError {
    pub kind: String,
    pub message: String,
    pub trace: Vec<String>,
}

impl EvaluationError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            trace: Vec::new(),
        }
    }

    pub fn with_trace(mut self, trace: Vec<String>) -> Self {
        self.trace = trace;
        self
    }
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Invalid command syntax.")]
    InvalidCommandSyntax,

    #[error("Unknown command named \"{0}\".")]
    UnknownCommand(String),

    #[error("{0}")]
    Evaluation(EvaluationError),

    #[error(transparent)]
    Command(#[from] anyhow::Error),

    #[error("execution context failure: {0}")]
    Context(String),

    #[error("failed to load config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ShellError {
    /// Lines describing the error for display to the user.
    ///
    /// Evaluation errors carry their (already sanitized) trace; everything else degrades
    /// to a single line.
    pub fn trace(&self) -> Vec<String> {
        match self {
            ShellError::Evaluation(err) if !err.trace.is_empty() => err.trace.clone(),
            other => vec![other.to_string()],
        }
    }
}
