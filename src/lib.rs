pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod output;
#[cfg(feature = "python")]
pub mod py_bindings;
pub mod shell;
pub mod value;

// Re-export commonly used types and functions
pub use commands::{Command, CommandForm, CommandRegistry, ParsedCommand};
pub use config::ShellConfig;
pub use context::{ExecutionContext, INJECTED_GLOBALS};
#[cfg(feature = "python")]
pub use context::python::PythonContext;
pub use error::{EvaluationError, ShellError};
pub use output::Output;
pub use shell::{Completion, Evaluation, Initializer, PendingResult, Shell, ShellBuilder};
pub use value::Value;
