//! The shell: routes each submitted input to code or command evaluation and hands back one
//! normalized [`Evaluation`].

mod buffer;
mod result;
pub mod trace;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

use crate::commands::builtins::BuiltinCommands;
use crate::commands::{COMMAND_SIGIL, Command, CommandRegistry, parse_command};
use crate::config::ShellConfig;
use crate::context::{ExecutionContext, code_label};
use crate::error::ShellError;
use crate::output::Output;
use crate::value::Value;

pub use buffer::CodeBuffer;
pub use result::{Completion, Evaluation, PendingResult};

/// A contributor that registers commands or globals while a shell is being built.
pub trait Initializer {
    fn initialize(&self, builder: &mut ShellBuilder) -> Result<(), ShellError>;
}

/// Registration phase of a shell. Everything registered here is fixed once
/// [`ShellBuilder::build`] runs.
pub struct ShellBuilder {
    config: Arc<ShellConfig>,
    context: Box<dyn ExecutionContext>,
    commands: CommandRegistry,
    output: Output,
    diagnostics: Output,
}

impl ShellBuilder {
    pub fn new(config: impl Into<Arc<ShellConfig>>, context: impl ExecutionContext + 'static) -> Self {
        Self {
            config: config.into(),
            context: Box::new(context),
            commands: CommandRegistry::new(),
            output: Output::stdout(),
            diagnostics: Output::stderr(),
        }
    }

    /// Where commands write their regular output.
    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    /// Where argument diagnostics are reported.
    pub fn with_diagnostics(mut self, diagnostics: Output) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn register_command(&mut self, name: &str, command: impl Command + 'static) -> &mut Self {
        self.register_shared_command(name, Arc::new(command))
    }

    pub fn register_shared_command(&mut self, name: &str, command: Arc<dyn Command>) -> &mut Self {
        self.commands.register(name, command);
        self
    }

    /// Seed the execution context with an extra global binding.
    pub fn define_global(&mut self, name: &str, value: Value) -> Result<&mut Self, ShellError> {
        self.context.define(name, value)?;
        Ok(self)
    }

    pub fn initialize(&mut self, initializer: &dyn Initializer) -> Result<&mut Self, ShellError> {
        initializer.initialize(self)?;
        Ok(self)
    }

    pub fn build(self) -> Shell {
        debug!(commands = ?self.commands.names(), "shell ready");
        Shell {
            config: self.config,
            context: self.context,
            commands: self.commands,
            code: Rc::new(RefCell::new(CodeBuffer::new())),
            output: self.output,
            diagnostics: self.diagnostics,
        }
    }
}

/// One evaluation session.
///
/// Evaluations must be serialized by the caller: the context is not safe to mutate from
/// two evaluations at once, and pending results should be settled before the next call
/// when ordering matters.
pub struct Shell {
    config: Arc<ShellConfig>,
    context: Box<dyn ExecutionContext>,
    commands: CommandRegistry,
    code: Rc<RefCell<CodeBuffer>>,
    output: Output,
    diagnostics: Output,
}

impl Shell {
    /// Build a shell with the builtin commands registered.
    pub fn create(
        config: impl Into<Arc<ShellConfig>>,
        context: impl ExecutionContext + 'static,
    ) -> Result<Shell, ShellError> {
        let mut builder = ShellBuilder::new(config, context);
        builder.initialize(&BuiltinCommands)?;
        Ok(builder.build())
    }

    /// Evaluate one unit of input.
    ///
    /// Input starting with `%` is a command; anything else is code for the context.
    pub fn evaluate(&mut self, text: &str, evaluation_id: &str) -> Evaluation {
        if text.starts_with(COMMAND_SIGIL) {
            self.evaluate_command(text, evaluation_id)
        } else {
            self.evaluate_code(text, evaluation_id)
        }
    }

    fn evaluate_code(&mut self, code: &str, evaluation_id: &str) -> Evaluation {
        debug!(evaluation_id, "evaluating code");

        let label = code_label(evaluation_id);
        let markers: Vec<String> = self
            .context
            .internal_frame_markers()
            .iter()
            .map(|marker| marker.to_string())
            .collect();
        let buffer = Rc::clone(&self.code);
        let snippet = code.to_string();

        // Only code that completed (including any pending result) joins the session history
        Evaluation::from_outcome(self.context.evaluate(code, &label)).then(move |result| {
            match result {
                Ok(value) => {
                    buffer.borrow_mut().append(&snippet);
                    Ok(value)
                }
                Err(err) => {
                    let markers: Vec<&str> = markers.iter().map(String::as_str).collect();
                    Err(trace::sanitize_error(err, &markers))
                }
            }
        })
    }

    fn evaluate_command(&mut self, text: &str, evaluation_id: &str) -> Evaluation {
        let parsed = match parse_command(&self.commands, text, &self.output, &self.diagnostics) {
            Ok(Some(parsed)) => parsed,
            // Arguments were rejected and the diagnostic already reported
            Ok(None) => return Evaluation::Resolved(Value::None),
            Err(err) => return Evaluation::Rejected(err),
        };

        debug!(evaluation_id, command = %parsed.name, form = ?parsed.form, "evaluating command");
        let outcome = parsed
            .command
            .run(self, &parsed.args, &parsed.data, evaluation_id)
            .map_err(handler_error);
        Evaluation::from_outcome(outcome)
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn diagnostics(&self) -> &Output {
        &self.diagnostics
    }

    /// Read a binding from the session scope.
    pub fn binding(&self, name: &str) -> Option<Value> {
        self.context.binding(name)
    }

    /// User bindings in the session scope (injected globals excluded).
    pub fn bindings(&self) -> Vec<(String, Value)> {
        self.context.bindings()
    }

    /// Every snippet that evaluated successfully so far, newline separated.
    pub fn code(&self) -> String {
        self.code.borrow().as_str().to_string()
    }

    /// Whether `text` is ready to evaluate or needs more lines.
    ///
    /// Line commands are always complete. Block commands are complete once a blank line has
    /// been entered (the text ends in a newline). Code defers to the context.
    pub fn is_complete(&self, text: &str) -> bool {
        if text.starts_with("%%") {
            text.ends_with('\n')
        } else if text.starts_with(COMMAND_SIGIL) {
            true
        } else {
            self.context.is_complete(text)
        }
    }
}

/// Handlers may fail with a `ShellError` wrapped in `anyhow`; unwrap it so callers see the
/// underlying kind.
fn handler_error(err: anyhow::Error) -> ShellError {
    match err.downcast::<ShellError>() {
        Ok(err) => err,
        Err(err) => ShellError::Command(err),
    }
}
