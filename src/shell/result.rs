use std::fmt;

use crate::error::ShellError;
use crate::value::Value;

type Settle = Box<dyn FnOnce() -> Result<Value, ShellError>>;

/// A result that is not available yet.
///
/// Nothing runs until [`PendingResult::wait`] is called; the shell hands the handle back
/// to its caller immediately and never blocks on it.
pub struct PendingResult {
    settle: Settle,
}

impl PendingResult {
    pub fn new(settle: impl FnOnce() -> Result<Value, ShellError> + 'static) -> Self {
        Self {
            settle: Box::new(settle),
        }
    }

    /// Drive the pending work to completion.
    pub fn wait(self) -> Result<Value, ShellError> {
        (self.settle)()
    }

    /// Chain a continuation that sees the settled result.
    pub fn then(
        self,
        next: impl FnOnce(Result<Value, ShellError>) -> Result<Value, ShellError> + 'static,
    ) -> Self {
        let settle = self.settle;
        Self::new(move || next(settle()))
    }
}

impl fmt::Debug for PendingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PendingResult")
    }
}

/// What a code evaluation or a command handler produced, before normalization.
#[derive(Debug)]
pub enum Completion {
    Value(Value),
    Pending(PendingResult),
}

impl From<Value> for Completion {
    fn from(value: Value) -> Self {
        Completion::Value(value)
    }
}

impl From<PendingResult> for Completion {
    fn from(pending: PendingResult) -> Self {
        Completion::Pending(pending)
    }
}

/// The single caller-facing outcome of `Shell::evaluate`.
#[derive(Debug)]
pub enum Evaluation {
    Resolved(Value),
    Rejected(ShellError),
    Pending(PendingResult),
}

impl Evaluation {
    /// Normalize a raw outcome. Pending completions pass through untouched.
    pub fn from_outcome(outcome: Result<Completion, ShellError>) -> Self {
        match outcome {
            Ok(Completion::Value(value)) => Evaluation::Resolved(value),
            Ok(Completion::Pending(pending)) => Evaluation::Pending(pending),
            Err(err) => Evaluation::Rejected(err),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Evaluation::Pending(_))
    }

    /// Apply `next` to the settled result: right away for settled outcomes, on
    /// settlement for pending ones.
    pub fn then(
        self,
        next: impl FnOnce(Result<Value, ShellError>) -> Result<Value, ShellError> + 'static,
    ) -> Self {
        match self {
            Evaluation::Resolved(value) => Evaluation::from_result(next(Ok(value))),
            Evaluation::Rejected(err) => Evaluation::from_result(next(Err(err))),
            Evaluation::Pending(pending) => Evaluation::Pending(pending.then(next)),
        }
    }

    /// Settle into a plain `Result`, driving pending work if needed.
    pub fn wait(self) -> Result<Value, ShellError> {
        match self {
            Evaluation::Resolved(value) => Ok(value),
            Evaluation::Rejected(err) => Err(err),
            Evaluation::Pending(pending) => pending.wait(),
        }
    }

    fn from_result(result: Result<Value, ShellError>) -> Self {
        match result {
            Ok(value) => Evaluation::Resolved(value),
            Err(err) => Evaluation::Rejected(err),
        }
    }
}
