//! The sandbox that user code runs in.
//!
//! A context owns one persistent variable scope. Every evaluation runs against that same
//! scope, so bindings made by one snippet are visible to the next.

#[cfg(feature = "python")]
pub(crate) mod convert;
#[cfg(feature = "python")]
pub mod python;
#[cfg(test)]
pub(crate) mod scripted;

use crate::error::ShellError;
use crate::shell::Completion;
use crate::value::Value;

/// Bindings every context seeds its scope with: a console logger, the byte-buffer
/// constructor, the utility namespace, and a self-reference to the scope.
pub const INJECTED_GLOBALS: [&str; 4] = ["console", "Buffer", "_", "scope"];

pub trait ExecutionContext {
    /// Run `code` against the persistent scope.
    ///
    /// `label` names the code in stack traces. The result is the value of the final
    /// expression, or a pending result when that value is awaitable.
    fn evaluate(&mut self, code: &str, label: &str) -> Result<Completion, ShellError>;

    /// Read one binding from the scope.
    fn binding(&self, name: &str) -> Option<Value>;

    /// All user-visible bindings, excluding the injected globals.
    fn bindings(&self) -> Vec<(String, Value)>;

    /// Create or replace a binding in the scope.
    fn define(&mut self, name: &str, value: Value) -> Result<(), ShellError>;

    /// Substrings identifying stack frames that belong to the context's own machinery.
    fn internal_frame_markers(&self) -> &[&str];

    /// Whether `code` forms a complete unit of input (used for multi-line entry).
    fn is_complete(&self, _code: &str) -> bool {
        true
    }
}

/// The name user code is filed under in traces for one evaluation.
pub fn code_label(evaluation_id: &str) -> String {
    format!("code[{evaluation_id}]")
}

pub(crate) fn is_injected(name: &str) -> bool {
    INJECTED_GLOBALS.contains(&name)
}
