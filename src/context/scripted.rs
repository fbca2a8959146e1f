//! A tiny line-oriented context for exercising the shell without an interpreter.
//!
//! Statements (one per line):
//! - `let NAME = JSON` binds a value
//! - `fail MESSAGE` raises an error whose trace includes an internal frame
//! - `later JSON` / `later fail MESSAGE` produce a pending result
//! - `NAME` reads a binding, anything else is parsed as a JSON literal

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{ExecutionContext, INJECTED_GLOBALS, is_injected};
use crate::error::{EvaluationError, ShellError};
use crate::shell::{Completion, PendingResult};
use crate::value::Value;

const MARKERS: &[&str] = &["Shell."];

#[derive(Default)]
pub(crate) struct ScriptedContext {
    scope: HashMap<String, Value>,
    order: Vec<String>,
    labels: Rc<RefCell<Vec<String>>>,
}

impl ScriptedContext {
    pub(crate) fn new() -> Self {
        let mut context = Self::default();
        for name in INJECTED_GLOBALS {
            context.set(
                name,
                Value::Object {
                    type_name: "builtin".to_string(),
                    repr: format!("<{name}>"),
                },
            );
        }
        context
    }

    /// Labels passed to `evaluate`, in call order.
    pub(crate) fn labels(&self) -> Rc<RefCell<Vec<String>>> {
        self.labels.clone()
    }

    fn set(&mut self, name: &str, value: Value) {
        if !self.scope.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.scope.insert(name.to_string(), value);
    }

    fn run_statement(&mut self, statement: &str, label: &str) -> Result<Completion, ShellError> {
        if let Some(rest) = statement.strip_prefix("let ") {
            let (name, literal) = rest
                .split_once('=')
                .ok_or_else(|| syntax_error(statement))?;
            let value = parse_literal(literal.trim()).ok_or_else(|| syntax_error(statement))?;
            self.set(name.trim(), value);
            return Ok(Value::None.into());
        }

        if let Some(message) = statement.strip_prefix("fail ") {
            return Err(raised(message, label));
        }

        if let Some(rest) = statement.strip_prefix("later ") {
            let label = label.to_string();
            let pending = match rest.strip_prefix("fail ") {
                Some(message) => {
                    let message = message.to_string();
                    PendingResult::new(move || Err(raised(&message, &label)))
                }
                None => {
                    let value = parse_literal(rest).ok_or_else(|| syntax_error(statement))?;
                    PendingResult::new(move || Ok(value))
                }
            };
            return Ok(pending.into());
        }

        if is_identifier(statement) {
            return self
                .scope
                .get(statement)
                .cloned()
                .map(Completion::from)
                .ok_or_else(|| {
                    ShellError::Evaluation(
                        EvaluationError::new("NameError", format!("{statement} is not defined"))
                            .with_trace(vec![
                                format!("NameError: {statement} is not defined"),
                                format!("  at <module> ({label})"),
                                "  at Shell.run (internal)".to_string(),
                            ]),
                    )
                });
        }

        parse_literal(statement)
            .map(Completion::from)
            .ok_or_else(|| syntax_error(statement))
    }
}

impl ExecutionContext for ScriptedContext {
    fn evaluate(&mut self, code: &str, label: &str) -> Result<Completion, ShellError> {
        self.labels.borrow_mut().push(label.to_string());

        let mut last = Completion::Value(Value::None);
        for statement in code.lines().map(str::trim).filter(|s| !s.is_empty()) {
            last = self.run_statement(statement, label)?;
        }
        Ok(last)
    }

    fn binding(&self, name: &str) -> Option<Value> {
        self.scope.get(name).cloned()
    }

    fn bindings(&self) -> Vec<(String, Value)> {
        self.order
            .iter()
            .filter(|name| !is_injected(name))
            .filter_map(|name| self.scope.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }

    fn define(&mut self, name: &str, value: Value) -> Result<(), ShellError> {
        self.set(name, value);
        Ok(())
    }

    fn internal_frame_markers(&self) -> &[&str] {
        MARKERS
    }
}

fn parse_literal(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok().map(|json| Value::from_json(&json))
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !matches!(text, "true" | "false" | "null")
}

fn syntax_error(statement: &str) -> ShellError {
    ShellError::Evaluation(
        EvaluationError::new("SyntaxError", format!("cannot parse `{statement}`"))
            .with_trace(vec![
                format!("SyntaxError: cannot parse `{statement}`"),
                "  at Shell.run (internal)".to_string(),
            ]),
    )
}

fn raised(message: &str, label: &str) -> ShellError {
    ShellError::Evaluation(EvaluationError::new("Error", message).with_trace(vec![
        format!("Error: {message}"),
        format!("  at <module> ({label})"),
        "  at Shell.run (internal)".to_string(),
        "  at kernel dispatch (internal)".to_string(),
    ]))
}
