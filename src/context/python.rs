//! Execution context backed by the embedded CPython interpreter.

use pyo3::prelude::*;
use pyo3::types::{PyByteArray, PyDict};
use tracing::debug;

use super::convert::{py_to_value, value_to_py};
use super::{ExecutionContext, is_injected};
use crate::error::{EvaluationError, ShellError};
use crate::output::Output;
use crate::py_bindings::{self, Console, RUNTIME_FILE};
use crate::shell::{Completion, PendingResult};
use crate::value::Value;

const MARKERS: &[&str] = &[RUNTIME_FILE];

/// A persistent Python scope.
///
/// The scope is a plain dict used as the globals of every evaluation, seeded with the
/// injected globals. Awaitable results are driven on the calling thread's event loop
/// when the pending result is waited on.
pub struct PythonContext {
    scope: Py<PyDict>,
    runtime: Py<PyModule>,
}

impl PythonContext {
    /// Create a fresh scope whose `console` writes to `output`.
    pub fn new(output: Output) -> Result<Self, ShellError> {
        Python::attach(|py| -> PyResult<Self> {
            let runtime = py_bindings::load_runtime(py)?;
            let util = py_bindings::util_module(py)?;

            let scope = PyDict::new(py);
            scope.set_item("__name__", "__main__")?;
            scope.set_item("console", Py::new(py, Console::new(output))?)?;
            scope.set_item("Buffer", py.get_type::<PyByteArray>())?;
            scope.set_item("_", util)?;
            scope.set_item("scope", &scope)?;

            Ok(Self {
                scope: scope.unbind(),
                runtime: runtime.unbind(),
            })
        })
        .map_err(|err| ShellError::Context(err.to_string()))
    }
}

impl ExecutionContext for PythonContext {
    fn evaluate(&mut self, code: &str, label: &str) -> Result<Completion, ShellError> {
        Python::attach(|py| {
            let runtime = self.runtime.bind(py);
            let scope = self.scope.bind(py);

            let value = runtime
                .call_method1("run", (code, scope, label))
                .map_err(|err| raised(py, runtime, err))?;

            let pending = runtime
                .call_method1("is_pending", (&value,))
                .and_then(|pending| pending.extract::<bool>())
                .map_err(|err| raised(py, runtime, err))?;
            if pending {
                debug!(label, "evaluation produced an awaitable");
                let awaitable = value.unbind();
                let runtime = self.runtime.clone_ref(py);
                return Ok(Completion::Pending(PendingResult::new(move || {
                    settle(runtime, awaitable)
                })));
            }

            py_to_value(&value)
                .map(Completion::Value)
                .map_err(|err| raised(py, runtime, err))
        })
    }

    fn binding(&self, name: &str) -> Option<Value> {
        Python::attach(|py| {
            let value = self.scope.bind(py).get_item(name).ok().flatten()?;
            py_to_value(&value).ok()
        })
    }

    fn bindings(&self) -> Vec<(String, Value)> {
        Python::attach(|py| {
            let mut bindings = Vec::new();
            for (key, value) in self.scope.bind(py).iter() {
                let Ok(name) = key.extract::<String>() else {
                    continue;
                };
                if name.starts_with("__") || is_injected(&name) {
                    continue;
                }
                if let Ok(value) = py_to_value(&value) {
                    bindings.push((name, value));
                }
            }
            bindings
        })
    }

    fn define(&mut self, name: &str, value: Value) -> Result<(), ShellError> {
        Python::attach(|py| -> PyResult<()> {
            let value = value_to_py(py, &value)?;
            self.scope.bind(py).set_item(name, value)
        })
        .map_err(|err| ShellError::Context(err.to_string()))
    }

    fn internal_frame_markers(&self) -> &[&str] {
        MARKERS
    }

    fn is_complete(&self, code: &str) -> bool {
        // codeop answers None while a block is still open
        Python::attach(|py| {
            let compiled = py
                .import("codeop")
                .and_then(|codeop| codeop.call_method1("compile_command", (code,)));

            // Broken input is complete too; evaluation surfaces the SyntaxError with a trace
            !matches!(compiled, Ok(ref pending) if pending.is_none())
        })
    }
}

fn settle(runtime: Py<PyModule>, awaitable: Py<PyAny>) -> Result<Value, ShellError> {
    Python::attach(|py| {
        let runtime = runtime.bind(py);
        let value = runtime
            .call_method1("settle", (awaitable.bind(py),))
            .map_err(|err| raised(py, runtime, err))?;
        py_to_value(&value).map_err(|err| raised(py, runtime, err))
    })
}

/// Describe a Python exception, frames innermost first.
fn raised(py: Python<'_>, runtime: &Bound<'_, PyModule>, err: PyErr) -> ShellError {
    let described = runtime
        .call_method1("describe", (err.value(py),))
        .and_then(|described| described.extract::<(String, String, Vec<String>)>());

    match described {
        Ok((kind, message, trace)) => {
            ShellError::Evaluation(EvaluationError::new(kind, message).with_trace(trace))
        }
        Err(_) => ShellError::Evaluation(EvaluationError::new("Exception", err.to_string())),
    }
}
