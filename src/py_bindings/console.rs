use pyo3::exceptions::PyIOError;
use pyo3::prelude::*;
use pyo3::types::PyTuple;

use crate::output::Output;

/// The `console` global: a logger writing to the shell's output sink.
#[pyclass(frozen)]
pub struct Console {
    output: Output,
}

impl Console {
    pub fn new(output: Output) -> Self {
        Self { output }
    }

    fn emit(&self, prefix: &str, args: &Bound<'_, PyTuple>) -> PyResult<()> {
        let mut parts = Vec::with_capacity(args.len());
        for arg in args.iter() {
            parts.push(arg.str()?.to_string());
        }
        let line = format!("{prefix}{}", parts.join(" "));
        self.output
            .write_line(&line)
            .map_err(|e| PyIOError::new_err(e.to_string()))
    }
}

#[pymethods]
impl Console {
    #[pyo3(signature = (*args))]
    fn log(&self, args: &Bound<'_, PyTuple>) -> PyResult<()> {
        self.emit("", args)
    }

    #[pyo3(signature = (*args))]
    fn info(&self, args: &Bound<'_, PyTuple>) -> PyResult<()> {
        self.emit("", args)
    }

    #[pyo3(signature = (*args))]
    fn warn(&self, args: &Bound<'_, PyTuple>) -> PyResult<()> {
        self.emit("warning: ", args)
    }

    #[pyo3(signature = (*args))]
    fn error(&self, args: &Bound<'_, PyTuple>) -> PyResult<()> {
        self.emit("error: ", args)
    }

    /// Print the repr of an object rather than its str.
    fn dir(&self, obj: &Bound<'_, PyAny>) -> PyResult<()> {
        self.output
            .write_line(&obj.repr()?.to_string())
            .map_err(|e| PyIOError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> &'static str {
        "<console>"
    }
}
