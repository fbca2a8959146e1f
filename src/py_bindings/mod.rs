pub mod console;

use std::ffi::CString;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::context::convert::{py_to_value, value_to_py};
use crate::value::Value;

pub use console::Console;

// Embed Python modules at compile time
const RUNTIME: &str = include_str!("../../python/runtime.py");
const UTIL: &str = include_str!("../../python/util.py");

/// File name the runtime helpers are compiled under; frames carrying it are internal.
pub const RUNTIME_FILE: &str = "<shell-runtime>";
pub const RUNTIME_MODULE: &str = "shell_runtime";
/// File name of the helpers user code calls through `_`. Not an internal marker.
pub const UTIL_FILE: &str = "<shell-util>";
pub const UTIL_MODULE: &str = "shell_util";

/// Load the embedded runtime module, reusing it if this interpreter already has it.
pub fn load_runtime(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    load_embedded(py, RUNTIME, RUNTIME_FILE, RUNTIME_MODULE, |_| Ok(()))
}

/// Load the utility namespace bound to `_` in every scope.
pub fn util_module(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    load_embedded(py, UTIL, UTIL_FILE, UTIL_MODULE, |module| {
        module.add_function(wrap_pyfunction!(typename, module)?)?;
        module.add_function(wrap_pyfunction!(to_json, module)?)?;
        module.add_function(wrap_pyfunction!(from_json, module)?)?;
        Ok(())
    })
}

fn load_embedded<'py>(
    py: Python<'py>,
    source: &str,
    file_name: &str,
    module_name: &str,
    extend: impl FnOnce(&Bound<'py, PyModule>) -> PyResult<()>,
) -> PyResult<Bound<'py, PyModule>> {
    let sys_modules = py.import("sys")?.getattr("modules")?;
    let sys_modules = sys_modules.cast_into::<PyDict>()?;
    if let Some(existing) = sys_modules.get_item(module_name)? {
        return Ok(existing.cast_into::<PyModule>()?);
    }

    let code = CString::new(source)?;
    let file = CString::new(file_name)?;
    let name = CString::new(module_name)?;
    let module = PyModule::from_code(py, &code, &file, &name)?;
    extend(&module)?;
    sys_modules.set_item(module_name, &module)?;
    Ok(module)
}

/// Name of an object's type
#[pyfunction]
fn typename(obj: &Bound<'_, PyAny>) -> PyResult<String> {
    Ok(obj.get_type().name()?.to_string())
}

/// Serialize a structural value (None, bool, numbers, str, bytes, list, tuple, dict) as JSON
#[pyfunction]
fn to_json(obj: &Bound<'_, PyAny>) -> PyResult<String> {
    let value = py_to_value(obj)?;
    serde_json::to_string(&value.to_json()).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Parse JSON text into Python values
#[pyfunction]
fn from_json(py: Python<'_>, text: &str) -> PyResult<Py<PyAny>> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| PyValueError::new_err(e.to_string()))?;
    value_to_py(py, &Value::from_json(&json))
}
