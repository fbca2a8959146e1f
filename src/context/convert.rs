use pyo3::prelude::*;
use pyo3::types::{
    PyBool, PyByteArray, PyBytes, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple,
};

use crate::value::Value;

// Containers nested deeper than this are summarized instead of walked
const MAX_DEPTH: usize = 64;
// Containers walked per conversion; shared references count once per occurrence
const MAX_CONTAINERS: usize = 10_000;

/// Convert a Python object to a Value
///
/// Structural types map one to one. Everything else (including integers that overflow
/// i64 and dicts with non-string keys) is kept as an opaque object with its repr.
/// Containers that refer back to themselves, sit too deep, or exceed the per-value
/// container budget become opaque summaries without walking their contents.
pub(crate) fn py_to_value(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    Converter::default().convert(obj)
}

#[derive(Default)]
struct Converter {
    // Addresses of the containers currently being walked
    path: Vec<usize>,
    containers: usize,
}

impl Converter {
    fn convert(&mut self, obj: &Bound<'_, PyAny>) -> PyResult<Value> {
        if obj.is_none() {
            return Ok(Value::None);
        }

        // bool subclasses int, so it has to be tested first
        if obj.is_instance_of::<PyBool>() {
            return Ok(Value::Bool(obj.extract::<bool>()?));
        }

        if obj.is_instance_of::<PyInt>() {
            if let Ok(i) = obj.extract::<i64>() {
                return Ok(Value::Integer(i));
            }
            return opaque(obj);
        }

        if obj.is_instance_of::<PyFloat>() {
            return Ok(Value::Decimal(obj.extract::<f64>()?));
        }

        if obj.is_instance_of::<PyString>() {
            return Ok(Value::String(obj.extract::<String>()?));
        }

        if let Ok(bytes) = obj.cast::<PyBytes>() {
            return Ok(Value::Bytes(bytes.as_bytes().to_vec()));
        }

        if let Ok(buffer) = obj.cast::<PyByteArray>() {
            return Ok(Value::Bytes(buffer.to_vec()));
        }

        let is_container = obj.is_instance_of::<PyList>()
            || obj.is_instance_of::<PyTuple>()
            || obj.is_instance_of::<PyDict>();
        if !is_container {
            return opaque(obj);
        }

        let address = obj.as_ptr() as usize;
        if self.path.contains(&address) {
            return summary(obj, "recursive");
        }
        if self.path.len() >= MAX_DEPTH {
            return summary(obj, "nested too deeply");
        }
        if self.containers >= MAX_CONTAINERS {
            return summary(obj, "too large");
        }
        self.containers += 1;

        self.path.push(address);
        let value = self.convert_container(obj);
        self.path.pop();
        value
    }

    fn convert_container(&mut self, obj: &Bound<'_, PyAny>) -> PyResult<Value> {
        if let Ok(list) = obj.cast::<PyList>() {
            let mut items = Vec::with_capacity(list.len());
            for item in list.iter() {
                items.push(self.convert(&item)?);
            }
            return Ok(Value::List(items));
        }

        if let Ok(tuple) = obj.cast::<PyTuple>() {
            let mut items = Vec::with_capacity(tuple.len());
            for item in tuple.iter() {
                items.push(self.convert(&item)?);
            }
            return Ok(Value::List(items));
        }

        let dict = obj.cast::<PyDict>()?;
        let mut entries = Vec::with_capacity(dict.len());
        for (key, value) in dict.iter() {
            let Ok(key) = key.extract::<String>() else {
                return opaque(obj);
            };
            entries.push((key, self.convert(&value)?));
        }
        Ok(Value::Map(entries))
    }
}

fn opaque(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    Ok(Value::Object {
        type_name: obj.get_type().name()?.to_string(),
        repr: obj.repr()?.to_string(),
    })
}

// Stands in for a container without calling its repr, which would walk it again
fn summary(obj: &Bound<'_, PyAny>, reason: &str) -> PyResult<Value> {
    let type_name = obj.get_type().name()?.to_string();
    let repr = format!("<{type_name} of {} items, {reason}>", obj.len()?);
    Ok(Value::Object { type_name, repr })
}

/// Convert a Value to a Python object
///
/// Opaque objects cannot be rebuilt; they come back as their repr string.
pub(crate) fn value_to_py(py: Python<'_>, value: &Value) -> PyResult<Py<PyAny>> {
    match value {
        Value::None => Ok(py.None()),
        Value::Bool(b) => Ok((*b).into_pyobject(py)?.to_owned().into_any().unbind()),
        Value::Integer(i) => Ok((*i).into_pyobject(py)?.into_any().unbind()),
        Value::Decimal(f) => Ok((*f).into_pyobject(py)?.into_any().unbind()),
        Value::String(s) => Ok(s.clone().into_pyobject(py)?.into_any().unbind()),
        Value::Bytes(bytes) => Ok(PyBytes::new(py, bytes).into_any().unbind()),
        Value::List(items) => {
            let items: Result<Vec<Py<PyAny>>, _> =
                items.iter().map(|item| value_to_py(py, item)).collect();
            Ok(PyList::new(py, &items?)?.into_any().unbind())
        }
        Value::Map(entries) => {
            let dict = PyDict::new(py);
            for (key, value) in entries {
                dict.set_item(key, value_to_py(py, value)?)?;
            }
            Ok(dict.into_any().unbind())
        }
        Value::Object { repr, .. } => Ok(repr.clone().into_pyobject(py)?.into_any().unbind()),
    }
}
