//! Builtin module function handlers.
//!
//! Each submodule implements [`crate::compiler::runtime::ModuleFunctions`]
//! for one family; the helpers below pull typed arguments out of the
//! positional slice the registry hands over.

pub mod color;
pub mod gradient;
pub mod list;
pub mod map;
pub mod math;

use crate::compiler::values::{SassColor, SassMap, SassNumber, Value};
use crate::error::CompileError;

/// The argument at `index`, treating `null` as absent.
pub(crate) fn arg(args: &[Value], index: usize) -> Option<&Value> {
    args.get(index).filter(|v| !v.is_null())
}

pub(crate) fn required<'a>(args: &'a [Value], index: usize, param: &str) -> Result<&'a Value, CompileError> {
    arg(args, index)
        .ok_or_else(|| CompileError::invalid_argument(format!("Missing argument ${}", param)))
}

pub(crate) fn type_error(param: &str, expected: &str, value: &Value) -> CompileError {
    CompileError::invalid_argument(format!(
        "${}: {} is not a {}",
        param,
        value.inspect(),
        expected
    ))
}

pub(crate) fn number<'a>(args: &'a [Value], index: usize, param: &str) -> Result<&'a SassNumber, CompileError> {
    match required(args, index, param)? {
        Value::Number(n) => Ok(n),
        other => Err(type_error(param, "number", other)),
    }
}

pub(crate) fn color<'a>(args: &'a [Value], index: usize, param: &str) -> Result<&'a SassColor, CompileError> {
    match required(args, index, param)? {
        Value::Color(c) => Ok(c),
        other => Err(type_error(param, "color", other)),
    }
}

/// Maps, with the empty list `()` accepted as the empty map.
pub(crate) fn map(args: &[Value], index: usize, param: &str) -> Result<SassMap, CompileError> {
    match required(args, index, param)? {
        Value::Map(m) => Ok(m.clone()),
        Value::List(l) if l.values.is_empty() => Ok(SassMap::new()),
        other => Err(type_error(param, "map", other)),
    }
}

pub(crate) fn unitless<'a>(args: &'a [Value], index: usize, param: &str) -> Result<&'a SassNumber, CompileError> {
    let n = number(args, index, param)?;
    if !n.is_unitless() {
        return Err(CompileError::invalid_argument(format!(
            "${}: Expected {} to have no units",
            param,
            n.to_css()
        )));
    }
    Ok(n)
}

/// A percentage or unitless amount as a plain number (`10%` → `10`).
pub(crate) fn amount(args: &[Value], index: usize, param: &str) -> Result<f64, CompileError> {
    let n = number(args, index, param)?;
    match n.unit.as_deref() {
        None | Some("%") => Ok(n.value),
        Some(_) => Err(CompileError::invalid_argument(format!(
            "${}: Expected {} to have unit \"%\" or no units",
            param,
            n.to_css()
        ))),
    }
}
