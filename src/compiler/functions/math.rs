//! `sass:math`
//!
//! Calls whose numeric operands cannot be combined (mixed incompatible units,
//! non-numeric arguments such as `var(--x)`) are deferred: the call is
//! re-emitted as CSS text so the browser evaluates it. Functions that only
//! inspect their arguments are always computed.

use std::cmp::Ordering;
use std::f64::consts::{E, PI};

use rand::Rng;

use super::{number, required, unitless};
use crate::compiler::runtime::ModuleFunctions;
use crate::compiler::values::{SassNumber, Value};
use crate::error::{CompileError, CompileErrorKind};

/// Functions computed even when their operands would otherwise defer.
const ALWAYS_COMPUTE: &[&str] = &["comparable", "compatible", "is-unitless", "random"];

pub struct MathFunctions;

impl ModuleFunctions for MathFunctions {
    fn namespace(&self) -> Option<&'static str> {
        Some("math")
    }

    fn module_functions(&self) -> &'static [&'static str] {
        &[
            "abs", "ceil", "floor", "round", "max", "min", "clamp", "div", "percentage", "sqrt",
            "pow", "log", "hypot", "sin", "cos", "tan", "asin", "acos", "atan", "atan2", "unit",
            "is-unitless", "compatible", "random",
        ]
    }

    fn global_functions(&self) -> &'static [&'static str] {
        &[
            "abs", "ceil", "floor", "round", "max", "min", "percentage", "unit", "unitless",
            "comparable", "random",
        ]
    }

    fn remap(&self) -> &'static [(&'static str, &'static str)] {
        &[("unitless", "is-unitless"), ("comparable", "compatible")]
    }

    fn signature(&self, name: &str) -> &'static [&'static str] {
        match name {
            "div" => &["number1", "number2"],
            "compatible" => &["number1", "number2"],
            "clamp" => &["min", "number", "max"],
            "pow" => &["base", "exponent"],
            "log" => &["number", "base"],
            "atan2" => &["y", "x"],
            "random" => &["limit"],
            _ => &["number"],
        }
    }

    fn variables(&self) -> Vec<(&'static str, Value)> {
        vec![("pi", Value::number(PI, None)), ("e", Value::number(E, None))]
    }

    fn handle(&self, name: &str, args: Vec<Value>) -> Result<Value, CompileError> {
        if !ALWAYS_COMPUTE.contains(&name) && !operands_combine(&args) {
            let text = deferred(name, &args);
            tracing::warn!("deferring {} to the browser: {}", name, text);
            return Ok(Value::unquoted(text));
        }
        match name {
            "abs" => map_value(&args, f64::abs),
            "ceil" => map_value(&args, f64::ceil),
            "floor" => map_value(&args, f64::floor),
            "round" => map_value(&args, fuzzy_round),
            "max" | "min" => extremum(name, &args),
            "clamp" => {
                let min = number(&args, 0, "min")?;
                let value = number(&args, 1, "number")?;
                let max = number(&args, 2, "max")?;
                if value.compare(min)? == Ordering::Less {
                    Ok(min.clone().into())
                } else if value.compare(max)? == Ordering::Greater {
                    Ok(max.clone().into())
                } else {
                    Ok(value.clone().into())
                }
            }
            "div" => {
                let left = number(&args, 0, "number1")?;
                let right = number(&args, 1, "number2")?;
                Ok(left.divide(right)?.into())
            }
            "percentage" => {
                let n = unitless(&args, 0, "number")?;
                Ok(Value::number(n.value * 100.0, Some("%")))
            }
            "sqrt" => Ok(Value::number(unitless(&args, 0, "number")?.value.sqrt(), None)),
            "pow" => {
                let base = unitless(&args, 0, "base")?;
                let exponent = unitless(&args, 1, "exponent")?;
                Ok(Value::number(base.value.powf(exponent.value), None))
            }
            "log" => {
                let n = unitless(&args, 0, "number")?;
                match args.get(1).filter(|v| !v.is_null()) {
                    Some(_) => {
                        let base = unitless(&args, 1, "base")?;
                        Ok(Value::number(n.value.ln() / base.value.ln(), None))
                    }
                    None => Ok(Value::number(n.value.ln(), None)),
                }
            }
            "hypot" => {
                let first = number(&args, 0, "numbers")?;
                let mut sum = 0.0;
                for value in &args {
                    let Value::Number(n) = value else {
                        return Err(super::type_error("numbers", "number", value));
                    };
                    let v = in_unit_of(first, n)?;
                    sum += v * v;
                }
                Ok(SassNumber::new(sum.sqrt(), first.unit.as_deref()).into())
            }
            "sin" | "cos" | "tan" => {
                let radians = to_radians(number(&args, 0, "number")?)?;
                let result = match name {
                    "sin" => radians.sin(),
                    "cos" => radians.cos(),
                    _ => radians.tan(),
                };
                Ok(Value::number(result, None))
            }
            "asin" | "acos" | "atan" => {
                let n = unitless(&args, 0, "number")?;
                let result = match name {
                    "asin" => n.value.asin(),
                    "acos" => n.value.acos(),
                    _ => n.value.atan(),
                };
                Ok(Value::number(result.to_degrees(), Some("deg")))
            }
            "atan2" => {
                let y = number(&args, 0, "y")?;
                let x = number(&args, 1, "x")?;
                Ok(Value::number(y.value.atan2(in_unit_of(y, x)?).to_degrees(), Some("deg")))
            }
            "unit" => Ok(Value::quoted(number(&args, 0, "number")?.unit_str())),
            "is-unitless" => Ok(Value::Bool(number(&args, 0, "number")?.is_unitless())),
            "compatible" => {
                let left = number(&args, 0, "number1")?;
                let right = number(&args, 1, "number2")?;
                Ok(Value::Bool(left.is_compatible(right)))
            }
            "random" => random(&args),
            _ => Err(CompileErrorKind::UnknownFunction(format!("math.{}", name)).into()),
        }
    }
}

/// All arguments are numbers whose units can be combined with each other.
fn operands_combine(args: &[Value]) -> bool {
    let mut numbers = Vec::new();
    for value in args.iter().filter(|v| !v.is_null()) {
        match value {
            Value::Number(n) => numbers.push(n),
            _ => return false,
        }
    }
    numbers
        .iter()
        .all(|a| numbers.iter().all(|b| a.is_compatible(b)))
}

fn deferred(name: &str, args: &[Value]) -> String {
    let rendered = args
        .iter()
        .filter(|v| !v.is_null())
        .map(Value::to_css)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({})", name, rendered)
}

/// Nearest integer, halves away from zero; values within `1e-11` of a half
/// count as the half.
fn fuzzy_round(value: f64) -> f64 {
    (value + 1e-11_f64.copysign(value)).round()
}

fn map_value(args: &[Value], op: fn(f64) -> f64) -> Result<Value, CompileError> {
    let n = number(args, 0, "number")?;
    Ok(SassNumber::new(op(n.value), n.unit.as_deref()).into())
}

fn extremum(name: &str, args: &[Value]) -> Result<Value, CompileError> {
    required(args, 0, "numbers")?;
    let wanted = if name == "max" {
        Ordering::Greater
    } else {
        Ordering::Less
    };
    let mut best: Option<&SassNumber> = None;
    for value in args {
        let Value::Number(n) = value else {
            return Err(super::type_error("numbers", "number", value));
        };
        best = match best {
            Some(current) if n.compare(current)? != wanted => Some(current),
            _ => Some(n),
        };
    }
    Ok(best.cloned().map(Value::Number).unwrap_or(Value::Null))
}

/// `n`'s magnitude in `base`'s unit.
fn in_unit_of(base: &SassNumber, n: &SassNumber) -> Result<f64, CompileError> {
    match (&base.unit, &n.unit) {
        (Some(unit), Some(_)) => Ok(n.convert_to(unit)?.value),
        _ => Ok(n.value),
    }
}

fn to_radians(n: &SassNumber) -> Result<f64, CompileError> {
    if n.is_unitless() {
        return Ok(n.value);
    }
    Ok(n.convert_to("deg")?.value.to_radians())
}

fn random(args: &[Value]) -> Result<Value, CompileError> {
    let mut rng = rand::thread_rng();
    match args.first().filter(|v| !v.is_null()) {
        None => Ok(Value::number(rng.gen::<f64>(), None)),
        Some(_) => {
            let limit = number(args, 0, "limit")?;
            if !limit.is_integer() || limit.value < 1.0 {
                return Err(CompileError::invalid_argument(format!(
                    "$limit: Must be an integer greater than zero, was {}",
                    limit.to_css()
                )));
            }
            let upper = limit.value.round() as i64;
            Ok(Value::number(rng.gen_range(1..=upper) as f64, None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(v: f64) -> Value {
        Value::number(v, Some("px"))
    }

    fn call(name: &str, args: Vec<Value>) -> String {
        MathFunctions.handle(name, args).unwrap().to_css()
    }

    #[test]
    fn rounding_family() {
        assert_eq!(call("round", vec![px(2.5)]), "3px");
        assert_eq!(call("round", vec![px(-2.5)]), "-3px");
        assert_eq!(call("round", vec![px(-2.4)]), "-2px");
        assert_eq!(call("round", vec![px(2.4999999999999)]), "3px");
        assert_eq!(call("ceil", vec![px(2.1)]), "3px");
        assert_eq!(call("floor", vec![px(2.9)]), "2px");
        assert_eq!(call("abs", vec![px(-4.0)]), "4px");
    }

    #[test]
    fn max_and_min_convert_units() {
        assert_eq!(call("max", vec![px(10.0), Value::number(1.0, Some("in"))]), "1in");
        assert_eq!(call("min", vec![px(10.0), px(3.0), px(7.0)]), "3px");
    }

    #[test]
    fn incompatible_operands_defer_to_css() {
        assert_eq!(
            call("min", vec![Value::number(100.0, Some("%")), px(500.0)]),
            "min(100%, 500px)"
        );
        assert_eq!(
            call("max", vec![px(1.0), Value::unquoted("var(--x)")]),
            "max(1px, var(--x))"
        );
    }

    #[test]
    fn inspection_functions_always_compute() {
        assert_eq!(call("compatible", vec![px(1.0), Value::number(1.0, Some("s"))]), "false");
        assert_eq!(call("is-unitless", vec![Value::number(3.0, None)]), "true");
    }

    #[test]
    fn percentage_and_div() {
        assert_eq!(call("percentage", vec![Value::number(0.25, None)]), "25%");
        assert_eq!(call("div", vec![px(10.0), Value::number(4.0, None)]), "2.5px");
        assert!(MathFunctions
            .handle("div", vec![px(10.0), Value::number(0.0, None)])
            .is_err());
    }

    #[test]
    fn trigonometry_uses_angle_units() {
        assert_eq!(call("sin", vec![Value::number(90.0, Some("deg"))]), "1");
        assert_eq!(call("atan2", vec![Value::number(1.0, None), Value::number(1.0, None)]), "45deg");
    }

    #[test]
    fn random_respects_limit() {
        for _ in 0..20 {
            let Value::Number(n) = MathFunctions
                .handle("random", vec![Value::number(3.0, None)])
                .unwrap()
            else {
                panic!("expected number");
            };
            assert!((1.0..=3.0).contains(&n.value) && n.is_integer());
        }
    }
}
