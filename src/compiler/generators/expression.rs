//! Expression Evaluation Module
//!
//! Turns [`Expr`] trees into [`Value`]s against the code generator's scopes.
//!
//! ## Slash handling
//! `/` between two literals (`font: 12px/1.5`) is a separator, not a
//! division. It divides when either operand is calculated (a variable, a
//! call, a parenthesized or arithmetic expression) or when the whole
//! expression sits inside parentheses or another arithmetic operation.
//!
//! ## Function dispatch
//! 1. `if()` and `calc()` are evaluated here since they need unevaluated
//!    arguments.
//! 2. User `@function`s, including those reached through a namespace or an
//!    `@use ... as *` module.
//! 3. The `meta` and `string` builtins, which need compiler state.
//! 4. Callbacks registered with `Compiler::add_function`.
//! 5. The builtin registry.
//! 6. Anything else is plain CSS and is re-emitted as `name(args)`.

use crate::ast::{Argument, BinOp, Expr, Interpolation, InterpolationPart, UnaryOp};
use crate::codegen::{CodeGen, FunctionTarget};
use crate::compiler::runtime::{normalize_name, CallArgs};
use crate::compiler::values::{named_color, SassColor, SassFunction, SassList, SassMap, SassNumber, SassString, Value};
use crate::error::{CompileError, CompileErrorKind, Result};
use crate::lexer::parse_hex_color;

// ============================================================================
// Expressions
// ============================================================================

pub fn evaluate(cg: &mut CodeGen<'_>, expr: &Expr) -> Result<Value> {
    evaluate_with(cg, expr, false)
}

/// `divide` forces `/` to divide even between two literals.
fn evaluate_with(cg: &mut CodeGen<'_>, expr: &Expr, divide: bool) -> Result<Value> {
    match expr {
        Expr::Number { value, unit, .. } => Ok(Value::number(*value, unit.as_deref())),
        Expr::StringLiteral { value, .. } => Ok(Value::quoted(interpolate(cg, value)?)),
        Expr::Identifier { name, .. } => Ok(Value::unquoted(name.clone())),
        Expr::Interpolation(interpolation) => Ok(Value::unquoted(interpolate(cg, interpolation)?)),
        Expr::HexColor {
            value,
            line,
            column,
        } => {
            let (red, green, blue, alpha) = parse_hex_color(value, *line, *column)?;
            Ok(Value::Color(SassColor::from_literal(red, green, blue, alpha, value)))
        }
        Expr::ColorLiteral { name, .. } => Ok(match named_color(name) {
            Some((red, green, blue, alpha)) => {
                Value::Color(SassColor::from_literal(red, green, blue, alpha, name))
            }
            None => Value::unquoted(name.clone()),
        }),
        Expr::Boolean { value, .. } => Ok(Value::Bool(*value)),
        Expr::Null { .. } => Ok(Value::Null),
        Expr::Variable { name, .. } => cg
            .lookup_variable(name)
            .ok_or_else(|| CompileErrorKind::UndefinedVariable(name.clone()).into()),
        Expr::PropertyAccess {
            namespace, name, ..
        } => cg.namespaced_variable(namespace, name),
        Expr::List {
            items,
            separator,
            bracketed,
            ..
        } => {
            let values = items
                .iter()
                .map(|item| evaluate_with(cg, item, false))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::List(SassList {
                values,
                separator: *separator,
                bracketed: *bracketed,
            }))
        }
        Expr::Map { pairs, .. } => {
            let mut map = SassMap::new();
            for (key, value) in pairs {
                let key = evaluate(cg, key)?;
                let value = evaluate(cg, value)?;
                map.insert(key, value);
            }
            Ok(Value::Map(map))
        }
        Expr::Binary {
            op, left, right, ..
        } => evaluate_binary(cg, *op, left, right, divide),
        Expr::Unary { op, operand, .. } => {
            let value = evaluate_with(cg, operand, true)?;
            Ok(match (*op, value) {
                (UnaryOp::Not, value) => Value::Bool(!value.is_truthy()),
                (UnaryOp::Minus, Value::Number(number)) => Value::Number(number.negate()),
                (UnaryOp::Minus, value) => Value::unquoted(format!("-{}", cg.formatter.format(&value))),
                (UnaryOp::Plus, Value::Number(number)) => Value::Number(number),
                (UnaryOp::Plus, value) => Value::unquoted(format!("+{}", cg.formatter.format(&value))),
            })
        }
        Expr::Paren { inner, .. } => evaluate_with(cg, inner, true),
        Expr::FunctionCall {
            namespace,
            name,
            args,
            ..
        } => call_function(cg, namespace.as_deref(), name, args),
        Expr::Url { value, .. } => Ok(Value::unquoted(format!("url({})", interpolate(cg, value)?))),
        Expr::ParentSelector { .. } => Ok(cg
            .selector
            .clone()
            .map(Value::unquoted)
            .unwrap_or(Value::Null)),
        Expr::Important { .. } => Ok(Value::unquoted("!important")),
    }
}

fn evaluate_binary(
    cg: &mut CodeGen<'_>,
    op: BinOp,
    left: &Expr,
    right: &Expr,
    divide: bool,
) -> Result<Value> {
    match op {
        BinOp::And => {
            let left = evaluate_with(cg, left, true)?;
            if !left.is_truthy() {
                return Ok(left);
            }
            evaluate_with(cg, right, true)
        }
        BinOp::Or => {
            let left = evaluate_with(cg, left, true)?;
            if left.is_truthy() {
                return Ok(left);
            }
            evaluate_with(cg, right, true)
        }
        BinOp::Div if !divide && !left.is_calculated() && !right.is_calculated() => {
            let left = evaluate_with(cg, left, false)?;
            let right = evaluate_with(cg, right, false)?;
            Ok(Value::unquoted(format!(
                "{}/{}",
                cg.formatter.format(&left),
                cg.formatter.format(&right)
            )))
        }
        _ => {
            let left = evaluate_with(cg, left, true)?;
            let right = evaluate_with(cg, right, true)?;
            apply_operator(cg, op, left, right)
        }
    }
}

fn undefined_operation(cg: &CodeGen<'_>, left: &Value, op: BinOp, right: &Value) -> CompileError {
    CompileErrorKind::UndefinedOperation(format!(
        "{} {} {}",
        cg.formatter.format(left),
        op.symbol(),
        cg.formatter.format(right)
    ))
    .into()
}

fn apply_operator(cg: &CodeGen<'_>, op: BinOp, left: Value, right: Value) -> Result<Value> {
    let text = |value: &Value| cg.formatter.format(value);
    let value = match (op, &left, &right) {
        (BinOp::Eq, _, _) => Value::Bool(left.sass_eq(&right)),
        (BinOp::NotEq, _, _) => Value::Bool(!left.sass_eq(&right)),
        (BinOp::Lt | BinOp::Gt | BinOp::LtE | BinOp::GtE, Value::Number(a), Value::Number(b)) => {
            let ordering = a.compare(b)?;
            Value::Bool(match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::Gt => ordering.is_gt(),
                BinOp::LtE => ordering.is_le(),
                _ => ordering.is_ge(),
            })
        }
        (BinOp::Add, Value::Number(a), Value::Number(b)) => Value::Number(a.add(b)?),
        (BinOp::Add, Value::String(a), _) => Value::String(SassString {
            text: format!("{}{}", a.text, right.to_css_unquoted()),
            quoted: a.quoted,
        }),
        (BinOp::Add, _, Value::String(b)) => Value::String(SassString {
            text: format!("{}{}", text(&left), b.text),
            quoted: b.quoted,
        }),
        (BinOp::Add, Value::Number(_), _) | (BinOp::Add, _, Value::Number(_)) => {
            return Err(undefined_operation(cg, &left, op, &right).into())
        }
        (BinOp::Add, _, _) => Value::unquoted(format!("{}+{}", text(&left), text(&right))),
        (BinOp::Sub, Value::Number(a), Value::Number(b)) => Value::Number(a.subtract(b)?),
        (BinOp::Sub, _, _) => Value::unquoted(format!("{}-{}", text(&left), text(&right))),
        (BinOp::Mul, Value::Number(a), Value::Number(b)) => Value::Number(a.multiply(b)),
        (BinOp::Div, Value::Number(a), Value::Number(b)) => Value::Number(a.divide(b)?),
        (BinOp::Div, _, _) => Value::unquoted(format!("{}/{}", text(&left), text(&right))),
        (BinOp::Mod, Value::Number(a), Value::Number(b)) => Value::Number(a.modulo(b)?),
        _ => return Err(undefined_operation(cg, &left, op, &right).into()),
    };
    Ok(value)
}

/// Render `#{}` text: strings lose their quotes and `null` disappears.
pub fn interpolate(cg: &mut CodeGen<'_>, interpolation: &Interpolation) -> Result<String> {
    let mut out = String::new();
    for part in &interpolation.parts {
        match part {
            InterpolationPart::Literal(text) => out.push_str(text),
            InterpolationPart::Expr(expr) => match evaluate(cg, expr)? {
                Value::String(string) => out.push_str(&string.text),
                Value::Null => {}
                other => out.push_str(&cg.formatter.format(&other)),
            },
        }
    }
    Ok(out)
}

// ============================================================================
// Function calls
// ============================================================================

pub fn evaluate_args(cg: &mut CodeGen<'_>, args: &[Argument]) -> Result<CallArgs> {
    let mut call = CallArgs::default();
    for arg in args {
        let value = evaluate(cg, &arg.value)?;
        if arg.rest {
            match value {
                Value::Map(map) => {
                    for (key, value) in map.iter() {
                        call.named
                            .insert(normalize_name(&key.to_css_unquoted()), value.clone());
                    }
                }
                Value::List(list) => call.positional.extend(list.values),
                other => call.positional.push(other),
            }
        } else if let Some(name) = &arg.name {
            call.named.insert(normalize_name(name), value);
        } else {
            call.positional.push(value);
        }
    }
    Ok(call)
}

fn call_function(
    cg: &mut CodeGen<'_>,
    namespace: Option<&str>,
    name: &str,
    args: &[Argument],
) -> Result<Value> {
    if namespace.is_none() {
        match name {
            "if" => return call_if(cg, args),
            "calc" if args.len() == 1 && !args[0].rest && args[0].name.is_none() => {
                return Ok(match calc_term(cg, &args[0].value)? {
                    CalcTerm::Number(number) => Value::Number(number),
                    CalcTerm::Text(text) => Value::unquoted(format!("calc({})", text)),
                });
            }
            _ => {}
        }
    }
    let call_args = evaluate_args(cg, args)?;
    invoke(cg, namespace, name, call_args)
}

/// Call a function by name with evaluated arguments.
pub fn invoke(
    cg: &mut CodeGen<'_>,
    namespace: Option<&str>,
    name: &str,
    args: CallArgs,
) -> Result<Value> {
    match cg.lookup_function(namespace, name)? {
        Some(FunctionTarget::User(function)) => cg.call_user_function(&function, args),
        Some(FunctionTarget::Builtin(module)) => call_builtin(cg, &module, name, args),
        None => match namespace {
            Some(namespace) => Err(CompileErrorKind::UnknownFunction(format!("{}.{}", namespace, name)).into()),
            None => call_global(cg, name, args),
        },
    }
}

fn call_builtin(cg: &mut CodeGen<'_>, module: &str, name: &str, args: CallArgs) -> Result<Value> {
    let registry = cg.registry;
    if registry.is_intrinsic(Some(module), name) {
        return codegen_function(cg, &normalize_name(name), args);
    }
    match registry.call(Some(module), name, args, &cg.formatter) {
        Some(result) => Ok(result?),
        None => Err(CompileErrorKind::UnknownFunction(format!("{}.{}", module, name)).into()),
    }
}

fn call_global(cg: &mut CodeGen<'_>, name: &str, args: CallArgs) -> Result<Value> {
    let normalized = normalize_name(name);
    if cg.registry.is_intrinsic(None, &normalized) {
        return codegen_function(cg, &normalized, args);
    }
    let callbacks = cg.callbacks;
    if let Some(callback) = callbacks.get(&normalized) {
        let mut values = args.positional;
        values.extend(args.named.into_values());
        return Ok(callback(&values)?);
    }
    let registry = cg.registry;
    if registry.contains(None, name) {
        if let Some(result) = registry.call(None, name, args, &cg.formatter) {
            return Ok(result?);
        }
        return Err(CompileErrorKind::UnknownFunction(name.to_string()).into());
    }
    Ok(Value::unquoted(plain_css_call(cg, name, &args)))
}

/// `name(a, b, $key: c)` for functions Sass does not know.
fn plain_css_call(cg: &CodeGen<'_>, name: &str, args: &CallArgs) -> String {
    let mut parts: Vec<String> = args
        .positional
        .iter()
        .map(|value| cg.formatter.format(value))
        .collect();
    parts.extend(
        args.named
            .iter()
            .map(|(key, value)| format!("${}: {}", key, cg.formatter.format(value))),
    );
    format!("{}({})", name, parts.join(", "))
}

/// `if($condition, $if-true, $if-false)`; only the chosen branch is evaluated.
fn call_if(cg: &mut CodeGen<'_>, args: &[Argument]) -> Result<Value> {
    let mut slots: [Option<&Expr>; 3] = [None, None, None];
    let mut position = 0;
    for arg in args {
        let index = match arg.name.as_deref().map(normalize_name).as_deref() {
            Some("condition") => 0,
            Some("if-true") => 1,
            Some("if-false") => 2,
            Some(other) => {
                return Err(CompileError::invalid_argument(format!("No argument named ${} for if()", other)).into())
            }
            None => {
                position += 1;
                position - 1
            }
        };
        if index > 2 {
            return Err(CompileError::invalid_argument("if() takes at most 3 arguments").into());
        }
        slots[index] = Some(&arg.value);
    }
    let condition = slots[0]
        .ok_or_else(|| CompileError::invalid_argument("Missing argument $condition for if()"))?;
    let branch = if evaluate(cg, condition)?.is_truthy() {
        slots[1]
    } else {
        slots[2]
    };
    match branch {
        Some(expr) => evaluate(cg, expr),
        None => Ok(Value::Null),
    }
}

// ============================================================================
// calc()
// ============================================================================

enum CalcTerm {
    Number(SassNumber),
    Text(String),
}

impl CalcTerm {
    fn text(&self) -> String {
        match self {
            CalcTerm::Number(number) => number.to_css(),
            CalcTerm::Text(text) => text.clone(),
        }
    }
}

/// Fold what can be folded; keep the rest as CSS for the browser.
fn calc_term(cg: &mut CodeGen<'_>, expr: &Expr) -> Result<CalcTerm> {
    match expr {
        Expr::Binary {
            op: op @ (BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div),
            left,
            right,
            ..
        } => {
            let left = calc_term(cg, left)?;
            let right = calc_term(cg, right)?;
            if let (CalcTerm::Number(a), CalcTerm::Number(b)) = (&left, &right) {
                let folded = match op {
                    BinOp::Add if a.is_compatible(b) => Some(a.add(b)?),
                    BinOp::Sub if a.is_compatible(b) => Some(a.subtract(b)?),
                    BinOp::Mul => Some(a.multiply(b)),
                    BinOp::Div => Some(a.divide(b)?),
                    _ => None,
                };
                if let Some(number) = folded {
                    return Ok(CalcTerm::Number(number));
                }
            }
            Ok(CalcTerm::Text(format!(
                "{} {} {}",
                left.text(),
                op.symbol(),
                right.text()
            )))
        }
        Expr::Paren { inner, .. } => Ok(match calc_term(cg, inner)? {
            CalcTerm::Text(text) => CalcTerm::Text(format!("({})", text)),
            number => number,
        }),
        Expr::FunctionCall {
            namespace: None,
            name,
            args,
            ..
        } if name == "calc" && args.len() == 1 => Ok(match calc_term(cg, &args[0].value)? {
            CalcTerm::Text(text) => CalcTerm::Text(format!("({})", text)),
            number => number,
        }),
        other => Ok(match evaluate(cg, other)? {
            Value::Number(number) => CalcTerm::Number(number),
            value => CalcTerm::Text(cg.formatter.format(&value)),
        }),
    }
}

// ============================================================================
// meta and string
// ============================================================================

fn argument(values: &[Value], index: usize, param: &str, function: &str) -> Result<Value> {
    values.get(index).cloned().ok_or_else(|| {
        CompileError::invalid_argument(format!("Missing argument ${} for {}()", param, function))
            .into()
    })
}

/// Text of a string argument, or its CSS for anything else.
fn text_of(value: &Value) -> String {
    value.to_css_unquoted()
}

fn optional_module(values: &[Value], index: usize) -> Option<String> {
    values
        .get(index)
        .filter(|value| !value.is_null())
        .map(text_of)
}

fn codegen_function(cg: &mut CodeGen<'_>, name: &str, args: CallArgs) -> Result<Value> {
    tracing::trace!("builtin {}", name);
    if name == "call" {
        return call_function_value(cg, args);
    }
    let signature: &[&str] = match name {
        "type-of" | "inspect" => &["value"],
        "variable-exists" => &["name"],
        "global-variable-exists" | "function-exists" | "mixin-exists" => &["name", "module"],
        "get-function" => &["name", "css", "module"],
        _ => &["string"],
    };
    let values = args.normalize(signature)?;
    let first = argument(&values, 0, signature[0], name)?;
    let value = match name {
        "type-of" => Value::unquoted(first.type_name()),
        "inspect" => Value::unquoted(first.inspect()),
        "variable-exists" => Value::Bool(cg.lookup_variable(&text_of(&first)).is_some()),
        "global-variable-exists" => {
            let variable = text_of(&first);
            Value::Bool(match optional_module(&values, 1) {
                Some(module) => cg.namespaced_variable(&module, &variable).is_ok(),
                None => cg
                    .env
                    .borrow()
                    .variables
                    .contains_key(&normalize_name(&variable)),
            })
        }
        "function-exists" => {
            let function = text_of(&first);
            let module = optional_module(&values, 1);
            let user = cg.lookup_function(module.as_deref(), &function)?.is_some();
            let builtin = module.is_none()
                && (cg.registry.contains(None, &function)
                    || cg.callbacks.contains_key(&normalize_name(&function)));
            Value::Bool(user || builtin)
        }
        "mixin-exists" => {
            let module = optional_module(&values, 1);
            Value::Bool(cg.lookup_mixin(module.as_deref(), &text_of(&first))?.is_some())
        }
        "get-function" => Value::Function(SassFunction {
            namespace: optional_module(&values, 2),
            name: text_of(&first),
        }),
        "unquote" => Value::unquoted(text_of(&first)),
        "quote" => Value::quoted(text_of(&first)),
        "to-upper-case" | "to-lower-case" => match first {
            Value::String(string) => Value::String(SassString {
                text: if name == "to-upper-case" {
                    string.text.to_ascii_uppercase()
                } else {
                    string.text.to_ascii_lowercase()
                },
                quoted: string.quoted,
            }),
            other => {
                return Err(CompileError::invalid_argument(format!(
                    "$string: {} is not a string",
                    other.inspect()
                ))
                .into())
            }
        },
        _ => return Err(CompileErrorKind::UnknownFunction(name.to_string()).into()),
    };
    Ok(value)
}

/// `call($function, $args...)`
fn call_function_value(cg: &mut CodeGen<'_>, mut args: CallArgs) -> Result<Value> {
    let target = match args.named.shift_remove("function") {
        Some(target) => target,
        None if !args.positional.is_empty() => args.positional.remove(0),
        None => return Err(CompileError::invalid_argument("Missing argument $function for call()").into()),
    };
    match target {
        Value::Function(function) => invoke(cg, function.namespace.as_deref(), &function.name, args),
        Value::String(string) => invoke(cg, None, &string.text, args),
        other => Err(CompileError::invalid_argument(format!(
            "$function: {} is not a function reference",
            other.inspect()
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::runtime::FunctionRegistry;
    use crate::compiler::strategies::StrategyRegistry;
    use crate::compiler::CustomFunction;
    use crate::loader::MemoryLoader;
    use crate::options::CompilerOptions;
    use crate::parser::parse_expression;
    use indexmap::IndexMap;

    fn eval(source: &str) -> Result<String> {
        let options = CompilerOptions::default();
        let registry = FunctionRegistry::default();
        let callbacks: IndexMap<String, CustomFunction> = IndexMap::new();
        let loader = MemoryLoader::default();
        let strategies = StrategyRegistry::default();
        let mut cg = CodeGen::new(&options, &registry, &callbacks, &loader, &strategies, "test.scss");
        cg.assign_variable("width", Value::number(100.0, Some("px")), false);
        let expr = parse_expression(source)?;
        let value = evaluate(&mut cg, &expr)?;
        Ok(cg.formatter.format(&value))
    }

    #[test]
    fn literal_slash_is_a_separator() {
        assert_eq!(eval("12px/1.5").unwrap(), "12px/1.5");
        assert_eq!(eval("(12px/2)").unwrap(), "6px");
        assert_eq!(eval("$width/4").unwrap(), "25px");
    }

    #[test]
    fn strings_concatenate() {
        assert_eq!(eval("\"foo\" + bar").unwrap(), "\"foobar\"");
        assert_eq!(eval("foo + \"bar\"").unwrap(), "foobar");
        assert_eq!(eval("1 + \"a\"").unwrap(), "\"1a\"");
    }

    #[test]
    fn calc_folds_compatible_terms() {
        assert_eq!(eval("calc($width + 2px)").unwrap(), "102px");
        assert_eq!(eval("calc(100% - 20px)").unwrap(), "calc(100% - 20px)");
    }

    #[test]
    fn if_only_evaluates_the_chosen_branch() {
        assert_eq!(eval("if(true, 1px, $missing)").unwrap(), "1px");
        assert_eq!(eval("if($condition: false, $if-true: a, $if-false: b)").unwrap(), "b");
    }

    #[test]
    fn unknown_functions_are_plain_css() {
        assert_eq!(eval("var(--gap)").unwrap(), "var(--gap)");
    }

    #[test]
    fn meta_functions_inspect_values() {
        assert_eq!(eval("type-of(1px)").unwrap(), "number");
        assert_eq!(eval("type-of(\"a\")").unwrap(), "string");
        assert_eq!(eval("variable-exists(width)").unwrap(), "true");
        assert_eq!(eval("unquote(\"a b\")").unwrap(), "a b");
    }

    #[test]
    fn mixed_operands_are_undefined() {
        assert!(eval("1px + #fff").is_err());
        assert!(eval("$missing").is_err());
    }
}
