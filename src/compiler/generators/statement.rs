//! Statement Compilation Module
//!
//! Helpers for statements that do not produce rules of their own: property
//! declarations, variable assignments, `@debug`/`@warn`/`@error` and the
//! control-flow directives. Each function takes `&mut CodeGen` to reach the
//! current scopes.
//!
//! ## Control flow
//! `@if`, `@each`, `@for` and `@while` are shared between style blocks and
//! function bodies. The caller passes the runner used for each iteration's
//! body; a runner returning [`ControlFlow::Break`] (an `@return` inside a
//! function) stops the loop and is handed back up.

use std::ops::ControlFlow;

use num_traits::ToPrimitive;

use crate::ast::{Declaration, Expr, MessageKind, Node};
use crate::codegen::CodeGen;
use crate::compiler::generators::expression::{evaluate, interpolate};
use crate::compiler::runtime::normalize_name;
use crate::compiler::values::{SassNumber, Value};
use crate::error::{CompileError, CompileErrorKind, Result};

/// `Break` carries the value of an `@return`.
pub type Flow = ControlFlow<Value>;

// ============================================================================
// Simple Statement Helpers
// ============================================================================

/// Compiles `property: value` and any nested properties into declaration
/// lines. Null and empty values produce no line.
pub fn compile_declaration(
    cg: &mut CodeGen<'_>,
    declaration: &Declaration,
    prefix: Option<&str>,
) -> Result<Vec<String>> {
    let name = interpolate(cg, &declaration.property)?;
    let property = match prefix {
        Some(prefix) => format!("{}-{}", prefix, name),
        None => name,
    };
    let mut lines = Vec::new();
    if let Some(expr) = &declaration.value {
        let value = evaluate(cg, expr)?;
        let mut text = cg.formatter.format(&value);
        if !text.is_empty() {
            if declaration.important {
                text.push_str(" !important");
            }
            lines.push(format!("{}: {};", property, text));
        }
    }
    for node in &declaration.nested {
        match node {
            Node::Property(nested) => {
                lines.extend(compile_declaration(cg, nested, Some(&property))?);
            }
            Node::Comment { text, .. } => lines.push(text.clone()),
            other => {
                let body = cg.compile_nodes(std::slice::from_ref(other), 0)?;
                lines.extend(body.declarations);
            }
        }
    }
    Ok(lines)
}

/// Compiles `$name: value` with its `!default`/`!global` flags, or
/// `module.$name: value`.
pub fn compile_variable_decl(
    cg: &mut CodeGen<'_>,
    namespace: Option<&str>,
    name: &str,
    value: &Expr,
    default: bool,
    global: bool,
) -> Result<()> {
    if let Some(namespace) = namespace {
        let value = evaluate(cg, value)?;
        return cg.assign_namespaced_variable(namespace, name, value);
    }
    if default {
        let existing = if global {
            cg.env
                .borrow()
                .variables
                .get(&normalize_name(name))
                .cloned()
        } else {
            cg.lookup_variable(name)
        };
        if existing.is_some_and(|value| !value.is_null()) {
            return Ok(());
        }
    }
    let value = evaluate(cg, value)?;
    cg.assign_variable(name, value, global);
    Ok(())
}

/// `@debug`, `@warn` and `@error`.
pub fn compile_message(cg: &mut CodeGen<'_>, kind: MessageKind, value: &Expr, line: usize) -> Result<()> {
    let text = match evaluate(cg, value)? {
        Value::String(string) => string.text,
        other => other.inspect(),
    };
    match kind {
        MessageKind::Debug => tracing::debug!("{}:{} DEBUG: {}", cg.current_file, line, text),
        MessageKind::Warn => tracing::warn!("{}:{} WARNING: {}", cg.current_file, line, text),
        MessageKind::Error => {
            return Err(CompileError::new(CompileErrorKind::User(text))
                .at(&cg.current_file, line)
                .into())
        }
    }
    Ok(())
}

// ============================================================================
// Control Flow
// ============================================================================

/// Runs an `@if`, `@each`, `@for` or `@while` node, calling `run` for every
/// body that executes.
pub fn compile_control<'a, F>(cg: &mut CodeGen<'a>, node: &Node, run: &mut F) -> Result<Flow>
where
    F: FnMut(&mut CodeGen<'a>, &[Node]) -> Result<Flow>,
{
    match node {
        Node::If { conditions, .. } => {
            for condition in conditions {
                let taken = match &condition.test {
                    Some(test) => evaluate(cg, test)?.is_truthy(),
                    None => true,
                };
                if taken {
                    return run_scoped(cg, &condition.body, run);
                }
            }
            Ok(ControlFlow::Continue(()))
        }
        Node::Each {
            variables,
            list,
            body,
            ..
        } => compile_each(cg, variables, list, body, run),
        Node::For {
            variable,
            from,
            to,
            inclusive,
            body,
            ..
        } => compile_for(cg, variable, from, to, *inclusive, body, run),
        Node::While {
            condition, body, ..
        } => {
            while evaluate(cg, condition)?.is_truthy() {
                let flow = run_scoped(cg, body, run)?;
                if flow.is_break() {
                    return Ok(flow);
                }
            }
            Ok(ControlFlow::Continue(()))
        }
        _ => Ok(ControlFlow::Continue(())),
    }
}

/// Runs `body` in a new block scope. Outside any rule the scope is
/// semi-global: assignments to existing globals reach them.
fn run_scoped<'a, F>(cg: &mut CodeGen<'a>, body: &[Node], run: &mut F) -> Result<Flow>
where
    F: FnMut(&mut CodeGen<'a>, &[Node]) -> Result<Flow>,
{
    let semi_global = cg.in_semi_global_scope();
    cg.with_frame(semi_global, |cg| run(cg, body))
}

fn compile_each<'a, F>(
    cg: &mut CodeGen<'a>,
    variables: &[String],
    list: &Expr,
    body: &[Node],
    run: &mut F,
) -> Result<Flow>
where
    F: FnMut(&mut CodeGen<'a>, &[Node]) -> Result<Flow>,
{
    let items = evaluate(cg, list)?.as_list();
    let semi_global = cg.in_semi_global_scope();
    for item in items {
        let flow = cg.with_frame(semi_global, |cg| {
            if let [variable] = variables {
                cg.define_local(variable, item);
            } else {
                let members = item.as_list();
                for (index, variable) in variables.iter().enumerate() {
                    let member = members.get(index).cloned().unwrap_or(Value::Null);
                    cg.define_local(variable, member);
                }
            }
            run(cg, body)
        })?;
        if flow.is_break() {
            return Ok(flow);
        }
    }
    Ok(ControlFlow::Continue(()))
}

fn loop_bound(cg: &mut CodeGen<'_>, expr: &Expr) -> Result<SassNumber> {
    match evaluate(cg, expr)? {
        Value::Number(number) => Ok(number),
        other => Err(CompileError::invalid_argument(format!(
            "{} is not a number",
            other.inspect()
        ))
        .into()),
    }
}

#[allow(clippy::too_many_arguments)]
fn compile_for<'a, F>(
    cg: &mut CodeGen<'a>,
    variable: &str,
    from: &Expr,
    to: &Expr,
    inclusive: bool,
    body: &[Node],
    run: &mut F,
) -> Result<Flow>
where
    F: FnMut(&mut CodeGen<'a>, &[Node]) -> Result<Flow>,
{
    let from = loop_bound(cg, from)?;
    let to = loop_bound(cg, to)?;
    let to = if from.is_unitless() { to } else { to.convert_to(from.unit_str())? };
    let unit = from.unit.clone().or_else(|| to.unit.clone());
    let integer = |number: &SassNumber| {
        number
            .value
            .round()
            .to_i64()
            .ok_or_else(|| CompileErrorKind::InvalidNumber(number.to_css()))
    };
    let (start, end) = (integer(&from)?, integer(&to)?);
    let steps: Vec<i64> = match (start <= end, inclusive) {
        (true, true) => (start..=end).collect(),
        (true, false) => (start..end).collect(),
        (false, true) => (end..=start).rev().collect(),
        (false, false) => (end + 1..=start).rev().collect(),
    };
    let semi_global = cg.in_semi_global_scope();
    for step in steps {
        let value = Value::number(step as f64, unit.as_deref());
        let flow = cg.with_frame(semi_global, |cg| {
            cg.define_local(variable, value);
            run(cg, body)
        })?;
        if flow.is_break() {
            return Ok(flow);
        }
    }
    Ok(ControlFlow::Continue(()))
}

// ============================================================================
// Function Bodies
// ============================================================================

/// Runs a `@function` body, returning the value of the `@return` reached.
pub fn run_function_body(cg: &mut CodeGen<'_>, body: &[Node]) -> Result<Option<Value>> {
    Ok(match execute_function_nodes(cg, body)? {
        ControlFlow::Break(value) => Some(value),
        ControlFlow::Continue(()) => None,
    })
}

fn execute_function_nodes(cg: &mut CodeGen<'_>, nodes: &[Node]) -> Result<Flow> {
    for node in nodes {
        let flow = execute_function_node(cg, node).map_err(|err| cg.locate(err, node.line()))?;
        if flow.is_break() {
            return Ok(flow);
        }
    }
    Ok(ControlFlow::Continue(()))
}

fn execute_function_node(cg: &mut CodeGen<'_>, node: &Node) -> Result<Flow> {
    match node {
        Node::Return { value, .. } => Ok(ControlFlow::Break(evaluate(cg, value)?)),
        Node::VariableDecl {
            namespace,
            name,
            value,
            default,
            global,
            ..
        } => {
            compile_variable_decl(cg, namespace.as_deref(), name, value, *default, *global)?;
            Ok(ControlFlow::Continue(()))
        }
        Node::If { .. } | Node::Each { .. } | Node::For { .. } | Node::While { .. } => {
            compile_control(cg, node, &mut |cg, nodes| execute_function_nodes(cg, nodes))
        }
        Node::Message { kind, value, line } => {
            compile_message(cg, *kind, value, *line)?;
            Ok(ControlFlow::Continue(()))
        }
        Node::Comment { .. } => Ok(ControlFlow::Continue(())),
        other => Err(CompileError::invalid_argument(format!(
            "{} is not allowed in a function body",
            statement_name(other)
        ))
        .into()),
    }
}

fn statement_name(node: &Node) -> &'static str {
    match node {
        Node::Rule { .. } => "A style rule",
        Node::Property(_) | Node::CustomProperty { .. } => "A declaration",
        Node::Include { .. } => "@include",
        Node::Content { .. } => "@content",
        Node::MixinDef { .. } => "@mixin",
        Node::FunctionDef { .. } => "@function",
        Node::Use { .. } | Node::Forward { .. } | Node::Import { .. } => "Loading a module",
        _ => "This at-rule",
    }
}
