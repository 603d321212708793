//! `sass:list`

use super::{arg, number, required};
use crate::ast::ListSeparator;
use crate::compiler::runtime::ModuleFunctions;
use crate::compiler::values::{SassList, Value};
use crate::error::CompileError;

pub struct ListFunctions;

impl ModuleFunctions for ListFunctions {
    fn namespace(&self) -> Option<&'static str> {
        Some("list")
    }

    fn module_functions(&self) -> &'static [&'static str] {
        &[
            "length", "nth", "set-nth", "join", "append", "zip", "index", "separator",
            "is-bracketed", "slash",
        ]
    }

    fn global_functions(&self) -> &'static [&'static str] {
        &[
            "length", "nth", "set-nth", "join", "append", "zip", "index", "list-separator",
            "is-bracketed",
        ]
    }

    fn remap(&self) -> &'static [(&'static str, &'static str)] {
        &[("list-separator", "separator")]
    }

    fn signature(&self, name: &str) -> &'static [&'static str] {
        match name {
            "nth" => &["list", "n"],
            "set-nth" => &["list", "n", "value"],
            "join" => &["list1", "list2", "separator", "bracketed"],
            "append" => &["list", "val", "separator"],
            "index" => &["list", "value"],
            _ => &["list"],
        }
    }

    fn handle(&self, name: &str, args: Vec<Value>) -> Result<Value, CompileError> {
        match name {
            "length" => {
                let list = required(&args, 0, "list")?;
                Ok(Value::number(list.as_list().len() as f64, None))
            }
            "nth" => {
                let items = required(&args, 0, "list")?.as_list();
                let index = position(&args, 1, items.len())?;
                Ok(items[index].clone())
            }
            "set-nth" => {
                let list = required(&args, 0, "list")?;
                let mut items = list.as_list();
                let index = position(&args, 1, items.len())?;
                items[index] = args.get(2).cloned().unwrap_or(Value::Null);
                Ok(rebuild(list, items))
            }
            "join" => {
                let first = required(&args, 0, "list1")?;
                let second = required(&args, 1, "list2")?;
                let separator = match separator_arg(&args, 2)? {
                    Some(sep) => sep,
                    None => joined_separator(first, second),
                };
                let bracketed = match arg(&args, 3) {
                    Some(Value::String(s)) if s.text == "auto" => is_bracketed(first),
                    Some(value) => value.is_truthy(),
                    None => is_bracketed(first),
                };
                let mut values = first.as_list();
                values.extend(second.as_list());
                Ok(Value::List(SassList {
                    values,
                    separator,
                    bracketed,
                }))
            }
            "append" => {
                let list = required(&args, 0, "list")?;
                let mut values = list.as_list();
                values.push(args.get(1).cloned().unwrap_or(Value::Null));
                let separator = match separator_arg(&args, 2)? {
                    Some(sep) => sep,
                    None if matches!(list, Value::List(_)) => list.separator(),
                    None => ListSeparator::Space,
                };
                Ok(Value::List(SassList {
                    values,
                    separator,
                    bracketed: is_bracketed(list),
                }))
            }
            "zip" => {
                let lists: Vec<Vec<Value>> = args
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(Value::as_list)
                    .collect();
                let shortest = lists.iter().map(Vec::len).min().unwrap_or(0);
                let values = (0..shortest)
                    .map(|i| {
                        Value::list(
                            lists.iter().map(|l| l[i].clone()).collect(),
                            ListSeparator::Space,
                        )
                    })
                    .collect();
                Ok(Value::list(values, ListSeparator::Comma))
            }
            "index" => {
                let items = required(&args, 0, "list")?.as_list();
                let needle = args.get(1).cloned().unwrap_or(Value::Null);
                Ok(items
                    .iter()
                    .position(|item| item.sass_eq(&needle))
                    .map(|i| Value::number((i + 1) as f64, None))
                    .unwrap_or(Value::Null))
            }
            "separator" => {
                let list = required(&args, 0, "list")?;
                Ok(Value::unquoted(list.separator().name()))
            }
            "is-bracketed" => Ok(Value::Bool(is_bracketed(required(&args, 0, "list")?))),
            "slash" => {
                let values: Vec<Value> = args.into_iter().filter(|v| !v.is_null()).collect();
                if values.len() < 2 {
                    return Err(CompileError::invalid_argument(
                        "At least two elements are required.",
                    ));
                }
                Ok(Value::list(values, ListSeparator::Slash))
            }
            _ => Err(CompileError::invalid_argument(format!(
                "Unknown list function: {}",
                name
            ))),
        }
    }
}

/// Resolve a 1-based, possibly negative index against a list of `len` items.
fn position(args: &[Value], index: usize, len: usize) -> Result<usize, CompileError> {
    let n = number(args, index, "n")?;
    if !n.is_integer() {
        return Err(CompileError::invalid_argument(format!(
            "$n: {} is not an int",
            n.to_css()
        )));
    }
    let raw = n.value.round() as i64;
    let len_i = len as i64;
    let resolved = if raw < 0 { len_i + raw } else { raw - 1 };
    if raw == 0 || resolved < 0 || resolved >= len_i {
        return Err(CompileError::invalid_argument(format!(
            "$n: Invalid index {} for a list with {} elements",
            raw, len
        )));
    }
    Ok(resolved as usize)
}

fn separator_arg(args: &[Value], index: usize) -> Result<Option<ListSeparator>, CompileError> {
    match arg(args, index) {
        None => Ok(None),
        Some(Value::String(s)) => match s.text.as_str() {
            "auto" => Ok(None),
            "space" => Ok(Some(ListSeparator::Space)),
            "comma" => Ok(Some(ListSeparator::Comma)),
            "slash" => Ok(Some(ListSeparator::Slash)),
            other => Err(CompileError::invalid_argument(format!(
                "$separator: Must be \"space\", \"comma\", \"slash\", or \"auto\", was {}",
                other
            ))),
        },
        Some(other) => Err(super::type_error("separator", "string", other)),
    }
}

/// `join` keeps the first list's separator unless it has fewer than two
/// members, in which case the second list decides.
fn joined_separator(first: &Value, second: &Value) -> ListSeparator {
    if first.as_list().len() >= 2 {
        first.separator()
    } else if second.as_list().len() >= 2 {
        second.separator()
    } else if matches!(first, Value::List(_)) {
        first.separator()
    } else {
        ListSeparator::Space
    }
}

fn is_bracketed(value: &Value) -> bool {
    matches!(value, Value::List(list) if list.bracketed)
}

fn rebuild(original: &Value, values: Vec<Value>) -> Value {
    Value::List(SassList {
        values,
        separator: original.separator(),
        bracketed: is_bracketed(original),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(items: &[&str], separator: ListSeparator) -> Value {
        Value::list(items.iter().map(|s| Value::unquoted(*s)).collect(), separator)
    }

    fn call(name: &str, args: Vec<Value>) -> Value {
        ListFunctions.handle(name, args).unwrap()
    }

    #[test]
    fn nth_is_one_based_and_accepts_negative_indexes() {
        let list = words(&["a", "b", "c"], ListSeparator::Space);
        assert_eq!(call("nth", vec![list.clone(), Value::number(1.0, None)]).to_css(), "a");
        assert_eq!(call("nth", vec![list.clone(), Value::number(-1.0, None)]).to_css(), "c");
        assert!(ListFunctions
            .handle("nth", vec![list, Value::number(4.0, None)])
            .is_err());
    }

    #[test]
    fn length_of_scalar_and_map() {
        assert_eq!(call("length", vec![Value::unquoted("solo")]).to_css(), "1");
        assert_eq!(
            call("length", vec![words(&["a", "b"], ListSeparator::Comma)]).to_css(),
            "2"
        );
    }

    #[test]
    fn join_and_append_keep_separators() {
        let a = words(&["a", "b"], ListSeparator::Comma);
        let b = words(&["c", "d"], ListSeparator::Space);
        assert_eq!(call("join", vec![a.clone(), b]).to_css(), "a, b, c, d");
        assert_eq!(call("append", vec![a, Value::unquoted("z")]).to_css(), "a, b, z");
        assert_eq!(
            call("append", vec![Value::unquoted("x"), Value::unquoted("y")]).to_css(),
            "x y"
        );
    }

    #[test]
    fn index_returns_null_when_missing() {
        let list = words(&["a", "b"], ListSeparator::Space);
        assert_eq!(call("index", vec![list.clone(), Value::unquoted("b")]).to_css(), "2");
        assert!(call("index", vec![list, Value::unquoted("q")]).is_null());
    }

    #[test]
    fn zip_truncates_to_shortest() {
        let result = call(
            "zip",
            vec![
                words(&["1px", "2px", "3px"], ListSeparator::Space),
                words(&["solid", "dashed"], ListSeparator::Space),
            ],
        );
        assert_eq!(result.to_css(), "1px solid, 2px dashed");
    }

    #[test]
    fn set_nth_replaces_in_place() {
        let list = words(&["a", "b", "c"], ListSeparator::Comma);
        let result = call(
            "set-nth",
            vec![list, Value::number(2.0, None), Value::unquoted("x")],
        );
        assert_eq!(result.to_css(), "a, x, c");
    }
}
