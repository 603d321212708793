//! `sass:map`
//!
//! Map functions always receive raw values: a rendered map is text and
//! could no longer be merged or looked up by a later call.

use super::{map, required};
use crate::compiler::runtime::ModuleFunctions;
use crate::compiler::values::{SassMap, Value};
use crate::ast::ListSeparator;
use crate::error::CompileError;

pub struct MapFunctions;

impl ModuleFunctions for MapFunctions {
    fn namespace(&self) -> Option<&'static str> {
        Some("map")
    }

    fn module_functions(&self) -> &'static [&'static str] {
        &["get", "merge", "deep-merge", "remove", "keys", "values", "has-key"]
    }

    fn global_functions(&self) -> &'static [&'static str] {
        &[
            "map-get", "map-merge", "map-remove", "map-keys", "map-values", "map-has-key",
        ]
    }

    fn remap(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("map-get", "get"),
            ("map-merge", "merge"),
            ("map-remove", "remove"),
            ("map-keys", "keys"),
            ("map-values", "values"),
            ("map-has-key", "has-key"),
        ]
    }

    fn signature(&self, name: &str) -> &'static [&'static str] {
        match name {
            "merge" | "deep-merge" => &["map1", "map2"],
            "get" | "has-key" => &["map", "key"],
            _ => &["map"],
        }
    }

    fn handle(&self, name: &str, args: Vec<Value>) -> Result<Value, CompileError> {
        match name {
            "get" => {
                let mut current = map(&args, 0, "map")?;
                let keys = &args[1..];
                required(&args, 1, "key")?;
                for (depth, key) in keys.iter().enumerate() {
                    let Some(found) = current.get(key).cloned() else {
                        return Ok(Value::Null);
                    };
                    if depth + 1 == keys.len() {
                        return Ok(found);
                    }
                    current = match found {
                        Value::Map(inner) => inner,
                        _ => return Ok(Value::Null),
                    };
                }
                Ok(Value::Null)
            }
            "has-key" => {
                let mut current = map(&args, 0, "map")?;
                let keys = &args[1..];
                required(&args, 1, "key")?;
                for (depth, key) in keys.iter().enumerate() {
                    let Some(found) = current.get(key).cloned() else {
                        return Ok(Value::Bool(false));
                    };
                    if depth + 1 == keys.len() {
                        return Ok(Value::Bool(true));
                    }
                    current = match found {
                        Value::Map(inner) => inner,
                        _ => return Ok(Value::Bool(false)),
                    };
                }
                Ok(Value::Bool(false))
            }
            "merge" => {
                let first = map(&args, 0, "map1")?;
                let second = map(&args, 1, "map2")?;
                Ok(Value::Map(first.merge(&second)))
            }
            "deep-merge" => {
                let first = map(&args, 0, "map1")?;
                let second = map(&args, 1, "map2")?;
                Ok(Value::Map(first.deep_merge(&second)))
            }
            "remove" => {
                let mut result: SassMap = map(&args, 0, "map")?;
                for key in args.iter().skip(1) {
                    result.remove(key);
                }
                Ok(Value::Map(result))
            }
            "keys" => Ok(Value::list(map(&args, 0, "map")?.keys(), ListSeparator::Comma)),
            "values" => Ok(Value::list(map(&args, 0, "map")?.values(), ListSeparator::Comma)),
            _ => Err(CompileError::invalid_argument(format!(
                "Unknown map function: {}",
                name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme() -> Value {
        Value::Map(
            [
                (Value::unquoted("primary"), Value::unquoted("blue")),
                (
                    Value::unquoted("sizes"),
                    Value::Map(
                        [(Value::unquoted("sm"), Value::number(4.0, Some("px")))]
                            .into_iter()
                            .collect(),
                    ),
                ),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn get_follows_nested_keys() {
        let result = MapFunctions
            .handle(
                "get",
                vec![theme(), Value::unquoted("sizes"), Value::quoted("sm")],
            )
            .unwrap();
        assert_eq!(result.to_css(), "4px");
        let missing = MapFunctions
            .handle("get", vec![theme(), Value::unquoted("nope")])
            .unwrap();
        assert!(missing.is_null());
    }

    #[test]
    fn merge_overrides_and_appends() {
        let extra: SassMap = [
            (Value::unquoted("primary"), Value::unquoted("red")),
            (Value::unquoted("accent"), Value::unquoted("gold")),
        ]
        .into_iter()
        .collect();
        let merged = MapFunctions
            .handle("merge", vec![theme(), Value::Map(extra)])
            .unwrap();
        let keys = MapFunctions.handle("keys", vec![merged.clone()]).unwrap();
        assert_eq!(keys.to_css(), "primary, sizes, accent");
        let primary = MapFunctions
            .handle("get", vec![merged, Value::unquoted("primary")])
            .unwrap();
        assert_eq!(primary.to_css(), "red");
    }

    #[test]
    fn empty_list_is_an_empty_map() {
        let empty = Value::list(Vec::new(), ListSeparator::Space);
        let result = MapFunctions
            .handle("merge", vec![empty, theme()])
            .unwrap();
        assert_eq!(
            MapFunctions.handle("has-key", vec![result, Value::unquoted("primary")]).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn remove_drops_keys() {
        let result = MapFunctions
            .handle("remove", vec![theme(), Value::unquoted("sizes")])
            .unwrap();
        assert_eq!(MapFunctions.handle("keys", vec![result]).unwrap().to_css(), "primary");
    }
}
