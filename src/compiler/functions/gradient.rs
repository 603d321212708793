//! CSS gradient functions, re-rendered with their arguments regrouped.

use crate::compiler::runtime::ModuleFunctions;
use crate::compiler::values::Value;
use crate::error::CompileError;
use crate::text_reflow::reflow_gradient_args;

pub struct GradientFunctions;

impl ModuleFunctions for GradientFunctions {
    fn namespace(&self) -> Option<&'static str> {
        None
    }

    fn module_functions(&self) -> &'static [&'static str] {
        &[]
    }

    fn global_functions(&self) -> &'static [&'static str] {
        &[
            "linear-gradient",
            "radial-gradient",
            "repeating-linear-gradient",
            "repeating-radial-gradient",
        ]
    }

    fn requires_raw_values(&self) -> bool {
        false
    }

    fn handle(&self, name: &str, args: Vec<Value>) -> Result<Value, CompileError> {
        let rendered: Vec<String> = args
            .iter()
            .map(Value::to_css_unquoted)
            .filter(|text| !text.is_empty())
            .collect();
        let segments = reflow_gradient_args(&rendered);
        Ok(Value::unquoted(format!("{}({})", name, segments.join(", "))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_direction_and_stops_are_regrouped() {
        let args = ["to", "right", "red", "0%", "blue", "100%"]
            .iter()
            .map(|s| Value::unquoted(*s))
            .collect();
        let result = GradientFunctions.handle("linear-gradient", args).unwrap();
        assert_eq!(result.to_css(), "linear-gradient(to right, red 0%, blue 100%)");
    }

    #[test]
    fn already_grouped_arguments_pass_through() {
        let args = vec![
            Value::unquoted("circle at center"),
            Value::unquoted("#fff 0%"),
            Value::unquoted("#000 100%"),
        ];
        let result = GradientFunctions.handle("radial-gradient", args).unwrap();
        assert_eq!(result.to_css(), "radial-gradient(circle at center, #fff 0%, #000 100%)");
    }
}
