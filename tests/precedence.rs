use pretty_assertions::assert_eq;
use sass_compiler::*;

fn value(expr: &str) -> String {
    let source = format!(".a {{ v: {}; }}", expr);
    let css = Compiler::default()
        .compile_string(&source, None)
        .unwrap_or_else(|err| panic!("{} failed: {}", expr, err));
    css.strip_prefix(".a {\n  v: ")
        .and_then(|rest| rest.strip_suffix(";\n}\n"))
        .unwrap_or_else(|| panic!("unexpected output: {:?}", css))
        .to_string()
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    assert_eq!(value("2 + 3 * 4"), "14");
    assert_eq!(value("2 * 3 + 4 * 5"), "26");
}

#[test]
fn test_parentheses_override_precedence() {
    assert_eq!(value("(2 + 3) * 4"), "20");
}

#[test]
fn test_subtraction_is_left_associative() {
    assert_eq!(value("10 - 4 - 3"), "3");
}

#[test]
fn test_division_operand_of_arithmetic_divides() {
    assert_eq!(value("10px / 2 * 3"), "15px");
    assert_eq!(value("1 + 2 * 3 - 4 / 2"), "5");
}

#[test]
fn test_unary_minus() {
    assert_eq!(value("-2 * 3"), "-6");
}

#[test]
fn test_comparison_below_arithmetic() {
    assert_eq!(value("1 + 2 == 3"), "true");
    assert_eq!(value("2 * 2 > 3"), "true");
}

#[test]
fn test_logical_operators() {
    assert_eq!(value("1 < 2 and 3 > 4"), "false");
    assert_eq!(value("1 < 2 or 3 > 4"), "true");
    assert_eq!(value("true and false or true"), "true");
    assert_eq!(value("null or 1px"), "1px");
}

#[test]
fn test_not() {
    assert_eq!(value("not true"), "false");
    assert_eq!(value("not (1 > 2)"), "true");
}

#[test]
fn test_space_lists_versus_subtraction() {
    assert_eq!(value("10px -5px"), "10px -5px");
    assert_eq!(value("10px - 5px"), "5px");
}

#[test]
fn test_comma_lists() {
    assert_eq!(value("1px 2px, 3px"), "1px 2px, 3px");
}
