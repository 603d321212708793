use pretty_assertions::assert_eq;
use sass_compiler::*;

fn value(expr: &str) -> String {
    let source = format!(
        "@use \"sass:map\";\n@use \"sass:list\";\n@use \"sass:color\";\n.a {{ v: {}; }}",
        expr
    );
    let css = Compiler::default()
        .compile_string(&source, None)
        .unwrap_or_else(|err| panic!("{} failed: {}", expr, err));
    css.strip_prefix(".a {\n  v: ")
        .and_then(|rest| rest.strip_suffix(";\n}\n"))
        .unwrap_or_else(|| panic!("unexpected output: {:?}", css))
        .to_string()
}

#[test]
fn test_color_literals_keep_their_spelling() {
    assert_eq!(value("red"), "red");
    assert_eq!(value("#fff"), "#fff");
}

#[test]
fn test_rgb_functions() {
    assert_eq!(value("rgb(255, 0, 0)"), "#ff0000");
    assert_eq!(value("rgba(#000, 0.5)"), "rgba(0, 0, 0, 0.5)");
}

#[test]
fn test_channels() {
    assert_eq!(value("red(#336699)"), "51");
    assert_eq!(value("blue(#336699)"), "153");
    assert_eq!(value("color.alpha(rgba(0, 0, 0, 0.25))"), "0.25");
}

#[test]
fn test_lightness_and_alpha_adjustments() {
    assert_eq!(value("darken(#fff, 100%)"), "#000000");
    assert_eq!(value("lighten(#000, 100%)"), "#ffffff");
    assert_eq!(value("transparentize(#000, 0.25)"), "rgba(0, 0, 0, 0.75)");
    assert_eq!(value("invert(#000)"), "#ffffff");
}

#[test]
fn test_gradients_pass_through() {
    assert_eq!(
        value("linear-gradient(to right, red, blue)"),
        "linear-gradient(to right, red, blue)"
    );
}

#[test]
fn test_list_functions() {
    assert_eq!(value("length(1px 2px 3px)"), "3");
    assert_eq!(value("nth(a b c, 2)"), "b");
    assert_eq!(value("nth(a b c, -1)"), "c");
    assert_eq!(value("join(a b, c d)"), "a b c d");
    assert_eq!(value("append(a b, c)"), "a b c");
    assert_eq!(value("index(a b c, c)"), "3");
    assert_eq!(value("list.separator((a, b))"), "comma");
}

#[test]
fn test_map_functions() {
    assert_eq!(value("map-get((a: 1, b: 2), b)"), "2");
    assert_eq!(value("map-keys((a: 1, b: 2))"), "a, b");
    assert_eq!(value("map-has-key((a: 1), a)"), "true");
    assert_eq!(value("map.get(map.merge((a: 1), (b: 2)), b)"), "2");
    assert_eq!(value("map.values(map.remove((a: 1, b: 2), a))"), "2");
}

#[test]
fn test_inspect_keeps_structure() {
    assert_eq!(value("inspect((a: 1))"), "(a: 1)");
    assert_eq!(value("inspect(null)"), "null");
}

#[test]
fn test_string_functions() {
    assert_eq!(value("quote(abc)"), "\"abc\"");
    assert_eq!(value("to-lower-case(ABC)"), "abc");
}
