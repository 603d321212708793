use pretty_assertions::assert_eq;
use sass_compiler::*;

fn compile(source: &str) -> String {
    Compiler::default()
        .compile_string(source, None)
        .unwrap_or_else(|err| panic!("compilation failed: {}", err))
}

#[test]
fn test_mixin_defaults_and_keyword_arguments() {
    let source = "@mixin box($w, $h: 10px) { width: $w; height: $h; }\n\
                  .a { @include box(5px); }\n\
                  .b { @include box($h: 2px, $w: 1px); }";
    insta::assert_snapshot!(compile(source), @r"
.a {
  width: 5px;
  height: 10px;
}

.b {
  width: 1px;
  height: 2px;
}
");
}

#[test]
fn test_mixin_without_arguments() {
    let source = "@mixin reset { margin: 0; padding: 0; }\n.a { @include reset; }";
    assert_eq!(compile(source), ".a {\n  margin: 0;\n  padding: 0;\n}\n");
}

#[test]
fn test_content_block_keeps_the_parent_selector() {
    let source = "@mixin hover { &:hover { @content; } }\n\
                  .link { color: red; @include hover { color: blue; } }";
    assert_eq!(
        compile(source),
        ".link {\n  color: red;\n}\n.link:hover {\n  color: blue;\n}\n"
    );
}

#[test]
fn test_content_arguments() {
    let source = "@mixin sized { @content(10px); }\n\
                  .a { @include sized using ($w) { width: $w; } }";
    assert_eq!(compile(source), ".a {\n  width: 10px;\n}\n");
}

#[test]
fn test_content_sees_the_including_scope() {
    let source = "@mixin wrap { @content; }\n\
                  .a { $local: 3px; @include wrap { width: $local; } }";
    assert_eq!(compile(source), ".a {\n  width: 3px;\n}\n");
}

#[test]
fn test_rest_parameters() {
    let source = "@mixin shadows($list...) { box-shadow: $list; }\n\
                  .a { @include shadows(0 1px red, 0 2px blue); }";
    assert_eq!(
        compile(source),
        ".a {\n  box-shadow: 0 1px red, 0 2px blue;\n}\n"
    );
}

#[test]
fn test_mixin_emitting_rules_at_root() {
    let source = "@mixin theme($name) { .theme-#{$name} { x: $name; } }\n@include theme(dark);";
    assert_eq!(compile(source), ".theme-dark {\n  x: dark;\n}\n");
}

#[test]
fn test_function_with_return() {
    let source = "@function double($n) { @return $n * 2; }\n.a { width: double(5px); }";
    assert_eq!(compile(source), ".a {\n  width: 10px;\n}\n");
}

#[test]
fn test_function_with_control_flow() {
    let source = "@function sum($numbers...) {\n\
                    $total: 0;\n\
                    @each $n in $numbers { $total: $total + $n; }\n\
                    @return $total;\n\
                  }\n\
                  .a { width: sum(1px, 2px, 3px); }";
    assert_eq!(compile(source), ".a {\n  width: 6px;\n}\n");
}

#[test]
fn test_function_early_return() {
    let source = "@function sign($n) { @if $n < 0 { @return -1; } @return 1; }\n\
                  .a { v: sign(-4) sign(4); }";
    assert_eq!(compile(source), ".a {\n  v: -1 1;\n}\n");
}

#[test]
fn test_functions_with_hyphens_and_underscores_are_the_same() {
    let source = "@function to_rem($px) { @return $px / 16px * 1rem; }\n.a { v: to-rem(32px); }";
    assert_eq!(compile(source), ".a {\n  v: 2rem;\n}\n");
}

#[test]
fn test_unknown_functions_are_plain_css() {
    assert_eq!(
        compile(".a { transform: translate(10px, 20px); }"),
        ".a {\n  transform: translate(10px, 20px);\n}\n"
    );
}

#[test]
fn test_custom_function() {
    let mut compiler = Compiler::default();
    compiler.add_function("double-it", |args: &[Value]| match args.first() {
        Some(Value::Number(n)) => Ok(Value::number(n.value * 2.0, n.unit.as_deref())),
        _ => Err(CompileError::invalid_argument("expected a number")),
    });
    let css = compiler
        .compile_string(".a { width: double-it(4px); }", None)
        .unwrap();
    assert_eq!(css, ".a {\n  width: 8px;\n}\n");
}

#[test]
fn test_user_function_overrides_custom_function() {
    let mut compiler = Compiler::default();
    compiler.add_function("pick", |_: &[Value]| Ok(Value::unquoted("callback")));
    let css = compiler
        .compile_string("@function pick() { @return stylesheet; }\n.a { v: pick(); }", None)
        .unwrap();
    assert_eq!(css, ".a {\n  v: stylesheet;\n}\n");
}

#[test]
fn test_introspection() {
    let source = "@mixin m { }\n@function f() { @return 1; }\n$g: 1;\n\
                  .a { v: mixin-exists(m) function-exists(f) variable-exists(g) type-of(1px); }";
    assert_eq!(compile(source), ".a {\n  v: true true true number;\n}\n");
}
