use pretty_assertions::assert_eq;
use sass_compiler::*;

fn compile(source: &str) -> String {
    Compiler::default()
        .compile_string(source, None)
        .unwrap_or_else(|err| panic!("compilation failed: {}", err))
}

#[test]
fn test_for_through_is_inclusive() {
    let css = compile("@for $i from 1 through 3 { .m-#{$i} { margin: $i * 4px; } }");
    insta::assert_snapshot!(css, @r"
.m-1 {
  margin: 4px;
}

.m-2 {
  margin: 8px;
}

.m-3 {
  margin: 12px;
}
");
}

#[test]
fn test_for_to_is_exclusive() {
    let css = compile("@for $i from 1 to 3 { .m-#{$i} { margin: $i; } }");
    assert!(css.contains(".m-2"), "{}", css);
    assert!(!css.contains(".m-3"), "{}", css);
}

#[test]
fn test_for_counts_down() {
    let css = compile("@for $i from 3 through 1 { .m-#{$i} { margin: $i; } }");
    let first = css.find(".m-3").unwrap();
    let last = css.find(".m-1").unwrap();
    assert!(first < last, "{}", css);
}

#[test]
fn test_each_over_a_list() {
    let css = compile("@each $name in home, about { .icon-#{$name} { x: $name; } }");
    assert_eq!(
        css,
        ".icon-home {\n  x: home;\n}\n\n.icon-about {\n  x: about;\n}\n"
    );
}

#[test]
fn test_each_over_a_map_destructures_pairs() {
    let css = compile(
        "$colors: (primary: red, secondary: blue);\n\
         @each $name, $color in $colors { .text-#{$name} { color: $color; } }",
    );
    assert_eq!(
        css,
        ".text-primary {\n  color: red;\n}\n\n.text-secondary {\n  color: blue;\n}\n"
    );
}

#[test]
fn test_each_inside_a_rule() {
    let css = compile(".a { @each $side in top, left { margin-#{$side}: 1px; } }");
    assert_eq!(css, ".a {\n  margin-top: 1px;\n  margin-left: 1px;\n}\n");
}

#[test]
fn test_if_else_chain() {
    let source = "$theme: dark;\n\
                  .a {\n\
                    @if $theme == light { color: black; }\n\
                    @else if $theme == dark { color: white; }\n\
                    @else { color: gray; }\n\
                  }";
    assert_eq!(compile(source), ".a {\n  color: white;\n}\n");
}

#[test]
fn test_if_without_match_emits_nothing() {
    assert_eq!(compile(".a { @if false { color: red; } b: c; }"), ".a {\n  b: c;\n}\n");
}

#[test]
fn test_while_updates_globals() {
    let css = compile("$i: 2;\n@while $i > 0 { .w-#{$i} { width: $i; } $i: $i - 1; }");
    assert_eq!(css, ".w-2 {\n  width: 2;\n}\n\n.w-1 {\n  width: 1;\n}\n");
}

#[test]
fn test_if_function_is_lazy() {
    assert_eq!(
        compile(".a { v: if(true, 1px, $undefined); }"),
        ".a {\n  v: 1px;\n}\n"
    );
}

#[test]
fn test_local_assignment_shadows_global() {
    let css = compile("$x: 1;\n.a { $x: 2; v: $x; }\n.b { v: $x; }");
    assert_eq!(css, ".a {\n  v: 2;\n}\n\n.b {\n  v: 1;\n}\n");
}

#[test]
fn test_global_flag_writes_the_global() {
    let css = compile("$x: 1;\n.a { $x: 2 !global; v: $x; }\n.b { v: $x; }");
    assert_eq!(css, ".a {\n  v: 2;\n}\n\n.b {\n  v: 2;\n}\n");
}

#[test]
fn test_default_flag_keeps_existing_values() {
    let css = compile("$x: 1;\n$x: 2 !default;\n$y: 3 !default;\n.a { v: $x $y; }");
    assert_eq!(css, ".a {\n  v: 1 3;\n}\n");
}
