use pretty_assertions::assert_eq;
use sass_compiler::*;

fn compile(source: &str) -> Result<String, SassError> {
    Compiler::default().compile_string(source, None)
}

fn compile_error(source: &str) -> CompileError {
    match compile(source) {
        Err(SassError::Compile(err)) => err,
        other => panic!("expected a compile error, got {:?}", other),
    }
}

#[test]
fn test_invalid_hex_color() {
    let err = compile(".a { color: #ggg; }").unwrap_err();
    assert!(matches!(err, SassError::Lex(LexError::Color(_))), "{:?}", err);
}

#[test]
fn test_unterminated_string() {
    let err = compile(".a { content: \"open; }").unwrap_err();
    assert!(
        matches!(err, SassError::Lex(LexError::UnterminatedString { .. })),
        "{:?}",
        err
    );
}

#[test]
fn test_missing_closing_brace() {
    let err = compile(".a { color: red;").unwrap_err();
    assert!(matches!(err, SassError::Syntax(_)), "{:?}", err);
}

#[test]
fn test_undefined_variable_reports_its_location() {
    let err = compile_error("\n.a {\n  color: red;\n  width: $missing;\n}");
    assert_eq!(err.kind, CompileErrorKind::UndefinedVariable("missing".to_string()));
    assert_eq!(err.file, "input.scss");
    assert_eq!(err.line, 4);
    assert!(err.to_string().contains("input.scss:4"), "{}", err);
}

#[test]
fn test_error_rule() {
    let err = compile_error("@error \"Boom\";");
    assert_eq!(err.kind, CompileErrorKind::User("Boom".to_string()));
}

#[test]
fn test_error_inside_mixin() {
    let err = compile_error("@mixin m($x) { @if $x < 0 { @error \"negative\"; } }\n.a { @include m(-1); }");
    assert_eq!(err.kind, CompileErrorKind::User("negative".to_string()));
}

#[test]
fn test_undefined_mixin() {
    let err = compile_error(".a { @include nope; }");
    assert_eq!(err.kind, CompileErrorKind::UndefinedMixin("nope".to_string()));
}

#[test]
fn test_return_outside_function() {
    let err = compile_error(".a { @return 1; }");
    assert_eq!(err.kind, CompileErrorKind::ReturnOutsideFunction);
}

#[test]
fn test_function_without_return() {
    let err = compile_error("@function f() { $x: 1; }\n.a { v: f(); }");
    assert_eq!(err.kind, CompileErrorKind::MissingReturn("f".to_string()));
}

#[test]
fn test_too_many_arguments() {
    let err = compile_error("@function f($a) { @return $a; }\n.a { v: f(1, 2); }");
    assert!(matches!(err.kind, CompileErrorKind::InvalidArgument(_)), "{:?}", err);
}

#[test]
fn test_missing_argument() {
    let err = compile_error("@mixin m($a) { v: $a; }\n.a { @include m; }");
    assert!(matches!(err.kind, CompileErrorKind::InvalidArgument(_)), "{:?}", err);
}

#[test]
fn test_report_rendering() {
    let source = ".a { width: $missing; }";
    let err = compile(source).unwrap_err();
    assert!(display_error(source, "input.scss", &err).is_ok());
}
