use std::fs;

use pretty_assertions::assert_eq;
use sass_compiler::*;

fn compile_with(loader: MemoryLoader, source: &str) -> Result<String, SassError> {
    Compiler::with_loader(CompilerOptions::default(), loader).compile_string(source, None)
}

fn compile_error(loader: MemoryLoader, source: &str) -> CompileErrorKind {
    match compile_with(loader, source) {
        Err(SassError::Compile(err)) => err.kind,
        other => panic!("expected a compile error, got {:?}", other),
    }
}

#[test]
fn test_use_namespaced_members() {
    let loader = MemoryLoader::new().with_file(
        "_colors.scss",
        "$primary: red;\n@mixin pad { padding: 1px; }\n@function shade() { @return dark; }",
    );
    let css = compile_with(
        loader,
        "@use \"colors\";\n.a { color: colors.$primary; v: colors.shade(); @include colors.pad; }",
    )
    .unwrap();
    assert_eq!(css, ".a {\n  color: red;\n  v: dark;\n  padding: 1px;\n}\n");
}

#[test]
fn test_module_css_is_emitted_once() {
    let loader = MemoryLoader::new()
        .with_file("_reset.scss", ".reset { margin: 0; }")
        .with_file("_a.scss", "@use \"reset\";")
        .with_file("_b.scss", "@use \"reset\";");
    let css = compile_with(loader, "@use \"a\";\n@use \"b\";\n.x { y: z; }").unwrap();
    assert_eq!(css, ".reset {\n  margin: 0;\n}\n\n.x {\n  y: z;\n}\n");
}

#[test]
fn test_use_with_configuration() {
    let loader = MemoryLoader::new().with_file(
        "_theme.scss",
        "$color: red !default;\n.t { color: $color; }",
    );
    let css = compile_with(loader, "@use \"theme\" with ($color: blue);").unwrap();
    assert_eq!(css, ".t {\n  color: blue;\n}\n");
}

#[test]
fn test_use_as_star() {
    let loader = MemoryLoader::new().with_file("_vars.scss", "$gap: 4px;");
    let css = compile_with(loader, "@use \"vars\" as *;\n.a { margin: $gap; }").unwrap();
    assert_eq!(css, ".a {\n  margin: 4px;\n}\n");
}

#[test]
fn test_use_as_alias() {
    let loader = MemoryLoader::new().with_file("_vars.scss", "$gap: 4px;");
    let css = compile_with(loader, "@use \"vars\" as v;\n.a { margin: v.$gap; }").unwrap();
    assert_eq!(css, ".a {\n  margin: 4px;\n}\n");
}

#[test]
fn test_forward_with_prefix() {
    let loader = MemoryLoader::new()
        .with_file(
            "_tokens.scss",
            "$size: 3px;\n@function twice($n) { @return $n * 2; }",
        )
        .with_file("_lib.scss", "@forward \"tokens\" as tok-*;");
    let css = compile_with(
        loader,
        "@use \"lib\";\n.a { w: lib.$tok-size; h: lib.tok-twice(2px); }",
    )
    .unwrap();
    assert_eq!(css, ".a {\n  w: 3px;\n  h: 4px;\n}\n");
}

#[test]
fn test_forward_show_hides_other_members() {
    let loader = MemoryLoader::new()
        .with_file(
            "_tokens.scss",
            "$size: 3px;\n@function twice($n) { @return $n * 2; }",
        )
        .with_file("_lib.scss", "@forward \"tokens\" show $size;");
    let kind = compile_error(loader, "@use \"lib\";\n.a { h: lib.twice(2px); }");
    assert!(matches!(kind, CompileErrorKind::UnknownFunction(_)), "{:?}", kind);
}

#[test]
fn test_import_shares_scope() {
    let loader = MemoryLoader::new().with_file("_vars.scss", "$gap: 4px;");
    let css = compile_with(loader, "@import \"vars\";\n.a { margin: $gap; }").unwrap();
    assert_eq!(css, ".a {\n  margin: 4px;\n}\n");
}

#[test]
fn test_plain_css_import_passes_through() {
    let css = compile_with(MemoryLoader::new(), "@import \"print.css\";").unwrap();
    assert_eq!(css, "@import \"print.css\";\n");
}

#[test]
fn test_builtin_map_module() {
    let css = compile_with(
        MemoryLoader::new(),
        "@use \"sass:map\";\n$m: (a: 1px, b: 2px);\n.a { v: map.get($m, b); k: map.keys($m); }",
    )
    .unwrap();
    assert_eq!(css, ".a {\n  v: 2px;\n  k: a, b;\n}\n");
}

#[test]
fn test_namespace_requires_use() {
    let kind = compile_error(MemoryLoader::new(), ".a { v: math.div(1, 2); }");
    assert_eq!(kind, CompileErrorKind::UnknownModule("math".to_string()));
}

#[test]
fn test_module_loop() {
    let loader = MemoryLoader::new()
        .with_file("a.scss", "@use \"b\";")
        .with_file("b.scss", "@use \"a\";");
    let kind = compile_error(loader, "@use \"a\";");
    assert!(matches!(kind, CompileErrorKind::ModuleLoop(_)), "{:?}", kind);
}

#[test]
fn test_missing_module() {
    let kind = compile_error(MemoryLoader::new(), "@use \"nowhere\";");
    assert_eq!(kind, CompileErrorKind::FileNotFound("nowhere".to_string()));
}

#[test]
fn test_unknown_builtin_module() {
    let kind = compile_error(MemoryLoader::new(), "@use \"sass:nope\";");
    assert_eq!(kind, CompileErrorKind::UnknownModule("sass:nope".to_string()));
}

#[test]
fn test_compile_file_with_indented_partial() {
    let loader = MemoryLoader::new()
        .with_file("main.scss", "@use \"base\";\n.nav { color: base.$c; }")
        .with_file("_base.sass", "$c: red\n");
    let mut compiler = Compiler::with_loader(CompilerOptions::default(), loader);
    let css = compiler.compile_file("main").unwrap();
    assert_eq!(css, ".nav {\n  color: red;\n}\n");
}

#[test]
fn test_file_loader_searches_load_paths() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("_settings.scss"), "$w: 12px;").unwrap();
    let options = CompilerOptions {
        load_paths: vec![dir.path().to_path_buf()],
        ..CompilerOptions::default()
    };
    let css = Compiler::new(options)
        .compile_string("@use \"settings\";\n.a { width: settings.$w; }", None)
        .unwrap();
    assert_eq!(css, ".a {\n  width: 12px;\n}\n");
}
