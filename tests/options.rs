use pretty_assertions::assert_eq;
use sass_compiler::*;

#[test]
fn test_options_deserialize_with_defaults() {
    let options: CompilerOptions = serde_json::from_str(r#"{"style": "compressed"}"#).unwrap();
    assert_eq!(options.style, OutputStyle::Compressed);
    assert_eq!(options.source_file, "input.scss");
    assert!(!options.source_map);
    assert!(options.load_paths.is_empty());
}

#[test]
fn test_options_use_camel_case_keys() {
    let options: CompilerOptions =
        serde_json::from_str(r#"{"sourceMap": true, "loadPaths": ["styles"], "sourceMapFile": "out.css.map"}"#)
            .unwrap();
    assert!(options.source_map);
    assert_eq!(options.load_paths, vec![std::path::PathBuf::from("styles")]);
    assert_eq!(options.source_map_file.as_deref(), Some("out.css.map"));
}

#[test]
fn test_partial_options_overlay() {
    let base = CompilerOptions {
        source_file: "main.scss".to_string(),
        ..CompilerOptions::default()
    };
    let partial: PartialCompilerOptions =
        serde_json::from_str(r#"{"style": "compressed"}"#).unwrap();
    let merged = base.merge(partial);
    assert!(merged.is_compressed());
    assert_eq!(merged.source_file, "main.scss");
}

#[test]
fn test_compressed_output() {
    let options = CompilerOptions {
        style: OutputStyle::Compressed,
        ..CompilerOptions::default()
    };
    let css = Compiler::new(options)
        .compile_string(".a { color: red; margin: 0 auto; }\n.b { padding: 0.5em; }", None)
        .unwrap();
    assert_eq!(css, ".a{color:red;margin:0 auto}.b{padding:.5em}");
}

fn source_mapped() -> CompilerOptions {
    CompilerOptions {
        source_map: true,
        include_sources: true,
        ..CompilerOptions::default()
    }
}

#[test]
fn test_source_mappings() {
    let source = ".a {\n  color: red;\n}\n.b {\n  color: blue;\n}";
    let mut compiler = Compiler::new(source_mapped());
    compiler.compile_string(source, None).unwrap();
    let positions: Vec<(usize, usize, usize)> = compiler
        .mappings()
        .iter()
        .map(|m| (m.generated_line, m.generated_column, m.original_line))
        .collect();
    assert_eq!(positions, vec![(1, 0, 1), (5, 0, 4)]);
    assert!(compiler.mappings().iter().all(|m| m.source == "input.scss"));
}

#[test]
fn test_source_map_document() {
    let source = ".a { color: red; }";
    let mut compiler = Compiler::new(source_mapped());
    compiler.compile_string(source, None).unwrap();
    let map = serde_json::to_value(compiler.source_map()).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["sources"][0], "input.scss");
    assert_eq!(map["sourcesContent"][0], source);
    assert_eq!(map["mappings"][0]["generatedLine"], 1);
}

#[test]
fn test_mappings_are_off_by_default() {
    let mut compiler = Compiler::default();
    compiler.compile_string(".a { color: red; }", None).unwrap();
    assert!(compiler.mappings().is_empty());
}

#[test]
fn test_source_mapping_url_comment() {
    let options = CompilerOptions {
        source_map_file: Some("out.css.map".to_string()),
        ..source_mapped()
    };
    let css = Compiler::new(options)
        .compile_string(".a { color: red; }", None)
        .unwrap();
    assert!(css.ends_with("/*# sourceMappingURL=out.css.map */"), "{}", css);
}
