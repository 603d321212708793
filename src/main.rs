use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sass_compiler::{display_error, Compiler, CompilerOptions, OutputStyle, SassError, Syntax};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Style {
    Expanded,
    Compressed,
}

impl From<Style> for OutputStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Expanded => OutputStyle::Expanded,
            Style::Compressed => OutputStyle::Compressed,
        }
    }
}

/// Compile Sass and SCSS stylesheets to CSS.
#[derive(Parser)]
#[command(name = "sassc", version)]
struct Cli {
    /// Stylesheet to compile; reads stdin when omitted.
    input: Option<PathBuf>,

    /// Write CSS here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "expanded")]
    style: Style,

    /// Directory searched for `@use` and `@import` targets. Repeatable.
    #[arg(short = 'I', long = "load-path")]
    load_paths: Vec<PathBuf>,

    /// Treat stdin as the indented syntax.
    #[arg(long)]
    indented: bool,
}

fn run(cli: &Cli, compiler: &mut Compiler, source: &str) -> Result<String, SassError> {
    match &cli.input {
        Some(path) => compiler.compile_file(&path.to_string_lossy()),
        None => {
            let syntax = if cli.indented { Syntax::Indented } else { Syntax::Scss };
            compiler.compile_string(source, Some(syntax))
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let options = CompilerOptions {
        style: cli.style.into(),
        load_paths: cli.load_paths.clone(),
        source_file: cli
            .input
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stdin".to_string()),
        output_file: cli
            .output
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned()),
        ..CompilerOptions::default()
    };

    let source = match &cli.input {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map(|_| buffer)
        }
    };
    let source = match source {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error: cannot read input: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let mut compiler = Compiler::new(options);
    let css = match run(&cli, &mut compiler, &source) {
        Ok(css) => css,
        Err(err) => {
            let filename = compiler.options().source_file.clone();
            if display_error(&source, &filename, &err).is_err() {
                eprintln!("Error: {}", err);
            }
            return ExitCode::FAILURE;
        }
    };

    let written = match &cli.output {
        Some(path) => fs::write(path, css),
        None => {
            print!("{}", css);
            Ok(())
        }
    };
    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: cannot write output: {}", err);
            ExitCode::FAILURE
        }
    }
}
