use std::fs;

use clap::Parser;
use miette::{bail, Diagnostic, IntoDiagnostic, Report, Result};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use plover::parsing::{self, ParsingError};
use plover::{analyze, lower, AnalysisFailure, LoweringError, SemanticError, SemanticWarning};

mod cli;

use cli::{Args, Mode};

/// Anything the pipeline reports, rendered against the source
#[derive(Debug, Error, Diagnostic)]
enum Reported {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parsing(ParsingError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Semantic(SemanticError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Lowering(LoweringError),
}

#[derive(Debug, Error, Diagnostic)]
#[error("Compilation failed [errors: {}, warnings: {warnings}]", .errs.len())]
struct AppError {
    #[related]
    errs: Vec<Reported>,

    warnings: usize,

    #[source_code]
    code: String,
}

/// Output of a successful run
struct Output {
    text: String,
    warnings: Vec<SemanticWarning>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().without_time())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();

    if !args.input_file.is_file() {
        bail!("No proper input file: {:?}", args.input_file);
    }

    let source = fs::read_to_string(&args.input_file).into_diagnostic()?;

    let output = run(&args, &source)?;

    report_warnings(&output.warnings, &source);
    info!("[errors: 0, warnings: {}]", output.warnings.len());

    match &args.output_file {
        Some(path) => {
            if path.exists() {
                warn!("{:?} already exists and will be overridden", path);
            }
            fs::write(path, output.text).into_diagnostic()?;
        }
        None => print!("{}", output.text),
    }

    Ok(())
}

/// Run the pipeline up to the stage selected by `args.mode`
fn run(args: &Args, source: &str) -> Result<Output> {
    let tokens = parsing::lex(source)
        .map_err(|err| failure(vec![Reported::Parsing(err.into())], &[], source))?;
    if args.mode == Mode::Tokens {
        let text = tokens
            .iter()
            .map(|token| format!("{}:{} {}\n", token.line(), token.column(), token.kind.describe()))
            .collect();
        return Ok(Output {
            text,
            warnings: Vec::new(),
        });
    }

    let program = parsing::parse_tokens(tokens)
        .map_err(|err| failure(vec![Reported::Parsing(err)], &[], source))?;
    info!("Parsing successful");
    if args.mode == Mode::Ast {
        let mut text = Vec::new();
        program.write_tree(&mut text).into_diagnostic()?;
        return Ok(Output {
            text: String::from_utf8(text).into_diagnostic()?,
            warnings: Vec::new(),
        });
    }

    let analysis = analyze(&program).map_err(|AnalysisFailure { errors, warnings }| {
        let errs = errors.into_iter().map(Reported::Semantic).collect();
        failure(errs, &warnings, source)
    })?;
    info!("Semantic analysis successful");
    if args.mode == Mode::Check {
        let mut text = Vec::new();
        analysis.program.write_tree(&mut text).into_diagnostic()?;
        return Ok(Output {
            text: String::from_utf8(text).into_diagnostic()?,
            warnings: analysis.warnings,
        });
    }

    let module = lower(&analysis.program, &args.module_name())
        .map_err(|err| failure(vec![Reported::Lowering(err)], &analysis.warnings, source))?;
    Ok(Output {
        text: module.to_string(),
        warnings: analysis.warnings,
    })
}

/// Log the summary and report the warnings of a failed run
fn failure(errs: Vec<Reported>, warnings: &[SemanticWarning], source: &str) -> Report {
    warn!("[errors: {}, warnings: {}]", errs.len(), warnings.len());
    report_warnings(warnings, source);

    AppError {
        errs,
        warnings: warnings.len(),
        code: source.to_owned(),
    }
    .into()
}

fn report_warnings(warnings: &[SemanticWarning], source: &str) {
    for warning in warnings {
        let report = Report::new(warning.clone()).with_source_code(source.to_owned());
        eprintln!("{report:?}");
    }
}
