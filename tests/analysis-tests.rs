use plover::{SemanticError, SemanticWarning, Severity};

fn analyze(src: &str) -> Result<plover::Analysis, plover::AnalysisFailure> {
    let program = plover::parse(src).unwrap();
    plover::analyze(&program)
}

#[test]
fn errors_come_before_warnings() {
    let src = "x: int = 1;\nfunc f() int {\n    x: = 2.0;\n    return y;\n};\n";
    let failure = analyze(src).unwrap_err();

    assert!(failure
        .errors
        .iter()
        .any(|e| matches!(e, SemanticError::UndefinedVariable { name, .. } if name == "y")));
    assert_eq!(failure.warning_count(), 1);

    let records = failure.records();
    assert_eq!(records[0].severity, Severity::Error);

    let warning = records.last().unwrap();
    assert_eq!(warning.severity, Severity::Warning);
    assert_eq!((warning.line, warning.column), (3, 5));
}

#[test]
fn later_phases_are_skipped() {
    let src = "value: int = 1;\nprintf(value);\nfunc f() int { return z; };\n";
    let failure = analyze(src).unwrap_err();

    assert_eq!(failure.error_count(), 1);
    assert!(matches!(
        failure.errors[0],
        SemanticError::IllegalGlobalStatement { .. }
    ));
}

#[test]
fn warnings_do_not_stop_compilation() {
    let compilation = plover::compile("func f() int { return 1; x: = 2; };", "warn").unwrap();

    assert_eq!(compilation.warnings.len(), 1);
    assert!(matches!(
        compilation.warnings[0],
        SemanticWarning::UnreachableCode { .. }
    ));
    assert_eq!(compilation.module.name, "warn");
}

#[test]
fn failure_converts_to_compile_error() {
    let err = plover::compile("func f() { if (1) { }; };", "test").unwrap_err();

    assert!(matches!(err, plover::CompileError::Analysis(_)));
}

#[test]
fn compile_errors_flatten_to_records() {
    let err = plover::compile("x: int = 1;\nfunc f() int {\n    return 1 +;\n};", "test").unwrap_err();
    let records = err.records();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].severity, Severity::Error);
    assert_eq!((records[0].line, records[0].column), (3, 15));
}

#[test]
fn warnings_of_a_successful_run_flatten_to_records() {
    let compilation = plover::compile("x: int = 1;\nfunc f() { x: = 2; };", "test").unwrap();
    let records = compilation.records();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].severity, Severity::Warning);
    assert_eq!((records[0].line, records[0].column), (2, 12));

    let analysis = analyze("x: int = 1;\nfunc f() { x: = 2; };").unwrap();
    assert_eq!(analysis.records(), records);
}
