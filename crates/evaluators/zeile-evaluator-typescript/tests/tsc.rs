//! Runs the real TypeScript compiler. Skipped when `tsc` is not on PATH.

use std::process::Command;

use zeile_core::diagnostic::{DiagnosticKind, TextPosition};
use zeile_evaluator_typescript::{FunctionEvaluator, TscConfig, TscTranspiler};

fn tsc_available() -> bool {
    Command::new("tsc").arg("--version").output().is_ok()
}

fn evaluator() -> FunctionEvaluator {
    FunctionEvaluator::with_standard_library(Box::new(TscTranspiler::default()))
}

#[test]
fn compiles_story_script() {
    if !tsc_available() {
        eprintln!("Skipping: tsc not found");
        return;
    }
    let mut evaluator = evaluator();
    let name = "$zf5greetrV";
    let source = "const kasumi: Character = new Character(1);\nsay(`Hello, ${kasumi.name}`, kasumi);\n";
    let diagnostics = evaluator.compile(name, source, TextPosition::new(1, 1));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    let js = evaluator.get(name).expect("stored translation");
    assert!(js.contains("new Character(1)"));
}

#[test]
fn reports_type_errors_at_script_positions() {
    if !tsc_available() {
        eprintln!("Skipping: tsc not found");
        return;
    }
    let mut evaluator = evaluator();
    let diagnostics = evaluator.compile(
        "$zf4failrV",
        "let n: number = 1;\nn = \"two\";\n",
        TextPosition::new(20, 8),
    );
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    let d = &diagnostics[0];
    assert_eq!(d.message.kind, DiagnosticKind::TypeScriptError);
    assert!(d.message.detail.starts_with("TS2322: "), "{}", d.message.detail);
    assert_eq!(d.location.absolute(), Some(TextPosition::new(21, 1)));
}

#[test]
fn missing_compiler_is_reported() {
    let transpiler = TscTranspiler::new(TscConfig {
        program: "zeile-no-such-compiler".into(),
        args: Vec::new(),
    });
    let mut evaluator = FunctionEvaluator::with_standard_library(Box::new(transpiler));
    let diagnostics = evaluator.compile("$zf4failrV", "1;", TextPosition::new(1, 1));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message.kind,
        DiagnosticKind::TranspilerUnavailable
    );
}

#[cfg(unix)]
#[test]
fn compiler_without_output_is_reported() {
    // `true` accepts any arguments, exits 0 and writes nothing.
    let transpiler = TscTranspiler::new(TscConfig {
        program: "true".into(),
        args: Vec::new(),
    });
    let mut evaluator = FunctionEvaluator::with_standard_library(Box::new(transpiler));
    let name = "$zf5greetrV";
    for _ in 0..2 {
        let diagnostics = evaluator.compile(name, "say('hi', new Character(1));", TextPosition::new(1, 1));
        assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
        assert_eq!(
            diagnostics[0].message.kind,
            DiagnosticKind::TranspilerUnavailable
        );
        assert!(evaluator.get(name).is_none());
    }
}
