use std::collections::HashMap;

use tracing::{debug, warn};
use zeile_core::diagnostic::{Diagnostic, DiagnosticKind, SourceLocation, TextPosition};

use crate::mangle::demangle;
use crate::transpiler::{ScriptDiagnostic, Transpiler, SOURCE_FILE};
use crate::STANDARD_LIBRARY;

/// Compiles script functions and keeps their translations by mangled name.
///
/// Each evaluator owns its compiled functions; instances share nothing.
/// The first compilation of a name wins: compiling a name again is a
/// no-op that reports nothing.
pub struct FunctionEvaluator {
    transpiler: Box<dyn Transpiler>,
    library: String,
    compiled: HashMap<String, String>,
}

impl FunctionEvaluator {
    pub fn new(transpiler: Box<dyn Transpiler>, library: impl Into<String>) -> Self {
        Self {
            transpiler,
            library: library.into(),
            compiled: HashMap::new(),
        }
    }

    /// An evaluator compiling against the bundled story library.
    pub fn with_standard_library(transpiler: Box<dyn Transpiler>) -> Self {
        Self::new(transpiler, STANDARD_LIBRARY)
    }

    /// Compile `source` under `mangled_name`.
    ///
    /// `origin` is where the script's string literal starts in the story
    /// source; diagnostics are reported relative to it. An empty result
    /// means the script compiled cleanly.
    pub fn compile(
        &mut self,
        mangled_name: &str,
        source: &str,
        origin: TextPosition,
    ) -> Vec<Diagnostic> {
        if self.compiled.contains_key(mangled_name) {
            debug!(name = mangled_name, "already compiled");
            return Vec::new();
        }
        if demangle(mangled_name).is_none() {
            warn!(name = mangled_name, "compiling a function under a non-mangled name");
        }

        let transpiled = match self.transpiler.transpile(source, &self.library) {
            Ok(transpiled) => transpiled,
            Err(e) => {
                warn!(name = mangled_name, "transpiler unavailable: {e}");
                return vec![Diagnostic::error(
                    SourceLocation::Literal {
                        node: origin,
                        offset: TextPosition::UNKNOWN,
                    },
                    DiagnosticKind::TranspilerUnavailable,
                    e.to_string(),
                )];
            }
        };

        let diagnostics: Vec<Diagnostic> = transpiled
            .diagnostics
            .into_iter()
            .map(|d| to_diagnostic(d, origin))
            .collect();
        debug!(
            name = mangled_name,
            diagnostics = diagnostics.len(),
            "compiled function"
        );
        self.compiled
            .insert(mangled_name.to_string(), transpiled.js_code);
        diagnostics
    }

    /// The translation stored for `mangled_name`.
    pub fn get(&self, mangled_name: &str) -> Option<&str> {
        self.compiled.get(mangled_name).map(String::as_str)
    }

    pub fn contains(&self, mangled_name: &str) -> bool {
        self.compiled.contains_key(mangled_name)
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    pub fn library(&self) -> &str {
        &self.library
    }
}

/// Diagnostics outside the script (library, global) point at the literal
/// itself and name their own location in the detail.
fn to_diagnostic(d: ScriptDiagnostic, origin: TextPosition) -> Diagnostic {
    let (offset, detail) = match d.file.as_deref() {
        Some(file) if file.ends_with(SOURCE_FILE) => {
            (d.position, format!("{}: {}", d.code, d.message))
        }
        Some(file) => (
            TextPosition::UNKNOWN,
            format!("{file}({}): {}: {}", d.position, d.code, d.message),
        ),
        None => (TextPosition::UNKNOWN, format!("{}: {}", d.code, d.message)),
    };
    Diagnostic::new(
        SourceLocation::Literal {
            node: origin,
            offset,
        },
        d.severity,
        DiagnosticKind::TypeScriptError,
        detail,
    )
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use zeile_core::diagnostic::{has_errors, Severity};
    use zeile_core::error::CoreError;

    use crate::transpiler::Transpiled;

    /// Echoes the source as "compiled" code and flags every line
    /// containing `ERR`.
    struct MockTranspiler {
        calls: Rc<Cell<usize>>,
    }

    impl Transpiler for MockTranspiler {
        fn transpile(&self, source: &str, _library: &str) -> Result<Transpiled, CoreError> {
            self.calls.set(self.calls.get() + 1);
            let diagnostics = source
                .lines()
                .enumerate()
                .filter_map(|(i, line)| {
                    line.find("ERR").map(|col| ScriptDiagnostic {
                        file: Some(SOURCE_FILE.into()),
                        position: TextPosition::new(i as u32 + 1, col as u32 + 1),
                        code: "TS2304".into(),
                        severity: Severity::Error,
                        message: "Cannot find name 'ERR'.".into(),
                    })
                })
                .collect();
            Ok(Transpiled {
                js_code: format!("// js\n{source}"),
                diagnostics,
            })
        }
    }

    struct Unavailable;

    impl Transpiler for Unavailable {
        fn transpile(&self, _source: &str, _library: &str) -> Result<Transpiled, CoreError> {
            Err(CoreError::Evaluator("failed to run tsc".into()))
        }
    }

    fn evaluator() -> (FunctionEvaluator, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let mock = MockTranspiler {
            calls: calls.clone(),
        };
        (FunctionEvaluator::with_standard_library(Box::new(mock)), calls)
    }

    const NAME: &str = "$zf5greetrV";

    #[test]
    fn first_compilation_wins() {
        let (mut evaluator, calls) = evaluator();
        assert!(evaluator
            .compile(NAME, "say('hi', new Character(1));", TextPosition::new(3, 10))
            .is_empty());
        assert!(evaluator
            .compile(NAME, "ERR", TextPosition::new(9, 1))
            .is_empty());
        assert_eq!(calls.get(), 1);
        assert_eq!(
            evaluator.get(NAME),
            Some("// js\nsay('hi', new Character(1));")
        );
        assert_eq!(evaluator.len(), 1);
    }

    #[test]
    fn diagnostics_map_onto_the_literal() {
        let (mut evaluator, _) = evaluator();
        let diagnostics = evaluator.compile(NAME, "let a = ERR;\n  ERR;", TextPosition::new(10, 20));
        assert!(has_errors(&diagnostics));
        let positions: Vec<_> = diagnostics
            .iter()
            .map(|d| d.location.absolute())
            .collect();
        assert_eq!(
            positions,
            [Some(TextPosition::new(10, 28)), Some(TextPosition::new(11, 3))]
        );
        assert_eq!(
            diagnostics[0].message.detail,
            "TS2304: Cannot find name 'ERR'."
        );
        // Code with errors is still stored.
        assert!(evaluator.contains(NAME));
    }

    #[test]
    fn unavailable_transpiler_is_a_diagnostic() {
        let mut evaluator = FunctionEvaluator::new(Box::new(Unavailable), "");
        let diagnostics = evaluator.compile(NAME, "say('x')", TextPosition::new(1, 1));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message.kind,
            DiagnosticKind::TranspilerUnavailable
        );
        assert!(evaluator.get(NAME).is_none());
    }

    #[test]
    fn library_diagnostics_have_no_offset() {
        let d = ScriptDiagnostic {
            file: Some("lib.d.ts".into()),
            position: TextPosition::new(4, 2),
            code: "TS2300".into(),
            severity: Severity::Error,
            message: "Duplicate identifier 'x'.".into(),
        };
        let diagnostic = to_diagnostic(d, TextPosition::new(7, 5));
        assert_eq!(diagnostic.location.absolute(), Some(TextPosition::new(7, 5)));
        assert_eq!(
            diagnostic.message.detail,
            "lib.d.ts(4:2): TS2300: Duplicate identifier 'x'."
        );
    }

    #[test]
    fn evaluators_do_not_share_state() {
        let (mut first, _) = evaluator();
        let (second, _) = evaluator();
        first.compile(NAME, "say('a', new Character(1));", TextPosition::new(1, 1));
        assert!(second.is_empty());
    }
}
