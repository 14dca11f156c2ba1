use std::fs;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;
use zeile_core::diagnostic::{Severity, TextPosition};
use zeile_core::error::CoreError;

/// Name of the script inside the compilation directory.
pub const SOURCE_FILE: &str = "source.ts";
const LIBRARY_FILE: &str = "lib.d.ts";
const OUTPUT_FILE: &str = "source.js";

/// A diagnostic as reported by the TypeScript compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDiagnostic {
    /// File the diagnostic points into; `None` for global diagnostics.
    pub file: Option<String>,
    pub position: TextPosition,
    /// Compiler code such as `TS2304`.
    pub code: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transpiled {
    pub js_code: String,
    pub diagnostics: Vec<ScriptDiagnostic>,
}

/// Type-checks and translates one script against a library declaration.
///
/// `Err` means the compiler could not be run at all; problems in the
/// script itself are reported through [`Transpiled::diagnostics`].
pub trait Transpiler {
    fn transpile(&self, source: &str, library: &str) -> Result<Transpiled, CoreError>;
}

/// How to invoke the TypeScript compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TscConfig {
    pub program: String,
    /// Arguments placed before the ones the transpiler adds.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for TscConfig {
    fn default() -> Self {
        Self {
            program: "tsc".into(),
            args: Vec::new(),
        }
    }
}

/// Runs `tsc` in a scratch directory.
///
/// The bundled library replaces the compiler's default library, so
/// scripts only see what the library declares.
#[derive(Debug, Clone, Default)]
pub struct TscTranspiler {
    pub config: TscConfig,
}

impl TscTranspiler {
    pub fn new(config: TscConfig) -> Self {
        Self { config }
    }
}

impl Transpiler for TscTranspiler {
    fn transpile(&self, source: &str, library: &str) -> Result<Transpiled, CoreError> {
        let dir = tempfile::tempdir()?;
        let tsconfig = serde_json::json!({
            "compilerOptions": {
                "noLib": true,
                "target": "ES2017",
                "strict": true,
                "newLine": "lf",
            },
            "files": [LIBRARY_FILE, SOURCE_FILE],
        });
        fs::write(dir.path().join(SOURCE_FILE), source)?;
        fs::write(dir.path().join(LIBRARY_FILE), library)?;
        fs::write(
            dir.path().join("tsconfig.json"),
            serde_json::to_string_pretty(&tsconfig)?,
        )?;

        let output = Command::new(&self.config.program)
            .args(&self.config.args)
            .args(["--pretty", "false", "-p", "tsconfig.json"])
            .current_dir(dir.path())
            .output()
            .map_err(|e| {
                CoreError::Evaluator(format!(
                    "failed to run {}: {e} (is TypeScript installed?)",
                    self.config.program
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostics = parse_output(&stdout);

        if !output.status.success() && diagnostics.is_empty() {
            return Err(CoreError::Evaluator(format!(
                "{} exited with {} without diagnostics: {}",
                self.config.program,
                output.status,
                stderr.trim()
            )));
        }

        // Missing output is only acceptable when the compiler said why.
        let js_code = match fs::read_to_string(dir.path().join(OUTPUT_FILE)) {
            Ok(js_code) => js_code,
            Err(_) if !diagnostics.is_empty() => String::new(),
            Err(e) => {
                return Err(CoreError::Evaluator(format!(
                    "{} produced no {OUTPUT_FILE}: {e}",
                    self.config.program
                )))
            }
        };
        debug!(
            diagnostics = diagnostics.len(),
            js_bytes = js_code.len(),
            "tsc finished"
        );
        Ok(Transpiled {
            js_code,
            diagnostics,
        })
    }
}

/// Collect diagnostics from `tsc --pretty false` output.
///
/// Indented lines continue the message of the diagnostic before them.
pub fn parse_output(output: &str) -> Vec<ScriptDiagnostic> {
    let mut diagnostics: Vec<ScriptDiagnostic> = Vec::new();
    for line in output.lines() {
        if let Some(d) = parse_diagnostic(line) {
            diagnostics.push(d);
        } else if line.starts_with(' ') && !line.trim().is_empty() {
            if let Some(last) = diagnostics.last_mut() {
                last.message.push('\n');
                last.message.push_str(line.trim());
            }
        }
    }
    diagnostics
}

/// Parse a diagnostic line in non-pretty format:
/// `source.ts(42,5): error TS2304: Cannot find name 'foo'.`
/// or, without a location, `error TS18003: No inputs were found.`
pub fn parse_diagnostic(line: &str) -> Option<ScriptDiagnostic> {
    let (file, position, rest) = match line.find("): ") {
        Some(marker) if line[..marker].ends_with(|c: char| c.is_ascii_digit()) => {
            // Everything before the marker is "file(line,col"
            let loc_part = &line[..marker];
            let paren_pos = loc_part.rfind('(')?;
            let (line_num, col) = loc_part[paren_pos + 1..].split_once(',')?;
            let position = TextPosition::new(line_num.parse().ok()?, col.parse().ok()?);
            (
                Some(loc_part[..paren_pos].to_string()),
                position,
                &line[marker + 3..],
            )
        }
        _ => (None, TextPosition::UNKNOWN, line),
    };

    // "error TSxxxx: message"
    let (severity_and_code, message) = rest.split_once(": ")?;
    let (severity, code) = severity_and_code.split_once(' ')?;
    let severity = match severity {
        "error" => Severity::Error,
        "warning" => Severity::Warning,
        "message" => Severity::Note,
        _ => return None,
    };
    if !code.starts_with("TS") {
        return None;
    }

    Some(ScriptDiagnostic {
        file,
        position,
        code: code.to_string(),
        severity,
        message: message.to_string(),
    })
}
