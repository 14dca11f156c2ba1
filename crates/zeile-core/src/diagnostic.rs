//! Diagnostics reported by the converter and the function evaluator.
//!
//! Diagnostics are data: producers collect them next to a best-effort
//! result and the caller decides whether any of them is fatal.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 1-based line/column pair. Zero means the position is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextPosition {
    pub line: u32,
    pub column: u32,
}

impl TextPosition {
    pub const UNKNOWN: TextPosition = TextPosition { line: 0, column: 0 };

    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    pub fn is_known(self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Where a diagnostic originates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SourceLocation {
    #[default]
    Unknown,
    /// A snippet of a source-format story asset.
    Snippet { index: usize },
    /// A position inside a script embedded as a string literal.
    ///
    /// `node` is where the literal's contents begin in the enclosing
    /// source; `offset` is the position reported inside the script.
    Literal {
        node: TextPosition,
        offset: TextPosition,
    },
}

impl SourceLocation {
    /// Map a literal-relative position back onto the enclosing source.
    ///
    /// Line 1 of the script shares the literal's line, so its column is
    /// shifted by the literal's column; later lines keep their own column.
    /// Returns `None` for locations with no text position.
    pub fn absolute(&self) -> Option<TextPosition> {
        match *self {
            Self::Literal { node, offset } if node.is_known() => {
                if !offset.is_known() {
                    return Some(node);
                }
                if offset.line == 1 {
                    Some(TextPosition::new(
                        node.line,
                        node.column + offset.column.saturating_sub(1),
                    ))
                } else {
                    Some(TextPosition::new(node.line + offset.line - 1, offset.column))
                }
            }
            Self::Literal { offset, .. } if offset.is_known() => Some(offset),
            _ => None,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("<unknown>"),
            Self::Snippet { index } => write!(f, "snippet #{index}"),
            Self::Literal { .. } => match self.absolute() {
                Some(pos) => write!(f, "{pos}"),
                None => f.write_str("<script>"),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Note => "note",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// Reported by the TypeScript compiler.
    TypeScriptError,
    /// The compiler could not be run at all.
    TranspilerUnavailable,
    /// A source construct the IR cannot represent.
    UnsupportedSnippet,
    /// A side-table lookup that could not be resolved.
    UnresolvedReference,
    /// A model appearance whose costume was never named.
    UnresolvedCostume,
}

impl DiagnosticKind {
    pub fn id(self) -> &'static str {
        match self {
            Self::TypeScriptError => "typescript_error",
            Self::TranspilerUnavailable => "transpiler_unavailable",
            Self::UnsupportedSnippet => "unsupported_snippet",
            Self::UnresolvedReference => "unresolved_reference",
            Self::UnresolvedCostume => "unresolved_costume",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    pub kind: DiagnosticKind,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub location: SourceLocation,
    pub severity: Severity,
    pub message: DiagnosticMessage,
}

impl Diagnostic {
    pub fn new(
        location: SourceLocation,
        severity: Severity,
        kind: DiagnosticKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            location,
            severity,
            message: DiagnosticMessage {
                kind,
                detail: detail.into(),
            },
        }
    }

    pub fn error(location: SourceLocation, kind: DiagnosticKind, detail: impl Into<String>) -> Self {
        Self::new(location, Severity::Error, kind, detail)
    }

    pub fn warning(
        location: SourceLocation,
        kind: DiagnosticKind,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(location, Severity::Warning, kind, detail)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {} [{}]",
            self.location,
            self.severity,
            self.message.detail,
            self.message.kind.id()
        )
    }
}

/// Whether any diagnostic in the list is an error.
pub fn has_errors(diags: &[Diagnostic]) -> bool {
    diags.iter().any(Diagnostic::is_error)
}
