use std::path::PathBuf;

/// Core error type for the zeile toolchain.
///
/// Unsupported constructs, unresolved references and script compilation
/// errors are not errors at this level: they travel as
/// [`Diagnostic`](crate::diagnostic::Diagnostic)s next to a best-effort
/// result. `CoreError` covers I/O, malformed inputs and broken invariants.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("unsupported format: {format}")]
    UnsupportedFormat { format: String },

    #[error("parse error in {file}: {message}")]
    Parse { file: PathBuf, message: String },

    #[error("codegen error: {0}")]
    Codegen(String),

    #[error("evaluator error: {0}")]
    Evaluator(String),

    #[error("project error: {0}")]
    Project(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
