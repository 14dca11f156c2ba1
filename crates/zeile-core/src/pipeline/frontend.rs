use std::path::PathBuf;

use crate::diagnostic::Diagnostic;
use crate::error::CoreError;
use crate::ir::{Locale, Story};
use crate::project::SourceFormat;

/// Input to a frontend.
pub struct FrontendInput {
    /// Path to the source story asset.
    pub source: PathBuf,
    /// Locale the asset was published in.
    pub locale: Locale,
    /// Frontend-specific options from the project manifest.
    pub options: serde_json::Value,
}

/// Output from a frontend.
pub struct FrontendOutput {
    /// The converted story.
    pub story: Story,
    /// Constructs that were skipped or defaulted during conversion.
    pub diagnostics: Vec<Diagnostic>,
}

/// Reads a source story format and emits IR.
///
/// Conversion degrades instead of failing: unsupported constructs are
/// omitted and reported in [`FrontendOutput::diagnostics`]. `Err` is
/// reserved for unreadable or undecodable input.
pub trait Frontend {
    /// Which source format this frontend reads.
    fn format(&self) -> SourceFormat;

    /// Read the source and produce a story.
    fn extract(&self, input: FrontendInput) -> Result<FrontendOutput, CoreError>;
}
