use crate::error::CoreError;
use crate::ir::Story;

/// Serializes a story into one external format.
///
/// Backends are independent of each other and never mutate the story.
pub trait Backend {
    /// Name of this backend (e.g. "plain-text", "bestdori").
    fn name(&self) -> &str;

    /// Extension of the files this backend writes, without the dot.
    fn file_extension(&self) -> &str;

    /// Render the story.
    ///
    /// Fails only when the story breaks an IR invariant the backend
    /// relies on.
    fn emit(&self, story: &Story) -> Result<String, CoreError>;
}
