pub mod manifest;

pub use manifest::{ProjectManifest, SourceFormat, TargetBackend, TargetConfig, MANIFEST_FILE_NAME};
