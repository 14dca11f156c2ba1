use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ir::Locale;

pub const MANIFEST_FILE_NAME: &str = "zeile.json";

/// The source format a story asset is stored in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceFormat {
    Bandori,
    Other(String),
}

/// Output backend for a build target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetBackend {
    PlainText,
    Sirius,
    Bestdori,
}

/// Configuration for one build target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub backend: TargetBackend,
    /// Output file path.
    pub output: PathBuf,
    /// Additional backend-specific options.
    #[serde(default)]
    pub options: serde_json::Value,
}

/// Top-level project manifest (`zeile.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub name: String,
    #[serde(default)]
    pub locale: Locale,
    pub format: SourceFormat,
    /// Path to the source story asset.
    pub source: PathBuf,
    /// Frontend-specific options.
    #[serde(default)]
    pub options: serde_json::Value,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

impl ProjectManifest {
    /// Resolve relative paths against `base` (the manifest's directory).
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.source.is_relative() {
            self.source = base.join(&self.source);
        }
        for target in &mut self.targets {
            if target.output.is_relative() {
                target.output = base.join(&target.output);
            }
        }
        debug!(
            base = %base.display(),
            source = %self.source.display(),
            targets = self.targets.len(),
            "resolved manifest paths"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_manifest() {
        let json = r#"{
            "name": "band-story-1",
            "locale": "en",
            "format": "bandori",
            "source": "assets/story.json",
            "options": { "voiceBundlePath": "voice/band1" },
            "targets": [
                { "backend": "plain-text", "output": "out/story.txt" },
                { "backend": "bestdori", "output": "/abs/story.json", "options": { "server": 1 } }
            ]
        }"#;
        let mut manifest: ProjectManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.locale, Locale::En);
        assert_eq!(manifest.format, SourceFormat::Bandori);
        assert_eq!(manifest.targets[0].backend, TargetBackend::PlainText);
        assert_eq!(manifest.targets[1].options["server"], 1);

        manifest.resolve_paths(Path::new("/project"));
        assert_eq!(manifest.source, PathBuf::from("/project/assets/story.json"));
        assert_eq!(manifest.targets[0].output, PathBuf::from("/project/out/story.txt"));
        assert_eq!(manifest.targets[1].output, PathBuf::from("/abs/story.json"));
    }

    #[test]
    fn locale_and_targets_default() {
        let json = r#"{ "name": "s", "format": "bandori", "source": "a.json" }"#;
        let manifest: ProjectManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.locale, Locale::Jp);
        assert!(manifest.targets.is_empty());
        assert!(manifest.options.is_null());
    }
}
