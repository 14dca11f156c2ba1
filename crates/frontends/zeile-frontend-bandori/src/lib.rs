pub mod asset;
pub mod convert;

use std::fs;

use serde::Deserialize;
use tracing::info;
use zeile_core::error::CoreError;
use zeile_core::pipeline::{Frontend, FrontendInput, FrontendOutput};
use zeile_core::project::SourceFormat;

pub use asset::{parse_asset, StoryAsset};
pub use convert::{convert, Conversion};

/// Options read from the manifest's `options` object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BandoriOptions {
    /// Directory voice lines are resolved against.
    pub voice_bundle_path: String,
}

impl BandoriOptions {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, CoreError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(value)
            .map_err(|e| CoreError::Project(format!("invalid bandori options: {e}")))
    }
}

/// Bandori frontend: converts story asset JSON into IR.
pub struct BandoriFrontend;

impl Frontend for BandoriFrontend {
    fn format(&self) -> SourceFormat {
        SourceFormat::Bandori
    }

    fn extract(&self, input: FrontendInput) -> Result<FrontendOutput, CoreError> {
        let options = BandoriOptions::from_value(&input.options)?;
        let json = fs::read_to_string(&input.source)?;
        let asset = parse_asset(&json).map_err(|e| CoreError::Parse {
            file: input.source.clone(),
            message: e.to_string(),
        })?;

        info!(
            source = %input.source.display(),
            scene = %asset.scenario_scene_id,
            "converting story asset"
        );
        let Conversion { story, diagnostics } =
            convert(&asset, input.locale, &options.voice_bundle_path);
        Ok(FrontendOutput { story, diagnostics })
    }
}
