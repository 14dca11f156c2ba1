//! Backend for the Bestdori story player.
//!
//! Produces the scenario JSON the player consumes: a flat list of typed
//! records, each carrying its own delay and wait flag.

mod lower;
pub mod wire;

use serde::Deserialize;
use tracing::debug;
use zeile_core::error::CoreError;
use zeile_core::ir::Story;
use zeile_core::pipeline::Backend;

pub use lower::{lower, resolve_path};
pub use wire::Scenario;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BestdoriOptions {
    /// Server id written into the scenario.
    pub server: i64,
}

impl BestdoriOptions {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, CoreError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(value)
            .map_err(|e| CoreError::Project(format!("invalid bestdori options: {e}")))
    }
}

#[derive(Default)]
pub struct BestdoriBackend {
    pub options: BestdoriOptions,
}

impl BestdoriBackend {
    pub fn new(options: BestdoriOptions) -> Self {
        Self { options }
    }
}

impl Backend for BestdoriBackend {
    fn name(&self) -> &str {
        "bestdori"
    }

    fn file_extension(&self) -> &str {
        "json"
    }

    fn emit(&self, story: &Story) -> Result<String, CoreError> {
        let scenario = lower(story, self.options.server);
        debug!(records = scenario.actions.len(), "lowered story to scenario");
        Ok(serde_json::to_string_pretty(&scenario)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zeile_core::ir::{Locale, Position, PositionBase, StepAction};

    #[test]
    fn record_json_shape() {
        let story = Story::from_actions(
            Locale::Jp,
            vec![
                StepAction::ChangeBackground {
                    path: "https://example.com/bg.png".into(),
                },
                StepAction::Delay { seconds: 1.0 },
                StepAction::ShowModel {
                    character_id: 2,
                    model_path: "jp/live2d/chara/002_school".into(),
                    position: Position::new(PositionBase::CenterBottom, 0.0),
                },
                StepAction::ShowBlackCover { duration: 0.5 },
                StepAction::ChangeSe {
                    path: "jp/sound/se/scenario_se_rip/se_001.mp3".into(),
                },
            ],
        );
        let out = BestdoriBackend::default().emit(&story).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            value,
            json!({
                "server": 0,
                "voice": "",
                "background": { "type": "custom", "url": "https://example.com/bg.png" },
                "actions": [
                    {
                        "type": "layout",
                        "delay": 1,
                        "wait": false,
                        "layoutType": "appear",
                        "character": 2,
                        "costume": "002_school",
                        "motion": "",
                        "expression": "",
                        "sideFrom": "center",
                        "sideFromOffsetX": 0,
                        "sideTo": "center",
                        "sideToOffsetX": 0
                    },
                    {
                        "type": "effect",
                        "effectType": "blackOut",
                        "delay": 1,
                        "wait": false,
                        "duration": 0.5
                    },
                    {
                        "type": "sound",
                        "delay": 1,
                        "wait": false,
                        "se": { "type": "bandori", "file": "se_001", "bundle": "scenario_se" }
                    }
                ]
            })
        );
    }

    #[test]
    fn server_option() {
        let options = BestdoriOptions::from_value(&json!({ "server": 3 })).unwrap();
        assert_eq!(options.server, 3);
        assert!(BestdoriOptions::from_value(&json!({ "server": "jp" })).is_err());
    }
}
