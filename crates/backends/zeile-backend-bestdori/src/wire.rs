//! Records of the Bestdori story player's scenario format.

use serde::Serialize;

/// A whole scenario: initial scene state plus the action list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub server: i64,
    /// Voice bundle of the scenario. Always empty: voices are not carried
    /// over.
    pub voice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<AssetRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgm: Option<AssetRef>,
    pub actions: Vec<Record>,
}

/// One entry of the action list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Whole seconds to wait before the action starts.
    pub delay: i64,
    /// Whether the player waits for the action to finish.
    pub wait: bool,
    #[serde(flatten)]
    pub body: RecordBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RecordBody {
    Talk {
        characters: Vec<i64>,
        name: String,
        body: String,
        motions: Vec<serde_json::Value>,
        voices: Vec<serde_json::Value>,
        close: bool,
    },
    Layout {
        layout_type: LayoutType,
        character: i64,
        costume: String,
        motion: String,
        expression: String,
        side_from: Side,
        side_from_offset_x: i64,
        side_to: Side,
        side_to_offset_x: i64,
    },
    Motion {
        character: i64,
        costume: String,
        motion: String,
        expression: String,
    },
    Effect(Effect),
    Sound {
        #[serde(skip_serializing_if = "Option::is_none")]
        bgm: Option<AssetRef>,
        #[serde(skip_serializing_if = "Option::is_none")]
        se: Option<AssetRef>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutType {
    Appear,
    Hide,
    Move,
    ShakeX,
    ShakeY,
}

/// The five slots the player can place a model at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    LeftOver,
    LeftInside,
    Center,
    RightInside,
    RightOver,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effectType", rename_all = "camelCase")]
pub enum Effect {
    BlackIn { duration: f64 },
    BlackOut { duration: f64 },
    WhiteIn { duration: f64 },
    WhiteOut { duration: f64 },
    ShakeScreen { duration: f64 },
    ShakeWindow { duration: f64 },
    Telop { text: String },
    ChangeBackground { background: AssetRef },
}

/// Reference to an asset, either a game file or an arbitrary URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AssetRef {
    Custom {
        url: String,
    },
    Bandori {
        file: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        bundle: Option<String>,
    },
}
