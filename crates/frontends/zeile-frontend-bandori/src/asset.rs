//! Serde model of a Bandori story asset.
//!
//! Story assets are JSON documents with a top-level `Base` object holding
//! an ordered list of snippets and four side tables (talk, layout, special
//! effect, sound) that snippets point into by index. Only the fields the
//! converter reads are modelled. Every field is optional in the source, so
//! missing fields decode to their defaults and unknown enum values decode
//! to the `None` case.

use serde::Deserialize;

/// Declare an integer-coded enum whose unknown values decode to `None`.
macro_rules! int_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
        #[serde(from = "i64")]
        pub enum $name {
            #[default]
            None,
            $($variant),+
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                match raw {
                    $($value => Self::$variant,)+
                    _ => Self::None,
                }
            }
        }
    };
}

int_enum!(
    /// What a snippet refers to.
    ActionType {
        Talk = 1,
        Layout = 2,
        Input = 3,
        Motion = 4,
        Selectable = 5,
        Effect = 6,
        Sound = 7,
    }
);

int_enum!(LayoutType {
    Move = 1,
    Appear = 2,
    Hide = 3,
    ShakeX = 4,
    ShakeY = 5,
});

int_enum!(
    /// Horizontal staging slot of a layout record.
    Side {
        Left = 1,
        LeftOver = 2,
        LeftInside = 3,
        Center = 4,
        Right = 5,
        RightOver = 6,
        RightInside = 7,
        LeftUnder = 8,
        LeftInsideUnder = 9,
        CenterUnder = 10,
        RightUnder = 11,
        RightInsideUnder = 12,
    }
);

int_enum!(EffectType {
    BlackIn = 1,
    BlackOut = 2,
    WhiteIn = 3,
    WhiteOut = 4,
    ShakeScreen = 5,
    ShakeWindow = 6,
    ChangeBackground = 7,
    Telop = 8,
    FlashbackIn = 9,
    FlashbackOut = 10,
    ChangeCardStill = 11,
    AmbientColorNormal = 12,
    AmbientColorEvening = 13,
    AmbientColorNight = 14,
    PlayScenarioEffect = 15,
    StopScenarioEffect = 16,
    ChangeBackgroundStill = 17,
});

/// Progress type of snippets that wait for all running tasks first.
pub const GATING_PROGRESS_TYPE: i64 = 1;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoryAsset {
    pub scenario_scene_id: String,
    pub first_bgm: String,
    pub first_background: String,
    pub first_background_bundle_name: String,
    pub snippets: Vec<Snippet>,
    pub talk_data: Vec<TalkData>,
    pub layout_data: Vec<LayoutData>,
    pub special_effect_data: Vec<SpecialEffectData>,
    pub sound_data: Vec<SoundData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snippet {
    pub action_type: ActionType,
    pub progress_type: i64,
    pub reference_index: i64,
    /// Cumulative seconds since the last gating snippet.
    pub delay: f64,
}

impl Snippet {
    pub fn is_gating(&self) -> bool {
        self.progress_type == GATING_PROGRESS_TYPE
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TalkData {
    pub talk_characters: Vec<TalkCharacter>,
    pub window_display_name: String,
    pub body: String,
    pub motions: Vec<TalkMotion>,
    pub voices: Vec<TalkVoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TalkCharacter {
    pub character_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TalkMotion {
    pub character_id: i64,
    pub motion_name: String,
    pub expression_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TalkVoice {
    pub character_id: i64,
    pub voice_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutData {
    #[serde(rename = "type")]
    pub layout_type: LayoutType,
    pub side_from: Side,
    pub side_from_offset_x: i64,
    pub side_to: Side,
    pub side_to_offset_x: i64,
    pub character_id: i64,
    pub costume_type: String,
    pub motion_name: String,
    pub expression_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecialEffectData {
    pub effect_type: EffectType,
    pub string_val: String,
    pub string_val_sub: String,
    pub duration: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SoundData {
    pub bgm: String,
    pub se: String,
    pub se_bundle_name: String,
}

/// Parse a story asset, with or without the `Base` envelope.
pub fn parse_asset(json: &str) -> Result<StoryAsset, serde_json::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Envelope {
        Wrapped {
            #[serde(rename = "Base")]
            base: StoryAsset,
        },
        Bare(StoryAsset),
    }
    match serde_json::from_str(json)? {
        Envelope::Wrapped { base } => Ok(base),
        Envelope::Bare(asset) => Ok(asset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_wrapped_asset() {
        let json = r#"{
            "Base": {
                "scenarioSceneId": "band1_01",
                "firstBgm": "BGM001",
                "firstBackground": "bg00001",
                "firstBackgroundBundleName": "bg/scenario1_rip",
                "snippets": [
                    { "actionType": 1, "progressType": 1, "referenceIndex": 0, "delay": 0.5 }
                ],
                "talkData": [{
                    "talkCharacters": [{ "characterId": 1 }],
                    "windowDisplayName": "Kasumi",
                    "body": "Hello!",
                    "motions": [{ "characterId": 1, "motionName": "smile01", "expressionName": "" }],
                    "voices": [{ "characterId": 1, "voiceId": "scenario1_01", "volume": 1.0 }]
                }],
                "layoutData": [{ "type": 2, "sideTo": 4, "sideToOffsetX": -30, "characterId": 1, "costumeType": "001_casual" }]
            }
        }"#;
        let asset = parse_asset(json).unwrap();
        assert_eq!(asset.scenario_scene_id, "band1_01");
        assert_eq!(asset.first_bgm, "BGM001");
        assert_eq!(asset.snippets[0].action_type, ActionType::Talk);
        assert!(asset.snippets[0].is_gating());
        assert_eq!(asset.talk_data[0].voices[0].voice_id, "scenario1_01");
        assert_eq!(asset.layout_data[0].layout_type, LayoutType::Appear);
        assert_eq!(asset.layout_data[0].side_to, Side::Center);
        assert_eq!(asset.layout_data[0].side_to_offset_x, -30);
        assert!(asset.sound_data.is_empty());
    }

    #[test]
    fn parse_bare_asset() {
        let json = r#"{ "snippets": [{ "actionType": 7, "referenceIndex": 0 }], "soundData": [{ "se": "se_door" }] }"#;
        let asset = parse_asset(json).unwrap();
        assert_eq!(asset.snippets[0].action_type, ActionType::Sound);
        assert_eq!(asset.sound_data[0].se, "se_door");
        assert!(asset.sound_data[0].se_bundle_name.is_empty());
    }

    #[test]
    fn unknown_enum_values_decode_to_none() {
        assert_eq!(ActionType::from(42), ActionType::None);
        assert_eq!(Side::from(-1), Side::None);
        assert_eq!(EffectType::from(17), EffectType::ChangeBackgroundStill);
        assert_eq!(LayoutType::from(0), LayoutType::None);
    }
}
