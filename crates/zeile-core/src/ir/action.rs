use serde::{Deserialize, Serialize};

/// One step of a story.
///
/// The set of variants is closed. `Blocking` and `ForkTask` nest further
/// sequences, so a story is a tree of actions, never a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "action",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum StepAction {
    /// A dialogue line. `character_ids` and `character_names` are parallel
    /// as far as the source provides names.
    Talk {
        text: String,
        character_ids: Vec<i64>,
        character_names: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        voice_path: Option<String>,
    },
    Telop {
        text: String,
    },
    ShowModel {
        character_id: i64,
        model_path: String,
        position: Position,
    },
    HideModel {
        character_id: i64,
    },
    MoveModel {
        character_id: i64,
        position: Position,
    },
    Act {
        character_id: i64,
        motion_name: String,
    },
    Express {
        character_id: i64,
        expression_name: String,
    },
    HorizontalShake {
        character_id: i64,
    },
    VerticalShake {
        character_id: i64,
    },

    ShowBlackCover {
        duration: f64,
    },
    HideBlackCover {
        duration: f64,
    },
    ShowWhiteCover {
        duration: f64,
    },
    HideWhiteCover {
        duration: f64,
    },
    ShakeScreen {
        duration: f64,
    },
    ShakeDialogBox {
        duration: f64,
    },

    ChangeBackground {
        path: String,
    },
    #[serde(rename = "changeBGM")]
    ChangeBgm {
        path: String,
    },
    #[serde(rename = "changeSE")]
    ChangeSe {
        path: String,
    },

    /// Members run to completion before the parent sequence continues.
    Blocking {
        actions: Vec<StepAction>,
    },
    /// Elapsed time before the following actions of the same sequence.
    Delay {
        seconds: f64,
    },
    /// Members start running while the parent sequence continues.
    ForkTask {
        actions: Vec<StepAction>,
    },
    WaitForTap,
    WaitForAll,
}

impl StepAction {
    /// The IR name of this action, as used in serialized IR.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Talk { .. } => "talk",
            Self::Telop { .. } => "telop",
            Self::ShowModel { .. } => "showModel",
            Self::HideModel { .. } => "hideModel",
            Self::MoveModel { .. } => "moveModel",
            Self::Act { .. } => "act",
            Self::Express { .. } => "express",
            Self::HorizontalShake { .. } => "horizontalShake",
            Self::VerticalShake { .. } => "verticalShake",
            Self::ShowBlackCover { .. } => "showBlackCover",
            Self::HideBlackCover { .. } => "hideBlackCover",
            Self::ShowWhiteCover { .. } => "showWhiteCover",
            Self::HideWhiteCover { .. } => "hideWhiteCover",
            Self::ShakeScreen { .. } => "shakeScreen",
            Self::ShakeDialogBox { .. } => "shakeDialogBox",
            Self::ChangeBackground { .. } => "changeBackground",
            Self::ChangeBgm { .. } => "changeBGM",
            Self::ChangeSe { .. } => "changeSE",
            Self::Blocking { .. } => "blocking",
            Self::Delay { .. } => "delay",
            Self::ForkTask { .. } => "forkTask",
            Self::WaitForTap => "waitForTap",
            Self::WaitForAll => "waitForAll",
        }
    }

    /// The nested sequence of a `Blocking` or `ForkTask`.
    pub fn nested(&self) -> Option<&[StepAction]> {
        match self {
            Self::Blocking { actions } | Self::ForkTask { actions } => Some(actions),
            _ => None,
        }
    }

    /// Visit this action and every nested action in pre-order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a StepAction)) {
        f(self);
        if let Some(actions) = self.nested() {
            for action in actions {
                action.walk(f);
            }
        }
    }
}

/// A staging position: an anchor slot plus a horizontal offset from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub base: PositionBase,
    pub offset_x: f64,
}

impl Position {
    pub const fn new(base: PositionBase, offset_x: f64) -> Self {
        Self { base, offset_x }
    }

    /// The fallback position for characters with no known placement.
    pub const fn center() -> Self {
        Self::new(PositionBase::Center, 0.0)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::center()
    }
}

/// The twelve anchor slots a model or cover can be placed at.
///
/// Discriminants are stable: the plain-text format writes them as numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum PositionBase {
    LeftOutside = 0,
    Left = 1,
    LeftInside = 2,
    LeftBottom = 3,
    LeftInsideBottom = 4,
    Center = 5,
    CenterBottom = 6,
    RightOutside = 7,
    Right = 8,
    RightInside = 9,
    RightBottom = 10,
    RightInsideBottom = 11,
}

impl PositionBase {
    pub const ALL: [PositionBase; 12] = [
        Self::LeftOutside,
        Self::Left,
        Self::LeftInside,
        Self::LeftBottom,
        Self::LeftInsideBottom,
        Self::Center,
        Self::CenterBottom,
        Self::RightOutside,
        Self::Right,
        Self::RightInside,
        Self::RightBottom,
        Self::RightInsideBottom,
    ];

    pub fn raw(self) -> u8 {
        self as u8
    }

    pub fn from_raw(raw: u8) -> Option<Self> {
        Self::ALL.get(usize::from(raw)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LeftOutside => "leftOutside",
            Self::Left => "left",
            Self::LeftInside => "leftInside",
            Self::LeftBottom => "leftBottom",
            Self::LeftInsideBottom => "leftInsideBottom",
            Self::Center => "center",
            Self::CenterBottom => "centerBottom",
            Self::RightOutside => "rightOutside",
            Self::Right => "right",
            Self::RightInside => "rightInside",
            Self::RightBottom => "rightBottom",
            Self::RightInsideBottom => "rightInsideBottom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_round_trip() {
        for base in PositionBase::ALL {
            assert_eq!(PositionBase::from_raw(base.raw()), Some(base));
        }
        assert_eq!(PositionBase::from_raw(12), None);
    }

    #[test]
    fn walk_is_pre_order() {
        let action = StepAction::Blocking {
            actions: vec![
                StepAction::WaitForTap,
                StepAction::ForkTask {
                    actions: vec![StepAction::Delay { seconds: 1.0 }],
                },
                StepAction::WaitForAll,
            ],
        };
        let mut names = Vec::new();
        action.walk(&mut |a| names.push(a.name()));
        assert_eq!(
            names,
            ["blocking", "waitForTap", "forkTask", "delay", "waitForAll"]
        );
    }

    #[test]
    fn serde_uses_ir_names() {
        let action = StepAction::ChangeBgm {
            path: "jp/bgm.mp3".into(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "changeBGM");
        assert_eq!(json["path"], "jp/bgm.mp3");

        let talk = StepAction::Talk {
            text: "hi".into(),
            character_ids: vec![1],
            character_names: vec!["Kasumi".into()],
            voice_path: None,
        };
        let json = serde_json::to_value(&talk).unwrap();
        assert_eq!(json["characterIds"], serde_json::json!([1]));
        assert!(json.get("voicePath").is_none());
        let back: StepAction = serde_json::from_value(json).unwrap();
        assert_eq!(back, talk);
    }
}
