//! Structured-text debug backend.
//!
//! One line per action, `<index> <Name>(<key: value, ...>)` with keys in
//! sorted order. Nested groups are written as indented closures:
//!
//! ```text
//! # LOCALE: JP
//!
//! 0 ChangeBGM(path: jp/sound/scenario/bgm/bgm001/BGM001.mp3)
//! 1 Blocking {
//!   0 ShowModel(charID: 1, modelPath: jp/live2d/chara/001, position: {base: left, offsetX: 0.0})
//!   1 WaitForTap
//! }
//!
//! EOF.
//! ```

use std::fmt::Write;

use serde::Deserialize;
use tracing::debug;
use zeile_core::error::CoreError;
use zeile_core::ir::{Position, StepAction, Story};
use zeile_core::pipeline::Backend;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiriusOptions {
    /// Render nested groups as indented closures instead of inline arrays.
    pub allow_closures: bool,
}

impl Default for SiriusOptions {
    fn default() -> Self {
        Self {
            allow_closures: true,
        }
    }
}

impl SiriusOptions {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, CoreError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(value)
            .map_err(|e| CoreError::Project(format!("invalid sirius options: {e}")))
    }
}

#[derive(Default)]
pub struct SiriusBackend {
    pub options: SiriusOptions,
}

impl SiriusBackend {
    pub fn new(options: SiriusOptions) -> Self {
        Self { options }
    }
}

impl Backend for SiriusBackend {
    fn name(&self) -> &str {
        "sirius"
    }

    fn file_extension(&self) -> &str {
        "sirius"
    }

    fn emit(&self, story: &Story) -> Result<String, CoreError> {
        let out = render(story, self.options.allow_closures);
        debug!(bytes = out.len(), "emitted structured text");
        Ok(out)
    }
}

/// Render `story` as structured text.
pub fn render(story: &Story, allow_closures: bool) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "# LOCALE: {}\n\n",
        story.locale().as_str().to_uppercase()
    );
    write_actions(&mut out, story.actions(), 0, allow_closures);
    out.push_str("\nEOF.");
    out
}

fn write_actions(out: &mut String, actions: &[StepAction], depth: usize, allow_closures: bool) {
    let indent = "  ".repeat(depth);
    for (index, action) in actions.iter().enumerate() {
        let _ = write!(out, "{indent}{index} ");
        match action.nested() {
            Some(children) if allow_closures => {
                out.push_str(display_name(action));
                if children.is_empty() {
                    out.push_str(" {}");
                } else {
                    out.push_str(" {\n");
                    write_actions(out, children, depth + 1, true);
                    let _ = write!(out, "{indent}}}");
                }
            }
            _ => out.push_str(&inline(action)),
        }
        out.push('\n');
    }
}

/// Render one action on a single line, nested groups included.
fn inline(action: &StepAction) -> String {
    let mut params: Vec<(&str, String)> = match action {
        StepAction::Talk {
            text,
            character_ids,
            character_names,
            voice_path,
        } => vec![
            ("", text.replace('\n', "\\n")),
            ("charID", format!("{character_ids:?}")),
            ("charName", format!("{character_names:?}")),
            ("voicePath", voice_path.clone().unwrap_or_else(|| "nil".into())),
        ],
        StepAction::Telop { text } => vec![("", text.clone())],
        StepAction::ShowModel {
            character_id,
            model_path,
            position,
        } => vec![
            ("charID", character_id.to_string()),
            ("modelPath", model_path.clone()),
            ("position", position_text(position)),
        ],
        StepAction::MoveModel {
            character_id,
            position,
        } => vec![
            ("charID", character_id.to_string()),
            ("position", position_text(position)),
        ],
        StepAction::HideModel { character_id }
        | StepAction::HorizontalShake { character_id }
        | StepAction::VerticalShake { character_id } => {
            vec![("charID", character_id.to_string())]
        }
        StepAction::Act {
            character_id,
            motion_name,
        } => vec![
            ("charID", character_id.to_string()),
            ("motionName", motion_name.clone()),
        ],
        StepAction::Express {
            character_id,
            expression_name,
        } => vec![
            ("charID", character_id.to_string()),
            ("expressionName", expression_name.clone()),
        ],
        StepAction::ShowBlackCover { duration }
        | StepAction::HideBlackCover { duration }
        | StepAction::ShowWhiteCover { duration }
        | StepAction::HideWhiteCover { duration }
        | StepAction::ShakeScreen { duration }
        | StepAction::ShakeDialogBox { duration } => vec![("duration", format!("{duration:?}"))],
        StepAction::ChangeBackground { path }
        | StepAction::ChangeBgm { path }
        | StepAction::ChangeSe { path } => vec![("path", path.clone())],
        StepAction::Delay { seconds } => vec![("seconds", format!("{seconds:?}"))],
        StepAction::Blocking { actions } | StepAction::ForkTask { actions } => {
            let items: Vec<String> = actions.iter().map(inline).collect();
            vec![("array", format!("[{}]", items.join(", ")))]
        }
        StepAction::WaitForTap | StepAction::WaitForAll => Vec::new(),
    };

    let name = display_name(action);
    if params.is_empty() {
        return name.to_string();
    }
    params.sort_by(|a, b| a.0.cmp(b.0));
    let params: Vec<String> = params
        .into_iter()
        .map(|(key, value)| {
            if key.is_empty() {
                value
            } else {
                format!("{key}: {value}")
            }
        })
        .collect();
    format!("{name}({})", params.join(", "))
}

fn display_name(action: &StepAction) -> &'static str {
    match action {
        StepAction::Talk { .. } => "Talk",
        StepAction::Telop { .. } => "Telop",
        StepAction::ShowModel { .. } => "ShowModel",
        StepAction::HideModel { .. } => "HideModel",
        StepAction::MoveModel { .. } => "MoveModel",
        StepAction::Act { .. } => "Act",
        StepAction::Express { .. } => "Express",
        StepAction::HorizontalShake { .. } => "HorizontalShake",
        StepAction::VerticalShake { .. } => "VerticalShake",
        StepAction::ShowBlackCover { .. } => "ShowBlackCover",
        StepAction::HideBlackCover { .. } => "HideBlackCover",
        StepAction::ShowWhiteCover { .. } => "ShowWhiteCover",
        StepAction::HideWhiteCover { .. } => "HideWhiteCover",
        StepAction::ShakeScreen { .. } => "ShakeScreen",
        StepAction::ShakeDialogBox { .. } => "ShakeDialogBox",
        StepAction::ChangeBackground { .. } => "ChangeBackground",
        StepAction::ChangeBgm { .. } => "ChangeBGM",
        StepAction::ChangeSe { .. } => "ChangeSE",
        StepAction::Blocking { .. } => "Blocking",
        StepAction::Delay { .. } => "Delay",
        StepAction::ForkTask { .. } => "ForkTask",
        StepAction::WaitForTap => "WaitForTap",
        StepAction::WaitForAll => "WaitForAll",
    }
}

fn position_text(position: &Position) -> String {
    format!(
        "{{base: {}, offsetX: {:?}}}",
        position.base.name(),
        position.offset_x
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeile_core::ir::{Locale, PositionBase};

    fn sample() -> Story {
        Story::from_actions(
            Locale::Jp,
            vec![
                StepAction::Talk {
                    text: "Line one\nline two".into(),
                    character_ids: vec![1, 2],
                    character_names: vec!["Kasumi".into()],
                    voice_path: None,
                },
                StepAction::Blocking {
                    actions: vec![
                        StepAction::MoveModel {
                            character_id: 1,
                            position: Position::new(PositionBase::LeftInside, -10.0),
                        },
                        StepAction::ForkTask { actions: vec![] },
                    ],
                },
                StepAction::Express {
                    character_id: 1,
                    expression_name: "smile".into(),
                },
                StepAction::WaitForTap,
            ],
        )
    }

    #[test]
    fn renders_closures() {
        let expected = "\
# LOCALE: JP

0 Talk(Line one\\nline two, charID: [1, 2], charName: [\"Kasumi\"], voicePath: nil)
1 Blocking {
  0 MoveModel(charID: 1, position: {base: leftInside, offsetX: -10.0})
  1 ForkTask {}
}
2 Express(charID: 1, expressionName: smile)
3 WaitForTap

EOF.";
        assert_eq!(render(&sample(), true), expected);
    }

    #[test]
    fn renders_inline_arrays_without_closures() {
        let out = render(&sample(), false);
        assert!(out.contains(
            "1 Blocking(array: [MoveModel(charID: 1, position: {base: leftInside, offsetX: -10.0}), ForkTask(array: [])])\n"
        ));
    }

    #[test]
    fn empty_story() {
        let story = Story::new(Locale::Kr);
        assert_eq!(render(&story, true), "# LOCALE: KR\n\n\nEOF.");
    }

    #[test]
    fn options_default_to_closures() {
        let options = SiriusOptions::from_value(&serde_json::json!({})).unwrap();
        assert!(options.allow_closures);
        let options = SiriusOptions::from_value(&serde_json::json!({ "allowClosures": false })).unwrap();
        assert!(!options.allow_closures);
    }
}
