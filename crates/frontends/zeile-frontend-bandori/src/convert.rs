//! Lowering of a Bandori story asset into a [`Story`].
//!
//! Snippets are converted one at a time, in order. The source leaves some
//! state implicit (costumes, whether a character is on stage, the delay
//! baseline), which is recovered from the earlier records of the asset.

use tracing::{debug, error, warn};
use zeile_core::diagnostic::{Diagnostic, DiagnosticKind, SourceLocation};
use zeile_core::ir::{Locale, Position, PositionBase, StepAction, Story};

use crate::asset::{
    ActionType, EffectType, LayoutData, LayoutType, Side, Snippet, SoundData, SpecialEffectData,
    StoryAsset, TalkData,
};

/// Shared location of sound effects that ship without a bundle.
pub const COMMON_SE_BASE_URL: &str = "https://bestdori.com/res/CommonSE";

/// Result of a conversion: the best-effort story plus everything that was
/// skipped or guessed along the way.
#[derive(Debug)]
pub struct Conversion {
    pub story: Story,
    pub diagnostics: Vec<Diagnostic>,
}

/// Convert `asset` into a story for `locale`.
///
/// `voice_bundle_path` is the directory voice lines are resolved against.
/// Conversion never fails; problems are reported as diagnostics.
pub fn convert(asset: &StoryAsset, locale: Locale, voice_bundle_path: &str) -> Conversion {
    let mut converter = Converter {
        asset,
        locale,
        voice_bundle_path,
        diagnostics: Vec::new(),
    };
    let mut story = Story::new(locale);

    if !asset.first_bgm.is_empty() {
        story.emit(StepAction::ChangeBgm {
            path: converter.bgm_path(&asset.first_bgm),
        });
    }
    if !asset.first_background.is_empty() {
        story.emit(StepAction::ChangeBackground {
            path: format!(
                "{locale}/{}/{}.png",
                asset.first_background_bundle_name, asset.first_background
            ),
        });
    }

    for index in 0..asset.snippets.len() {
        story.emit_all(converter.snippet_actions(index));
    }

    debug!(
        scene = %asset.scenario_scene_id,
        snippets = asset.snippets.len(),
        actions = story.actions().len(),
        diagnostics = converter.diagnostics.len(),
        "converted story asset"
    );
    Conversion {
        story,
        diagnostics: converter.diagnostics,
    }
}

struct Converter<'a> {
    asset: &'a StoryAsset,
    locale: Locale,
    voice_bundle_path: &'a str,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Converter<'a> {
    fn snippet_actions(&mut self, index: usize) -> Vec<StepAction> {
        let asset = self.asset;
        let snippet = &asset.snippets[index];
        let mut out = Vec::new();

        if snippet.is_gating() {
            out.push(StepAction::WaitForAll);
        }

        match snippet.action_type {
            ActionType::None => {}
            ActionType::Talk => {
                if let Some(talk) = self.lookup(&asset.talk_data, index, "talk") {
                    self.talk(talk, &mut out);
                }
            }
            ActionType::Layout | ActionType::Motion => {
                if let Some(layout) = self.lookup(&asset.layout_data, index, "layout") {
                    self.layout(index, snippet, layout, &mut out);
                }
            }
            ActionType::Input => self.unsupported(index, "input"),
            ActionType::Selectable => self.unsupported(index, "selectable"),
            ActionType::Effect => {
                if let Some(effect) = self.lookup(&asset.special_effect_data, index, "effect") {
                    self.effect(effect, &mut out);
                }
            }
            ActionType::Sound => {
                if let Some(sound) = self.lookup(&asset.sound_data, index, "sound") {
                    self.sound(sound, &mut out);
                }
            }
        }

        if snippet.delay > 0.0 {
            let previous = previous_delay(&asset.snippets[..index]);
            out.insert(
                0,
                StepAction::Delay {
                    seconds: snippet.delay - previous,
                },
            );
        }

        out
    }

    fn talk(&mut self, talk: &TalkData, out: &mut Vec<StepAction>) {
        let voice_path = talk.voices.first().map(|voice| {
            if self.voice_bundle_path.is_empty() {
                format!("{}.mp3", voice.voice_id)
            } else {
                format!("{}/{}.mp3", self.voice_bundle_path, voice.voice_id)
            }
        });
        out.push(StepAction::Talk {
            text: talk.body.clone(),
            character_ids: talk.talk_characters.iter().map(|c| c.character_id).collect(),
            character_names: vec![talk.window_display_name.clone()],
            voice_path,
        });
        for motion in &talk.motions {
            push_motion(
                out,
                motion.character_id,
                &motion.motion_name,
                &motion.expression_name,
            );
        }
    }

    fn layout(
        &mut self,
        index: usize,
        snippet: &Snippet,
        layout: &LayoutData,
        out: &mut Vec<StepAction>,
    ) {
        let character_id = layout.character_id;
        if snippet.action_type == ActionType::Layout {
            match layout.layout_type {
                LayoutType::None => {}
                LayoutType::Move => {
                    let position = self.position(index, layout.side_to, layout.side_to_offset_x);
                    out.push(StepAction::MoveModel {
                        character_id,
                        position,
                    });
                }
                LayoutType::Appear => self.appear(index, snippet, layout, out),
                LayoutType::Hide => out.push(StepAction::HideModel { character_id }),
                LayoutType::ShakeX => out.push(StepAction::HorizontalShake { character_id }),
                LayoutType::ShakeY => out.push(StepAction::VerticalShake { character_id }),
            }
        }

        if layout.layout_type != LayoutType::Hide || snippet.action_type == ActionType::Motion {
            push_motion(
                out,
                character_id,
                &layout.motion_name,
                &layout.expression_name,
            );
        }
    }

    fn appear(
        &mut self,
        index: usize,
        snippet: &Snippet,
        layout: &LayoutData,
        out: &mut Vec<StepAction>,
    ) {
        let character_id = layout.character_id;
        let position = self.position(index, layout.side_to, layout.side_to_offset_x);
        // `lookup` already checked the index, so this slice is in bounds.
        let reference = snippet.reference_index as usize;
        let earlier = &self.asset.layout_data[..reference];

        if has_appeared(earlier, character_id) {
            out.push(StepAction::MoveModel {
                character_id,
                position,
            });
            return;
        }

        // Appearances may omit the costume when the same one was named by
        // an earlier record for this character.
        let costume = std::iter::once(layout)
            .chain(earlier.iter().rev())
            .find(|data| data.character_id == character_id && !data.costume_type.is_empty())
            .map(|data| data.costume_type.as_str());

        match costume {
            Some(costume) => out.push(StepAction::ShowModel {
                character_id,
                model_path: format!("{}/live2d/chara/{costume}", self.locale),
                position,
            }),
            None => {
                error!(
                    snippet = index,
                    character_id, "model costume for character was never defined"
                );
                self.diagnostics.push(Diagnostic::error(
                    SourceLocation::Snippet { index },
                    DiagnosticKind::UnresolvedCostume,
                    format!("no costume was ever named for character {character_id}"),
                ));
            }
        }
    }

    fn effect(&mut self, effect: &SpecialEffectData, out: &mut Vec<StepAction>) {
        let duration = effect.duration;
        let locale = self.locale;
        let action = match effect.effect_type {
            EffectType::BlackIn => StepAction::HideBlackCover { duration },
            EffectType::BlackOut => StepAction::ShowBlackCover { duration },
            EffectType::WhiteIn => StepAction::HideWhiteCover { duration },
            EffectType::WhiteOut => StepAction::ShowWhiteCover { duration },
            EffectType::ShakeScreen => StepAction::ShakeScreen { duration },
            EffectType::ShakeWindow => StepAction::ShakeDialogBox { duration },
            EffectType::ChangeBackground
            | EffectType::ChangeBackgroundStill
            | EffectType::ChangeCardStill => StepAction::ChangeBackground {
                path: format!("{locale}/{}/{}.png", effect.string_val, effect.string_val_sub),
            },
            EffectType::Telop => StepAction::Telop {
                text: effect.string_val.clone(),
            },
            // Most scenario effects are engine animations with no IR
            // counterpart; only background swaps carry over.
            EffectType::PlayScenarioEffect if effect.string_val.starts_with("bgchange") => {
                StepAction::ChangeBackground {
                    path: format!("{locale}/{}/bg.png", effect.string_val_sub),
                }
            }
            other => {
                debug!(effect = ?other, value = %effect.string_val, "skipping effect");
                return;
            }
        };
        out.push(action);
    }

    fn sound(&mut self, sound: &SoundData, out: &mut Vec<StepAction>) {
        if !sound.bgm.is_empty() {
            out.push(StepAction::ChangeBgm {
                path: self.bgm_path(&sound.bgm),
            });
        }
        if !sound.se.is_empty() {
            let path = if sound.se_bundle_name.is_empty() {
                format!("{COMMON_SE_BASE_URL}/{}.mp3", sound.se)
            } else {
                format!(
                    "{}/sound/se/{}/{}.mp3",
                    self.locale, sound.se_bundle_name, sound.se
                )
            };
            out.push(StepAction::ChangeSe { path });
        }
    }

    fn bgm_path(&self, bgm: &str) -> String {
        format!(
            "{}/sound/scenario/bgm/{}/{bgm}.mp3",
            self.locale,
            bgm.to_lowercase()
        )
    }

    fn position(&mut self, index: usize, side: Side, offset_x: i64) -> Position {
        let base = match side {
            Side::None => {
                warn!(snippet = index, "layout side is 'none', evaluating as center");
                self.diagnostics.push(Diagnostic::warning(
                    SourceLocation::Snippet { index },
                    DiagnosticKind::UnresolvedReference,
                    "layout side 'none' has no staging slot, using center",
                ));
                PositionBase::Center
            }
            Side::Left => PositionBase::Left,
            Side::LeftOver => PositionBase::LeftOutside,
            Side::LeftInside => PositionBase::LeftInside,
            Side::Center => PositionBase::Center,
            Side::Right => PositionBase::Right,
            Side::RightOver => PositionBase::RightOutside,
            Side::RightInside => PositionBase::RightInside,
            Side::LeftUnder => PositionBase::LeftBottom,
            Side::LeftInsideUnder => PositionBase::LeftInsideBottom,
            Side::CenterUnder => PositionBase::CenterBottom,
            Side::RightUnder => PositionBase::RightBottom,
            Side::RightInsideUnder => PositionBase::RightInsideBottom,
        };
        Position::new(base, offset_x as f64)
    }

    /// Resolve the side-table row a snippet points at.
    fn lookup<T>(&mut self, table: &'a [T], index: usize, what: &str) -> Option<&'a T> {
        let reference = self.asset.snippets[index].reference_index;
        let row = usize::try_from(reference)
            .ok()
            .and_then(|row| table.get(row));
        if row.is_none() {
            warn!(
                snippet = index,
                reference,
                table = what,
                "snippet references a missing record"
            );
            self.diagnostics.push(Diagnostic::warning(
                SourceLocation::Snippet { index },
                DiagnosticKind::UnresolvedReference,
                format!(
                    "{what} record {reference} does not exist ({} records)",
                    table.len()
                ),
            ));
        }
        row
    }

    fn unsupported(&mut self, index: usize, kind: &str) {
        error!(snippet = index, "the '{kind}' action is not supported, skipping");
        self.diagnostics.push(Diagnostic::warning(
            SourceLocation::Snippet { index },
            DiagnosticKind::UnsupportedSnippet,
            format!("'{kind}' snippets are not supported"),
        ));
    }
}

fn push_motion(out: &mut Vec<StepAction>, character_id: i64, motion: &str, expression: &str) {
    if !motion.is_empty() {
        out.push(StepAction::Act {
            character_id,
            motion_name: motion.to_string(),
        });
    }
    if !expression.is_empty() {
        out.push(StepAction::Express {
            character_id,
            expression_name: expression.to_string(),
        });
    }
}

/// Whether the nearest earlier staging record for `character_id` left the
/// character on stage.
fn has_appeared(earlier: &[LayoutData], character_id: i64) -> bool {
    earlier
        .iter()
        .rev()
        .filter(|data| data.character_id == character_id)
        .find_map(|data| match data.layout_type {
            LayoutType::Hide => Some(false),
            LayoutType::Appear | LayoutType::Move => Some(true),
            _ => None,
        })
        .unwrap_or(false)
}

/// The delay baseline for the next snippet: the delay of the nearest
/// earlier snippet that has one, unless a gating snippet comes first.
fn previous_delay(earlier: &[Snippet]) -> f64 {
    for snippet in earlier.iter().rev() {
        if snippet.is_gating() {
            break;
        }
        if snippet.delay > 0.0 {
            return snippet.delay;
        }
    }
    0.0
}
