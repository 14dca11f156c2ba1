//! Lowering of IR into the scenario action list.
//!
//! The player wants every record to be self-contained, while the IR only
//! states changes. Each flat sequence is walked forward with a
//! [`SequenceState`] that remembers the delay baseline and where each
//! character stands, so hide and move records can name where a model was.

use std::collections::HashMap;

use tracing::trace;
use zeile_core::ir::{Position, PositionBase, StepAction, Story};

use crate::wire::{AssetRef, Effect, LayoutType, Record, RecordBody, Scenario, Side};

/// Lower `story` into a scenario for `server`.
pub fn lower(story: &Story, server: i64) -> Scenario {
    let actions = story.actions();

    // A leading run of background and BGM changes is the initial scene.
    let mut background = None;
    let mut bgm = None;
    let mut start = 0;
    for action in actions {
        match action {
            StepAction::ChangeBackground { path } => background = Some(background_ref(path)),
            StepAction::ChangeBgm { path } => bgm = Some(bgm_ref(path)),
            _ => break,
        }
        start += 1;
    }

    let mut records = Vec::new();
    lower_sequence(&actions[start..], Grouping::TopLevel, &mut records);
    Scenario {
        server,
        voice: String::new(),
        background,
        bgm,
        actions: records,
    }
}

/// How a sequence's members are awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grouping {
    TopLevel,
    /// The last member of the group is awaited.
    Blocking,
    /// Members run alongside the parent and are never awaited.
    Fork,
}

/// What the lowering knows at one point of a flat sequence.
#[derive(Default)]
struct SequenceState {
    delay: i64,
    positions: HashMap<i64, Position>,
    models: HashMap<i64, String>,
}

impl SequenceState {
    fn last_position(&self, character: i64) -> Position {
        self.positions
            .get(&character)
            .copied()
            .unwrap_or_else(Position::center)
    }

    fn costume(&self, character: i64) -> String {
        self.models
            .get(&character)
            .map(|path| costume_of(path))
            .unwrap_or_default()
    }
}

/// Lower one flat sequence into `out`.
///
/// Only the last member of a blocking group waits. When that member emits
/// no record (a trailing delay or wait), no record of the group waits.
fn lower_sequence(actions: &[StepAction], grouping: Grouping, out: &mut Vec<Record>) {
    let mut state = SequenceState::default();
    for (index, action) in actions.iter().enumerate() {
        let wait = grouping == Grouping::Blocking && index + 1 == actions.len();
        let delay = state.delay;
        let record = |body| Record { delay, wait, body };

        match action {
            StepAction::Talk {
                text,
                character_ids,
                character_names,
                ..
            } => out.push(Record {
                delay,
                // The player always waits for dialogue.
                wait: true,
                body: RecordBody::Talk {
                    characters: character_ids.clone(),
                    name: character_names.first().cloned().unwrap_or_default(),
                    body: text.clone(),
                    motions: Vec::new(),
                    voices: Vec::new(),
                    close: false,
                },
            }),
            StepAction::Telop { text } => out.push(record(RecordBody::Effect(Effect::Telop {
                text: text.clone(),
            }))),
            StepAction::ShowModel {
                character_id,
                model_path,
                position,
            } => {
                let side = map_side(position.base);
                let offset = position.offset_x as i64;
                out.push(record(RecordBody::Layout {
                    layout_type: LayoutType::Appear,
                    character: *character_id,
                    costume: costume_of(model_path),
                    motion: String::new(),
                    expression: String::new(),
                    side_from: side,
                    side_from_offset_x: offset,
                    side_to: side,
                    side_to_offset_x: offset,
                }));
                state.positions.insert(*character_id, *position);
                state.models.insert(*character_id, model_path.clone());
            }
            StepAction::MoveModel {
                character_id,
                position,
            } => {
                let from = state.last_position(*character_id);
                out.push(record(RecordBody::Layout {
                    layout_type: LayoutType::Move,
                    character: *character_id,
                    costume: state.costume(*character_id),
                    motion: String::new(),
                    expression: String::new(),
                    side_from: map_side(from.base),
                    side_from_offset_x: from.offset_x as i64,
                    side_to: map_side(position.base),
                    side_to_offset_x: position.offset_x as i64,
                }));
                state.positions.insert(*character_id, *position);
            }
            StepAction::HideModel { character_id } => {
                out.push(record(in_place(&state, *character_id, LayoutType::Hide)))
            }
            StepAction::HorizontalShake { character_id } => {
                out.push(record(in_place(&state, *character_id, LayoutType::ShakeX)))
            }
            StepAction::VerticalShake { character_id } => {
                out.push(record(in_place(&state, *character_id, LayoutType::ShakeY)))
            }
            StepAction::Act {
                character_id,
                motion_name,
            } => out.push(record(RecordBody::Motion {
                character: *character_id,
                costume: state.costume(*character_id),
                motion: motion_name.clone(),
                expression: String::new(),
            })),
            StepAction::Express {
                character_id,
                expression_name,
            } => out.push(record(RecordBody::Motion {
                character: *character_id,
                costume: state.costume(*character_id),
                motion: String::new(),
                expression: expression_name.clone(),
            })),
            // Covering the screen is the player's fade-out.
            StepAction::ShowBlackCover { duration } => out.push(record(RecordBody::Effect(
                Effect::BlackOut {
                    duration: *duration,
                },
            ))),
            StepAction::HideBlackCover { duration } => out.push(record(RecordBody::Effect(
                Effect::BlackIn {
                    duration: *duration,
                },
            ))),
            StepAction::ShowWhiteCover { duration } => out.push(record(RecordBody::Effect(
                Effect::WhiteOut {
                    duration: *duration,
                },
            ))),
            StepAction::HideWhiteCover { duration } => out.push(record(RecordBody::Effect(
                Effect::WhiteIn {
                    duration: *duration,
                },
            ))),
            StepAction::ShakeScreen { duration } => out.push(record(RecordBody::Effect(
                Effect::ShakeScreen {
                    duration: *duration,
                },
            ))),
            StepAction::ShakeDialogBox { duration } => out.push(record(RecordBody::Effect(
                Effect::ShakeWindow {
                    duration: *duration,
                },
            ))),
            StepAction::ChangeBackground { path } => out.push(record(RecordBody::Effect(
                Effect::ChangeBackground {
                    background: background_ref(path),
                },
            ))),
            StepAction::ChangeBgm { path } => out.push(record(RecordBody::Sound {
                bgm: Some(bgm_ref(path)),
                se: None,
            })),
            StepAction::ChangeSe { path } => out.push(record(RecordBody::Sound {
                bgm: None,
                se: Some(resolve_path(path, true, "")),
            })),
            StepAction::Blocking { actions } => lower_sequence(actions, Grouping::Blocking, out),
            StepAction::ForkTask { actions } => lower_sequence(actions, Grouping::Fork, out),
            StepAction::Delay { seconds } => state.delay = *seconds as i64,
            // Taps gate the sequence just like waitForAll, so both reset.
            StepAction::WaitForTap | StepAction::WaitForAll => {
                trace!(action = action.name(), "delay baseline reset");
                state.delay = 0;
            }
        }
    }
}

/// A layout record that leaves the character where it last stood.
fn in_place(state: &SequenceState, character: i64, layout_type: LayoutType) -> RecordBody {
    let position = state.last_position(character);
    let side = map_side(position.base);
    let offset = position.offset_x as i64;
    RecordBody::Layout {
        layout_type,
        character,
        costume: state.costume(character),
        motion: String::new(),
        expression: String::new(),
        side_from: side,
        side_from_offset_x: offset,
        side_to: side,
        side_to_offset_x: offset,
    }
}

fn costume_of(model_path: &str) -> String {
    model_path.rsplit('/').next().unwrap_or_default().to_string()
}

fn background_ref(path: &str) -> AssetRef {
    resolve_path(path, true, "bg/")
}

fn bgm_ref(path: &str) -> AssetRef {
    resolve_path(path, false, "")
}

/// Turn an IR asset path into an asset reference.
///
/// URLs are passed through. Game paths name the file without its
/// extension and, when `contains_bundle` is set, the bundle it lives in:
/// the parent directory with any `_rip` suffix removed, after
/// `bundle_prefix`.
pub fn resolve_path(path: &str, contains_bundle: bool, bundle_prefix: &str) -> AssetRef {
    if path.starts_with("http://") || path.starts_with("https://") {
        return AssetRef::Custom {
            url: path.to_string(),
        };
    }
    let mut components = path.rsplit('/');
    let file_part = components.next().unwrap_or_default();
    let file = match file_part.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => file_part,
    };
    let bundle = match components.next() {
        Some(dir) if contains_bundle => {
            let dir = dir.strip_suffix("_rip").unwrap_or(dir);
            Some(format!("{bundle_prefix}{dir}"))
        }
        _ => None,
    };
    AssetRef::Bandori {
        file: file.to_string(),
        bundle,
    }
}

fn map_side(base: PositionBase) -> Side {
    match base {
        PositionBase::LeftOutside => Side::LeftOver,
        PositionBase::Left
        | PositionBase::LeftInside
        | PositionBase::LeftBottom
        | PositionBase::LeftInsideBottom => Side::LeftInside,
        PositionBase::Center | PositionBase::CenterBottom => Side::Center,
        PositionBase::RightOutside => Side::RightOver,
        PositionBase::Right
        | PositionBase::RightInside
        | PositionBase::RightBottom
        | PositionBase::RightInsideBottom => Side::RightInside,
    }
}
