//! Plain-text emission.
//!
//! Output has three sections. `.text` and `.path` list every distinct
//! literal of the story once, in first-occurrence order; `.code` holds one
//! line per action that refers to those literals by index. Nested groups
//! are written as separate `sub_<n>` blocks after the main code.

use std::collections::HashMap;
use std::fmt::Write;

use zeile_core::error::CoreError;
use zeile_core::ir::{Position, StepAction, Story};

/// Distinct strings in first-occurrence order.
#[derive(Default)]
struct Table<'a> {
    items: Vec<&'a str>,
    index: HashMap<&'a str, usize>,
}

impl<'a> Table<'a> {
    fn intern(&mut self, s: &'a str) {
        if !self.index.contains_key(s) {
            self.index.insert(s, self.items.len());
            self.items.push(s);
        }
    }

    fn get(&self, s: &str, kind: &str) -> Result<usize, CoreError> {
        self.index
            .get(s)
            .copied()
            .ok_or_else(|| CoreError::Codegen(format!("{kind} {s:?} missing from table")))
    }

    fn write_section(&self, out: &mut String, header: &str, prefix: char) {
        let _ = writeln!(out, "{header}");
        for (i, item) in self.items.iter().enumerate() {
            let _ = writeln!(out, "{prefix}{i}: {};", escape(item));
        }
        out.push('\n');
    }
}

fn escape(s: &str) -> String {
    s.replace(';', "\\;")
}

struct Tables<'a> {
    texts: Table<'a>,
    paths: Table<'a>,
}

impl<'a> Tables<'a> {
    fn collect(story: &'a Story) -> Self {
        let mut texts = Table::default();
        let mut paths = Table::default();
        story.walk(|action| match action {
            StepAction::Talk {
                text,
                character_names,
                voice_path,
                ..
            } => {
                texts.intern(text);
                for name in character_names {
                    texts.intern(name);
                }
                if let Some(path) = voice_path {
                    paths.intern(path);
                }
            }
            StepAction::Telop { text } => texts.intern(text),
            StepAction::ShowModel { model_path, .. } => paths.intern(model_path),
            StepAction::Act { motion_name, .. } => texts.intern(motion_name),
            StepAction::Express {
                expression_name, ..
            } => texts.intern(expression_name),
            StepAction::ChangeBackground { path }
            | StepAction::ChangeBgm { path }
            | StepAction::ChangeSe { path } => paths.intern(path),
            _ => {}
        });
        Self { texts, paths }
    }

    fn text(&self, s: &str) -> Result<String, CoreError> {
        Ok(format!("t{}", self.texts.get(s, "text")?))
    }

    fn path(&self, s: &str) -> Result<String, CoreError> {
        Ok(format!("p{}", self.paths.get(s, "path")?))
    }
}

/// Render `story` in the plain-text format.
pub fn emit(story: &Story) -> Result<String, CoreError> {
    let tables = Tables::collect(story);
    let mut code = CodeWriter {
        tables: &tables,
        subs: Vec::new(),
    };
    let main = code.block(story.actions())?;

    let mut out = String::new();
    tables.texts.write_section(&mut out, ".text", 't');
    tables.paths.write_section(&mut out, ".path", 'p');
    out.push_str(".code\n");
    out.push_str(&main);
    out.push('\n');
    let subs: Vec<String> = code
        .subs
        .iter()
        .enumerate()
        .map(|(n, body)| format!("sub_{n}:\n{body}"))
        .collect();
    out.push_str(&subs.join("\n"));
    Ok(out)
}

struct CodeWriter<'t> {
    tables: &'t Tables<'t>,
    subs: Vec<String>,
}

impl CodeWriter<'_> {
    /// Render one sequence. Nested groups are rendered first and appended
    /// to `subs`, so sub-blocks are numbered in post-order.
    fn block(&mut self, actions: &[StepAction]) -> Result<String, CoreError> {
        let mut out = String::new();
        for action in actions {
            let line = self.line(action)?;
            let _ = writeln!(out, "{line}");
        }
        Ok(out)
    }

    fn line(&mut self, action: &StepAction) -> Result<String, CoreError> {
        let t = self.tables;
        let line = match action {
            StepAction::Talk {
                text,
                character_ids,
                character_names,
                voice_path,
            } => {
                let ids: Vec<String> = character_ids.iter().map(|id| format!("#{id}")).collect();
                let names = character_names
                    .iter()
                    .map(|name| t.text(name))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut line = format!(
                    "tlk    {}, [{}], [{}]",
                    t.text(text)?,
                    ids.join(", "),
                    names.join(", ")
                );
                if let Some(path) = voice_path {
                    let _ = write!(line, ", {}", t.path(path)?);
                }
                line
            }
            StepAction::Telop { text } => format!("tlp    {}", t.text(text)?),
            StepAction::ShowModel {
                character_id,
                model_path,
                position,
            } => format!(
                "mds    #{character_id}, {}, {}",
                t.path(model_path)?,
                position_text(position)
            ),
            StepAction::HideModel { character_id } => format!("mdh    #{character_id}"),
            StepAction::MoveModel {
                character_id,
                position,
            } => format!("mdm    #{character_id}, {}", position_text(position)),
            StepAction::Act {
                character_id,
                motion_name,
            } => format!("act    #{character_id}, {}", t.text(motion_name)?),
            StepAction::Express {
                character_id,
                expression_name,
            } => format!("exp    #{character_id}, {}", t.text(expression_name)?),
            StepAction::HorizontalShake { character_id } => format!("hsk    #{character_id}"),
            StepAction::VerticalShake { character_id } => format!("vsk    #{character_id}"),
            StepAction::ShowBlackCover { duration } => format!("bcs    #{duration:?}"),
            StepAction::HideBlackCover { duration } => format!("bch    #{duration:?}"),
            StepAction::ShowWhiteCover { duration } => format!("wcs    #{duration:?}"),
            StepAction::HideWhiteCover { duration } => format!("wch    #{duration:?}"),
            StepAction::ShakeScreen { duration } => format!("ssc    #{duration:?}"),
            StepAction::ShakeDialogBox { duration } => format!("sdb    #{duration:?}"),
            StepAction::ChangeBackground { path } => format!("cbg    {}", t.path(path)?),
            StepAction::ChangeBgm { path } => format!("cbm    {}", t.path(path)?),
            StepAction::ChangeSe { path } => format!("cse    {}", t.path(path)?),
            StepAction::Blocking { actions } => format!("blk    $sub_{}", self.sub(actions)?),
            StepAction::Delay { seconds } => format!("slp    #{seconds:?}"),
            StepAction::ForkTask { actions } => format!("tsk    $sub_{}", self.sub(actions)?),
            StepAction::WaitForAll => "wfa".to_string(),
            StepAction::WaitForTap => "wft".to_string(),
        };
        Ok(line)
    }

    fn sub(&mut self, actions: &[StepAction]) -> Result<usize, CoreError> {
        let body = self.block(actions)?;
        self.subs.push(body);
        Ok(self.subs.len() - 1)
    }
}

fn position_text(position: &Position) -> String {
    format!("{{#{}, #{:?}}}", position.base.raw(), position.offset_x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeile_core::ir::{Locale, PositionBase};

    #[test]
    fn emits_sections_and_dedups_literals() {
        let story = Story::from_actions(
            Locale::Jp,
            vec![
                StepAction::ChangeBgm {
                    path: "jp/bgm.mp3".into(),
                },
                StepAction::Talk {
                    text: "Hi; there".into(),
                    character_ids: vec![1, 2],
                    character_names: vec!["Kasumi".into()],
                    voice_path: Some("voice/1.mp3".into()),
                },
                StepAction::Act {
                    character_id: 1,
                    motion_name: "Kasumi".into(),
                },
                StepAction::ShowModel {
                    character_id: 1,
                    model_path: "jp/live2d/chara/001".into(),
                    position: Position::new(PositionBase::Left, -20.0),
                },
                StepAction::ChangeBgm {
                    path: "jp/bgm.mp3".into(),
                },
                StepAction::ShowBlackCover { duration: 2.0 },
                StepAction::WaitForTap,
            ],
        );
        let expected = "\
.text
t0: Hi\\; there;
t1: Kasumi;

.path
p0: jp/bgm.mp3;
p1: voice/1.mp3;
p2: jp/live2d/chara/001;

.code
cbm    p0
tlk    t0, [#1, #2], [t1], p1
act    #1, t1
mds    #1, p2, {#1, #-20.0}
cbm    p0
bcs    #2.0
wft

";
        assert_eq!(emit(&story).unwrap(), expected);
    }

    #[test]
    fn nested_blocks_are_numbered_post_order() {
        let story = Story::from_actions(
            Locale::Jp,
            vec![
                StepAction::Blocking {
                    actions: vec![
                        StepAction::ForkTask {
                            actions: vec![StepAction::Delay { seconds: 0.5 }],
                        },
                        StepAction::WaitForAll,
                    ],
                },
                StepAction::ForkTask { actions: vec![] },
            ],
        );
        let expected = "\
.text

.path

.code
blk    $sub_1
tsk    $sub_2

sub_0:
slp    #0.5

sub_1:
tsk    $sub_0
wfa

sub_2:
";
        assert_eq!(emit(&story).unwrap(), expected);
    }

    #[test]
    fn nested_literals_share_the_table() {
        let talk = StepAction::Telop {
            text: "Chapter 1".into(),
        };
        let story = Story::from_actions(
            Locale::Jp,
            vec![
                talk.clone(),
                StepAction::ForkTask {
                    actions: vec![talk],
                },
            ],
        );
        let out = emit(&story).unwrap();
        assert_eq!(out.matches("Chapter 1").count(), 1);
        assert!(out.contains("sub_0:\ntlp    t0\n"));
    }
}
